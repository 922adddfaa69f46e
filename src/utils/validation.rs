use std::borrow::Cow;

use validator::{ValidationError, ValidationErrors};

/// Builds a single-field `ValidationErrors` for checks that don't fit a derive.
pub fn field_error(field: &'static str, code: &'static str, message: &'static str) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add(
        field,
        ValidationError::new(code).with_message(Cow::Borrowed(message)),
    );
    errors
}

pub fn validate_http_url(url: &str) -> Result<(), ValidationError> {
    if url.starts_with("http") {
        Ok(())
    } else {
        Err(ValidationError::new("http_url")
            .with_message(Cow::Borrowed("url must start with http")))
    }
}
