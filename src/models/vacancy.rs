use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::error::{Error, Result};
use crate::utils::validation::validate_http_url;

/// Placeholder stored when the source omits a text field.
pub const NOT_SPECIFIED: &str = "not specified";

/// Field names as they appear in the storage file.
pub const FIELD_TITLE: &str = "name_vacancy";
pub const FIELD_CITY: &str = "city";
pub const FIELD_URL: &str = "url";
pub const FIELD_SALARY: &str = "salary";
pub const FIELD_CURRENCY: &str = "currency";
pub const FIELD_DESCRIPTION: &str = "description";

fn not_specified() -> String {
    NOT_SPECIFIED.to_string()
}

fn string_or_sentinel<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        _ => not_specified(),
    })
}

/// Unvalidated vacancy fields. Turned into a [`Vacancy`] via [`Vacancy::new`].
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewVacancy {
    #[serde(rename = "name_vacancy", default)]
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: String,
    #[serde(default = "not_specified")]
    pub city: String,
    #[serde(default)]
    #[validate(custom(function = "validate_http_url"))]
    pub url: String,
    #[serde(default)]
    #[validate(range(min = 0, message = "salary must not be negative"))]
    pub salary: Option<i64>,
    #[serde(default = "not_specified")]
    pub currency: String,
    #[serde(default = "not_specified", deserialize_with = "string_or_sentinel")]
    pub description: String,
}

impl NewVacancy {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            city: not_specified(),
            url: url.into(),
            salary: None,
            currency: not_specified(),
            description: not_specified(),
        }
    }

    pub fn city(mut self, city: impl Into<String>) -> Self {
        self.city = city.into();
        self
    }

    pub fn salary(mut self, salary: i64) -> Self {
        self.salary = Some(salary);
        self
    }

    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// A validated job posting. Fields are read-only once constructed.
///
/// Equality is structural over every field. Salary ordering is available
/// through [`compare_by_salary`], never through `PartialOrd`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "NewVacancy")]
pub struct Vacancy {
    #[serde(rename = "name_vacancy")]
    title: String,
    city: String,
    url: String,
    salary: u64,
    currency: String,
    description: String,
}

impl Vacancy {
    pub fn new(fields: NewVacancy) -> Result<Self> {
        fields.validate()?;
        let salary = match fields.salary {
            Some(value) => u64::try_from(value).map_err(|_| {
                crate::utils::validation::field_error(
                    "salary",
                    "range",
                    "salary must not be negative",
                )
            })?,
            None => 0,
        };

        Ok(Self {
            title: fields.title,
            city: fields.city,
            url: fields.url,
            salary,
            currency: fields.currency,
            description: fields.description,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn salary(&self) -> u64 {
        self.salary
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Value of a storage field by its on-disk name; `None` for unknown names.
    pub fn field_value(&self, field: &str) -> Option<Value> {
        let value = match field {
            FIELD_TITLE => Value::from(self.title.as_str()),
            FIELD_CITY => Value::from(self.city.as_str()),
            FIELD_URL => Value::from(self.url.as_str()),
            FIELD_SALARY => Value::from(self.salary),
            FIELD_CURRENCY => Value::from(self.currency.as_str()),
            FIELD_DESCRIPTION => Value::from(self.description.as_str()),
            _ => return None,
        };
        Some(value)
    }
}

impl TryFrom<NewVacancy> for Vacancy {
    type Error = Error;

    fn try_from(fields: NewVacancy) -> Result<Self> {
        Vacancy::new(fields)
    }
}

impl fmt::Display for Vacancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, {}): {}\nDescription: {}",
            self.title, self.salary, self.currency, self.url, self.description
        )
    }
}

/// Ascending salary order. Ties compare equal regardless of other fields,
/// so pair it with a stable sort to keep insertion order among them.
pub fn compare_by_salary(a: &Vacancy, b: &Vacancy) -> Ordering {
    a.salary.cmp(&b.salary)
}
