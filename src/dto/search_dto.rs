use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::models::vacancy::{NewVacancy, NOT_SPECIFIED};

/// Records requested per page.
pub const PER_PAGE: u32 = 10;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SearchParams {
    #[validate(length(min = 1, message = "query must not be empty"))]
    pub query: String,
    #[validate(range(min = 1, message = "min_salary must be positive"))]
    pub min_salary: i64,
    #[validate(range(min = 1, message = "period_days must be positive"))]
    pub period_days: i64,
}

impl SearchParams {
    pub fn new(query: impl Into<String>, min_salary: i64, period_days: i64) -> Self {
        Self {
            query: query.into(),
            min_salary,
            period_days,
        }
    }
}

/// Query string of a single page request.
#[derive(Debug, Clone, Serialize)]
pub struct PageQuery<'a> {
    pub per_page: u32,
    pub text: &'a str,
    pub only_with_salary: bool,
    pub salary: i64,
    pub period: i64,
    pub page: u32,
}

impl<'a> PageQuery<'a> {
    pub fn new(params: &'a SearchParams, page: u32) -> Self {
        Self {
            per_page: PER_PAGE,
            text: &params.query,
            only_with_salary: true,
            salary: params.min_salary,
            period: params.period_days,
            page,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchPage {
    #[serde(default)]
    pub items: Vec<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawArea {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawSalary {
    pub from: Option<i64>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawSnippet {
    pub requirement: Option<Value>,
}

/// A posting as the search API returns it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawVacancy {
    pub name: Option<String>,
    pub area: Option<RawArea>,
    pub alternate_url: Option<String>,
    pub salary: Option<RawSalary>,
    pub snippet: Option<RawSnippet>,
}

impl RawVacancy {
    pub fn salary_from(&self) -> Option<i64> {
        self.salary.as_ref().and_then(|s| s.from)
    }
}

impl From<RawVacancy> for NewVacancy {
    fn from(raw: RawVacancy) -> Self {
        let salary_from = raw.salary_from();
        let currency = raw.salary.and_then(|s| s.currency);
        let description = match raw.snippet.and_then(|s| s.requirement) {
            Some(Value::String(text)) => text,
            _ => NOT_SPECIFIED.to_string(),
        };

        NewVacancy {
            title: raw.name.unwrap_or_default(),
            city: raw
                .area
                .and_then(|a| a.name)
                .unwrap_or_else(|| NOT_SPECIFIED.to_string()),
            url: raw.alternate_url.unwrap_or_default(),
            salary: salary_from,
            currency: currency.unwrap_or_else(|| NOT_SPECIFIED.to_string()),
            description,
        }
    }
}
