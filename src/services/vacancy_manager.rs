use serde::Deserialize;
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::dto::search_dto::RawVacancy;
use crate::error::Result;
use crate::models::vacancy::{compare_by_salary, NewVacancy, Vacancy};
use crate::services::search_service::{HhApiSource, SearchService, VacancySource};
use crate::utils::validation::field_error;

/// Holds the result set of the latest search.
pub struct VacancyManager<S = HhApiSource> {
    search: SearchService<S>,
    vacancies: Vec<Vacancy>,
}

impl<S: VacancySource> VacancyManager<S> {
    pub fn new(search: SearchService<S>) -> Self {
        Self {
            search,
            vacancies: Vec::new(),
        }
    }

    /// Replaces the current results with postings paying at least
    /// `min_salary`. Records that fail to map are skipped.
    #[instrument(skip(self))]
    pub async fn fetch_vacancies(
        &mut self,
        query: &str,
        min_salary: i64,
        period_days: i64,
    ) -> Result<&[Vacancy]> {
        let items = self.search.fetch(query, min_salary, period_days).await?;
        let received = items.len();

        self.vacancies = items
            .into_iter()
            .filter_map(|item| map_record(item, min_salary))
            .collect();

        info!(
            received,
            kept = self.vacancies.len(),
            "Vacancies filtered by salary"
        );
        Ok(&self.vacancies)
    }

    pub fn vacancies(&self) -> &[Vacancy] {
        &self.vacancies
    }

    pub fn add_vacancy(&mut self, vacancy: Vacancy) {
        self.vacancies.push(vacancy);
    }

    /// Case-insensitive substring match on the description. An empty keyword
    /// matches everything.
    pub fn filter_by_keyword(&self, keyword: &str) -> Vec<&Vacancy> {
        let needle = keyword.to_lowercase();
        self.vacancies
            .iter()
            .filter(|v| v.description().to_lowercase().contains(&needle))
            .collect()
    }

    /// Highest salary first; equal salaries keep their current order.
    pub fn sort_by_salary(&mut self) {
        self.vacancies.sort_by(|a, b| compare_by_salary(b, a));
    }

    /// First `n` results in the current order.
    pub fn top_n(&self, n: usize) -> Result<&[Vacancy]> {
        if n == 0 {
            return Err(field_error("n", "range", "n must be a positive integer").into());
        }
        Ok(&self.vacancies[..n.min(self.vacancies.len())])
    }
}

fn map_record(item: Value, min_salary: i64) -> Option<Vacancy> {
    let raw = match RawVacancy::deserialize(item) {
        Ok(raw) => raw,
        Err(err) => {
            warn!(error = %err, "Skipping undecodable vacancy record");
            return None;
        }
    };

    if !raw.salary_from().is_some_and(|from| from >= min_salary) {
        return None;
    }

    match Vacancy::new(NewVacancy::from(raw)) {
        Ok(vacancy) => Some(vacancy),
        Err(err) => {
            warn!(error = %err, "Skipping invalid vacancy record");
            None
        }
    }
}
