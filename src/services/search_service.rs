use anyhow::Context as _;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info, instrument};
use validator::Validate;

use crate::config::Config;
use crate::dto::search_dto::{PageQuery, SearchPage, SearchParams};
use crate::error::{Error, Result};

/// Upper bound on page requests per fetch.
pub const PAGE_CAP: u32 = 20;

/// One page of raw postings from the remote search API.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VacancySource: Send + Sync {
    async fn fetch_page(&self, params: &SearchParams, page: u32) -> anyhow::Result<Vec<Value>>;
}

#[derive(Clone)]
pub struct HhApiSource {
    client: Client,
    base_url: String,
}

impl HhApiSource {
    pub fn new(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.http_timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self::new(config.base_url.clone(), client))
    }
}

#[async_trait]
impl VacancySource for HhApiSource {
    async fn fetch_page(&self, params: &SearchParams, page: u32) -> anyhow::Result<Vec<Value>> {
        let resp = self
            .client
            .get(&self.base_url)
            .query(&PageQuery::new(params, page))
            .send()
            .await
            .context("search request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("search API status {}: {}", status.as_u16(), body);
        }

        let parsed: SearchPage = resp.json().await.context("search response parse failed")?;
        Ok(parsed.items)
    }
}

/// Validates search input and walks the remote pages.
#[derive(Clone)]
pub struct SearchService<S = HhApiSource> {
    source: S,
}

impl<S: VacancySource> SearchService<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub async fn fetch(&self, query: &str, min_salary: i64, period_days: i64) -> Result<Vec<Value>> {
        self.fetch_with(&SearchParams::new(query, min_salary, period_days))
            .await
    }

    /// Returns every item of every page, or the first failure. Stops at the
    /// first empty page or after [`PAGE_CAP`] requests.
    #[instrument(skip(self, params), fields(query = %params.query))]
    pub async fn fetch_with(&self, params: &SearchParams) -> Result<Vec<Value>> {
        params.validate()?;

        info!("Fetching vacancies from search API");
        let mut items = Vec::new();
        for page in 0..PAGE_CAP {
            let batch = self
                .source
                .fetch_page(params, page)
                .await
                .map_err(|source| Error::Request { page, source })?;

            debug!(page, count = batch.len(), "Fetched search page");
            if batch.is_empty() {
                break;
            }
            items.extend(batch);
        }

        info!(count = items.len(), "Search finished");
        Ok(items)
    }
}
