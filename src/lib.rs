pub mod cli;
pub mod config;
pub mod dto;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

use crate::config::Config;
use crate::error::Result;
use crate::services::{
    search_service::{HhApiSource, SearchService},
    storage_service::VacancyStore,
};

#[derive(Clone)]
pub struct AppState {
    pub search: SearchService<HhApiSource>,
    pub store: VacancyStore,
}

impl AppState {
    pub async fn new(config: &Config) -> Result<Self> {
        let search = SearchService::new(HhApiSource::from_config(config)?);
        let store = VacancyStore::initialize(&config.vacancies_file).await?;

        Ok(Self { search, store })
    }
}
