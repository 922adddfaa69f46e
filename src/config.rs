use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

const DEFAULT_VACANCIES_FILE: &str = "data/vacancies.json";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub vacancies_file: PathBuf,
    pub user_agent: String,
    pub http_timeout: Duration,
    pub log_file: Option<PathBuf>,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let base_url = get_env("BASE_URL")?;
        if !base_url.starts_with("http") {
            return Err(Error::Config(format!(
                "BASE_URL must be an http(s) endpoint, got {}",
                base_url
            )));
        }

        Ok(Self {
            base_url,
            vacancies_file: env::var("VACANCIES_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_VACANCIES_FILE)),
            user_agent: env::var("HTTP_USER_AGENT").unwrap_or_else(|_| default_user_agent()),
            http_timeout: Duration::from_secs(
                get_env_parse_or("HTTP_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?,
            ),
            log_file: env::var("LOG_FILE").ok().map(PathBuf::from),
        })
    }
}

pub fn default_user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
