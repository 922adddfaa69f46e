use std::fs::OpenOptions;
use std::sync::Mutex;

use tokio::io::{stdin, stdout, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;
use vacancy_aggregator::{
    cli::{menu::Menu, prompt::Prompt},
    config::{get_config, init_config, Config},
    AppState,
};

fn init_tracing(config: &Config) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match &config.log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_config()?;
    let config = get_config();
    init_tracing(config)?;

    let state = AppState::new(config).await?;
    info!(store = %state.store.path().display(), "Vacancy store ready");

    let prompt = Prompt::new(BufReader::new(stdin()), stdout());
    Menu::new(&state.search, &state.store, prompt).run().await?;

    info!("Bye");
    Ok(())
}
