mod app;
mod client;
mod config;
mod error;
#[cfg(test)]
mod testing;
mod ui;

use std::{fs::OpenOptions, sync::Mutex};

use tracing_subscriber::EnvFilter;

use crate::{config::AppConfig, error::Result};

/// Logs go to a file only: the terminal belongs to the UI.
fn init_logging(config: &AppConfig) -> Result<()> {
    let Some(path) = config.log_file.as_deref() else {
        return Ok(());
    };
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("gastos_tui={}", config.level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::load()?;
    init_logging(&config)?;
    tracing::info!("starting against {}", config.base_url);

    let mut app = app::App::new(config)?;
    ui::install_panic_hook();
    app.run()?;
    Ok(())
}
