use std::{collections::HashMap, time::Duration};

use clap::Parser;
use engine::Amount;
use serde::Deserialize;

use crate::{
    client::GatewayConfig,
    error::{AppError, Result},
};

const DEFAULT_CONFIG_PATH: &str = "config/tui.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub probe_interval_secs: u64,
    /// Monthly allowance, as a decimal string.
    pub allowance: String,
    pub currency_symbol: String,
    /// Extra headers sent with every request.
    pub headers: HashMap<String, String>,
    /// Log file; logging is off when unset since the terminal is taken.
    pub log_file: Option<String>,
    pub level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/api/gastos/".to_string(),
            timeout_secs: 10,
            probe_interval_secs: 30,
            allowance: "380.00".to_string(),
            currency_symbol: "R$".to_string(),
            headers: HashMap::new(),
            log_file: None,
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn allowance(&self) -> Result<Amount> {
        let allowance: Amount = self
            .allowance
            .parse()
            .map_err(|err| AppError::Setting(format!("allowance: {err}")))?;
        if !allowance.is_positive() {
            return Err(AppError::Setting(format!(
                "allowance must be positive, got {allowance}"
            )));
        }
        Ok(allowance)
    }

    pub fn probe_interval(&self) -> Result<Duration> {
        if self.probe_interval_secs == 0 {
            return Err(AppError::Setting(
                "probe_interval_secs must be at least 1".to_string(),
            ));
        }
        Ok(Duration::from_secs(self.probe_interval_secs))
    }

    pub fn gateway(&self) -> Result<GatewayConfig> {
        if self.timeout_secs == 0 {
            return Err(AppError::Setting(
                "timeout_secs must be at least 1".to_string(),
            ));
        }
        let mut gateway =
            GatewayConfig::new(&self.base_url)?.with_timeout(Duration::from_secs(self.timeout_secs));
        for (name, value) in &self.headers {
            gateway = gateway.with_header(name, value)?;
        }
        Ok(gateway)
    }
}

#[derive(Debug, Parser)]
#[command(name = "gastos_tui", disable_version_flag = true)]
struct Args {
    /// Optional config file path (TOML).
    #[arg(long)]
    config: Option<String>,
    /// Override base URL of the expense API (e.g. http://127.0.0.1:8000/api/gastos/).
    #[arg(long)]
    base_url: Option<String>,
    /// Override request timeout, in seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,
    /// Override reachability probe interval, in seconds.
    #[arg(long)]
    probe_interval_secs: Option<u64>,
    /// Override monthly allowance (e.g. 380.00).
    #[arg(long)]
    allowance: Option<String>,
    /// Write logs to this file.
    #[arg(long)]
    log_file: Option<String>,
}

pub fn load() -> Result<AppConfig> {
    let args = Args::parse();

    let config_path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let mut builder = config::Config::builder();
    builder = builder.add_source(config::File::with_name(config_path).required(false));
    builder = builder.add_source(config::Environment::with_prefix("GASTOS_TUI"));
    let mut settings: AppConfig = builder.build()?.try_deserialize()?;

    if let Some(base_url) = args.base_url {
        settings.base_url = base_url;
    }
    if let Some(timeout_secs) = args.timeout_secs {
        settings.timeout_secs = timeout_secs;
    }
    if let Some(probe_interval_secs) = args.probe_interval_secs {
        settings.probe_interval_secs = probe_interval_secs;
    }
    if let Some(allowance) = args.allowance {
        settings.allowance = allowance;
    }
    if let Some(log_file) = args.log_file {
        settings.log_file = Some(log_file);
    }

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn defaults_are_usable() {
        let config = AppConfig::default();
        assert_eq!(config.allowance().unwrap(), Amount::new(dec!(380)));
        assert_eq!(config.probe_interval().unwrap(), Duration::from_secs(30));
        let gateway = config.gateway().unwrap();
        assert_eq!(gateway.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn rejects_bad_allowance_and_interval() {
        let config = AppConfig {
            allowance: "-1".to_string(),
            probe_interval_secs: 0,
            ..AppConfig::default()
        };
        assert!(matches!(config.allowance(), Err(AppError::Setting(_))));
        assert!(matches!(config.probe_interval(), Err(AppError::Setting(_))));
    }

    #[test]
    fn rejects_zero_timeout() {
        let config = AppConfig {
            timeout_secs: 0,
            ..AppConfig::default()
        };
        assert!(matches!(config.gateway(), Err(AppError::Setting(_))));
    }
}
