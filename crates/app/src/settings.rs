//! Settings of the ledger service binary.
//!
//! Read from `config/gastos.toml` (optional) and then from `GASTOS__*`
//! environment variables, e.g. `GASTOS__SERVER__PORT=8080`.
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const DEFAULT_SETTINGS_PATH: &str = "config/gastos";

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct App {
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    /// Monthly allowance reported by `/resumo/`.
    pub allowance: String,
    /// Artificial delay added to every request, in milliseconds.
    pub latency_ms: u64,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            bind: None,
            port: 8000,
            allowance: "380.00".to_string(),
            latency_ms: 0,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app: App,
    pub server: Server,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name(DEFAULT_SETTINGS_PATH).required(false))
            .add_source(Environment::with_prefix("GASTOS").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}
