use std::time::Duration;

use engine::Amount;
use server::ServerState;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "gastos={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let allowance: Amount = settings.server.allowance.parse()?;
    if !allowance.is_positive() {
        return Err(format!("allowance must be positive, got {allowance}").into());
    }

    let state = ServerState::new(allowance)
        .with_latency(Duration::from_millis(settings.server.latency_ms));

    let bind = settings
        .server
        .bind
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let addr = format!("{}:{}", bind, settings.server.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Monthly allowance: {allowance}");

    server::run_with_listener(state, listener).await?;
    Ok(())
}
