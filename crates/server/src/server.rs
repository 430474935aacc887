use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{delete, get},
};
use engine::Amount;
use tokio::sync::RwLock;

use std::{sync::Arc, time::Duration};

use crate::{Ledger, expenses};

/// Mount point of the expense resource.
pub const BASE_PATH: &str = "/api/gastos";

#[derive(Clone)]
pub struct ServerState {
    pub ledger: Arc<RwLock<Ledger>>,
    /// Artificial delay applied before every request, to mimic a remote store.
    pub latency: Duration,
}

impl ServerState {
    pub fn new(allowance: Amount) -> Self {
        Self {
            ledger: Arc::new(RwLock::new(Ledger::new(allowance))),
            latency: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

async fn simulate_latency(State(state): State<ServerState>, request: Request, next: Next) -> Response {
    if !state.latency.is_zero() {
        tokio::time::sleep(state.latency).await;
    }
    next.run(request).await
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route(
            &format!("{BASE_PATH}/"),
            get(expenses::list).post(expenses::create),
        )
        .route(&format!("{BASE_PATH}/resumo/"), get(expenses::summary))
        .route(
            &format!("{BASE_PATH}/meses-com-gastos/"),
            get(expenses::active_periods),
        )
        .route(&format!("{BASE_PATH}/{{id}}/"), delete(expenses::remove))
        .route_layer(middleware::from_fn_with_state(state.clone(), simulate_latency))
        .with_state(state)
}

pub async fn run_with_listener(
    state: ServerState,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}{}", addr, BASE_PATH);

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    state: ServerState,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(state, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
