//! In-memory expense ledger service.
//!
//! Implements the `/api/gastos` REST contract the terminal client talks to,
//! keeping every period's expenses in memory. Meant for local development and
//! for exercising the client against a real HTTP stack.

use api_types::envelope::ApiResponse;
use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;
use serde_json::{Map, Value};

pub use ledger::Ledger;
pub use server::{BASE_PATH, ServerState, router, run_with_listener, spawn_with_listener};

mod expenses;
mod ledger;
mod server;

#[derive(Debug)]
pub enum ServerError {
    Engine(EngineError),
    /// Payload rejected field by field; each value is a list of messages.
    Validation(Map<String, Value>),
    NotFound(String),
    Generic(String),
}

fn status_for_error(err: &ServerError) -> StatusCode {
    match err {
        ServerError::NotFound(_) => StatusCode::NOT_FOUND,
        ServerError::Engine(_) | ServerError::Validation(_) | ServerError::Generic(_) => {
            StatusCode::BAD_REQUEST
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let status = status_for_error(&self);
        let body: ApiResponse<()> = match self {
            ServerError::Engine(err) => ApiResponse::failure(err.to_string()),
            ServerError::Validation(details) => {
                ApiResponse::failure("invalid expense").with_details(Value::Object(details))
            }
            ServerError::NotFound(err) | ServerError::Generic(err) => ApiResponse::failure(err),
        };

        (status, Json(body)).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        let res = ServerError::NotFound("expense not found".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn engine_error_maps_to_400() {
        let res = ServerError::from(EngineError::InvalidPeriod("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn validation_maps_to_400() {
        let res = ServerError::Validation(Map::new()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
