//! Expense API endpoints

use api_types::{
    envelope::ApiResponse,
    expense::{ExpenseRecord, PeriodQuery},
    summary::MonthlySummary,
};
use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
};
use chrono::Local;
use engine::Period;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Map, json};

use crate::{ServerError, server::ServerState};

/// Largest amount a single expense may carry.
const MAX_VALOR: i64 = 1_000_000_000;

/// Create payload as received; every field is checked by hand so that all
/// problems are reported together.
#[derive(Debug, Deserialize)]
pub struct ExpenseDraft {
    pub descricao: Option<String>,
    pub valor: Option<Decimal>,
    pub mes: Option<String>,
}

fn required_period(mes: Option<&str>) -> Result<Period, ServerError> {
    let mes = mes
        .map(str::trim)
        .filter(|mes| !mes.is_empty())
        .ok_or_else(|| ServerError::Generic("mes is required".to_string()))?;
    Ok(mes.parse()?)
}

fn optional_period(mes: Option<&str>) -> Result<Option<Period>, ServerError> {
    match mes.map(str::trim).filter(|mes| !mes.is_empty()) {
        Some(mes) => Ok(Some(mes.parse()?)),
        None => Ok(None),
    }
}

/// Handle listing the expenses of a period
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<ApiResponse<Vec<ExpenseRecord>>>, ServerError> {
    let period = required_period(query.mes.as_deref())?;
    let ledger = state.ledger.read().await;
    Ok(Json(ApiResponse::ok(ledger.list(period))))
}

/// Handle creating an expense
pub async fn create(
    State(state): State<ServerState>,
    payload: Result<Json<ExpenseDraft>, JsonRejection>,
) -> Result<Json<ApiResponse<ExpenseRecord>>, ServerError> {
    let Json(draft) = payload.map_err(|rejection| ServerError::Generic(rejection.body_text()))?;
    let period = required_period(draft.mes.as_deref())?;

    let mut details = Map::new();
    let description = draft.descricao.as_deref().map(str::trim).unwrap_or_default();
    if description.is_empty() {
        details.insert("descricao".to_string(), json!(["this field is required"]));
    }
    match draft.valor {
        None => {
            details.insert("valor".to_string(), json!(["this field is required"]));
        }
        Some(valor) if valor <= Decimal::ZERO => {
            details.insert("valor".to_string(), json!(["must be positive"]));
        }
        Some(valor) if valor > Decimal::from(MAX_VALOR) => {
            details.insert(
                "valor".to_string(),
                json!([format!("ensure this value is less than or equal to {MAX_VALOR}")]),
            );
        }
        Some(valor) if valor.normalize().scale() > 2 => {
            details.insert(
                "valor".to_string(),
                json!(["ensure there are no more than 2 decimal places"]),
            );
        }
        Some(_) => {}
    }
    if !details.is_empty() {
        return Err(ServerError::Validation(details));
    }

    let amount = draft.valor.unwrap_or_default();
    let mut ledger = state.ledger.write().await;
    let record = ledger.insert(
        period,
        description.to_string(),
        amount,
        Local::now().date_naive(),
    );
    tracing::info!("expense {} added to {period}: {amount}", record.id);

    Ok(Json(ApiResponse::ok_with_message(
        Some(record),
        "expense added",
    )))
}

/// Handle removing an expense
pub async fn remove(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<ApiResponse<()>>, ServerError> {
    let period = optional_period(query.mes.as_deref())?;
    let mut ledger = state.ledger.write().await;
    let removed = ledger.remove(id, period)?;
    tracing::info!("expense {} removed", removed.id);

    Ok(Json(ApiResponse::ok_with_message(None, "expense removed")))
}

/// Handle the totals of a period
pub async fn summary(
    State(state): State<ServerState>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<ApiResponse<MonthlySummary>>, ServerError> {
    let period = required_period(query.mes.as_deref())?;
    let ledger = state.ledger.read().await;
    Ok(Json(ApiResponse::ok(ledger.summary(period)?)))
}

/// Handle listing the periods that hold expenses
pub async fn active_periods(
    State(state): State<ServerState>,
) -> Json<ApiResponse<Vec<String>>> {
    let ledger = state.ledger.read().await;
    let periods = ledger
        .active_periods()
        .into_iter()
        .map(Period::key)
        .collect::<Vec<_>>();
    Json(ApiResponse::ok(periods))
}
