//! JSON shapes exchanged with the expense ledger service (`/api/gastos`).
//!
//! Field names follow the service contract (`descricao`, `valor`, `mes`, ...);
//! the client maps them onto the domain types of the `engine` crate.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub mod envelope {
    use super::*;
    use serde_json::Value;

    /// Envelope wrapping every response of the service.
    ///
    /// Failures carry `success: false` plus an `error` message and/or a
    /// `details` payload, which is either a plain message or a map of
    /// field → messages.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ApiResponse<T> {
        #[serde(default)]
        pub success: bool,
        #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
        pub data: Option<T>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub message: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub error: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub details: Option<Value>,
    }

    impl<T> ApiResponse<T> {
        pub fn ok(data: T) -> Self {
            Self {
                success: true,
                data: Some(data),
                message: None,
                error: None,
                details: None,
            }
        }

        pub fn ok_with_message(data: Option<T>, message: impl Into<String>) -> Self {
            Self {
                success: true,
                data,
                message: Some(message.into()),
                error: None,
                details: None,
            }
        }

        pub fn failure(error: impl Into<String>) -> Self {
            Self {
                success: false,
                data: None,
                message: None,
                error: Some(error.into()),
                details: None,
            }
        }

        #[must_use]
        pub fn with_details(mut self, details: Value) -> Self {
            self.details = Some(details);
            self
        }

        /// Human readable reason of a failed response.
        ///
        /// `details` wins over `error`; field maps are flattened with
        /// [`flatten_details`].
        pub fn failure_message(&self) -> Option<String> {
            self.details
                .as_ref()
                .and_then(flatten_details)
                .or_else(|| self.error.clone().filter(|e| !e.trim().is_empty()))
        }
    }

    /// Joins every message of a `details` payload with `", "`.
    ///
    /// Maps are walked in payload order, list values are flattened one level.
    /// Returns `None` when nothing printable is left.
    pub fn flatten_details(details: &Value) -> Option<String> {
        let mut messages = Vec::new();
        match details {
            Value::Object(fields) => {
                for value in fields.values() {
                    push_messages(value, &mut messages);
                }
            }
            other => push_messages(other, &mut messages),
        }

        if messages.is_empty() {
            None
        } else {
            Some(messages.join(", "))
        }
    }

    fn push_messages(value: &Value, messages: &mut Vec<String>) {
        match value {
            Value::Null => {}
            Value::String(message) => {
                if !message.trim().is_empty() {
                    messages.push(message.clone());
                }
            }
            Value::Array(items) => {
                for item in items {
                    match item {
                        Value::Null => {}
                        Value::String(message) => messages.push(message.clone()),
                        other => messages.push(other.to_string()),
                    }
                }
            }
            other => messages.push(other.to_string()),
        }
    }
}

pub mod expense {
    use super::*;

    /// Expense as stored by the service.
    ///
    /// `valor` is written as a JSON number; reading accepts a number or a
    /// decimal string.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct ExpenseRecord {
        pub id: i64,
        pub descricao: String,
        #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
        pub valor: Decimal,
        /// Creation date assigned by the service.
        pub data: String,
    }

    /// Request body for creating an expense.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseNew {
        pub descricao: String,
        #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
        pub valor: Decimal,
        /// Period key, `YYYY-MM`.
        pub mes: String,
    }

    /// Query string selecting a period (`?mes=YYYY-MM`).
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct PeriodQuery {
        pub mes: Option<String>,
    }
}

pub mod summary {
    use super::*;

    /// Server-side totals of a period (`/resumo/`).
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct MonthlySummary {
        pub mes: String,
        #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
        pub total_gasto: Decimal,
        #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
        pub saldo_restante: Decimal,
        pub quantidade_gastos: u64,
        #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
        pub orcamento_mensal: Decimal,
    }
}
