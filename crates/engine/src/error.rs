//! The module contains the errors the domain model can throw.
//!
//! The errors are:
//!
//! - [`InvalidAmount`] thrown when user input is not a valid monetary amount.
//! - [`InvalidPeriod`] thrown when a period key is not a `YYYY-MM` month.
//! - [`AmountOverflow`] thrown when a total does not fit an amount.
//!
//!  [`InvalidAmount`]: EngineError::InvalidAmount
//!  [`InvalidPeriod`]: EngineError::InvalidPeriod
//!  [`AmountOverflow`]: EngineError::AmountOverflow
use thiserror::Error;

/// Domain errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid period: {0}")]
    InvalidPeriod(String),
    #[error("Amount out of range")]
    AmountOverflow,
}
