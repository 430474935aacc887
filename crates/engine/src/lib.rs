//! Domain model of the monthly expense tracker.
//!
//! Everything here is pure: amounts, periods, expenses and the budget figures
//! derived from them. Both the terminal client and the mock ledger service
//! build on these types.

pub use budget::BudgetState;
pub use error::EngineError;
pub use expense::{Expense, ExpenseId};
pub use money::Amount;
pub use period::Period;

mod budget;
mod error;
mod expense;
mod money;
mod period;

pub type ResultEngine<T> = Result<T, EngineError>;
