use serde::{Deserialize, Serialize};

use crate::Amount;

/// Store-assigned expense identifier.
pub type ExpenseId = i64;

/// A recorded expense of one period.
///
/// `id` and `occurred_on` are assigned by the store at creation time and never
/// change afterwards; there is no partial update.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub description: String,
    pub amount: Amount,
    pub occurred_on: String,
}
