use crate::{Amount, EngineError, Expense, ResultEngine};

/// Budget figures of a period, derived from its loaded expenses.
///
/// Rebuild it whenever the list changes so `total_spent` and `remaining`
/// never drift from it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BudgetState {
    pub allowance: Amount,
    pub total_spent: Amount,
    pub remaining: Amount,
}

impl BudgetState {
    /// Figures of a period with nothing spent yet.
    #[must_use]
    pub fn untouched(allowance: Amount) -> Self {
        Self {
            allowance,
            total_spent: Amount::ZERO,
            remaining: allowance,
        }
    }

    /// Sums `amounts` against `allowance`.
    ///
    /// Fails with [`EngineError::AmountOverflow`] when the total or the
    /// remaining balance does not fit an amount.
    pub fn from_amounts<I>(allowance: Amount, amounts: I) -> ResultEngine<Self>
    where
        I: IntoIterator<Item = Amount>,
    {
        let total_spent = Amount::checked_sum(amounts)?;
        let remaining = allowance
            .checked_sub(total_spent)
            .ok_or(EngineError::AmountOverflow)?;
        Ok(Self {
            allowance,
            total_spent,
            remaining,
        })
    }

    pub fn from_expenses<'a, I>(allowance: Amount, expenses: I) -> ResultEngine<Self>
    where
        I: IntoIterator<Item = &'a Expense>,
    {
        Self::from_amounts(allowance, expenses.into_iter().map(|expense| expense.amount))
    }

    /// Returns `true` if spending `amount` would take `remaining` below zero.
    #[must_use]
    pub fn would_exceed(&self, amount: Amount) -> bool {
        amount > self.remaining
    }

    /// Returns `true` once more than the allowance has been spent.
    #[must_use]
    pub fn is_overspent(&self) -> bool {
        self.remaining.is_negative()
    }

    /// Fraction of the allowance already spent, clamped to `0.0..=1.0`.
    #[must_use]
    pub fn usage(&self) -> f64 {
        self.total_spent.ratio_of(self.allowance)
    }
}
