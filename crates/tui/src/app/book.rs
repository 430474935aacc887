//! Per-period expense state.
//!
//! [`ExpenseBook`] owns everything the screen shows about the selected
//! period. It performs no I/O: every remote operation is split into a
//! `begin_*` step, which validates and hands back a request, and a `finish_*`
//! step, which applies the gateway result. The caller runs the request in
//! between.

use std::collections::HashSet;

use api_types::summary::MonthlySummary;
use engine::{Amount, BudgetState, EngineError, Expense, ExpenseId, Period};
use thiserror::Error;

use crate::client::GatewayError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    Idle,
    Loading,
    Ready,
    Failed,
}

/// Last known reachability of the store; the latest observation wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    Reachable,
    Unreachable,
}

impl Connectivity {
    fn from_reachable(reachable: bool) -> Self {
        if reachable {
            Self::Reachable
        } else {
            Self::Unreachable
        }
    }
}

/// Identifies one list load. Only the most recently issued ticket is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    pub period: Period,
    generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddRequest {
    pub period: Period,
    pub description: String,
    pub amount: Amount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoveRequest {
    pub period: Period,
    pub id: ExpenseId,
}

/// Reasons a mutation is refused before reaching the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookError {
    #[error("server unreachable, changes are disabled until it is back")]
    Offline,
    #[error("expenses are still loading")]
    NotReady,
    #[error("an expense is already being saved")]
    SaveInProgress,
    #[error("please fill in all fields")]
    MissingFields,
    #[error("please enter a valid amount")]
    InvalidAmount,
    #[error("amount exceeds the remaining balance")]
    ExceedsBalance { amount: Amount, remaining: Amount },
    #[error("expense {0} is already being removed")]
    AlreadyRemoving(ExpenseId),
    #[error("expense {0} is not in the list")]
    UnknownExpense(ExpenseId),
}

/// Something worth a toast once a mutation is confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Added { period: Period, description: String },
    Removed { period: Period, id: ExpenseId },
}

#[derive(Debug)]
pub struct ExpenseBook {
    allowance: Amount,
    period: Period,
    generation: u64,
    phase: LoadPhase,
    expenses: Vec<Expense>,
    budget: BudgetState,
    saving: bool,
    removing: HashSet<ExpenseId>,
    connectivity: Connectivity,
    error: Option<String>,
    summary: Option<MonthlySummary>,
    active_periods: Vec<Period>,
}

impl ExpenseBook {
    pub fn new(allowance: Amount, period: Period) -> Self {
        Self {
            allowance,
            period,
            generation: 0,
            phase: LoadPhase::Idle,
            expenses: Vec::new(),
            budget: BudgetState::untouched(allowance),
            saving: false,
            removing: HashSet::new(),
            connectivity: Connectivity::Reachable,
            error: None,
            summary: None,
            active_periods: Vec::new(),
        }
    }

    pub fn allowance(&self) -> Amount {
        self.allowance
    }

    pub fn period(&self) -> Period {
        self.period
    }

    pub fn phase(&self) -> LoadPhase {
        self.phase
    }

    pub fn expenses(&self) -> &[Expense] {
        &self.expenses
    }

    /// Totals of the loaded list.
    pub fn budget(&self) -> BudgetState {
        self.budget
    }

    /// Replaces the list, refusing one whose totals do not fit an amount.
    fn commit(&mut self, expenses: Vec<Expense>) -> Result<(), EngineError> {
        self.budget = BudgetState::from_expenses(self.allowance, &expenses)?;
        self.expenses = expenses;
        Ok(())
    }

    pub fn connectivity(&self) -> Connectivity {
        self.connectivity
    }

    pub fn is_reachable(&self) -> bool {
        self.connectivity == Connectivity::Reachable
    }

    /// Add and remove are only offered while the store is reachable.
    pub fn can_mutate(&self) -> bool {
        self.is_reachable()
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn is_removing(&self, id: ExpenseId) -> bool {
        self.removing.contains(&id)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn summary(&self) -> Option<&MonthlySummary> {
        self.summary.as_ref()
    }

    pub fn active_periods(&self) -> &[Period] {
        &self.active_periods
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn apply_probe(&mut self, reachable: bool) {
        let next = Connectivity::from_reachable(reachable);
        if next != self.connectivity {
            tracing::info!("store reachability changed: {next:?}");
        }
        self.connectivity = next;
    }

    fn observe<T>(&mut self, result: &Result<T, GatewayError>) {
        self.apply_probe(result.is_ok());
    }

    /// Switches to `period` and starts loading it.
    ///
    /// The list is emptied immediately; a load issued for an earlier period
    /// is ignored when it completes.
    pub fn select_period(&mut self, period: Period) -> LoadTicket {
        self.generation += 1;
        self.period = period;
        self.phase = LoadPhase::Loading;
        self.expenses.clear();
        self.budget = BudgetState::untouched(self.allowance);
        self.summary = None;
        self.error = None;
        LoadTicket {
            period,
            generation: self.generation,
        }
    }

    pub fn reload(&mut self) -> LoadTicket {
        self.select_period(self.period)
    }

    /// Applies a finished load. Returns `false` when the ticket was stale.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Vec<Expense>, GatewayError>,
    ) -> bool {
        self.observe(&result);
        if ticket.generation != self.generation || ticket.period != self.period {
            tracing::debug!("discarding stale load of {}", ticket.period);
            return false;
        }

        match result {
            Ok(expenses) => {
                tracing::debug!("loaded {} expenses for {}", expenses.len(), ticket.period);
                if let Err(err) = self.commit(expenses) {
                    tracing::warn!("refusing the list of {}: {err}", ticket.period);
                    self.phase = LoadPhase::Failed;
                    self.error = Some(format!("{err}. Try again."));
                    return true;
                }
                self.phase = LoadPhase::Ready;
                self.error = None;
                if self.budget.is_overspent() {
                    tracing::warn!("{} is over budget", ticket.period);
                }
            }
            Err(err) => {
                tracing::warn!("failed to load {}: {err}", ticket.period);
                self.phase = LoadPhase::Failed;
                self.error = Some(format!("{err}. Try again."));
            }
        }
        true
    }

    fn check_add(&self, description: &str, amount: &str) -> Result<Amount, BookError> {
        if !self.can_mutate() {
            return Err(BookError::Offline);
        }
        if self.phase != LoadPhase::Ready {
            return Err(BookError::NotReady);
        }
        if self.saving {
            return Err(BookError::SaveInProgress);
        }
        if description.trim().is_empty() || amount.trim().is_empty() {
            return Err(BookError::MissingFields);
        }
        let amount: Amount = amount.parse().map_err(|_| BookError::InvalidAmount)?;
        if !amount.is_positive() {
            return Err(BookError::InvalidAmount);
        }
        if self.budget.would_exceed(amount) {
            return Err(BookError::ExceedsBalance {
                amount,
                remaining: self.budget.remaining,
            });
        }
        Ok(amount)
    }

    /// Validates a new expense for the selected period.
    ///
    /// A refusal is also recorded as the visible error.
    pub fn begin_add(&mut self, description: &str, amount: &str) -> Result<AddRequest, BookError> {
        match self.check_add(description, amount) {
            Ok(amount) => {
                self.saving = true;
                self.error = None;
                Ok(AddRequest {
                    period: self.period,
                    description: description.trim().to_string(),
                    amount,
                })
            }
            Err(err) => {
                self.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Applies a finished create.
    ///
    /// The stored record is appended only if its period is still selected;
    /// otherwise the next load of that period picks it up.
    pub fn finish_add(
        &mut self,
        request: AddRequest,
        result: Result<Expense, GatewayError>,
    ) -> Option<Notice> {
        self.saving = false;
        self.observe(&result);

        match result {
            Ok(expense) => {
                self.error = None;
                if request.period == self.period
                    && !self.expenses.iter().any(|known| known.id == expense.id)
                {
                    let mut expenses = self.expenses.clone();
                    expenses.push(expense);
                    if let Err(err) = self.commit(expenses) {
                        tracing::warn!("not listing the new expense of {}: {err}", request.period);
                        self.error = Some(err.to_string());
                    } else if self.budget.is_overspent() {
                        tracing::warn!("{} went over budget", request.period);
                    }
                }
                Some(Notice::Added {
                    period: request.period,
                    description: request.description,
                })
            }
            Err(err) => {
                tracing::warn!("failed to add expense to {}: {err}", request.period);
                self.error = Some(err.to_string());
                None
            }
        }
    }

    pub fn begin_remove(&mut self, id: ExpenseId) -> Result<RemoveRequest, BookError> {
        let checked = if !self.can_mutate() {
            Err(BookError::Offline)
        } else if self.removing.contains(&id) {
            Err(BookError::AlreadyRemoving(id))
        } else if !self.expenses.iter().any(|expense| expense.id == id) {
            Err(BookError::UnknownExpense(id))
        } else {
            Ok(())
        };

        match checked {
            Ok(()) => {
                self.removing.insert(id);
                self.error = None;
                Ok(RemoveRequest {
                    period: self.period,
                    id,
                })
            }
            // A duplicate request is silently ignored.
            Err(err @ BookError::AlreadyRemoving(_)) => Err(err),
            Err(err) => {
                self.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Applies a finished delete.
    ///
    /// A record the store no longer knows is dropped locally as well, with
    /// the error still reported.
    pub fn finish_remove(
        &mut self,
        request: RemoveRequest,
        result: Result<(), GatewayError>,
    ) -> Option<Notice> {
        self.removing.remove(&request.id);
        self.observe(&result);

        let drop_local = match &result {
            Ok(()) => true,
            Err(GatewayError::NotFound(_)) => true,
            Err(_) => false,
        };
        if drop_local && request.period == self.period {
            let expenses = self
                .expenses
                .iter()
                .filter(|expense| expense.id != request.id)
                .cloned()
                .collect();
            if let Err(err) = self.commit(expenses) {
                tracing::warn!("keeping expense {} listed: {err}", request.id);
            }
        }

        match result {
            Ok(()) => {
                self.error = None;
                Some(Notice::Removed {
                    period: request.period,
                    id: request.id,
                })
            }
            Err(err) => {
                tracing::warn!("failed to remove expense {}: {err}", request.id);
                self.error = Some(format!("{err}. Try again."));
                None
            }
        }
    }

    pub fn finish_summary(&mut self, period: Period, result: Result<MonthlySummary, GatewayError>) {
        self.observe(&result);
        if period != self.period {
            return;
        }
        match result {
            Ok(summary) => self.summary = Some(summary),
            Err(err) => self.error = Some(err.to_string()),
        }
    }

    pub fn finish_active_periods(&mut self, result: Result<Vec<Period>, GatewayError>) {
        self.observe(&result);
        match result {
            Ok(periods) => self.active_periods = periods,
            Err(err) => tracing::debug!("failed to refresh active months: {err}"),
        }
    }
}
