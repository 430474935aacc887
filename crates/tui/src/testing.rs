//! In-memory gateway used by the unit tests.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use api_types::summary::MonthlySummary;
use engine::{Amount, BudgetState, Expense, ExpenseId, Period};
use rust_decimal_macros::dec;

use crate::client::{ExpenseGateway, GatewayError};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Calls {
    pub list: usize,
    pub create: usize,
    pub delete: usize,
    pub probe: usize,
    pub summary: usize,
    pub periods: usize,
}

struct FakeState {
    records: HashMap<Period, Vec<Expense>>,
    next_id: ExpenseId,
    reachable: bool,
    delay: Duration,
    list_delays: HashMap<Period, Duration>,
    list_failure: Option<GatewayError>,
    create_failure: Option<GatewayError>,
    delete_failure: Option<GatewayError>,
    calls: Calls,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            records: HashMap::new(),
            next_id: 1,
            reachable: true,
            delay: Duration::ZERO,
            list_delays: HashMap::new(),
            list_failure: None,
            create_failure: None,
            delete_failure: None,
            calls: Calls::default(),
        }
    }
}

#[derive(Clone, Default)]
pub struct FakeGateway {
    state: Arc<Mutex<FakeState>>,
}

pub fn expense(id: ExpenseId, description: &str, amount: Amount) -> Expense {
    Expense {
        id,
        description: description.to_string(),
        amount,
        occurred_on: "01/01/2025".to_string(),
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

impl FakeGateway {
    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn seed(&self, period: Period, expenses: Vec<Expense>) {
        let mut state = self.state();
        let max_id = expenses.iter().map(|e| e.id).max().unwrap_or_default();
        state.next_id = state.next_id.max(max_id + 1);
        state.records.insert(period, expenses);
    }

    pub fn records(&self, period: Period) -> Vec<Expense> {
        self.state().records.get(&period).cloned().unwrap_or_default()
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.state().reachable = reachable;
    }

    /// Delay applied to every call.
    pub fn set_delay(&self, delay: Duration) {
        self.state().delay = delay;
    }

    pub fn set_list_delay(&self, period: Period, delay: Duration) {
        self.state().list_delays.insert(period, delay);
    }

    pub fn fail_list(&self, err: Option<GatewayError>) {
        self.state().list_failure = err;
    }

    pub fn fail_create(&self, err: Option<GatewayError>) {
        self.state().create_failure = err;
    }

    pub fn fail_delete(&self, err: Option<GatewayError>) {
        self.state().delete_failure = err;
    }

    pub fn calls(&self) -> Calls {
        self.state().calls
    }
}

impl ExpenseGateway for FakeGateway {
    async fn list_by_period(&self, period: Period) -> Result<Vec<Expense>, GatewayError> {
        let delay = {
            let mut state = self.state();
            state.calls.list += 1;
            state.list_delays.get(&period).copied().unwrap_or(state.delay)
        };
        pause(delay).await;

        let state = self.state();
        match &state.list_failure {
            Some(err) => Err(err.clone()),
            None => Ok(state.records.get(&period).cloned().unwrap_or_default()),
        }
    }

    async fn create(
        &self,
        period: Period,
        description: &str,
        amount: Amount,
    ) -> Result<Expense, GatewayError> {
        let delay = {
            let mut state = self.state();
            state.calls.create += 1;
            state.delay
        };
        pause(delay).await;

        let mut state = self.state();
        if let Some(err) = &state.create_failure {
            return Err(err.clone());
        }
        let record = expense(state.next_id, description, amount);
        state.next_id += 1;
        state.records.entry(period).or_default().push(record.clone());
        Ok(record)
    }

    async fn delete(&self, period: Period, id: ExpenseId) -> Result<(), GatewayError> {
        let delay = {
            let mut state = self.state();
            state.calls.delete += 1;
            state.delay
        };
        pause(delay).await;

        let mut state = self.state();
        if let Some(err) = &state.delete_failure {
            return Err(err.clone());
        }
        let records = state.records.entry(period).or_default();
        let before = records.len();
        records.retain(|record| record.id != id);
        if records.len() == before {
            return Err(GatewayError::NotFound("expense not found".to_string()));
        }
        Ok(())
    }

    async fn probe_reachability(&self) -> bool {
        let delay = {
            let mut state = self.state();
            state.calls.probe += 1;
            state.delay
        };
        pause(delay).await;
        self.state().reachable
    }

    async fn monthly_summary(&self, period: Period) -> Result<MonthlySummary, GatewayError> {
        let delay = {
            let mut state = self.state();
            state.calls.summary += 1;
            state.delay
        };
        pause(delay).await;

        let state = self.state();
        let records = state.records.get(&period).cloned().unwrap_or_default();
        let budget = BudgetState::from_expenses(Amount::new(dec!(380)), &records).map_err(|err| {
            GatewayError::Server {
                status: Some(500),
                message: err.to_string(),
            }
        })?;
        Ok(MonthlySummary {
            mes: period.key(),
            total_gasto: budget.total_spent.value(),
            saldo_restante: budget.remaining.value(),
            quantidade_gastos: records.len() as u64,
            orcamento_mensal: budget.allowance.value(),
        })
    }

    async fn periods_with_expenses(&self) -> Result<Vec<Period>, GatewayError> {
        let delay = {
            let mut state = self.state();
            state.calls.periods += 1;
            state.delay
        };
        pause(delay).await;

        let state = self.state();
        let mut periods: Vec<Period> = state
            .records
            .iter()
            .filter(|(_, records)| !records.is_empty())
            .map(|(period, _)| *period)
            .collect();
        periods.sort_unstable_by(|a, b| b.cmp(a));
        Ok(periods)
    }
}
