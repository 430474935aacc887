use std::collections::BTreeMap;

use api_types::{expense::ExpenseRecord, summary::MonthlySummary};
use chrono::NaiveDate;
use engine::{Amount, BudgetState, Period};
use rust_decimal::Decimal;

use crate::ServerError;

/// Expenses of every period, held in memory.
///
/// Ids come from a monotonic counter shared by all periods, so an id alone
/// identifies an expense.
#[derive(Debug)]
pub struct Ledger {
    expenses: BTreeMap<Period, Vec<ExpenseRecord>>,
    next_id: i64,
    allowance: Amount,
}

impl Ledger {
    pub fn new(allowance: Amount) -> Self {
        Self {
            expenses: BTreeMap::new(),
            next_id: 1,
            allowance,
        }
    }

    pub fn allowance(&self) -> Amount {
        self.allowance
    }

    /// Expenses of `period` in insertion order.
    pub fn list(&self, period: Period) -> Vec<ExpenseRecord> {
        self.expenses.get(&period).cloned().unwrap_or_default()
    }

    /// Stores a new expense, assigning its id and creation date.
    pub fn insert(
        &mut self,
        period: Period,
        description: String,
        amount: Decimal,
        created_on: NaiveDate,
    ) -> ExpenseRecord {
        let record = ExpenseRecord {
            id: self.next_id,
            descricao: description,
            valor: amount,
            data: created_on.format("%d/%m/%Y").to_string(),
        };
        self.next_id += 1;
        self.expenses.entry(period).or_default().push(record.clone());
        record
    }

    /// Removes expense `id`, optionally restricted to `period`.
    pub fn remove(&mut self, id: i64, period: Option<Period>) -> Result<ExpenseRecord, ServerError> {
        let period = match period {
            Some(period) => {
                if !self.expenses.contains_key(&period) {
                    return Err(ServerError::NotFound(format!("period {period} not found")));
                }
                period
            }
            None => self
                .expenses
                .iter()
                .find(|(_, records)| records.iter().any(|record| record.id == id))
                .map(|(period, _)| *period)
                .ok_or_else(|| ServerError::NotFound(format!("expense {id} not found")))?,
        };

        let records = self
            .expenses
            .get_mut(&period)
            .ok_or_else(|| ServerError::NotFound(format!("period {period} not found")))?;
        let index = records
            .iter()
            .position(|record| record.id == id)
            .ok_or_else(|| ServerError::NotFound(format!("expense {id} not found")))?;
        let removed = records.remove(index);

        if records.is_empty() {
            self.expenses.remove(&period);
        }
        Ok(removed)
    }

    pub fn summary(&self, period: Period) -> Result<MonthlySummary, ServerError> {
        let records = self.expenses.get(&period).map(Vec::as_slice).unwrap_or_default();
        let budget = BudgetState::from_amounts(
            self.allowance,
            records.iter().map(|record| Amount::new(record.valor)),
        )?;

        Ok(MonthlySummary {
            mes: period.key(),
            total_gasto: budget.total_spent.value(),
            saldo_restante: budget.remaining.value(),
            quantidade_gastos: records.len() as u64,
            orcamento_mensal: budget.allowance.value(),
        })
    }

    /// Periods holding at least one expense, oldest first.
    pub fn active_periods(&self) -> Vec<Period> {
        self.expenses
            .iter()
            .filter(|(_, records)| !records.is_empty())
            .map(|(period, _)| *period)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use engine::EngineError;
    use rust_decimal_macros::dec;

    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
    }

    fn january() -> Period {
        Period::new(2025, 1).unwrap()
    }

    #[test]
    fn insert_assigns_increasing_ids_and_date() {
        let mut ledger = Ledger::new(Amount::new(dec!(380)));
        let first = ledger.insert(january(), "Cinema".to_string(), dec!(50), day());
        let second = ledger.insert(january().next(), "Mercado".to_string(), dec!(20), day());

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(first.data, "15/01/2025");
        assert_eq!(ledger.list(january()), vec![first]);
    }

    #[test]
    fn remove_checks_period_and_id() {
        let mut ledger = Ledger::new(Amount::new(dec!(380)));
        let record = ledger.insert(january(), "Cinema".to_string(), dec!(50), day());

        assert!(matches!(
            ledger.remove(record.id, Some(january().next())),
            Err(ServerError::NotFound(_))
        ));
        assert!(matches!(ledger.remove(99, None), Err(ServerError::NotFound(_))));

        let removed = ledger.remove(record.id, Some(january())).unwrap();
        assert_eq!(removed, record);
        assert!(ledger.list(january()).is_empty());
        assert!(ledger.active_periods().is_empty());
    }

    #[test]
    fn summary_reports_totals() {
        let mut ledger = Ledger::new(Amount::new(dec!(380)));
        ledger.insert(january(), "Cinema".to_string(), dec!(50), day());
        ledger.insert(january(), "Bus".to_string(), dec!(4.5), day());

        let summary = ledger.summary(january()).unwrap();
        assert_eq!(summary.mes, "2025-01");
        assert_eq!(summary.total_gasto, dec!(54.5));
        assert_eq!(summary.saldo_restante, dec!(325.5));
        assert_eq!(summary.quantidade_gastos, 2);
        assert_eq!(summary.orcamento_mensal, dec!(380));
    }

    #[test]
    fn summary_refuses_totals_that_do_not_fit() {
        let mut ledger = Ledger::new(Amount::new(dec!(380)));
        ledger.insert(january(), "big".to_string(), Decimal::MAX, day());
        ledger.insert(january(), "big".to_string(), Decimal::MAX, day());

        assert!(matches!(
            ledger.summary(january()),
            Err(ServerError::Engine(EngineError::AmountOverflow))
        ));
    }
}
