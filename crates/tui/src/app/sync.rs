use std::time::Duration;

use api_types::summary::MonthlySummary;
use engine::{Expense, ExpenseId, Period};
use tokio::sync::mpsc;

use crate::client::{ExpenseGateway, GatewayError, ProbeLoop};

use super::book::{AddRequest, BookError, ExpenseBook, LoadTicket, Notice, RemoveRequest};

/// Completion of a gateway call, delivered back to the owner of the book.
#[derive(Debug)]
pub enum Outcome {
    Loaded(LoadTicket, Result<Vec<Expense>, GatewayError>),
    Added(AddRequest, Result<Expense, GatewayError>),
    Removed(RemoveRequest, Result<(), GatewayError>),
    Summarized(Period, Result<MonthlySummary, GatewayError>),
    ActivePeriods(Result<Vec<Period>, GatewayError>),
    Probed(bool),
}

/// Drives an [`ExpenseBook`] against a gateway.
///
/// Gateway calls run as tasks; their results queue up until
/// [`Synchronizer::apply_pending`] folds them into the book, so the book is
/// only ever touched from the owner's thread.
pub struct Synchronizer<G> {
    gateway: G,
    book: ExpenseBook,
    tx: mpsc::UnboundedSender<Outcome>,
    rx: mpsc::UnboundedReceiver<Outcome>,
    probe: Option<ProbeLoop>,
}

impl<G: ExpenseGateway> Synchronizer<G> {
    pub fn new(gateway: G, book: ExpenseBook) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            gateway,
            book,
            tx,
            rx,
            probe: None,
        }
    }

    pub fn book(&self) -> &ExpenseBook {
        &self.book
    }

    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = Outcome> + Send + 'static,
    {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            // The receiver only goes away on shutdown.
            let _ = tx.send(task.await);
        });
    }

    fn spawn_load(&self, ticket: LoadTicket) {
        let gateway = self.gateway.clone();
        self.spawn(async move {
            let result = gateway.list_by_period(ticket.period).await;
            Outcome::Loaded(ticket, result)
        });
    }

    pub fn select_period(&mut self, period: Period) {
        tracing::info!("selecting {period}");
        let ticket = self.book.select_period(period);
        self.spawn_load(ticket);
    }

    pub fn reload(&mut self) {
        let ticket = self.book.reload();
        self.spawn_load(ticket);
    }

    pub fn add_expense(&mut self, description: &str, amount: &str) -> Result<(), BookError> {
        let request = self.book.begin_add(description, amount)?;
        let gateway = self.gateway.clone();
        self.spawn(async move {
            let result = gateway
                .create(request.period, &request.description, request.amount)
                .await;
            Outcome::Added(request, result)
        });
        Ok(())
    }

    pub fn remove_expense(&mut self, id: ExpenseId) -> Result<(), BookError> {
        let request = self.book.begin_remove(id)?;
        let gateway = self.gateway.clone();
        self.spawn(async move {
            let result = gateway.delete(request.period, request.id).await;
            Outcome::Removed(request, result)
        });
        Ok(())
    }

    pub fn request_summary(&self) {
        let period = self.book.period();
        let gateway = self.gateway.clone();
        self.spawn(async move {
            let result = gateway.monthly_summary(period).await;
            Outcome::Summarized(period, result)
        });
    }

    pub fn refresh_active_periods(&self) {
        let gateway = self.gateway.clone();
        self.spawn(async move { Outcome::ActivePeriods(gateway.periods_with_expenses().await) });
    }

    pub fn dismiss_error(&mut self) {
        self.book.dismiss_error();
    }

    /// Starts the periodic reachability probe, replacing a running one.
    pub fn start_probing(&mut self, interval: Duration) {
        let tx = self.tx.clone();
        self.probe = Some(ProbeLoop::spawn(
            self.gateway.clone(),
            interval,
            move |reachable| {
                let _ = tx.send(Outcome::Probed(reachable));
            },
        ));
    }

    pub fn stop_probing(&mut self) {
        if let Some(probe) = self.probe.take() {
            probe.stop();
        }
    }

    pub fn is_probing(&self) -> bool {
        self.probe.as_ref().is_some_and(|probe| !probe.is_finished())
    }

    pub fn apply(&mut self, outcome: Outcome) -> Option<Notice> {
        let notice = match outcome {
            Outcome::Loaded(ticket, result) => {
                self.book.finish_load(ticket, result);
                None
            }
            Outcome::Added(request, result) => self.book.finish_add(request, result),
            Outcome::Removed(request, result) => self.book.finish_remove(request, result),
            Outcome::Summarized(period, result) => {
                self.book.finish_summary(period, result);
                None
            }
            Outcome::ActivePeriods(result) => {
                self.book.finish_active_periods(result);
                None
            }
            Outcome::Probed(reachable) => {
                self.book.apply_probe(reachable);
                None
            }
        };

        if notice.is_some() {
            self.refresh_active_periods();
        }
        notice
    }

    /// Applies every outcome received so far without waiting.
    pub fn apply_pending(&mut self) -> Vec<Notice> {
        let mut notices = Vec::new();
        while let Ok(outcome) = self.rx.try_recv() {
            notices.extend(self.apply(outcome));
        }
        notices
    }

    /// Waits for the next outcome and applies it.
    #[cfg(test)]
    pub async fn settle_next(&mut self) -> Option<Notice> {
        let outcome = self.rx.recv().await?;
        self.apply(outcome)
    }
}

#[cfg(test)]
mod tests {
    use engine::Amount;
    use rust_decimal_macros::dec;

    use crate::{
        app::book::{Connectivity, LoadPhase},
        testing::{FakeGateway, expense},
    };

    use super::*;

    fn january() -> Period {
        Period::new(2025, 1).unwrap()
    }

    fn synchronizer(gateway: &FakeGateway) -> Synchronizer<FakeGateway> {
        let book = ExpenseBook::new(Amount::new(dec!(380)), january());
        Synchronizer::new(gateway.clone(), book)
    }

    #[tokio::test(start_paused = true)]
    async fn spending_scenario() {
        let gateway = FakeGateway::default();
        let mut sync = synchronizer(&gateway);

        sync.select_period(january());
        sync.settle_next().await;
        assert_eq!(sync.book().phase(), LoadPhase::Ready);
        assert!(sync.book().expenses().is_empty());
        assert_eq!(sync.book().budget().total_spent, Amount::ZERO);
        assert_eq!(sync.book().budget().remaining, Amount::new(dec!(380)));

        sync.add_expense("Cinema", "50").unwrap();
        let notice = sync.settle_next().await;
        assert!(matches!(notice, Some(Notice::Added { .. })));
        assert_eq!(sync.book().expenses().len(), 1);
        assert_eq!(sync.book().budget().total_spent, Amount::new(dec!(50)));
        assert_eq!(sync.book().budget().remaining, Amount::new(dec!(330)));

        // Active months refresh after a confirmed mutation.
        sync.settle_next().await;
        assert_eq!(sync.book().active_periods(), &[january()]);

        let err = sync.add_expense("Mercado", "400").unwrap_err();
        assert!(matches!(err, BookError::ExceedsBalance { .. }));
        assert_eq!(
            sync.book().error(),
            Some("amount exceeds the remaining balance")
        );
        assert_eq!(gateway.calls().create, 1);
        assert_eq!(sync.book().expenses().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_input_never_reaches_the_store() {
        let gateway = FakeGateway::default();
        let mut sync = synchronizer(&gateway);
        sync.select_period(january());
        sync.settle_next().await;

        assert_eq!(sync.add_expense("", "10"), Err(BookError::MissingFields));
        assert_eq!(sync.add_expense("Cinema", "0"), Err(BookError::InvalidAmount));
        assert_eq!(sync.add_expense("Cinema", "-5"), Err(BookError::InvalidAmount));
        assert_eq!(gateway.calls().create, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_load_of_previous_period_is_discarded() {
        let gateway = FakeGateway::default();
        let february = january().next();
        gateway.seed(january(), vec![expense(1, "Jan", Amount::new(dec!(10)))]);
        gateway.seed(february, vec![expense(2, "Feb", Amount::new(dec!(20)))]);
        gateway.set_list_delay(january(), Duration::from_millis(100));
        gateway.set_list_delay(february, Duration::from_millis(10));
        let mut sync = synchronizer(&gateway);

        sync.select_period(january());
        sync.select_period(february);
        sync.settle_next().await;
        sync.settle_next().await;

        assert_eq!(gateway.calls().list, 2);
        assert_eq!(sync.book().period(), february);
        let descriptions: Vec<_> = sync
            .book()
            .expenses()
            .iter()
            .map(|e| e.description.as_str())
            .collect();
        assert_eq!(descriptions, vec!["Feb"]);
    }

    #[tokio::test(start_paused = true)]
    async fn double_remove_sends_one_request() {
        let gateway = FakeGateway::default();
        gateway.seed(january(), vec![expense(7, "Cinema", Amount::new(dec!(50)))]);
        gateway.set_delay(Duration::from_millis(50));
        let mut sync = synchronizer(&gateway);
        sync.select_period(january());
        sync.settle_next().await;

        sync.remove_expense(7).unwrap();
        assert_eq!(sync.remove_expense(7), Err(BookError::AlreadyRemoving(7)));
        let notice = sync.settle_next().await;

        assert!(matches!(notice, Some(Notice::Removed { id: 7, .. })));
        assert_eq!(gateway.calls().delete, 1);
        assert!(sync.book().expenses().is_empty());
        assert!(gateway.records(january()).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_probe_blocks_mutations() {
        let gateway = FakeGateway::default();
        gateway.seed(january(), vec![expense(7, "Cinema", Amount::new(dec!(50)))]);
        let mut sync = synchronizer(&gateway);
        sync.select_period(january());
        sync.settle_next().await;

        gateway.set_reachable(false);
        sync.start_probing(Duration::from_secs(30));
        sync.settle_next().await;
        assert_eq!(sync.book().connectivity(), Connectivity::Unreachable);

        assert_eq!(sync.add_expense("Cinema", "10"), Err(BookError::Offline));
        assert_eq!(sync.remove_expense(7), Err(BookError::Offline));
        assert_eq!(gateway.calls().create, 0);
        assert_eq!(gateway.calls().delete, 0);

        gateway.set_reachable(true);
        sync.settle_next().await;
        assert!(sync.book().can_mutate());
        assert!(sync.is_probing());

        sync.stop_probing();
        assert!(!sync.is_probing());
    }

    #[tokio::test(start_paused = true)]
    async fn store_rejection_is_shown() {
        let gateway = FakeGateway::default();
        gateway.fail_create(Some(GatewayError::Validation(
            "must be positive, required".to_string(),
        )));
        let mut sync = synchronizer(&gateway);
        sync.select_period(january());
        sync.settle_next().await;

        sync.add_expense("Cinema", "10").unwrap();
        assert_eq!(sync.settle_next().await, None);
        assert_eq!(sync.book().error(), Some("must be positive, required"));
        assert!(sync.book().expenses().is_empty());
        assert!(!sync.book().is_saving());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_load_recovers_on_reload() {
        let gateway = FakeGateway::default();
        gateway.fail_list(Some(GatewayError::Transport(
            "connection error, check your internet connection".to_string(),
        )));
        let mut sync = synchronizer(&gateway);
        sync.select_period(january());
        sync.settle_next().await;
        assert_eq!(sync.book().phase(), LoadPhase::Failed);
        assert_eq!(
            sync.book().error(),
            Some("connection error, check your internet connection. Try again.")
        );

        gateway.fail_list(None);
        sync.reload();
        sync.settle_next().await;
        assert_eq!(sync.book().phase(), LoadPhase::Ready);
        assert_eq!(sync.book().error(), None);
        assert!(sync.book().can_mutate());
    }

    #[tokio::test(start_paused = true)]
    async fn apply_pending_drains_without_waiting() {
        let gateway = FakeGateway::default();
        let mut sync = synchronizer(&gateway);
        assert!(sync.apply_pending().is_empty());

        sync.select_period(january());
        tokio::task::yield_now().await;
        sync.request_summary();
        tokio::time::sleep(Duration::from_millis(1)).await;

        assert!(sync.apply_pending().is_empty());
        assert_eq!(sync.book().phase(), LoadPhase::Ready);
        let summary = sync.book().summary().unwrap();
        assert_eq!(summary.mes, "2025-01");
        assert_eq!(summary.quantidade_gastos, 0);
    }
}
