use std::time::Duration;

use tokio::{
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use super::ExpenseGateway;

/// Background task probing the store at a fixed interval.
///
/// The first probe runs one interval after spawning. Dropping the handle
/// stops the loop, including a probe still in flight.
pub struct ProbeLoop {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl ProbeLoop {
    pub fn spawn<G, F>(gateway: G, interval: Duration, report: F) -> Self
    where
        G: ExpenseGateway,
        F: Fn(bool) + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        tokio::select! {
                            _ = token.cancelled() => break,
                            reachable = gateway.probe_reachability() => {
                                tracing::debug!("probe: reachable={reachable}");
                                report(reachable);
                            }
                        }
                    }
                }
            }
            tracing::debug!("probe loop stopped");
        });

        Self { cancel, handle }
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for ProbeLoop {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use crate::testing::FakeGateway;

    use super::*;

    fn recorder() -> (Arc<Mutex<Vec<bool>>>, impl Fn(bool) + Send + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        (seen, move |reachable| sink.lock().unwrap().push(reachable))
    }

    #[tokio::test(start_paused = true)]
    async fn probes_once_per_interval() {
        let gateway = FakeGateway::default();
        gateway.set_reachable(false);
        let (seen, report) = recorder();

        let probe = ProbeLoop::spawn(gateway.clone(), Duration::from_secs(30), report);

        tokio::time::sleep(Duration::from_secs(29)).await;
        assert!(seen.lock().unwrap().is_empty());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(*seen.lock().unwrap(), vec![false]);

        gateway.set_reachable(true);
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(*seen.lock().unwrap(), vec![false, true]);
        assert_eq!(gateway.calls().probe, 2);

        drop(probe);
    }

    #[tokio::test(start_paused = true)]
    async fn stops_when_dropped() {
        let gateway = FakeGateway::default();
        let (seen, report) = recorder();

        let probe = ProbeLoop::spawn(gateway.clone(), Duration::from_secs(1), report);
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(seen.lock().unwrap().len(), 1);

        drop(probe);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(seen.lock().unwrap().len(), 1);
        assert_eq!(gateway.calls().probe, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_interrupts_a_probe_in_flight() {
        let gateway = FakeGateway::default();
        gateway.set_delay(Duration::from_secs(5));
        let (seen, report) = recorder();

        let probe = ProbeLoop::spawn(gateway, Duration::from_secs(1), report);
        tokio::time::sleep(Duration::from_secs(2)).await;
        probe.stop();
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert!(seen.lock().unwrap().is_empty());
        assert!(probe.is_finished());
    }
}
