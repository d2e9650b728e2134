//! Perpetual robot reachability monitor
//!
//! The monitor repeats one connector attempt, reports it, and waits a fixed
//! delay, forever. It is a steady poll: there is no backoff and no attempt
//! cap, and failed attempts are expected (the robot is usually off).
//!
//! `ConnectionMonitor::start` consumes the monitor and spawns the loop, so a
//! given monitor can only ever run once. The returned `MonitorHandle` owns
//! the cancellation token; stopping preempts both an in-flight attempt and
//! the inter-attempt delay.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::connector::{AttemptOutcome, ConnectionAttempt, RobotConnector};

/// Default pause between attempts
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(2000);

/// Latest known reachability of the robot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    /// No attempt has completed yet
    Unknown,
    Connected(SocketAddr),
    Disconnected,
}

impl LinkStatus {
    fn from_outcome(outcome: &AttemptOutcome) -> Self {
        match outcome {
            AttemptOutcome::Connected(addr) => LinkStatus::Connected(*addr),
            AttemptOutcome::Failed(_) => LinkStatus::Disconnected,
        }
    }
}

/// Receives every attempt the monitor makes
///
/// The default reporter is `TracingReporter`; tests plug in recorders.
pub trait AttemptReporter: Send + Sync {
    fn report(&self, attempt: &ConnectionAttempt);
}

/// Logs attempts through `tracing`
///
/// Failures are informational, never warnings.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl AttemptReporter for TracingReporter {
    fn report(&self, attempt: &ConnectionAttempt) {
        match &attempt.outcome {
            AttemptOutcome::Connected(addr) => {
                debug!(ip = %addr.ip(), port = addr.port(), "connected");
            }
            AttemptOutcome::Failed(reason) => match &attempt.endpoint {
                Some(endpoint) => {
                    debug!(endpoint = %endpoint, reason = %reason, "failed to connect")
                }
                None => debug!(reason = %reason, "failed to connect"),
            },
        }
    }
}

/// Unstarted monitor
pub struct ConnectionMonitor {
    connector: Arc<dyn RobotConnector>,
    reporter: Arc<dyn AttemptReporter>,
    delay: Duration,
    quiet: bool,
}

impl ConnectionMonitor {
    pub fn new(connector: Arc<dyn RobotConnector>, delay: Duration) -> Self {
        Self {
            connector,
            reporter: Arc::new(TracingReporter),
            delay,
            quiet: false,
        }
    }

    /// Log connect/disconnect transitions at debug instead of info
    ///
    /// Used while an interactive prompt owns the terminal.
    pub fn with_quiet_transitions(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Replace the reporter
    pub fn with_reporter(mut self, reporter: Arc<dyn AttemptReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Spawn the polling loop on the current tokio runtime
    pub fn start(self) -> MonitorHandle {
        let cancel = CancellationToken::new();
        let (status_tx, status_rx) = watch::channel(LinkStatus::Unknown);

        let task = tokio::spawn(self.run(status_tx, cancel.clone()));

        MonitorHandle {
            cancel,
            task,
            status: status_rx,
        }
    }

    async fn run(self, status_tx: watch::Sender<LinkStatus>, cancel: CancellationToken) {
        info!(delay_ms = self.delay.as_millis() as u64, "connection monitor started");
        let mut attempts: u64 = 0;

        loop {
            if cancel.is_cancelled() {
                break;
            }

            // Dropping the attempt future on cancel closes its socket.
            let attempt = tokio::select! {
                _ = cancel.cancelled() => break,
                attempt = self.connector.attempt() => attempt,
            };
            attempts += 1;

            self.reporter.report(&attempt);

            let status = LinkStatus::from_outcome(&attempt.outcome);
            let previous = *status_tx.borrow();
            if previous != status {
                self.log_transition(previous, status);
            }
            // Receivers wake on transitions only. Nobody watching is fine.
            status_tx.send_if_modified(|current| {
                if *current == status {
                    return false;
                }
                *current = status;
                true
            });

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.delay) => {}
            }
        }

        info!(attempts, "connection monitor stopped");
    }

    fn log_transition(&self, previous: LinkStatus, status: LinkStatus) {
        match status {
            LinkStatus::Connected(addr) if self.quiet => debug!(ip = %addr.ip(), "robot connected"),
            LinkStatus::Connected(addr) => info!(ip = %addr.ip(), "robot connected"),
            LinkStatus::Disconnected if previous == LinkStatus::Unknown => {}
            LinkStatus::Disconnected if self.quiet => debug!("robot disconnected"),
            LinkStatus::Disconnected => info!("robot disconnected"),
            LinkStatus::Unknown => {}
        }
    }
}

/// Handle to the running monitor
pub struct MonitorHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
    status: watch::Receiver<LinkStatus>,
}

impl MonitorHandle {
    /// Receiver that observes every status change
    pub fn subscribe(&self) -> watch::Receiver<LinkStatus> {
        self.status.clone()
    }

    /// Signal the loop to stop and wait for it to exit
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            tracing::warn!(error = ?e, "connection monitor task panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::FailureReason;
    use async_trait::async_trait;
    use std::net::{IpAddr, Ipv4Addr};
    use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    /// Connector that records call times and alternates outcomes
    struct StubConnector {
        calls: Mutex<Vec<Instant>>,
        notify: mpsc::UnboundedSender<usize>,
    }

    impl StubConnector {
        fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<usize>) {
            let (tx, rx) = mpsc::unbounded_channel();
            (
                Arc::new(Self {
                    calls: Mutex::new(Vec::new()),
                    notify: tx,
                }),
                rx,
            )
        }

        fn calls(&self) -> Vec<Instant> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RobotConnector for StubConnector {
        async fn attempt(&self) -> ConnectionAttempt {
            let n = {
                let mut calls = self.calls.lock().unwrap();
                calls.push(Instant::now());
                calls.len()
            };
            let _ = self.notify.send(n);

            let outcome = if n % 2 == 0 {
                AttemptOutcome::Connected(SocketAddr::new(
                    IpAddr::V4(Ipv4Addr::new(10, 17, 41, 2)),
                    1741,
                ))
            } else {
                AttemptOutcome::Failed(FailureReason::TimedOut)
            };
            ConnectionAttempt {
                endpoint: None,
                timeout: Duration::from_millis(1),
                outcome,
            }
        }
    }

    /// Connector whose attempt never completes
    struct HangingConnector;

    #[async_trait]
    impl RobotConnector for HangingConnector {
        async fn attempt(&self) -> ConnectionAttempt {
            std::future::pending().await
        }
    }

    /// Connector that never reaches the robot
    struct AlwaysDown {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RobotConnector for AlwaysDown {
        async fn attempt(&self) -> ConnectionAttempt {
            self.calls.fetch_add(1, Ordering::SeqCst);
            ConnectionAttempt {
                endpoint: None,
                timeout: Duration::from_millis(1),
                outcome: AttemptOutcome::Failed(FailureReason::TimedOut),
            }
        }
    }

    struct RecordingReporter {
        outcomes: Mutex<Vec<AttemptOutcome>>,
    }

    impl AttemptReporter for RecordingReporter {
        fn report(&self, attempt: &ConnectionAttempt) {
            self.outcomes.lock().unwrap().push(attempt.outcome.clone());
        }
    }

    #[tokio::test]
    async fn test_n_attempts_with_delay_between_each() {
        let delay = Duration::from_millis(100);
        let (stub, mut rx) = StubConnector::new();
        let reporter = Arc::new(RecordingReporter {
            outcomes: Mutex::new(Vec::new()),
        });

        let handle = ConnectionMonitor::new(stub.clone(), delay)
            .with_reporter(reporter.clone())
            .start();

        const N: usize = 4;
        let reached = timeout(Duration::from_secs(5), async {
            while let Some(n) = rx.recv().await {
                if n == N {
                    break;
                }
            }
        })
        .await;
        assert!(reached.is_ok(), "monitor should make {} attempts", N);
        handle.stop().await;

        let calls = stub.calls();
        assert_eq!(calls.len(), N);
        for pair in calls.windows(2) {
            assert!(
                pair[1].duration_since(pair[0]) >= delay,
                "attempts must be separated by the configured delay"
            );
        }

        // Both success and failure were followed by another attempt.
        let outcomes = reporter.outcomes.lock().unwrap();
        assert!(outcomes.iter().any(|o| o.is_connected()));
        assert!(outcomes.iter().any(|o| !o.is_connected()));
    }

    #[tokio::test]
    async fn test_stop_interrupts_delay() {
        let (stub, mut rx) = StubConnector::new();
        let handle = ConnectionMonitor::new(stub.clone(), Duration::from_secs(30)).start();

        rx.recv().await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        let started = Instant::now();
        handle.stop().await;
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(stub.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_stop_interrupts_attempt() {
        let handle =
            ConnectionMonitor::new(Arc::new(HangingConnector), Duration::from_millis(10)).start();
        tokio::time::sleep(Duration::from_millis(20)).await;

        let result = timeout(Duration::from_secs(1), handle.stop()).await;
        assert!(result.is_ok(), "stop must not wait for a hung attempt");
    }

    #[tokio::test]
    async fn test_status_follows_outcomes() {
        let (stub, _rx) = StubConnector::new();
        let handle = ConnectionMonitor::new(stub, Duration::from_millis(30)).start();
        let mut status = handle.subscribe();
        assert_eq!(*status.borrow(), LinkStatus::Unknown);
        let first = timeout(Duration::from_secs(2), async {
            status.changed().await.unwrap();
            *status.borrow_and_update()
        })
        .await
        .unwrap();
        assert_eq!(first, LinkStatus::Disconnected);

        let second = timeout(Duration::from_secs(2), async {
            status.changed().await.unwrap();
            *status.borrow_and_update()
        })
        .await
        .unwrap();
        assert!(matches!(second, LinkStatus::Connected(_)));

        handle.stop().await;
    }

    #[tokio::test]
    async fn test_unchanged_status_notifies_once() {
        let connector = Arc::new(AlwaysDown {
            calls: AtomicUsize::new(0),
        });
        let handle = ConnectionMonitor::new(connector.clone(), Duration::from_millis(10))
            .with_quiet_transitions(true)
            .start();
        let mut status = handle.subscribe();

        let mut notifications = 0;
        let _ = timeout(Duration::from_millis(300), async {
            while status.changed().await.is_ok() {
                notifications += 1;
                let _ = status.borrow_and_update();
            }
        })
        .await;
        handle.stop().await;

        assert!(connector.calls.load(Ordering::SeqCst) > 2);
        assert_eq!(notifications, 1);
        assert_eq!(*status.borrow(), LinkStatus::Disconnected);
    }
}
