//! One bounded-time reachability probe against the robot
//!
//! An attempt never returns an error: every failure mode is an
//! `AttemptOutcome::Failed` with a reason. The probe socket lives inside the
//! attempt future, so it is closed on success (explicit drop), on refusal,
//! on timeout (the connect future is dropped) and when the caller drops the
//! whole attempt.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::{BoxFuture, select_ok};
use tokio::net::TcpStream;
use tokio::time;

use crate::endpoint::{DEFAULT_FALLBACK_PORT, DEFAULT_PRIMARY_PORT, Endpoint, TeamNumber};

/// Default budget for one attempt
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_millis(2000);

/// Why an attempt failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// No valid team number is configured, so there is nothing to probe
    NoTeamNumber,
    /// Every candidate refused or errored
    Unreachable(String),
    /// The timeout elapsed before any candidate answered
    TimedOut,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::NoTeamNumber => write!(f, "no team number configured"),
            FailureReason::Unreachable(detail) => write!(f, "unreachable: {}", detail),
            FailureReason::TimedOut => write!(f, "timed out"),
        }
    }
}

/// Outcome of a single attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// A connection was established; this is the peer address
    Connected(SocketAddr),
    Failed(FailureReason),
}

impl AttemptOutcome {
    pub fn is_connected(&self) -> bool {
        matches!(self, AttemptOutcome::Connected(_))
    }
}

/// Record of one attempt, discarded after it is reported
#[derive(Debug, Clone)]
pub struct ConnectionAttempt {
    /// `None` when no team number was available
    pub endpoint: Option<Endpoint>,
    pub timeout: Duration,
    pub outcome: AttemptOutcome,
}

/// Supplies the currently configured team number
///
/// Read at the start of every attempt, so a team number change takes effect
/// on the next iteration of the monitor.
pub trait TeamSource: Send + Sync {
    fn team_number(&self) -> Option<TeamNumber>;
}

impl TeamSource for TeamNumber {
    fn team_number(&self) -> Option<TeamNumber> {
        Some(*self)
    }
}

impl TeamSource for Option<TeamNumber> {
    fn team_number(&self) -> Option<TeamNumber> {
        *self
    }
}

/// Makes one reachability attempt
#[async_trait]
pub trait RobotConnector: Send + Sync {
    async fn attempt(&self) -> ConnectionAttempt;
}

/// Ports, timeout and optional host override for `TcpRobotConnector`
#[derive(Debug, Clone)]
pub struct ConnectorSettings {
    pub primary_port: u16,
    pub fallback_port: u16,
    pub timeout: Duration,
    /// Replaces the standard candidate hosts when non-empty
    pub hosts: Vec<String>,
}

impl Default for ConnectorSettings {
    fn default() -> Self {
        Self {
            primary_port: DEFAULT_PRIMARY_PORT,
            fallback_port: DEFAULT_FALLBACK_PORT,
            timeout: DEFAULT_ATTEMPT_TIMEOUT,
            hosts: Vec::new(),
        }
    }
}

/// TCP connector that races every candidate host
pub struct TcpRobotConnector {
    team: Arc<dyn TeamSource>,
    settings: ConnectorSettings,
}

impl TcpRobotConnector {
    pub fn new(team: Arc<dyn TeamSource>, settings: ConnectorSettings) -> Self {
        Self { team, settings }
    }

    fn endpoint(&self) -> Option<Endpoint> {
        let team = self.team.team_number()?;
        Some(
            Endpoint::new(team, self.settings.primary_port, self.settings.fallback_port)
                .with_hosts(self.settings.hosts.clone()),
        )
    }
}

#[async_trait]
impl RobotConnector for TcpRobotConnector {
    async fn attempt(&self) -> ConnectionAttempt {
        let timeout = self.settings.timeout;
        let Some(endpoint) = self.endpoint() else {
            return ConnectionAttempt {
                endpoint: None,
                timeout,
                outcome: AttemptOutcome::Failed(FailureReason::NoTeamNumber),
            };
        };

        let outcome = bounded(timeout, probe(&endpoint)).await;

        ConnectionAttempt {
            endpoint: Some(endpoint),
            timeout,
            outcome,
        }
    }
}

/// Run `probe` within `timeout`; an unfinished probe is dropped
async fn bounded<F>(timeout: Duration, probe: F) -> AttemptOutcome
where
    F: Future<Output = Result<SocketAddr, String>>,
{
    match time::timeout(timeout, probe).await {
        Ok(Ok(addr)) => AttemptOutcome::Connected(addr),
        Ok(Err(detail)) => AttemptOutcome::Failed(FailureReason::Unreachable(detail)),
        Err(_) => AttemptOutcome::Failed(FailureReason::TimedOut),
    }
}

/// Primary port on every host first, fallback port only if all of those fail
async fn probe(endpoint: &Endpoint) -> Result<SocketAddr, String> {
    match race(endpoint.hosts(), endpoint.primary_port()).await {
        Ok(addr) => Ok(addr),
        Err(primary) => race(endpoint.hosts(), endpoint.fallback_port())
            .await
            .map_err(|fallback| format!("{}; {}", primary, fallback)),
    }
}

/// First host to accept wins; the losers' connect futures are dropped
async fn race(hosts: &[String], port: u16) -> Result<SocketAddr, String> {
    if hosts.is_empty() {
        return Err("no candidate hosts".to_string());
    }

    let connects: Vec<BoxFuture<'static, Result<SocketAddr, String>>> = hosts
        .iter()
        .map(|host| connect_once(host.clone(), port).boxed())
        .collect();

    select_ok(connects).await.map(|(addr, _pending)| addr)
}

async fn connect_once(host: String, port: u16) -> Result<SocketAddr, String> {
    let stream = TcpStream::connect((host.as_str(), port))
        .await
        .map_err(|e| format!("{}:{}: {}", host, port, e))?;
    let peer = stream.peer_addr();
    // Reachability only; no data is exchanged.
    drop(stream);
    peer.map_err(|e| format!("{}:{}: {}", host, port, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Instant;
    use tokio::net::TcpListener;

    fn team() -> TeamNumber {
        TeamNumber::new(1741).unwrap()
    }

    fn local_settings(primary: u16, fallback: u16, timeout: Duration) -> ConnectorSettings {
        ConnectorSettings {
            primary_port: primary,
            fallback_port: fallback,
            timeout,
            hosts: vec!["127.0.0.1".to_string()],
        }
    }

    /// A port with nothing listening on it
    async fn closed_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        port
    }

    #[tokio::test]
    async fn test_connects_to_listening_primary() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let fallback = closed_port().await;

        let connector = TcpRobotConnector::new(
            Arc::new(team()),
            local_settings(port, fallback, Duration::from_secs(2)),
        );
        let attempt = connector.attempt().await;

        match attempt.outcome {
            AttemptOutcome::Connected(addr) => assert_eq!(addr.port(), port),
            other => panic!("expected Connected, got {:?}", other),
        }
        assert_eq!(attempt.endpoint.unwrap().team(), team());
    }

    #[tokio::test]
    async fn test_falls_back_when_primary_refused() {
        let primary = closed_port().await;
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let fallback = listener.local_addr().unwrap().port();

        let connector = TcpRobotConnector::new(
            Arc::new(team()),
            local_settings(primary, fallback, Duration::from_secs(2)),
        );

        match connector.attempt().await.outcome {
            AttemptOutcome::Connected(addr) => assert_eq!(addr.port(), fallback),
            other => panic!("expected Connected via fallback, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_refused_everywhere_is_failure() {
        let primary = closed_port().await;
        let fallback = closed_port().await;

        let connector = TcpRobotConnector::new(
            Arc::new(team()),
            local_settings(primary, fallback, Duration::from_secs(2)),
        );

        let attempt = connector.attempt().await;
        assert!(matches!(
            attempt.outcome,
            AttemptOutcome::Failed(FailureReason::Unreachable(_))
        ));
    }

    #[tokio::test]
    async fn test_no_team_fails_without_network() {
        let connector = TcpRobotConnector::new(
            Arc::new(None::<TeamNumber>),
            ConnectorSettings::default(),
        );

        let started = Instant::now();
        let attempt = connector.attempt().await;
        assert!(attempt.endpoint.is_none());
        assert_eq!(
            attempt.outcome,
            AttemptOutcome::Failed(FailureReason::NoTeamNumber)
        );
        assert!(started.elapsed() < Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_unroutable_host_is_bounded_by_timeout() {
        let settings = ConnectorSettings {
            primary_port: 1741,
            fallback_port: 9999,
            timeout: Duration::from_millis(300),
            // TEST-NET-1, never routed
            hosts: vec!["192.0.2.1".to_string()],
        };
        let connector = TcpRobotConnector::new(Arc::new(team()), settings);

        let started = Instant::now();
        let attempt = connector.attempt().await;
        assert!(!attempt.outcome.is_connected());
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_pending_connect_times_out() {
        /// Marks when the in-flight probe is dropped
        struct DropFlag(Arc<AtomicBool>);

        impl Drop for DropFlag {
            fn drop(&mut self) {
                self.0.store(true, Ordering::SeqCst);
            }
        }

        let dropped = Arc::new(AtomicBool::new(false));
        let flag = DropFlag(dropped.clone());
        let budget = Duration::from_millis(50);

        let started = Instant::now();
        let outcome = bounded(budget, async move {
            let _flag = flag;
            std::future::pending::<Result<SocketAddr, String>>().await
        })
        .await;

        assert_eq!(outcome, AttemptOutcome::Failed(FailureReason::TimedOut));
        assert!(started.elapsed() >= budget);
        assert!(dropped.load(Ordering::SeqCst), "probe must be cancelled");
    }

    #[tokio::test]
    async fn test_probe_error_is_unreachable() {
        let outcome = bounded(Duration::from_secs(1), async {
            Err::<SocketAddr, _>("refused".to_string())
        })
        .await;
        assert_eq!(
            outcome,
            AttemptOutcome::Failed(FailureReason::Unreachable("refused".into()))
        );
    }

    #[test]
    fn test_failure_reason_display() {
        assert_eq!(
            FailureReason::NoTeamNumber.to_string(),
            "no team number configured"
        );
        assert_eq!(FailureReason::TimedOut.to_string(), "timed out");
        assert!(
            FailureReason::Unreachable("refused".into())
                .to_string()
                .contains("refused")
        );
    }
}
