//! Bounded readiness check for the control socket

use crate::codec::CommandProtocol;
use crate::command::{Command, CommandClass};
use crate::connection::{ConnectionMode, SocketConnection};
use onair_config::Config;
use onair_core::{Error, Result, DEFAULT_PROBE_VERB, MAX_READINESS_BUDGET_SECS};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::{sleep_until, timeout, Instant};

pub const MAX_READINESS_BUDGET: Duration = Duration::from_secs(MAX_READINESS_BUDGET_SECS);

/// Result of a probe run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Ready {
        elapsed: Duration,
        attempts: u32,
    },
    NotReady {
        elapsed: Duration,
        attempts: u32,
        last_error: String,
    },
}

impl ProbeOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, ProbeOutcome::Ready { .. })
    }

    pub fn elapsed(&self) -> Duration {
        match self {
            ProbeOutcome::Ready { elapsed, .. } | ProbeOutcome::NotReady { elapsed, .. } => {
                *elapsed
            }
        }
    }

    /// `NotReady` as a `ReadinessTimeout` error for `socket`
    pub fn into_result(self, socket: &Path) -> Result<Duration> {
        match self {
            ProbeOutcome::Ready { elapsed, .. } => Ok(elapsed),
            ProbeOutcome::NotReady {
                elapsed,
                attempts,
                last_error,
            } => Err(Error::readiness_timeout(socket, attempts, elapsed, last_error)),
        }
    }
}

/// Polls until the socket both exists and answers a trivial command.
///
/// A socket file on disk only means the engine called `bind`; the probe is
/// satisfied only once a command round-trips. Any classified answer counts,
/// rejections included. Attempts start on a fixed cadence and the whole run
/// never outlasts `attempts × interval`.
#[derive(Debug, Clone)]
pub struct ReadinessProbe {
    socket_path: PathBuf,
    protocol: CommandProtocol,
    probe_verb: String,
    attempts: u32,
    interval: Duration,
    probe_timeout: Duration,
}

impl ReadinessProbe {
    pub fn new(socket_path: impl Into<PathBuf>, protocol: CommandProtocol) -> Self {
        Self {
            socket_path: socket_path.into(),
            protocol,
            probe_verb: DEFAULT_PROBE_VERB.to_string(),
            attempts: 30,
            interval: Duration::from_secs(1),
            probe_timeout: Duration::from_secs(1),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.socket_path.clone(), CommandProtocol::from_config(config))
            .probe_verb(config.protocol.probe_verb.clone())
            .attempts(config.readiness.attempts)
            .interval(config.readiness.interval())
            .probe_timeout(config.timeouts.probe())
    }

    #[must_use]
    pub fn probe_verb(mut self, verb: impl Into<String>) -> Self {
        self.probe_verb = verb.into();
        self
    }

    #[must_use]
    pub fn attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    #[must_use]
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    #[must_use]
    pub fn probe_timeout(mut self, probe_timeout: Duration) -> Self {
        self.probe_timeout = probe_timeout;
        self
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Longest time [`Self::run`] can take, capped at [`MAX_READINESS_BUDGET`]
    pub fn budget(&self) -> Duration {
        self.interval
            .checked_mul(self.attempts)
            .map_or(MAX_READINESS_BUDGET, |budget| budget.min(MAX_READINESS_BUDGET))
    }

    pub async fn run(&self) -> ProbeOutcome {
        let started = Instant::now();
        let budget = self.budget();
        let deadline = started + budget;
        let mut last_error = String::from("no probe attempted");
        let mut attempted = 0;

        for attempt in 1..=self.attempts {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            attempted = attempt;

            match self.probe_once(remaining.min(self.probe_timeout)).await {
                Ok(()) => {
                    let elapsed = started.elapsed();
                    tracing::info!(
                        socket = %self.socket_path.display(),
                        attempt,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "control socket ready"
                    );
                    return ProbeOutcome::Ready {
                        elapsed,
                        attempts: attempt,
                    };
                }
                Err(e) => {
                    tracing::debug!(
                        socket = %self.socket_path.display(),
                        attempt,
                        error = %e,
                        "control socket not ready"
                    );
                    last_error = e.to_string();
                }
            }

            if attempt < self.attempts {
                let offset = self.interval.checked_mul(attempt).unwrap_or(budget);
                sleep_until(started + offset.min(budget)).await;
            }
        }

        let elapsed = started.elapsed();
        tracing::warn!(
            socket = %self.socket_path.display(),
            attempts = attempted,
            elapsed_ms = elapsed.as_millis() as u64,
            last_error = %last_error,
            "control socket did not become ready"
        );
        ProbeOutcome::NotReady {
            elapsed,
            attempts: attempted,
            last_error,
        }
    }

    /// One existence check plus one round-trip, all within `limit`
    async fn probe_once(&self, limit: Duration) -> Result<()> {
        std::fs::symlink_metadata(&self.socket_path)
            .map_err(|e| Error::transport(&self.socket_path, "stat socket", e))?;

        let command = Command::bare(self.probe_verb.as_str(), CommandClass::Probe)?
            .with_terminator(self.protocol.terminator());
        let text = command.text();

        let exchange = async {
            let mut connection = SocketConnection::connect(
                &self.socket_path,
                ConnectionMode::Ephemeral,
                limit,
                &text,
            )
            .await?;
            let response = connection.exchange(&self.protocol, &command, limit).await;
            connection.close().await;
            response
        };

        match timeout(limit, exchange).await {
            Ok(Ok(response)) if response.is_timeout() => {
                Err(Error::transport_timeout(text, response.elapsed()))
            }
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(Error::transport_timeout(text, limit)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_budget_is_attempts_times_interval() {
        let probe = ReadinessProbe::new("/nonexistent.sock", CommandProtocol::default())
            .attempts(5)
            .interval(Duration::from_secs(1));
        assert_eq!(probe.budget(), Duration::from_secs(5));
    }

    #[test]
    fn test_budget_saturates_for_huge_settings() {
        let probe = ReadinessProbe::new("/tmp/never.sock", CommandProtocol::default())
            .attempts(u32::MAX)
            .interval(Duration::from_secs(u64::MAX / 2));
        assert_eq!(probe.budget(), MAX_READINESS_BUDGET);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_socket_gives_up_within_budget() {
        let temp_dir = TempDir::new().unwrap();
        let probe =
            ReadinessProbe::new(temp_dir.path().join("never.sock"), CommandProtocol::default())
                .attempts(5)
                .interval(Duration::from_secs(1))
                .probe_timeout(Duration::from_millis(500));

        let started = Instant::now();
        let outcome = probe.run().await;
        let elapsed = started.elapsed();

        match outcome {
            ProbeOutcome::NotReady {
                attempts,
                last_error,
                ..
            } => {
                assert_eq!(attempts, 5);
                assert!(last_error.contains("stat socket"), "{last_error}");
            }
            other => panic!("expected NotReady, got {other:?}"),
        }
        assert!(elapsed <= Duration::from_secs(5), "took {elapsed:?}");
        assert!(elapsed >= Duration::from_secs(4), "took {elapsed:?}");
    }

    #[tokio::test]
    async fn test_silent_listener_is_not_ready() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("silent.sock");
        // Bound but never accepting: connects land in the backlog and no
        // answer ever comes back.
        let _listener = std::os::unix::net::UnixListener::bind(&path).unwrap();

        let probe = ReadinessProbe::new(&path, CommandProtocol::default())
            .attempts(3)
            .interval(Duration::from_millis(100))
            .probe_timeout(Duration::from_millis(50));

        let started = std::time::Instant::now();
        let outcome = probe.run().await;
        assert!(!outcome.is_ready());
        assert!(started.elapsed() < Duration::from_secs(1));

        let err = outcome.into_result(&path).unwrap_err();
        assert!(matches!(err, Error::ReadinessTimeout { attempts: 3, .. }));
    }
}
