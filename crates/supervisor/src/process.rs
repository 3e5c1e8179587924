//! Engine process identity and lifecycle state

use std::fmt;
use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;
use std::time::{Duration, Instant};

/// Lifecycle of the supervised engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    /// Spawned, control socket not confirmed yet
    Starting,
    /// Past the readiness step, possibly degraded
    Running,
    /// Exited on its own after settling, or stopped by `terminate`
    Exited(i32),
    /// Died before settling or from a signal nobody here sent.
    /// Carries the exit code, `128 + signo` for signal deaths.
    Crashed(Option<i32>),
}

impl ProcessState {
    pub fn is_finished(&self) -> bool {
        matches!(self, ProcessState::Exited(_) | ProcessState::Crashed(_))
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ProcessState::Exited(code) => Some(*code),
            ProcessState::Crashed(code) => *code,
            ProcessState::Starting | ProcessState::Running => None,
        }
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessState::Starting => f.write_str("starting"),
            ProcessState::Running => f.write_str("running"),
            ProcessState::Exited(code) => write!(f, "exited ({code})"),
            ProcessState::Crashed(Some(code)) => write!(f, "crashed ({code})"),
            ProcessState::Crashed(None) => f.write_str("crashed"),
        }
    }
}

/// The engine as seen by its supervisor
#[derive(Debug, Clone)]
pub struct ManagedProcess {
    pid: u32,
    state: ProcessState,
    started_at: Instant,
}

impl ManagedProcess {
    pub(crate) fn new(pid: u32) -> Self {
        Self {
            pid,
            state: ProcessState::Starting,
            started_at: Instant::now(),
        }
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    /// Time since the child was spawned
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub(crate) fn mark_running(&mut self) {
        if self.state == ProcessState::Starting {
            self.state = ProcessState::Running;
        }
    }

    /// Record how the child ended.
    ///
    /// `requested` holds the signals sent by `terminate`; deaths from one of
    /// those are a clean stop. Everything else is a crash unless the engine
    /// exited by itself after supervision settled.
    pub(crate) fn record_exit(
        &mut self,
        status: ExitStatus,
        requested: &[i32],
        settled: bool,
    ) -> ProcessState {
        self.state = match (status.code(), status.signal()) {
            (Some(code), _) if settled || !requested.is_empty() => ProcessState::Exited(code),
            (Some(code), _) => ProcessState::Crashed(Some(code)),
            (None, Some(signal)) if requested.contains(&signal) => {
                ProcessState::Exited(128 + signal)
            }
            (None, Some(signal)) => ProcessState::Crashed(Some(128 + signal)),
            (None, None) => ProcessState::Crashed(None),
        };
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signalled(signal: i32) -> ExitStatus {
        ExitStatus::from_raw(signal)
    }

    fn exited(code: i32) -> ExitStatus {
        ExitStatus::from_raw(code << 8)
    }

    #[test]
    fn test_requested_signal_is_a_clean_exit() {
        let mut process = ManagedProcess::new(42);
        process.mark_running();
        let state = process.record_exit(signalled(libc::SIGTERM), &[libc::SIGTERM], true);
        assert_eq!(state, ProcessState::Exited(143));
    }

    #[test]
    fn test_foreign_signal_is_a_crash() {
        let mut process = ManagedProcess::new(42);
        process.mark_running();
        let state = process.record_exit(signalled(libc::SIGSEGV), &[], true);
        assert_eq!(state, ProcessState::Crashed(Some(128 + libc::SIGSEGV)));
    }

    #[test]
    fn test_exit_before_settling_is_a_crash() {
        let mut process = ManagedProcess::new(42);
        assert_eq!(
            process.record_exit(exited(0), &[], false),
            ProcessState::Crashed(Some(0))
        );

        let mut process = ManagedProcess::new(42);
        assert_eq!(process.record_exit(exited(1), &[], true), ProcessState::Exited(1));
    }
}
