//! Mapping from errors to failure classes and process exit codes

use super::types::Error;
use crate::constants::{EXIT_DISABLED, EXIT_FAILURE, EXIT_REJECTED, EXIT_TRANSPORT};

/// Coarse failure class a scheduler acts on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Socket, deadline or framing trouble: retry or page someone
    Transport,
    /// The engine understood the command and said no
    Rejected,
    /// The kill switch stopped the action before it reached the engine
    Disabled,
    /// Anything else: bad input, bad config, missing binary
    Local,
}

impl Error {
    /// Classify this error; a partial clear takes the class of its cause
    #[must_use]
    pub fn class(&self) -> FailureClass {
        match self {
            Error::ReadinessTimeout { .. }
            | Error::TransportTimeout { .. }
            | Error::Transport { .. }
            | Error::Framing { .. }
            | Error::EmptyResponse { .. } => FailureClass::Transport,
            Error::Application { .. } => FailureClass::Rejected,
            Error::GenerationDisabled { .. } => FailureClass::Disabled,
            Error::PartialClear { source, .. } => source.class(),
            _ => FailureClass::Local,
        }
    }

    /// Exit code a command-line entry point reports for this error
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self.class() {
            FailureClass::Transport => EXIT_TRANSPORT,
            FailureClass::Rejected => EXIT_REJECTED,
            FailureClass::Disabled => EXIT_DISABLED,
            FailureClass::Local => EXIT_FAILURE,
        }
    }

    /// Whether a single fresh-connection retry is worthwhile
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::TransportTimeout { .. } | Error::Transport { .. }
        )
    }

    /// Whether this is a deadline expiry
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::TransportTimeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_exit_codes_distinguish_transport_from_rejection() {
        let timeout = Error::transport_timeout("queue.queue", Duration::from_secs(1));
        let rejected = Error::application("queue.ignore 8", "ERROR: no such request");
        let empty = Error::empty_response("queue.push /a.flac");

        assert_eq!(timeout.exit_code(), EXIT_TRANSPORT);
        assert_eq!(empty.exit_code(), EXIT_TRANSPORT);
        assert_eq!(rejected.exit_code(), EXIT_REJECTED);
        assert_ne!(timeout.exit_code(), rejected.exit_code());
    }

    #[test]
    fn test_partial_clear_inherits_cause_class() {
        let cause = Error::application("queue.ignore 8", "ERROR");
        let partial = Error::partial_clear(1, 3, cause);
        assert_eq!(partial.class(), FailureClass::Rejected);
        assert_eq!(partial.exit_code(), EXIT_REJECTED);

        let cause = Error::transport_timeout("queue.ignore 8", Duration::from_millis(50));
        let partial = Error::partial_clear(0, 2, cause);
        assert_eq!(partial.exit_code(), EXIT_TRANSPORT);
    }

    #[test]
    fn test_only_transport_failures_are_retryable() {
        assert!(Error::transport_timeout("help", Duration::from_secs(1)).is_retryable());
        assert!(!Error::application("skip", "Error: nothing").is_retryable());
        assert!(!Error::empty_response("skip").is_retryable());
        assert!(!Error::generation_disabled("/tmp/flag").is_retryable());
    }

    #[test]
    fn test_kill_switch_has_its_own_code() {
        let err = Error::generation_disabled("/run/onair/generation.disabled");
        assert_eq!(err.exit_code(), EXIT_DISABLED);
        assert!(err.to_string().contains("kill switch"));
    }
}
