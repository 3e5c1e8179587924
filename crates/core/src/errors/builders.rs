//! Builder methods for creating errors with context

use super::types::Error;
use std::path::PathBuf;
use std::time::Duration;

// Helper methods for creating errors with context
impl Error {
    /// Create a process start error
    #[must_use]
    pub fn process_start(binary: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::ProcessStart {
            binary: binary.into(),
            message: message.into(),
        }
    }

    /// Create a readiness timeout error
    #[must_use]
    pub fn readiness_timeout(
        socket: impl Into<PathBuf>,
        attempts: u32,
        elapsed: Duration,
        last_error: impl Into<String>,
    ) -> Self {
        Error::ReadinessTimeout {
            socket: socket.into(),
            attempts,
            elapsed,
            last_error: last_error.into(),
        }
    }

    /// Create a transport timeout error
    #[must_use]
    pub fn transport_timeout(command: impl Into<String>, duration: Duration) -> Self {
        Error::TransportTimeout {
            command: command.into(),
            duration,
        }
    }

    /// Create a transport error with its I/O source
    #[must_use]
    pub fn transport(
        socket: impl Into<PathBuf>,
        command: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Error::Transport {
            socket: socket.into(),
            command: command.into(),
            source,
        }
    }

    /// Create a framing error
    #[must_use]
    pub fn framing(command: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Framing {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Create an empty response error
    #[must_use]
    pub fn empty_response(command: impl Into<String>) -> Self {
        Error::EmptyResponse {
            command: command.into(),
        }
    }

    /// Create an application-level rejection
    #[must_use]
    pub fn application(command: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Application {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Wrap the error that stopped a multi-step clear
    #[must_use]
    pub fn partial_clear(cleared: usize, total: usize, source: Error) -> Self {
        Error::PartialClear {
            cleared,
            total,
            source: Box::new(source),
        }
    }

    /// Create a generation disabled error
    #[must_use]
    pub fn generation_disabled(sentinel: impl Into<PathBuf>) -> Self {
        Error::GenerationDisabled {
            sentinel: sentinel.into(),
        }
    }

    /// Create a validation error
    #[must_use]
    pub fn validation(
        subject: impl Into<String>,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Error::Validation {
            subject: subject.into(),
            value: value.into(),
            message: message.into(),
        }
    }

    /// Create a process error
    #[must_use]
    pub fn process(pid: u32, message: impl Into<String>) -> Self {
        Error::Process {
            pid,
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// Create a file system error with context
    #[must_use]
    pub fn file_system(
        path: impl Into<PathBuf>,
        operation: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Error::FileSystem {
            path: path.into(),
            operation: operation.into(),
            source,
        }
    }
}
