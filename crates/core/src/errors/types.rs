//! Core error type definitions

use std::path::PathBuf;
use std::time::Duration;

/// Result type alias for onair operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for onair operations using thiserror
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The engine could not be launched (binary or config missing, spawn failed)
    #[error("failed to start engine '{}': {message}", binary.display())]
    ProcessStart { binary: PathBuf, message: String },

    /// The control socket never answered within the readiness budget
    #[error(
        "control socket '{}' not ready after {attempts} attempt(s) in {elapsed:?}: {last_error}",
        socket.display()
    )]
    ReadinessTimeout {
        socket: PathBuf,
        attempts: u32,
        elapsed: Duration,
        last_error: String,
    },

    /// No complete response arrived before the deadline
    #[error("command '{command}' timed out after {duration:?}")]
    TransportTimeout { command: String, duration: Duration },

    /// Connecting to, writing to or reading from the socket failed
    #[error("transport error on '{}' for '{command}': {source}", socket.display())]
    Transport {
        socket: PathBuf,
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The response was not framed by the terminator
    #[error("malformed response to '{command}': {message}")]
    Framing { command: String, message: String },

    /// The engine returned nothing before the terminator
    #[error("empty response to '{command}'")]
    EmptyResponse { command: String },

    /// The engine explicitly rejected the command
    #[error("engine rejected '{command}': {message}")]
    Application { command: String, message: String },

    /// A multi-step clear stopped before every entry was removed
    #[error("queue clear stopped after {cleared} of {total} entries: {source}")]
    PartialClear {
        cleared: usize,
        total: usize,
        #[source]
        source: Box<Error>,
    },

    /// The kill switch is engaged
    #[error("generation disabled: kill switch '{}' is engaged", sentinel.display())]
    GenerationDisabled { sentinel: PathBuf },

    /// Caller supplied input failed validation
    #[error("invalid {subject} '{value}': {message}")]
    Validation {
        subject: String,
        value: String,
        message: String,
    },

    /// Waiting on or signalling the supervised process failed
    #[error("engine process {pid}: {message}")]
    Process { pid: u32, message: String },

    /// Configuration errors
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// File system operations
    #[error("file system {operation} operation failed for '{}': {source}", path.display())]
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },
}
