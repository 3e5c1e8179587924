//! Conversion implementations for error types

use super::types::Error;

// No From<io::Error>: I/O failures carry their path or socket via the builders
impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::Json {
            message: error.to_string(),
            source: error,
        }
    }
}
