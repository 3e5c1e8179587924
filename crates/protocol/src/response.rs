//! Classified responses and the error vocabulary used to classify them

use onair_core::{Error, Result, DEFAULT_ERROR_MARKERS};
use std::time::Duration;

/// Outcome of one command exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Success,
    /// The engine rejected the command; carries the payload verbatim
    ApplicationError(String),
    /// Nothing preceded the terminator
    Empty,
    /// No terminator arrived before the deadline
    Timeout,
}

impl Classification {
    pub fn name(&self) -> &'static str {
        match self {
            Classification::Success => "success",
            Classification::ApplicationError(_) => "application_error",
            Classification::Empty => "empty",
            Classification::Timeout => "timeout",
        }
    }
}

/// The single classified answer to one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    command: String,
    raw: Vec<u8>,
    payload: String,
    classification: Classification,
    elapsed: Duration,
}

impl Response {
    pub(crate) fn classified(
        command: String,
        raw: Vec<u8>,
        payload: String,
        classification: Classification,
    ) -> Self {
        Self {
            command,
            raw,
            payload,
            classification,
            elapsed: Duration::ZERO,
        }
    }

    /// Response for a command whose deadline expired; keeps any partial bytes
    pub(crate) fn timeout(command: String, raw: Vec<u8>, elapsed: Duration) -> Self {
        let payload = String::from_utf8_lossy(&raw).into_owned();
        Self {
            command,
            raw,
            payload,
            classification: Classification::Timeout,
            elapsed,
        }
    }

    pub(crate) fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    /// Command text this response answers
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Bytes as read from the socket, terminator included
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Text preceding the terminator
    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn classification(&self) -> &Classification {
        &self.classification
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn is_success(&self) -> bool {
        self.classification == Classification::Success
    }

    pub fn is_timeout(&self) -> bool {
        self.classification == Classification::Timeout
    }

    /// Convert the classification into the error taxonomy; only `Success`
    /// yields `Ok`
    pub fn into_result(self) -> Result<String> {
        match self.classification {
            Classification::Success => Ok(self.payload),
            Classification::ApplicationError(text) => Err(Error::application(self.command, text)),
            Classification::Empty => Err(Error::empty_response(self.command)),
            Classification::Timeout => Err(Error::transport_timeout(self.command, self.elapsed)),
        }
    }
}

/// Case-sensitive substrings that mark a payload as a rejection.
///
/// The engine's full error surface is not documented, so the set is data:
/// defaults cover the known replies and configuration may add more.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorVocabulary {
    markers: Vec<String>,
}

impl Default for ErrorVocabulary {
    fn default() -> Self {
        Self::new(DEFAULT_ERROR_MARKERS.iter().copied())
    }
}

impl ErrorVocabulary {
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut vocabulary = Self {
            markers: Vec::new(),
        };
        vocabulary.extend(markers);
        vocabulary
    }

    /// Add markers; empty and duplicate markers are skipped
    pub fn extend<I, S>(&mut self, markers: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for marker in markers {
            let marker = marker.into();
            if !marker.is_empty() && !self.markers.contains(&marker) {
                self.markers.push(marker);
            }
        }
    }

    pub fn markers(&self) -> &[String] {
        &self.markers
    }

    /// First marker contained in `payload`
    pub fn find(&self, payload: &str) -> Option<&str> {
        self.markers
            .iter()
            .map(String::as_str)
            .find(|marker| payload.contains(marker))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_result_only_succeeds_on_success() {
        let ok = Response::classified(
            "help".into(),
            b"x\nEND\n".to_vec(),
            "x".into(),
            Classification::Success,
        );
        assert_eq!(ok.into_result().unwrap(), "x");

        let rejected = Response::classified(
            "queue.ignore 8".into(),
            Vec::new(),
            "ERROR: no such request".into(),
            Classification::ApplicationError("ERROR: no such request".into()),
        );
        match rejected.into_result().unwrap_err() {
            Error::Application { command, message } => {
                assert_eq!(command, "queue.ignore 8");
                assert_eq!(message, "ERROR: no such request");
            }
            other => panic!("unexpected error: {other}"),
        }

        let empty = Response::classified(
            "queue.skip".into(),
            b"END\n".to_vec(),
            String::new(),
            Classification::Empty,
        );
        assert!(matches!(empty.into_result(), Err(Error::EmptyResponse { .. })));

        let timeout = Response::timeout(
            "request.metadata 3".into(),
            Vec::new(),
            Duration::from_millis(20),
        );
        assert!(matches!(timeout.into_result(), Err(Error::TransportTimeout { .. })));
    }

    #[test]
    fn test_vocabulary_skips_empty_and_duplicate_markers() {
        let mut vocabulary = ErrorVocabulary::new(["ERROR", ""]);
        vocabulary.extend(["ERROR", "Unknown command"]);
        assert_eq!(vocabulary.markers(), ["ERROR", "Unknown command"]);
    }

    #[test]
    fn test_vocabulary_is_case_sensitive() {
        let vocabulary = ErrorVocabulary::new(["Error:"]);
        assert_eq!(vocabulary.find("Error: bad uri"), Some("Error:"));
        assert_eq!(vocabulary.find("error: bad uri"), None);
    }
}
