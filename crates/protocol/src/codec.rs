//! Wire encoding, framing and classification of the line protocol

use crate::command::{Command, CommandClass};
use crate::response::{Classification, ErrorVocabulary, Response};
use onair_config::Config;
use onair_core::{Error, Result, DEFAULT_TERMINATOR};

/// Encodes commands and classifies raw responses.
///
/// A command is `verb SP arg ... LF`. A response is any number of lines
/// followed by a line holding only the terminator (`END`); CRLF line endings
/// are accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandProtocol {
    terminator: String,
    vocabulary: ErrorVocabulary,
}

impl Default for CommandProtocol {
    fn default() -> Self {
        Self::new(DEFAULT_TERMINATOR, ErrorVocabulary::default())
    }
}

impl CommandProtocol {
    pub fn new(terminator: impl Into<String>, vocabulary: ErrorVocabulary) -> Self {
        Self {
            terminator: terminator.into(),
            vocabulary,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.protocol.terminator.clone(),
            ErrorVocabulary::new(config.protocol.error_markers.iter().cloned()),
        )
    }

    pub fn terminator(&self) -> &str {
        &self.terminator
    }

    pub fn vocabulary(&self) -> &ErrorVocabulary {
        &self.vocabulary
    }

    /// Build a command whose response ends with this protocol's terminator
    pub fn command<I, S>(&self, verb: &str, args: I, class: CommandClass) -> Result<Command>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Command::new(verb, args, class)?.with_terminator(self.terminator.as_str()))
    }

    /// Exact bytes written to the socket
    pub fn encode(&self, command: &Command) -> Vec<u8> {
        let mut line = command.text().into_bytes();
        line.push(b'\n');
        line
    }

    /// Whether `buf` already holds a complete response for `command`
    pub fn frame_complete(&self, command: &Command, buf: &[u8]) -> bool {
        terminator_line(buf, command.terminator()).is_some()
    }

    /// Split the payload off the terminator and classify it
    pub fn parse(&self, command: &Command, raw: Vec<u8>) -> Result<Response> {
        let start = terminator_line(&raw, command.terminator()).ok_or_else(|| {
            Error::framing(
                command.text(),
                format!(
                    "no '{}' line in {} byte(s) of response",
                    command.terminator(),
                    raw.len()
                ),
            )
        })?;

        let payload = String::from_utf8_lossy(&raw[..start])
            .trim_end_matches(['\r', '\n'])
            .to_string();
        let classification = self.classify(&payload);

        Ok(Response::classified(
            command.text(),
            raw,
            payload,
            classification,
        ))
    }

    /// Empty, then error vocabulary, then success
    pub fn classify(&self, payload: &str) -> Classification {
        if payload.trim().is_empty() {
            Classification::Empty
        } else if self.vocabulary.find(payload).is_some() {
            Classification::ApplicationError(payload.to_string())
        } else {
            Classification::Success
        }
    }
}

/// Byte offset where the first line equal to `terminator` starts
fn terminator_line(buf: &[u8], terminator: &str) -> Option<usize> {
    let mut start = 0;
    while start < buf.len() {
        let end = buf[start..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(buf.len(), |i| start + i);
        let line = &buf[start..end];
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if line == terminator.as_bytes() {
            return Some(start);
        }
        start = end + 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn query(verb: &str) -> Command {
        Command::bare(verb, CommandClass::Query).unwrap()
    }

    #[test]
    fn test_encode_is_newline_terminated() {
        let protocol = CommandProtocol::default();
        let cmd = protocol
            .command("queue.ignore", ["8"], CommandClass::Mutation)
            .unwrap();
        assert_eq!(protocol.encode(&cmd), b"queue.ignore 8\n");
    }

    #[test]
    fn test_parse_splits_payload_from_terminator() {
        let protocol = CommandProtocol::default();
        let response = protocol
            .parse(&query("queue.queue"), b"7 8 9\nEND\n".to_vec())
            .unwrap();
        assert_eq!(response.payload(), "7 8 9");
        assert_eq!(response.classification(), &Classification::Success);
        assert_eq!(response.command(), "queue.queue");
    }

    #[test]
    fn test_parse_accepts_crlf() {
        let protocol = CommandProtocol::default();
        let response = protocol
            .parse(&query("help"), b"Available commands:\r\n| help\r\nEND\r\n".to_vec())
            .unwrap();
        assert_eq!(response.payload(), "Available commands:\r\n| help");
        assert!(response.is_success());
    }

    #[test]
    fn test_parse_classifies_empty_payload() {
        let protocol = CommandProtocol::default();
        let response = protocol.parse(&query("queue.queue"), b"END\n".to_vec()).unwrap();
        assert_eq!(response.classification(), &Classification::Empty);

        let response = protocol.parse(&query("queue.queue"), b"  \nEND\n".to_vec()).unwrap();
        assert_eq!(response.classification(), &Classification::Empty);
    }

    #[test]
    fn test_parse_without_terminator_is_framing_error() {
        let protocol = CommandProtocol::default();
        let err = protocol
            .parse(&query("queue.queue"), b"7 8 9\nENDING\n".to_vec())
            .unwrap_err();
        assert!(matches!(err, Error::Framing { .. }));
    }

    #[test]
    fn test_frame_complete_needs_a_whole_terminator_line() {
        let protocol = CommandProtocol::default();
        let cmd = query("queue.queue");
        assert!(!protocol.frame_complete(&cmd, b"7 8"));
        assert!(!protocol.frame_complete(&cmd, b"7 8\nENDX\n"));
        assert!(protocol.frame_complete(&cmd, b"7 8\nEND\n"));
        assert!(protocol.frame_complete(&cmd, b"END"));
    }

    #[test]
    fn test_custom_terminator_and_vocabulary() {
        let protocol = CommandProtocol::new("DONE", ErrorVocabulary::new(["refused"]));
        let cmd = protocol
            .command("queue.push", ["/a.flac"], CommandClass::Mutation)
            .unwrap();
        let response = protocol.parse(&cmd, b"push refused\nDONE\n".to_vec()).unwrap();
        assert_eq!(
            response.classification(),
            &Classification::ApplicationError("push refused".to_string())
        );
    }

    proptest! {
        #[test]
        fn prop_error_marker_is_never_success(
            prefix in "[a-zA-Z0-9 ./]{0,40}",
            suffix in "[a-zA-Z0-9 ./]{0,40}",
            marker_index in 0usize..4,
        ) {
            let protocol = CommandProtocol::default();
            let marker = &protocol.vocabulary().markers()[marker_index];
            let payload = format!("{prefix}{marker}{suffix}");
            let raw = format!("{payload}\nEND\n").into_bytes();

            let response = protocol.parse(&query("queue.push"), raw).unwrap();
            prop_assert!(!response.is_success());
            let is_rejection = matches!(
                response.classification(),
                Classification::ApplicationError(_)
            );
            prop_assert!(is_rejection);
        }

        #[test]
        fn prop_marker_free_payload_is_success(payload in "[a-z0-9 ./_-]{0,60}[a-z0-9]") {
            let protocol = CommandProtocol::default();
            let raw = format!("{payload}\nEND\n").into_bytes();
            let response = protocol.parse(&query("request.metadata"), raw).unwrap();
            prop_assert!(response.is_success());
            prop_assert_eq!(response.payload(), payload.as_str());
        }
    }
}
