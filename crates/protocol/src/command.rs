//! Commands sent over the control socket

use onair_core::{Error, Result, DEFAULT_TERMINATOR};
use std::fmt;

/// What a command does, which drives its default timeout and connection mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandClass {
    /// Side-effect free liveness check
    Probe,
    /// Read-only listing such as the queue enumeration
    Query,
    /// Changes engine state: push, ignore, skip
    Mutation,
    /// Per-request metadata lookup; large and slow responses
    Metadata,
}

impl fmt::Display for CommandClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CommandClass::Probe => "probe",
            CommandClass::Query => "query",
            CommandClass::Mutation => "mutation",
            CommandClass::Metadata => "metadata",
        };
        f.write_str(name)
    }
}

/// A single verb with its arguments and the line that ends its response.
///
/// Immutable once built. Construction refuses anything that would corrupt
/// the line framing: an empty verb, whitespace inside the verb, or a line
/// break inside an argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    verb: String,
    args: Vec<String>,
    class: CommandClass,
    terminator: String,
}

impl Command {
    pub fn new<I, S>(verb: impl Into<String>, args: I, class: CommandClass) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let verb = verb.into();
        if verb.is_empty() {
            return Err(Error::validation("command verb", verb, "must not be empty"));
        }
        if verb.chars().any(char::is_whitespace) {
            return Err(Error::validation(
                "command verb",
                verb,
                "must not contain whitespace",
            ));
        }

        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        if let Some(bad) = args.iter().find(|a| a.contains(['\r', '\n'])) {
            return Err(Error::validation(
                "command argument",
                bad.escape_debug().to_string(),
                "must not contain line breaks",
            ));
        }

        Ok(Self {
            verb,
            args,
            class,
            terminator: DEFAULT_TERMINATOR.to_string(),
        })
    }

    /// Shorthand for an argument-less command
    pub fn bare(verb: impl Into<String>, class: CommandClass) -> Result<Self> {
        Self::new(verb, std::iter::empty::<String>(), class)
    }

    /// Replace the response terminator
    #[must_use]
    pub fn with_terminator(mut self, terminator: impl Into<String>) -> Self {
        self.terminator = terminator.into();
        self
    }

    pub fn verb(&self) -> &str {
        &self.verb
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn class(&self) -> CommandClass {
        self.class
    }

    pub fn terminator(&self) -> &str {
        &self.terminator
    }

    /// The command line as sent, without the trailing newline
    pub fn text(&self) -> String {
        let mut text = self.verb.clone();
        for arg in &self.args {
            text.push(' ');
            text.push_str(arg);
        }
        text
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_joins_args_with_spaces() {
        let cmd = Command::new("queue.push", ["/music/a b.flac"], CommandClass::Mutation).unwrap();
        assert_eq!(cmd.text(), "queue.push /music/a b.flac");
        assert_eq!(cmd.terminator(), "END");
    }

    #[test]
    fn test_rejects_line_breaks_in_arguments() {
        let err = Command::new("queue.push", ["/a.flac\nqueue.skip"], CommandClass::Mutation)
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn test_rejects_bad_verbs() {
        assert!(Command::bare("", CommandClass::Query).is_err());
        assert!(Command::bare("queue queue", CommandClass::Query).is_err());
    }
}
