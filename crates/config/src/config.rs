//! Centralized configuration for onair
//!
//! `Config` is the single source of truth for where the control socket lives,
//! how the engine is launched, which verbs the engine understands and how long
//! any socket operation may take. It is immutable after loading and cheap to
//! clone into the components that need a slice of it.

use onair_core::{
    Error, Result, DEFAULT_ERROR_MARKERS, DEFAULT_PROBE_VERB, DEFAULT_TERMINATOR,
    MAX_READINESS_BUDGET_SECS,
};
use onair_utils::XdgPaths;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Complete runtime configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Control socket exposed by the engine
    pub socket_path: PathBuf,

    /// Sentinel whose presence disables generation and enqueue
    pub kill_switch_path: PathBuf,

    /// How to launch the engine
    pub engine: EngineSettings,

    /// Deadlines for socket operations
    pub timeouts: TimeoutSettings,

    /// Readiness probe budget
    pub readiness: ReadinessSettings,

    /// Wire vocabulary of the engine
    pub protocol: ProtocolSettings,

    /// Initial enqueue performed once the engine is up
    pub seed: SeedSettings,
}

/// Engine process settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineSettings {
    /// Engine executable; bare names are looked up on PATH
    pub binary: PathBuf,

    /// Arguments placed before the config file argument
    pub args: Vec<String>,

    /// Engine configuration (script) file, passed as the last argument
    pub config_file: Option<PathBuf>,

    /// Working directory for the engine process
    pub working_dir: Option<PathBuf>,

    /// Extra environment variables for the engine
    pub env: BTreeMap<String, String>,

    /// Variable that receives the config file path
    pub config_env_var: Option<String>,

    /// Toolchain directories prepended to PATH
    pub toolchain_dirs: Vec<PathBuf>,

    /// Account the engine runs as; pushed tracks must be readable by it
    pub user: Option<String>,

    /// Grace period between the terminate signal and SIGKILL
    pub terminate_grace_ms: u64,
}

/// Socket deadlines, in milliseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimeoutSettings {
    pub connect_ms: u64,
    pub command_ms: u64,
    pub metadata_ms: u64,
    pub probe_ms: u64,
}

/// Readiness probe budget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReadinessSettings {
    pub attempts: u32,
    pub interval_ms: u64,
}

/// Command verbs and response vocabulary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProtocolSettings {
    pub terminator: String,
    pub probe_verb: String,
    pub queue_verb: String,
    pub push_verb: String,
    pub ignore_verb: String,
    pub skip_verb: String,
    pub metadata_verb: String,
    /// Case-sensitive substrings marking a rejected command
    pub error_markers: Vec<String>,
}

/// Seed track selection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeedSettings {
    /// Fixed track pushed on start
    pub track: Option<PathBuf>,
    /// Library scanned for a random track when no fixed track is set
    pub library_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            socket_path: XdgPaths::socket_file(),
            kill_switch_path: XdgPaths::kill_switch_file(),
            engine: EngineSettings::default(),
            timeouts: TimeoutSettings::default(),
            readiness: ReadinessSettings::default(),
            protocol: ProtocolSettings::default(),
            seed: SeedSettings::default(),
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("liquidsoap"),
            args: Vec::new(),
            config_file: None,
            working_dir: None,
            env: BTreeMap::new(),
            config_env_var: None,
            toolchain_dirs: Vec::new(),
            user: None,
            terminate_grace_ms: 10_000,
        }
    }
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            connect_ms: 2_000,
            command_ms: 5_000,
            metadata_ms: 10_000,
            probe_ms: 1_000,
        }
    }
}

impl Default for ReadinessSettings {
    fn default() -> Self {
        Self {
            attempts: 30,
            interval_ms: 1_000,
        }
    }
}

impl Default for ProtocolSettings {
    fn default() -> Self {
        Self {
            terminator: DEFAULT_TERMINATOR.to_string(),
            probe_verb: DEFAULT_PROBE_VERB.to_string(),
            queue_verb: "queue.queue".to_string(),
            push_verb: "queue.push".to_string(),
            ignore_verb: "queue.ignore".to_string(),
            skip_verb: "queue.skip".to_string(),
            metadata_verb: "request.metadata".to_string(),
            error_markers: DEFAULT_ERROR_MARKERS.iter().map(|m| m.to_string()).collect(),
        }
    }
}

impl EngineSettings {
    pub fn terminate_grace(&self) -> Duration {
        Duration::from_millis(self.terminate_grace_ms)
    }
}

impl TimeoutSettings {
    pub fn connect(&self) -> Duration {
        Duration::from_millis(self.connect_ms)
    }

    pub fn command(&self) -> Duration {
        Duration::from_millis(self.command_ms)
    }

    pub fn metadata(&self) -> Duration {
        Duration::from_millis(self.metadata_ms)
    }

    pub fn probe(&self) -> Duration {
        Duration::from_millis(self.probe_ms)
    }
}

impl ReadinessSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Upper bound on the time the probe may take
    pub fn budget(&self) -> Duration {
        self.interval() * self.attempts
    }
}

impl Config {
    /// Reject settings that would make an operation unbounded or unframeable
    pub fn validate(&self) -> Result<()> {
        let t = &self.timeouts;
        for (name, value) in [
            ("timeouts.connect_ms", t.connect_ms),
            ("timeouts.command_ms", t.command_ms),
            ("timeouts.metadata_ms", t.metadata_ms),
            ("timeouts.probe_ms", t.probe_ms),
            ("readiness.interval_ms", self.readiness.interval_ms),
        ] {
            if value == 0 {
                return Err(Error::configuration(format!("{name} must be greater than zero")));
            }
        }
        if self.readiness.attempts == 0 {
            return Err(Error::configuration(
                "readiness.attempts must be greater than zero",
            ));
        }
        let budget_ms = self
            .readiness
            .interval_ms
            .saturating_mul(u64::from(self.readiness.attempts));
        if budget_ms > MAX_READINESS_BUDGET_SECS * 1000 {
            return Err(Error::configuration(format!(
                "readiness budget (attempts * interval_ms) exceeds {MAX_READINESS_BUDGET_SECS} s"
            )));
        }

        let p = &self.protocol;
        if p.terminator.trim().is_empty() || p.terminator.contains(['\r', '\n']) {
            return Err(Error::configuration(
                "protocol.terminator must be a non-empty single line",
            ));
        }
        for (name, verb) in [
            ("protocol.probe_verb", &p.probe_verb),
            ("protocol.queue_verb", &p.queue_verb),
            ("protocol.push_verb", &p.push_verb),
            ("protocol.ignore_verb", &p.ignore_verb),
            ("protocol.skip_verb", &p.skip_verb),
            ("protocol.metadata_verb", &p.metadata_verb),
        ] {
            if verb.is_empty() || verb.chars().any(char::is_whitespace) {
                return Err(Error::configuration(format!(
                    "{name} must be a single non-empty word, got '{verb}'"
                )));
            }
        }
        if p.error_markers.iter().any(String::is_empty) {
            return Err(Error::configuration(
                "protocol.error_markers must not contain empty markers",
            ));
        }

        if self.socket_path.as_os_str().is_empty() {
            return Err(Error::configuration("socket_path must not be empty"));
        }
        Ok(())
    }
}
