/// Constants used throughout the onair codebase
// Environment variable names
pub const ONAIR_CONFIG_VAR: &str = "ONAIR_CONFIG";
pub const ONAIR_SOCKET_VAR: &str = "ONAIR_SOCKET";
pub const ONAIR_KILL_SWITCH_VAR: &str = "ONAIR_KILL_SWITCH";
pub const ONAIR_ENGINE_BIN_VAR: &str = "ONAIR_ENGINE_BIN";
pub const ONAIR_LOG_VAR: &str = "ONAIR_LOG";

// Default file names, resolved under the XDG directories
pub const CONFIG_FILENAME: &str = "config.json";
pub const SOCKET_FILENAME: &str = "engine.sock";
pub const KILL_SWITCH_FILENAME: &str = "generation.disabled";

// Control protocol defaults
pub const DEFAULT_TERMINATOR: &str = "END";
pub const DEFAULT_PROBE_VERB: &str = "help";
pub const DEFAULT_ERROR_MARKERS: &[&str] =
    &["ERROR", "Error:", "Unknown command", "No such request"];

// Upper bound on attempts × interval for the readiness probe
pub const MAX_READINESS_BUDGET_SECS: u64 = 24 * 60 * 60;

// Audio file extensions considered when picking a seed track from a library
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "flac", "ogg", "opus", "wav", "m4a", "aac"];

// Process exit codes surfaced by every command-line entry point
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_TRANSPORT: i32 = 2;
pub const EXIT_REJECTED: i32 = 3;
pub const EXIT_DISABLED: i32 = 4;
