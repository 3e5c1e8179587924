//! Configuration loader for onair
//!
//! Layers, lowest precedence first: built-in defaults, the JSON config file,
//! `ONAIR_*` environment variables, then explicit overrides from the command
//! line.

use crate::config::Config;
use onair_core::{
    constants::{
        CONFIG_FILENAME, ONAIR_CONFIG_VAR, ONAIR_ENGINE_BIN_VAR, ONAIR_KILL_SWITCH_VAR,
        ONAIR_SOCKET_VAR,
    },
    Error, IoResultExt, Result,
};
use onair_utils::XdgPaths;
use std::path::{Path, PathBuf};

/// Configuration loader that handles all startup configuration
#[derive(Debug, Default)]
pub struct ConfigLoader {
    /// Explicit config file; must exist when given
    file: Option<PathBuf>,
    /// Socket override from the command line
    socket_path: Option<PathBuf>,
    /// Kill-switch override from the command line
    kill_switch_path: Option<PathBuf>,
    /// Skip the environment layer (tests)
    ignore_env: bool,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from this file instead of the discovered one
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Override the control socket path
    pub fn socket_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.socket_path = Some(path.into());
        self
    }

    /// Override the kill-switch sentinel path
    pub fn kill_switch_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.kill_switch_path = Some(path.into());
        self
    }

    /// Do not consult `ONAIR_*` environment variables
    pub fn ignore_env(mut self) -> Self {
        self.ignore_env = true;
        self
    }

    /// Load the configuration
    pub fn load(self) -> Result<Config> {
        let mut config = match self.config_file()? {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading configuration file");
                read_config_file(&path)?
            }
            None => Config::default(),
        };

        if !self.ignore_env {
            apply_env_overrides(&mut config);
        }
        if let Some(socket) = self.socket_path {
            config.socket_path = socket;
        }
        if let Some(sentinel) = self.kill_switch_path {
            config.kill_switch_path = sentinel;
        }

        config.validate()?;
        Ok(config)
    }

    /// Resolve which file to read: explicit, then `ONAIR_CONFIG`, then the
    /// XDG default when it exists
    fn config_file(&self) -> Result<Option<PathBuf>> {
        if let Some(path) = &self.file {
            if !path.is_file() {
                return Err(Error::configuration(format!(
                    "config file '{}' does not exist",
                    path.display()
                )));
            }
            return Ok(Some(path.clone()));
        }

        if !self.ignore_env {
            if let Ok(path) = std::env::var(ONAIR_CONFIG_VAR) {
                let path = PathBuf::from(path);
                if !path.is_file() {
                    return Err(Error::configuration(format!(
                        "{ONAIR_CONFIG_VAR} points at missing file '{}'",
                        path.display()
                    )));
                }
                return Ok(Some(path));
            }

            let default = XdgPaths::config_dir().join(CONFIG_FILENAME);
            if default.is_file() {
                return Ok(Some(default));
            }
        }

        Ok(None)
    }
}

/// Parse a JSON config file; absent sections take their defaults
pub fn read_config_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).with_path(path, "read config")?;
    serde_json::from_str(&content).map_err(|e| {
        Error::configuration(format!("invalid config file '{}': {e}", path.display()))
    })
}

fn apply_env_overrides(config: &mut Config) {
    if let Some(socket) = env_path(ONAIR_SOCKET_VAR) {
        config.socket_path = socket;
    }
    if let Some(sentinel) = env_path(ONAIR_KILL_SWITCH_VAR) {
        config.kill_switch_path = sentinel;
    }
    if let Some(binary) = env_path(ONAIR_ENGINE_BIN_VAR) {
        config.engine.binary = binary;
    }
}

fn env_path(var: &str) -> Option<PathBuf> {
    std::env::var_os(var)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}
