//! Out-of-band switch that disables automated content generation

use onair_config::Config;
use onair_core::{Error, IoResultExt, Result};
use std::path::{Path, PathBuf};

/// A sentinel file whose mere existence disables generation.
///
/// Checked on every call, never cached: an operator creating the file is
/// honoured by the very next check. Contents are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KillSwitch {
    sentinel: PathBuf,
}

impl KillSwitch {
    pub fn new(sentinel: impl Into<PathBuf>) -> Self {
        Self {
            sentinel: sentinel.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.kill_switch_path.clone())
    }

    pub fn sentinel(&self) -> &Path {
        &self.sentinel
    }

    pub fn is_engaged(&self) -> bool {
        // A dangling symlink still counts as present.
        std::fs::symlink_metadata(&self.sentinel).is_ok()
    }

    /// Fails with `GenerationDisabled` while engaged
    pub fn ensure_disengaged(&self) -> Result<()> {
        if self.is_engaged() {
            tracing::info!(sentinel = %self.sentinel.display(), "kill switch engaged, skipping");
            return Err(Error::generation_disabled(&self.sentinel));
        }
        Ok(())
    }

    pub fn engage(&self) -> Result<()> {
        if let Some(parent) = self.sentinel.parent() {
            std::fs::create_dir_all(parent).with_path(parent, "create directory")?;
        }
        std::fs::write(&self.sentinel, b"").with_path(&self.sentinel, "create kill switch")?;
        tracing::info!(sentinel = %self.sentinel.display(), "kill switch engaged");
        Ok(())
    }

    /// Remove the sentinel; returns whether it was present
    pub fn disengage(&self) -> Result<bool> {
        match std::fs::remove_file(&self.sentinel) {
            Ok(()) => {
                tracing::info!(sentinel = %self.sentinel.display(), "kill switch disengaged");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::file_system(&self.sentinel, "remove kill switch", e)),
        }
    }
}
