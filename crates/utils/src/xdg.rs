use onair_core::{KILL_SWITCH_FILENAME, SOCKET_FILENAME};
use std::env;
use std::path::PathBuf;

/// XDG Base Directory paths for onair
pub struct XdgPaths;

impl XdgPaths {
    /// Get XDG_CONFIG_HOME/onair or fallback
    pub fn config_dir() -> PathBuf {
        env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::home_dir()
                    .map(|home| home.join(".config"))
                    .unwrap_or_else(|| PathBuf::from(".config"))
            })
            .join("onair")
    }

    /// Get XDG_STATE_HOME/onair or fallback
    pub fn state_dir() -> PathBuf {
        env::var("XDG_STATE_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::home_dir()
                    .map(|home| home.join(".local/state"))
                    .unwrap_or_else(|| PathBuf::from(".local/state"))
            })
            .join("onair")
    }

    /// Per-user runtime directory for the control socket.
    ///
    /// Prefers `$XDG_RUNTIME_DIR` (per-user, 0700). The `/tmp` fallback is
    /// scoped by UID so two users on one host never share a socket.
    pub fn runtime_dir() -> PathBuf {
        if let Ok(runtime_dir) = env::var("XDG_RUNTIME_DIR") {
            return PathBuf::from(runtime_dir).join("onair");
        }
        env::temp_dir().join(format!("onair-{}", users::get_current_uid()))
    }

    /// Default control socket location
    pub fn socket_file() -> PathBuf {
        Self::runtime_dir().join(SOCKET_FILENAME)
    }

    /// Default kill-switch sentinel location
    pub fn kill_switch_file() -> PathBuf {
        Self::state_dir().join(KILL_SWITCH_FILENAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn with_var<F: FnOnce()>(key: &str, value: Option<&str>, f: F) {
        let original = env::var(key).ok();
        match value {
            Some(v) => env::set_var(key, v),
            None => env::remove_var(key),
        }
        f();
        match original {
            Some(v) => env::set_var(key, v),
            None => env::remove_var(key),
        }
    }

    #[test]
    #[serial]
    fn test_xdg_paths_with_env() {
        with_var("XDG_CONFIG_HOME", Some("/tmp/config"), || {
            assert_eq!(XdgPaths::config_dir(), PathBuf::from("/tmp/config/onair"));
        });
        with_var("XDG_STATE_HOME", Some("/tmp/state"), || {
            assert_eq!(
                XdgPaths::kill_switch_file(),
                PathBuf::from("/tmp/state/onair/generation.disabled")
            );
        });
    }

    #[test]
    #[serial]
    fn test_socket_prefers_runtime_dir() {
        with_var("XDG_RUNTIME_DIR", Some("/run/user/1000"), || {
            assert_eq!(
                XdgPaths::socket_file(),
                PathBuf::from("/run/user/1000/onair/engine.sock")
            );
        });
    }

    #[test]
    #[serial]
    fn test_socket_fallback_is_uid_scoped() {
        with_var("XDG_RUNTIME_DIR", None, || {
            let dir = XdgPaths::runtime_dir();
            let name = dir.file_name().unwrap().to_string_lossy().into_owned();
            assert_eq!(name, format!("onair-{}", users::get_current_uid()));
        });
    }
}
