//! Building and spawning the engine command

use onair_config::EngineSettings;
use onair_core::{Error, Result};
use std::ffi::OsString;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

/// PATH for the engine: toolchain directories first, then our own PATH
pub fn child_path(toolchain_dirs: &[PathBuf]) -> Result<OsString> {
    let inherited = std::env::var_os("PATH").unwrap_or_default();
    let dirs = toolchain_dirs
        .iter()
        .cloned()
        .chain(std::env::split_paths(&inherited));
    std::env::join_paths(dirs)
        .map_err(|e| Error::configuration(format!("invalid toolchain directory: {e}")))
}

/// Resolve the engine binary.
///
/// Paths with a directory component must name an executable file; bare
/// names are looked up on `search_path`.
pub fn resolve_binary(binary: &Path, search_path: &OsString) -> Result<PathBuf> {
    if binary.as_os_str().is_empty() {
        return Err(Error::process_start(binary, "no engine binary configured"));
    }

    if binary.components().count() > 1 {
        let metadata = std::fs::metadata(binary)
            .map_err(|e| Error::process_start(binary, format!("cannot stat binary: {e}")))?;
        if !metadata.is_file() {
            return Err(Error::process_start(binary, "not a regular file"));
        }
        if metadata.permissions().mode() & 0o111 == 0 {
            return Err(Error::process_start(binary, "not executable"));
        }
        return Ok(binary.to_path_buf());
    }

    let cwd = std::env::current_dir()
        .map_err(|e| Error::process_start(binary, format!("cannot read working directory: {e}")))?;
    which::which_in(binary, Some(search_path), cwd)
        .map_err(|e| Error::process_start(binary, format!("not found on PATH: {e}")))
}

/// Validate the settings and spawn the engine.
///
/// Stdout and stderr are piped and forwarded to tracing by the returned
/// tasks.
pub(crate) fn spawn_engine(settings: &EngineSettings) -> Result<(Child, Vec<JoinHandle<()>>)> {
    let path = child_path(&settings.toolchain_dirs)?;
    let binary = resolve_binary(&settings.binary, &path)?;

    if let Some(config_file) = &settings.config_file {
        if !config_file.is_file() {
            return Err(Error::process_start(
                &binary,
                format!("engine config file {} does not exist", config_file.display()),
            ));
        }
    }
    if let Some(dir) = &settings.working_dir {
        if !dir.is_dir() {
            return Err(Error::process_start(
                &binary,
                format!("working directory {} does not exist", dir.display()),
            ));
        }
    }

    let mut cmd = Command::new(&binary);
    cmd.args(&settings.args)
        .envs(&settings.env)
        .env("PATH", &path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    if let Some(config_file) = &settings.config_file {
        cmd.arg(config_file);
        if let Some(var) = &settings.config_env_var {
            cmd.env(var, config_file);
        }
    }
    if let Some(dir) = &settings.working_dir {
        cmd.current_dir(dir);
    }

    let mut child = cmd
        .spawn()
        .map_err(|e| Error::process_start(&binary, format!("failed to spawn: {e}")))?;
    let pid = child.id().unwrap_or_default();

    let mut forwarders = Vec::new();
    if let Some(stdout) = child.stdout.take() {
        forwarders.push(forward_lines(stdout, pid, "stdout"));
    }
    if let Some(stderr) = child.stderr.take() {
        forwarders.push(forward_lines(stderr, pid, "stderr"));
    }

    tracing::info!(
        pid,
        binary = %binary.display(),
        config = ?settings.config_file,
        "engine started"
    );
    Ok((child, forwarders))
}

fn forward_lines<R>(reader: R, pid: u32, stream: &'static str) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => tracing::info!(target: "engine", pid, stream, "{line}"),
                Ok(None) => break,
                Err(e) => {
                    tracing::debug!(target: "engine", pid, stream, error = %e, "output closed");
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_child_path_prepends_toolchain_dirs() {
        let path = child_path(&[PathBuf::from("/opt/engine/bin")]).unwrap();
        let first = std::env::split_paths(&path).next().unwrap();
        assert_eq!(first, PathBuf::from("/opt/engine/bin"));
    }

    #[test]
    fn test_resolve_binary_rejects_missing_and_non_executable() {
        let temp_dir = TempDir::new().unwrap();
        let search = OsString::from(temp_dir.path());

        let missing = temp_dir.path().join("missing");
        assert!(matches!(
            resolve_binary(&missing, &search),
            Err(Error::ProcessStart { .. })
        ));

        let plain = temp_dir.path().join("plain");
        std::fs::write(&plain, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&plain, std::fs::Permissions::from_mode(0o644)).unwrap();
        assert!(matches!(
            resolve_binary(&plain, &search),
            Err(Error::ProcessStart { .. })
        ));
    }

    #[test]
    fn test_resolve_bare_name_through_search_path() {
        let temp_dir = TempDir::new().unwrap();
        let engine = temp_dir.path().join("fake-engine");
        std::fs::write(&engine, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&engine, std::fs::Permissions::from_mode(0o755)).unwrap();

        let search = OsString::from(temp_dir.path());
        let resolved = resolve_binary(Path::new("fake-engine"), &search).unwrap();
        assert_eq!(resolved, engine);

        assert!(resolve_binary(Path::new("no-such-engine"), &search).is_err());
    }
}
