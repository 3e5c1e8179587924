//! Signal helpers for the supervisor

use onair_core::{Error, Result};

pub const DEFAULT_TERMINATE_SIGNAL: i32 = libc::SIGTERM;

/// Send `signal` to `pid`; a process that is already gone is not an error
pub fn send_signal(pid: u32, signal: i32) -> Result<()> {
    let rc = unsafe { libc::kill(pid as libc::pid_t, signal) };
    if rc == 0 {
        return Ok(());
    }
    let err = std::io::Error::last_os_error();
    if err.raw_os_error() == Some(libc::ESRCH) {
        tracing::debug!(pid, signal, "process already gone");
        return Ok(());
    }
    Err(Error::process(pid, format!("failed to send signal {signal}: {err}")))
}
