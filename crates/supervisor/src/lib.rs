//! Supervision of the broadcast engine process
//!
//! [`ProcessSupervisor`] starts the engine, waits for its control socket,
//! runs the one-off seed step and later stops the engine again. It never
//! restarts a crashed engine; that is left to the surrounding process manager.

mod launch;
mod process;
mod supervisor;
mod utils;

#[cfg(test)]
mod tests;

pub use launch::{child_path, resolve_binary};
pub use process::{ManagedProcess, ProcessState};
pub use supervisor::ProcessSupervisor;
pub use utils::{send_signal, DEFAULT_TERMINATE_SIGNAL};
