//! Core domain types, errors, and constants for the `onair` workspace.
//!
//! Every crate in the workspace reports failures through the single
//! [`Error`] enum defined here, so that a caller at the top (the CLI or a
//! timer-driven script) can tell an infrastructure problem apart
//! from a command the engine explicitly rejected.
//!
//! ## Key Components
//!
//! - **`errors`**: the `Error` enum, the `Result` alias, builder constructors
//!   and the `IoResultExt` path-context extension.
//! - **`types`**: engine-facing value types such as `RequestId` and
//!   `QueueEntry`.
//! - **`constants`**: environment variable names, default file names and the
//!   process exit codes shared by every command-line entry point.

pub mod constants;
pub mod errors;
pub mod types;

pub use self::{
    constants::*,
    errors::{Error, IoResultExt, Result},
    types::*,
};
