//! Shared utilities for onair
//!
//! Logging setup, filesystem locations and the retry helper used by every
//! crate in the workspace.

pub mod retry;
pub mod tracing;
pub mod xdg;

pub use retry::retry_once;
pub use xdg::*;
