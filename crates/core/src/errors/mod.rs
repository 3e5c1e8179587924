//! Error types and result extensions for onair operations

mod builders;
mod conversions;
mod exit;
mod extensions;
mod types;

pub use exit::FailureClass;
pub use extensions::*;
pub use types::{Error, Result};
