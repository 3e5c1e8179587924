//! Configuration loading and validation for onair
//!
//! This crate turns defaults, the JSON config file, environment variables and
//! command-line overrides into one validated [`Config`].

pub mod config;
pub mod loader;

#[cfg(test)]
mod config_tests;

pub use config::*;
pub use loader::*;
