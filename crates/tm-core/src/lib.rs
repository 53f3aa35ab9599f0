//! Core infrastructure shared by the tidemix crates
//!
//! - [`config`]: TOML-backed configuration with startup validation
//! - [`error`]: error type for configuration and I/O failures
//! - [`logging`]: tracing subscriber setup and target-scoped log macros

pub mod config;
pub mod error;
pub mod logging;

pub use config::Config;
pub use error::{CoreError, Result};
