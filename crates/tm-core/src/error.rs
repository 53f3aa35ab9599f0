//! Error types for tidemix core

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading, saving or validating configuration
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("No configuration directory available on this platform")]
    NoConfigDir,
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
