//! Configuration for the sound engine
//!
//! Stored as TOML under the platform configuration directory
//! (`<config_dir>/tidemix/config.toml`). Every section has defaults, so a
//! partial file only overrides what it names.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Audio device and mixer settings
    pub audio: AudioConfig,
    /// Logging and diagnostics
    pub debug: DebugConfig,
}

/// Which device backend the sound system opens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioBackendKind {
    /// Host default output device through cpal
    Cpal,
    /// Simulated device, no sound output
    Null,
}

/// Audio device and mixer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub backend: AudioBackendKind,
    /// Output sample rate in Hz
    pub sample_rate: u32,
    /// Output channel count (the mixer writes interleaved stereo)
    pub channels: u16,
    /// Device queue size in frames per channel
    pub device_frames: u32,
    /// Mono samples held by one pooled frame
    pub frame_capacity: u32,
    /// Number of frames preallocated in the pool
    pub pool_capacity: u32,
    /// Distance at which attenuation starts
    pub min_distance: f32,
    /// Distance at which an effect becomes silent
    pub max_distance: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            backend: AudioBackendKind::Cpal,
            sample_rate: 48_000,
            channels: 2,
            device_frames: 2048,
            frame_capacity: 256,
            pool_capacity: 512,
            min_distance: 0.0,
            max_distance: 50.0,
        }
    }
}

/// Log verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Logging and diagnostics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    pub log_level: LogLevel,
    pub log_to_file: bool,
    pub log_path: PathBuf,
    /// Record per-tick produced/required sample counts
    pub mix_history: bool,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            log_to_file: false,
            log_path: PathBuf::from("tidemix.log"),
            mix_history: false,
        }
    }
}

impl Config {
    /// Default location of the config file
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("tidemix").join("config.toml"))
            .ok_or(CoreError::NoConfigDir)
    }

    /// Load and validate the config from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(Self::default_path()?)
    }

    /// Load and validate the config from `path`
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CoreError::NotFound(path.to_path_buf()));
        }
        let text = fs::read_to_string(path)?;
        let config = Self::from_toml(&text)?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate a TOML document
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the config to `path`, creating parent directories
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Check the invariants the mixer relies on
    pub fn validate(&self) -> Result<()> {
        self.audio.validate()
    }
}

impl AudioConfig {
    /// Check the invariants the mixer relies on.
    ///
    /// A pooled frame must tile the device queue exactly, so
    /// `frame_capacity` has to divide `device_frames`.
    pub fn validate(&self) -> Result<()> {
        if self.channels != 2 {
            return Err(CoreError::Invalid(format!(
                "channels must be 2, got {}",
                self.channels
            )));
        }
        if self.sample_rate == 0 {
            return Err(CoreError::Invalid("sample_rate must be non-zero".into()));
        }
        if self.pool_capacity == 0 {
            return Err(CoreError::Invalid("pool_capacity must be non-zero".into()));
        }
        if self.frame_capacity == 0 || self.device_frames % self.frame_capacity != 0 {
            return Err(CoreError::Invalid(format!(
                "frame_capacity {} must evenly divide device_frames {}",
                self.frame_capacity, self.device_frames
            )));
        }
        if !(self.max_distance > self.min_distance) {
            return Err(CoreError::Invalid(format!(
                "max_distance {} must exceed min_distance {}",
                self.max_distance, self.min_distance
            )));
        }
        Ok(())
    }
}
