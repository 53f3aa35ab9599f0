//! Audio error types

use thiserror::Error;

/// Errors raised by the sound system and its device backends
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("No audio output device available")]
    DeviceUnavailable,
    #[error("Unsupported device format: {0}")]
    UnsupportedFormat(String),
    #[error("Failed to build output stream: {0}")]
    StreamBuild(String),
    #[error("Failed to start output stream: {0}")]
    StreamPlay(String),
    #[error("Device queue overflow: {dropped} of {submitted} samples dropped")]
    Overflow { submitted: usize, dropped: usize },
    #[error("Frame capacity {frame_capacity} does not divide device frame size {device_frames}")]
    FrameSizeMismatch {
        frame_capacity: usize,
        device_frames: usize,
    },
    #[error("Device must be stereo, got {0} channels")]
    ChannelCount(u16),
    #[error("Unknown sound resource handle {0}")]
    UnknownResource(u16),
    #[error("Too many sound resources on one component")]
    TooManyResources,
    #[error("Entity {0} has no sound component")]
    UnknownEntity(u32),
    #[error("Entity {0} already has a sound component")]
    EntityAlreadyAttached(u32),
    #[error("Configuration error: {0}")]
    Config(#[from] tm_core::CoreError),
}

pub type Result<T> = std::result::Result<T, AudioError>;
