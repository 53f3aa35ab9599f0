//! Audio device backends

use tm_core::config::{AudioBackendKind, AudioConfig};

use crate::error::Result;

pub mod cpal_backend;
pub mod null;

pub use cpal_backend::CpalAudioSink;
pub use null::{NullAudioSink, NullProbe};

/// Fixed device format negotiated at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceSpec {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Interleaved channel count
    pub channels: u16,
    /// Device queue size in frames per channel
    pub frames: usize,
}

impl DeviceSpec {
    pub fn new(sample_rate: u32, channels: u16, frames: usize) -> Self {
        Self {
            sample_rate,
            channels,
            frames,
        }
    }

    /// Device queue size in interleaved samples
    pub fn buffer_samples(&self) -> usize {
        self.frames * usize::from(self.channels)
    }
}

impl From<&AudioConfig> for DeviceSpec {
    fn from(config: &AudioConfig) -> Self {
        Self::new(
            config.sample_rate,
            config.channels,
            config.device_frames as usize,
        )
    }
}

/// Output device as seen by the mixer.
///
/// Both queries are non-blocking. The mixer asks how much the device can take
/// and produces exactly that much, so the device never has to wait on it.
pub trait AudioSink {
    /// Prepare the device for playback
    fn start(&mut self) -> Result<()>;
    /// Stop playback
    fn stop(&mut self);
    /// Negotiated device format
    fn spec(&self) -> DeviceSpec;
    /// Interleaved samples the device can accept right now. May be negative
    /// when the device reports being over-full.
    fn samples_needed(&self) -> i32;
    /// Queue interleaved samples for playback
    fn enqueue(&mut self, samples: &[f32]) -> Result<()>;
}

/// Open the device backend selected in `config` and report what was opened
pub fn open_sink(config: &AudioConfig) -> Result<Box<dyn AudioSink>> {
    let spec = DeviceSpec::from(config);
    match config.backend {
        AudioBackendKind::Cpal => Ok(Box::new(CpalAudioSink::open(spec)?)),
        AudioBackendKind::Null => {
            tracing::info!("Audio: null backend, output is discarded");
            Ok(Box::new(NullAudioSink::new(spec)))
        }
    }
}
