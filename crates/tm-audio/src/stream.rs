//! Decoded sound assets

use std::time::Duration;

/// Immutable mono PCM data for one sound asset.
///
/// Shared through `Arc<SoundStream>` by every component that plays it; frames
/// copy samples out, so a stream may be dropped while its effects still play.
#[derive(Debug, Clone, PartialEq)]
pub struct SoundStream {
    samples: Box<[f32]>,
    sample_rate: u32,
}

impl SoundStream {
    /// Wrap already decoded mono samples
    pub fn new(samples: impl Into<Box<[f32]>>, sample_rate: u32) -> Self {
        Self {
            samples: samples.into(),
            sample_rate,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Playback length at the stream's sample rate
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples.len() as f64 / f64::from(self.sample_rate))
    }
}
