//! cpal audio backend
//!
//! The mixer pushes interleaved samples into a ring buffer sized to the
//! device queue; the cpal callback pops from it and pads underruns with
//! silence. Headroom reported to the mixer is the ring's free space.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use ringbuf::{
    traits::{Consumer, Observer, Producer, Split},
    HeapRb,
};
use tm_core::device_debug;

use super::{AudioSink, DeviceSpec};
use crate::error::{AudioError, Result};

/// Output on the host's default device
pub struct CpalAudioSink {
    spec: DeviceSpec,
    producer: ringbuf::HeapProd<f32>,
    stream: cpal::Stream,
}

impl CpalAudioSink {
    /// Open the default output device with the requested format.
    ///
    /// Fails when no device exists or the device cannot play f32 at the
    /// requested rate and channel count. Callers decide whether that is
    /// fatal or whether to run muted.
    pub fn open(spec: DeviceSpec) -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(AudioError::DeviceUnavailable)?;
        let name = device.name().unwrap_or_else(|_| "unknown".to_string());

        let supported = device
            .supported_output_configs()
            .map_err(|e| AudioError::UnsupportedFormat(e.to_string()))?
            .any(|range| {
                range.channels() == spec.channels
                    && range.sample_format() == cpal::SampleFormat::F32
                    && range.min_sample_rate().0 <= spec.sample_rate
                    && spec.sample_rate <= range.max_sample_rate().0
            });
        if !supported {
            return Err(AudioError::UnsupportedFormat(format!(
                "{name} cannot play f32 at {} Hz with {} channels",
                spec.sample_rate, spec.channels
            )));
        }

        let config = cpal::StreamConfig {
            channels: spec.channels,
            sample_rate: cpal::SampleRate(spec.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let ring = HeapRb::<f32>::new(spec.buffer_samples());
        let (producer, mut consumer) = ring.split();

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let popped = consumer.pop_slice(data);
                    data[popped..].fill(0.0);
                },
                |err| tracing::error!(target: "device", "Audio stream error: {}", err),
                None,
            )
            .map_err(|e| AudioError::StreamBuild(e.to_string()))?;

        tracing::info!(
            "Audio: device {}, freq {}, channels {}, frames {}",
            name,
            spec.sample_rate,
            spec.channels,
            spec.frames
        );

        Ok(Self {
            spec,
            producer,
            stream,
        })
    }
}

impl AudioSink for CpalAudioSink {
    fn start(&mut self) -> Result<()> {
        self.stream
            .play()
            .map_err(|e| AudioError::StreamPlay(e.to_string()))?;
        device_debug!("Audio stream started");
        Ok(())
    }

    fn stop(&mut self) {
        if let Err(e) = self.stream.pause() {
            tracing::warn!(target: "device", "Failed to pause audio stream: {}", e);
        }
        device_debug!("Audio stream stopped");
    }

    fn spec(&self) -> DeviceSpec {
        self.spec
    }

    fn samples_needed(&self) -> i32 {
        i32::try_from(self.producer.vacant_len()).unwrap_or(i32::MAX)
    }

    fn enqueue(&mut self, samples: &[f32]) -> Result<()> {
        let pushed = self.producer.push_slice(samples);
        if pushed < samples.len() {
            return Err(AudioError::Overflow {
                submitted: samples.len(),
                dropped: samples.len() - pushed,
            });
        }
        Ok(())
    }
}
