//! Null audio backend (no sound output)
//!
//! Simulates a device queue: enqueued samples fill the queue and stay there
//! until [`NullProbe::drain`] plays them back. A sink built with
//! [`NullAudioSink::recording`] also keeps every accepted sample so tests can
//! check the mixed output; the default sink only counts them.

use std::sync::Arc;

use parking_lot::Mutex;

use super::{AudioSink, DeviceSpec};
use crate::error::{AudioError, Result};

#[derive(Debug, Default)]
struct NullState {
    started: bool,
    queued: usize,
    fixed_demand: Option<usize>,
    fail_next: bool,
    enqueue_calls: usize,
    record: bool,
    output: Vec<f32>,
    last_samples: Option<Vec<f32>>,
}

/// Null audio sink backed by a simulated queue
#[derive(Debug)]
pub struct NullAudioSink {
    spec: DeviceSpec,
    state: Arc<Mutex<NullState>>,
}

impl NullAudioSink {
    pub fn new(spec: DeviceSpec) -> Self {
        Self {
            spec,
            state: Arc::new(Mutex::new(NullState::default())),
        }
    }

    /// Sink that asks for `samples` interleaved samples every tick,
    /// regardless of what was queued before
    pub fn with_fixed_demand(spec: DeviceSpec, samples: usize) -> Self {
        let sink = Self::new(spec);
        sink.state.lock().fixed_demand = Some(samples);
        sink
    }

    /// Keep every accepted sample for [`NullProbe::output`] and
    /// [`NullProbe::last_samples`]. Memory grows with playback time.
    pub fn recording(self) -> Self {
        self.state.lock().record = true;
        self
    }

    /// Handle for inspecting and driving the sink after it was moved into
    /// the sound system
    pub fn probe(&self) -> NullProbe {
        NullProbe {
            state: Arc::clone(&self.state),
        }
    }
}

impl AudioSink for NullAudioSink {
    fn start(&mut self) -> Result<()> {
        self.state.lock().started = true;
        Ok(())
    }

    fn stop(&mut self) {
        let mut state = self.state.lock();
        state.started = false;
        state.queued = 0;
    }

    fn spec(&self) -> DeviceSpec {
        self.spec
    }

    fn samples_needed(&self) -> i32 {
        let state = self.state.lock();
        let needed = match state.fixed_demand {
            Some(samples) => samples as i64,
            None => self.spec.buffer_samples() as i64 - state.queued as i64,
        };
        i32::try_from(needed).unwrap_or(i32::MAX)
    }

    fn enqueue(&mut self, samples: &[f32]) -> Result<()> {
        let mut state = self.state.lock();
        state.enqueue_calls += 1;
        if std::mem::take(&mut state.fail_next) {
            return Err(AudioError::Overflow {
                submitted: samples.len(),
                dropped: samples.len(),
            });
        }
        if !state.started {
            return Ok(());
        }

        let accepted = match state.fixed_demand {
            Some(_) => samples.len(),
            None => samples
                .len()
                .min(self.spec.buffer_samples().saturating_sub(state.queued)),
        };
        state.queued += accepted;
        if state.record {
            state.output.extend_from_slice(&samples[..accepted]);
            state.last_samples = Some(samples[..accepted].to_vec());
        }

        if accepted < samples.len() {
            return Err(AudioError::Overflow {
                submitted: samples.len(),
                dropped: samples.len() - accepted,
            });
        }
        Ok(())
    }
}

/// Shared view of a [`NullAudioSink`]
#[derive(Debug, Clone)]
pub struct NullProbe {
    state: Arc<Mutex<NullState>>,
}

impl NullProbe {
    pub fn is_started(&self) -> bool {
        self.state.lock().started
    }

    /// Interleaved samples waiting in the simulated queue
    pub fn queued(&self) -> usize {
        self.state.lock().queued
    }

    /// Simulate the device playing back up to `samples` queued samples
    pub fn drain(&self, samples: usize) {
        let mut state = self.state.lock();
        state.queued = state.queued.saturating_sub(samples);
    }

    /// Change the per-tick demand; `None` returns to queue headroom
    pub fn set_fixed_demand(&self, samples: Option<usize>) {
        self.state.lock().fixed_demand = samples;
    }

    /// Make the next enqueue fail
    pub fn fail_next_enqueue(&self) {
        self.state.lock().fail_next = true;
    }

    pub fn enqueue_calls(&self) -> usize {
        self.state.lock().enqueue_calls
    }

    /// Every sample accepted since the sink was created. Empty unless the
    /// sink is recording.
    pub fn output(&self) -> Vec<f32> {
        self.state.lock().output.clone()
    }

    /// Samples accepted by the most recent enqueue
    pub fn last_samples(&self) -> Option<Vec<f32>> {
        self.state.lock().last_samples.clone()
    }
}
