//! Sound system: owns the frame pool and play list and mixes once per tick
//!
//! Every tick the mixer asks the device how many samples it can take, walks
//! the whole play list once and composites the overlapping part of each frame
//! into an interleaved stereo buffer, then hands that buffer to the device.
//!
//! Per frame, with `step` mono samples in the tick:
//!
//! - `delay <= -step`: starts after this tick, `delay += step`
//! - `-step < delay < capacity`: mixed. A negative delay starts `|delay|`
//!   samples into the buffer, a non-negative one resumes at sample `delay`.
//!   Afterwards `delay` is the index of the next unread sample.
//! - `delay >= capacity`: released back to the pool
//!
//! The play list has no meaningful order; every frame is visited each tick.

use std::sync::Arc;

use crossbeam::channel::{self, Receiver, Sender};
use tm_core::config::AudioConfig;
use tm_core::{mixer_debug, mixer_trace};

use crate::backend::{AudioSink, DeviceSpec};
use crate::component::{EntityId, Falloff, FrameSink, SoundComponent};
use crate::diagnostics::{MixObserver, TickReport};
use crate::error::{AudioError, Result};
use crate::frame::{FrameState, SoundFrame};
use crate::listener::ListenerSource;
use crate::pool::FramePool;

/// Pool sizing and falloff used by a sound system
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixerSettings {
    /// Frames preallocated in the pool
    pub pool_capacity: usize,
    /// Mono samples per frame
    pub frame_capacity: usize,
    /// Distance falloff given to new components
    pub falloff: Falloff,
}

impl From<&AudioConfig> for MixerSettings {
    fn from(config: &AudioConfig) -> Self {
        Self {
            pool_capacity: config.pool_capacity as usize,
            frame_capacity: config.frame_capacity as usize,
            falloff: Falloff::new(config.min_distance, config.max_distance),
        }
    }
}

/// Clonable handle for producing frames, from any thread.
///
/// Frames submitted here join the play list at the start of the next tick.
/// Every frame taken with [`acquire`](Self::acquire) must come back through
/// [`submit`](Self::submit) or [`release`](Self::release). A dropped frame is
/// lost to the pool and its counter never drains. Frames submitted while the
/// sound system is being dropped can be lost the same way.
#[derive(Debug, Clone)]
pub struct FrameSubmitter {
    pool: Arc<FramePool>,
    sender: Sender<SoundFrame>,
}

impl FrameSubmitter {
    /// Take a cleared frame from the shared pool. Panics when exhausted.
    pub fn acquire(&self) -> SoundFrame {
        self.pool.acquire()
    }

    /// Queue a filled frame for playback
    pub fn submit(&self, frame: SoundFrame) {
        // A frame that cannot reach the mixer anymore goes back to the pool.
        if let Err(channel::SendError(frame)) = self.sender.send(frame) {
            self.pool.release(frame);
        }
    }

    /// Hand back a frame that will not be played
    pub fn release(&self, frame: SoundFrame) {
        self.pool.release(frame);
    }

    /// Queue a chain of frames for playback
    pub fn submit_chain(&self, frames: impl IntoIterator<Item = SoundFrame>) {
        for frame in frames {
            self.submit(frame);
        }
    }

    pub fn pool(&self) -> &Arc<FramePool> {
        &self.pool
    }
}

impl FrameSink for FrameSubmitter {
    fn frame_capacity(&self) -> usize {
        self.pool.frame_capacity()
    }

    fn request_frame(&mut self) -> SoundFrame {
        self.acquire()
    }

    fn submit_frame(&mut self, frame: SoundFrame) {
        self.submit(frame);
    }
}

/// Mixing engine and owner of all sound components
pub struct SoundSystem {
    spec: DeviceSpec,
    pool: Arc<FramePool>,
    play_list: Vec<SoundFrame>,
    incoming: Receiver<SoundFrame>,
    submitter: FrameSubmitter,
    components: Vec<(EntityId, SoundComponent)>,
    falloff: Falloff,
    sink: Box<dyn AudioSink>,
    listener: Box<dyn ListenerSource>,
    observer: Option<Box<dyn MixObserver>>,
    mix_buffer: Vec<f32>,
    dropped_ticks: u64,
}

impl SoundSystem {
    /// Build a sound system on top of an already opened device.
    ///
    /// Fails when the device is not stereo or when the frame capacity does
    /// not evenly divide the device frame size.
    pub fn new(
        settings: MixerSettings,
        sink: Box<dyn AudioSink>,
        listener: Box<dyn ListenerSource>,
    ) -> Result<Self> {
        let spec = sink.spec();
        if spec.channels != 2 {
            return Err(AudioError::ChannelCount(spec.channels));
        }
        if settings.frame_capacity == 0 || spec.frames % settings.frame_capacity != 0 {
            return Err(AudioError::FrameSizeMismatch {
                frame_capacity: settings.frame_capacity,
                device_frames: spec.frames,
            });
        }

        let pool = Arc::new(FramePool::new(
            settings.pool_capacity,
            settings.frame_capacity,
        ));
        // Never more frames in flight than the pool holds, so sends never block.
        let (sender, incoming) = channel::bounded(settings.pool_capacity);
        let submitter = FrameSubmitter {
            pool: Arc::clone(&pool),
            sender,
        };

        mixer_debug!(
            "Sound system: {} frames of {} samples, device {:?}",
            settings.pool_capacity,
            settings.frame_capacity,
            spec
        );

        Ok(Self {
            spec,
            pool,
            play_list: Vec::with_capacity(settings.pool_capacity),
            incoming,
            submitter,
            components: Vec::new(),
            falloff: settings.falloff,
            sink,
            listener,
            observer: None,
            mix_buffer: Vec::with_capacity(spec.buffer_samples()),
            dropped_ticks: 0,
        })
    }

    /// Build a sound system from validated configuration
    pub fn from_config(
        config: &AudioConfig,
        sink: Box<dyn AudioSink>,
        listener: Box<dyn ListenerSource>,
    ) -> Result<Self> {
        config.validate()?;
        Self::new(MixerSettings::from(config), sink, listener)
    }

    /// Start the device
    pub fn start(&mut self) -> Result<()> {
        self.sink.start()
    }

    /// Stop the device. Frames already playing stay on the play list.
    pub fn stop(&mut self) {
        self.sink.stop();
    }

    /// Report every tick to `observer`
    pub fn set_observer(&mut self, observer: Box<dyn MixObserver>) {
        self.observer = Some(observer);
    }

    pub fn spec(&self) -> DeviceSpec {
        self.spec
    }

    pub fn pool(&self) -> &Arc<FramePool> {
        &self.pool
    }

    /// Handle for producers outside the component update
    pub fn submitter(&self) -> FrameSubmitter {
        self.submitter.clone()
    }

    /// Frames on the play list
    pub fn playing_count(&self) -> usize {
        self.play_list.len()
    }

    /// Ticks whose output the device rejected
    pub fn dropped_ticks(&self) -> u64 {
        self.dropped_ticks
    }

    /// Create the sound component for `entity`
    pub fn attach_entity(&mut self, entity: EntityId) -> Result<&mut SoundComponent> {
        if self.position(entity).is_some() {
            return Err(AudioError::EntityAlreadyAttached(entity.0));
        }
        mixer_debug!("Attach sound component to entity {}", entity.0);
        self.components
            .push((entity, SoundComponent::new(self.falloff)));
        let (_, component) = self
            .components
            .last_mut()
            .ok_or(AudioError::UnknownEntity(entity.0))?;
        Ok(component)
    }

    /// Destroy the sound component of `entity`, invalidating its handles.
    /// Effects it already submitted keep playing.
    pub fn detach_entity(&mut self, entity: EntityId) -> Result<()> {
        let index = self
            .position(entity)
            .ok_or(AudioError::UnknownEntity(entity.0))?;
        self.components.swap_remove(index);
        mixer_debug!("Detach sound component from entity {}", entity.0);
        Ok(())
    }

    pub fn component(&self, entity: EntityId) -> Option<&SoundComponent> {
        self.components
            .iter()
            .find(|(id, _)| *id == entity)
            .map(|(_, component)| component)
    }

    pub fn component_mut(&mut self, entity: EntityId) -> Option<&mut SoundComponent> {
        self.components
            .iter_mut()
            .find(|(id, _)| *id == entity)
            .map(|(_, component)| component)
    }

    fn position(&self, entity: EntityId) -> Option<usize> {
        self.components.iter().position(|(id, _)| *id == entity)
    }

    /// Convert queued effects of every component into frames, then mix one tick
    pub fn update(&mut self, delta_time: f32) -> TickReport {
        debug_assert!(delta_time >= 0.0);

        let listener = self.listener.listener();
        for (_, component) in self.components.iter_mut() {
            component.update(delta_time, &listener, &mut self.submitter);
        }

        self.tick()
    }

    /// Mix exactly what the device can take right now and hand it over
    pub fn tick(&mut self) -> TickReport {
        self.play_list.extend(self.incoming.try_iter());

        let channels = usize::from(self.spec.channels);
        let needed = usize::try_from(self.sink.samples_needed()).unwrap_or(0);
        let needed = needed - needed % channels;
        let step = needed / channels;

        self.mix_buffer.clear();
        self.mix_buffer.resize(needed, 0.0);
        let drained = self.mix(step);

        let mut enqueue_failed = false;
        if needed > 0 {
            if let Err(e) = self.sink.enqueue(&self.mix_buffer) {
                tracing::warn!(target: "mixer", "Audio queue error: {}", e);
                self.dropped_ticks += 1;
                enqueue_failed = true;
            }
        }
        self.mix_buffer.clear();

        let report = TickReport {
            samples_needed: needed,
            samples_produced: needed,
            frames_playing: self.play_list.len(),
            frames_free: self.pool.free_count(),
            frames_drained: drained,
            enqueue_failed,
        };
        mixer_trace!(
            "tick: {} samples, {} playing, {} drained",
            needed,
            report.frames_playing,
            drained
        );
        if let Some(observer) = self.observer.as_mut() {
            observer.on_tick(&report);
        }
        report
    }

    /// Advance every frame by `step` mono samples, mixing the active ones.
    /// Returns the number of frames released.
    fn mix(&mut self, step: usize) -> usize {
        let channels = usize::from(self.spec.channels);
        let mut drained = 0;
        let mut index = 0;

        while index < self.play_list.len() {
            let frame = &mut self.play_list[index];
            debug_assert_eq!(self.spec.frames % frame.capacity(), 0);

            match frame.state(step) {
                FrameState::Pending => {
                    frame.delay += step as i32;
                    index += 1;
                    continue;
                }
                FrameState::Active => mix_frame(frame, &mut self.mix_buffer, channels),
                FrameState::Drained => {}
            }

            if frame.state(step) == FrameState::Drained {
                let frame = self.play_list.swap_remove(index);
                self.pool.release(frame);
                drained += 1;
            } else {
                index += 1;
            }
        }
        drained
    }
}

/// Add the part of `frame` that overlaps this tick into `out`, duplicating
/// each mono sample into every channel, and move the frame's cursor.
fn mix_frame(frame: &mut SoundFrame, out: &mut [f32], channels: usize) {
    let (frame_start, mix_start) = if frame.delay < 0 {
        (0, frame.delay.unsigned_abs() as usize * channels)
    } else {
        (frame.delay as usize, 0)
    };

    let consumed = frame.samples()[frame_start..]
        .iter()
        .zip(out[mix_start..].chunks_exact_mut(channels))
        .map(|(sample, slot)| {
            for value in slot {
                *value += *sample;
            }
        })
        .count();

    frame.delay = (frame_start + consumed) as i32;
}

impl Drop for SoundSystem {
    fn drop(&mut self) {
        // Hand everything back so in-flight counters settle at zero.
        self.play_list.extend(self.incoming.try_iter());
        for frame in self.play_list.drain(..) {
            self.pool.release(frame);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{NullAudioSink, NullProbe};
    use crate::counter::InFlightCounter;
    use crate::listener::SoundListener;

    const FRAME: usize = 4;

    fn system(demand: usize) -> (SoundSystem, NullProbe) {
        let sink =
            NullAudioSink::with_fixed_demand(DeviceSpec::new(48_000, 2, 16), demand).recording();
        let probe = sink.probe();
        let settings = MixerSettings {
            pool_capacity: 8,
            frame_capacity: FRAME,
            falloff: Falloff::default(),
        };
        let mut system =
            SoundSystem::new(settings, Box::new(sink), Box::new(SoundListener::default()))
                .unwrap();
        system.start().unwrap();
        (system, probe)
    }

    fn frame_with(system: &SoundSystem, samples: [f32; FRAME], delay: i32) -> SoundFrame {
        let mut frame = system.pool().acquire();
        frame.samples_mut().copy_from_slice(&samples);
        frame.set_delay(delay);
        frame
    }

    #[test]
    fn test_rejects_mismatched_frame_size() {
        let sink = NullAudioSink::new(DeviceSpec::new(48_000, 2, 10));
        let settings = MixerSettings {
            pool_capacity: 4,
            frame_capacity: 4,
            falloff: Falloff::default(),
        };
        let result = SoundSystem::new(settings, Box::new(sink), Box::new(SoundListener::default()));
        assert!(matches!(
            result,
            Err(AudioError::FrameSizeMismatch {
                frame_capacity: 4,
                device_frames: 10
            })
        ));
    }

    #[test]
    fn test_rejects_mono_device() {
        let sink = NullAudioSink::new(DeviceSpec::new(48_000, 1, 16));
        let settings = MixerSettings {
            pool_capacity: 4,
            frame_capacity: 4,
            falloff: Falloff::default(),
        };
        let result = SoundSystem::new(settings, Box::new(sink), Box::new(SoundListener::default()));
        assert!(matches!(result, Err(AudioError::ChannelCount(1))));
    }

    #[test]
    fn test_single_frame_drains_in_one_tick() {
        let (mut system, probe) = system(2 * FRAME);
        let counter = InFlightCounter::new();
        let mut frame = frame_with(&system, [0.1, 0.2, 0.3, 0.4], 0);
        frame.track(&counter);
        system.submitter().submit(frame);

        let report = system.tick();
        assert_eq!(report.frames_drained, 1);
        assert_eq!(system.playing_count(), 0);
        assert_eq!(system.pool().free_count(), 8);
        assert!(counter.is_drained());
        assert_eq!(
            probe.last_samples().unwrap(),
            vec![0.1, 0.1, 0.2, 0.2, 0.3, 0.3, 0.4, 0.4]
        );
    }

    #[test]
    fn test_pending_frame_then_partial_start() {
        // Three mono samples per tick.
        let (mut system, probe) = system(6);
        let frame = frame_with(&system, [1.0, 2.0, 3.0, 4.0], -5);
        system.submitter().submit(frame);

        system.tick();
        assert_eq!(system.play_list[0].delay(), -2);
        assert_eq!(probe.last_samples().unwrap(), vec![0.0; 6]);

        system.tick();
        assert_eq!(system.play_list[0].delay(), 1);
        assert_eq!(
            probe.last_samples().unwrap(),
            vec![0.0, 0.0, 0.0, 0.0, 1.0, 1.0]
        );

        system.tick();
        assert_eq!(system.playing_count(), 0);
        assert_eq!(
            probe.last_samples().unwrap(),
            vec![2.0, 2.0, 3.0, 3.0, 4.0, 4.0]
        );
    }

    #[test]
    fn test_frame_resumes_across_ticks() {
        let (mut system, probe) = system(2);
        let frame = frame_with(&system, [1.0, 2.0, 3.0, 4.0], 0);
        system.submitter().submit(frame);

        for expected in [1.0, 2.0, 3.0] {
            system.tick();
            assert_eq!(probe.last_samples().unwrap(), vec![expected, expected]);
            assert_eq!(system.playing_count(), 1);
        }
        system.tick();
        assert_eq!(probe.last_samples().unwrap(), vec![4.0, 4.0]);
        assert_eq!(system.playing_count(), 0);
    }

    #[test]
    fn test_zero_demand_keeps_frames_waiting() {
        let (mut system, probe) = system(0);
        let frame = frame_with(&system, [1.0; FRAME], 0);
        system.submitter().submit(frame);

        let report = system.tick();
        assert_eq!(report.samples_needed, 0);
        assert_eq!(system.playing_count(), 1);
        assert_eq!(system.play_list[0].delay(), 0);
        assert_eq!(probe.enqueue_calls(), 0);
    }

    #[test]
    fn test_odd_demand_rounds_down_to_stereo() {
        let (mut system, probe) = system(7);
        let report = system.tick();
        assert_eq!(report.samples_needed, 6);
        assert_eq!(probe.last_samples().unwrap().len(), 6);
    }

    #[test]
    fn test_enqueue_failure_is_not_fatal() {
        let (mut system, probe) = system(2 * FRAME);
        let counter = InFlightCounter::new();
        let mut frame = frame_with(&system, [0.5; FRAME], 0);
        frame.track(&counter);
        system.submitter().submit(frame);

        probe.fail_next_enqueue();
        let report = system.tick();
        assert!(report.enqueue_failed);
        assert_eq!(system.dropped_ticks(), 1);
        // The frame was still consumed; its audio is the dropped tick.
        assert!(counter.is_drained());

        let report = system.tick();
        assert!(!report.enqueue_failed);
    }

    #[test]
    fn test_attach_and_detach() {
        let (mut system, _probe) = system(8);
        let entity = EntityId(7);

        system.attach_entity(entity).unwrap();
        assert!(matches!(
            system.attach_entity(entity),
            Err(AudioError::EntityAlreadyAttached(7))
        ));
        assert!(system.component(entity).is_some());

        system.detach_entity(entity).unwrap();
        assert!(system.component_mut(entity).is_none());
        assert!(matches!(
            system.detach_entity(entity),
            Err(AudioError::UnknownEntity(7))
        ));
    }

    #[test]
    fn test_unplayed_frame_goes_back_through_submitter() {
        let (mut system, probe) = system(2 * FRAME);
        let submitter = system.submitter();
        let counter = InFlightCounter::new();

        let mut frame = submitter.acquire();
        frame.samples_mut().fill(1.0);
        frame.track(&counter);
        assert_eq!(system.pool().free_count(), 7);

        submitter.release(frame);
        assert!(counter.is_drained());
        assert_eq!(system.pool().free_count(), 8);

        system.tick();
        assert_eq!(system.playing_count(), 0);
        assert_eq!(probe.last_samples().unwrap(), vec![0.0; 2 * FRAME]);
    }

    #[test]
    fn test_drop_returns_frames() {
        let (system, _probe) = system(0);
        let counter = InFlightCounter::new();
        let pool = Arc::clone(system.pool());
        let submitter = system.submitter();

        for _ in 0..3 {
            let mut frame = submitter.acquire();
            frame.track(&counter);
            submitter.submit(frame);
        }
        assert_eq!(counter.get(), 3);

        drop(system);
        assert!(counter.is_drained());
        assert_eq!(pool.free_count(), 8);

        // The mixer is gone, late submissions fall back to the pool.
        let frame = submitter.acquire();
        submitter.submit(frame);
        assert_eq!(pool.free_count(), 8);
    }
}
