//! Per-entity sound state
//!
//! A component owns the streams its entity can play and the effects queued
//! for the current tick. Once per tick [`SoundComponent::update`] turns every
//! queued effect into a chain of pooled frames and hands them to the mixer.

use std::sync::Arc;

use glam::Vec3;

use crate::counter::InFlightCounter;
use crate::error::{AudioError, Result};
use crate::frame::SoundFrame;
use crate::listener::SoundListener;
use crate::stream::SoundStream;

/// Entity that owns a sound component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId(pub u32);

/// Handle to a stream registered on one component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceHandle(u16);

impl ResourceHandle {
    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

/// Request to play a registered stream at a world position this tick
#[derive(Debug, Clone)]
pub struct SoundEffect {
    pub resource: ResourceHandle,
    pub position: Vec3,
    pub counter: Option<InFlightCounter>,
}

impl SoundEffect {
    pub fn new(resource: ResourceHandle, position: Vec3) -> Self {
        Self {
            resource,
            position,
            counter: None,
        }
    }

    /// Track this effect from `play` until its last frame is released
    pub fn with_counter(mut self, counter: InFlightCounter) -> Self {
        self.counter = Some(counter);
        self
    }
}

/// Linear distance falloff
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Falloff {
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Falloff {
    pub fn new(min_distance: f32, max_distance: f32) -> Self {
        debug_assert!(max_distance > min_distance);
        Self {
            min_distance,
            max_distance,
        }
    }

    /// Gain in [0, 1]: 1 up to `min_distance`, 0 from `max_distance` on
    pub fn attenuation(&self, distance: f32) -> f32 {
        let t = (distance - self.min_distance) / (self.max_distance - self.min_distance);
        1.0 - t.clamp(0.0, 1.0)
    }
}

impl Default for Falloff {
    fn default() -> Self {
        Self::new(0.0, 50.0)
    }
}

/// Where a component sends the frames it fills
pub trait FrameSink {
    /// Mono samples per frame
    fn frame_capacity(&self) -> usize;
    /// Take a cleared frame from the pool
    fn request_frame(&mut self) -> SoundFrame;
    /// Hand a filled frame to the mixer's play list
    fn submit_frame(&mut self, frame: SoundFrame);
}

/// Sound state attached to one entity.
///
/// A queued effect with a counter holds one count on it until `update` has
/// moved the count onto its frames. Dropping the component, for instance on
/// detach, gives back the counts of effects that never started.
#[derive(Debug, Default)]
pub struct SoundComponent {
    streams: Vec<Arc<SoundStream>>,
    pending: Vec<SoundEffect>,
    falloff: Falloff,
}

impl SoundComponent {
    pub fn new(falloff: Falloff) -> Self {
        Self {
            streams: Vec::new(),
            pending: Vec::new(),
            falloff,
        }
    }

    /// Register a stream. Handles are dense, assigned in order and stay
    /// valid for the component's lifetime.
    pub fn add_resource(&mut self, stream: Arc<SoundStream>) -> Result<ResourceHandle> {
        let index = u16::try_from(self.streams.len()).map_err(|_| AudioError::TooManyResources)?;
        self.streams.push(stream);
        Ok(ResourceHandle(index))
    }

    pub fn resource(&self, handle: ResourceHandle) -> Option<&Arc<SoundStream>> {
        self.streams.get(handle.index())
    }

    pub fn resource_count(&self) -> usize {
        self.streams.len()
    }

    /// Queue an effect for the next update. Does not touch the pool.
    pub fn play(&mut self, effect: SoundEffect) -> Result<()> {
        if effect.resource.index() >= self.streams.len() {
            return Err(AudioError::UnknownResource(effect.resource.0));
        }
        if let Some(counter) = &effect.counter {
            counter.increment();
        }
        self.pending.push(effect);
        Ok(())
    }

    /// Effects waiting for the next update
    pub fn pending(&self) -> &[SoundEffect] {
        &self.pending
    }

    pub fn falloff(&self) -> Falloff {
        self.falloff
    }

    /// Convert every queued effect into frames and clear the queue.
    ///
    /// Attenuation is computed here, from the listener of this tick, and baked
    /// into the frame samples. Frame `k` of an effect gets the delay
    /// `-(k * frame_capacity)` so the chain plays back to back.
    pub fn update(&mut self, delta_time: f32, listener: &SoundListener, sink: &mut dyn FrameSink) {
        debug_assert!(delta_time >= 0.0);

        let Self {
            streams,
            pending,
            falloff,
        } = self;

        let frame_capacity = sink.frame_capacity();
        for effect in pending.drain(..) {
            let Some(stream) = streams.get(effect.resource.index()) else {
                release_hold(&effect);
                continue;
            };
            let distance = listener.position.distance(effect.position);
            let gain = falloff.attenuation(distance);

            for (chunk_index, chunk) in stream.samples().chunks(frame_capacity).enumerate() {
                let start = chunk_index * frame_capacity;
                let mut frame = sink.request_frame();
                frame.set_delay(-i32::try_from(start).unwrap_or(i32::MAX));
                for (slot, sample) in frame.samples_mut().iter_mut().zip(chunk) {
                    *slot = sample * gain;
                }
                if let Some(counter) = &effect.counter {
                    frame.track(counter);
                }
                sink.submit_frame(frame);
            }
            // The frames carry the count now.
            release_hold(&effect);
        }
    }
}

impl Drop for SoundComponent {
    fn drop(&mut self) {
        for effect in self.pending.drain(..) {
            release_hold(&effect);
        }
    }
}

/// Give back the count taken by `SoundComponent::play`
fn release_hold(effect: &SoundEffect) {
    if let Some(counter) = &effect.counter {
        counter.decrement();
    }
}
