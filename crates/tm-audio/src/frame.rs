//! Pooled block of mono samples plus its scheduling cursor

use crate::counter::InFlightCounter;

/// Stable index of a frame's slot in the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(pub(crate) u32);

impl FrameId {
    /// Slot index inside the pool
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Scheduling state of a frame for a tick of `step` mono samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    /// Starts after this tick ends
    Pending,
    /// Overlaps this tick
    Active,
    /// Every sample has been consumed
    Drained,
}

/// Fixed-capacity block of mono samples.
///
/// `delay` is the scheduling cursor. While negative it counts the samples left
/// before playback starts; once non-negative it is the index of the next
/// sample to mix. The frame is done when `delay` reaches `capacity()`.
///
/// Frames are only created by [`FramePool`](crate::pool::FramePool) and moved
/// between the pool's free list, a producer and the mixer's play list. A
/// producer must submit or release every frame it acquires: dropping one
/// shrinks the pool for good and leaves its counter above zero.
#[derive(Debug)]
pub struct SoundFrame {
    id: FrameId,
    samples: Box<[f32]>,
    pub(crate) delay: i32,
    pub(crate) counter: Option<InFlightCounter>,
}

impl SoundFrame {
    pub(crate) fn new(id: FrameId, capacity: usize) -> Self {
        Self {
            id,
            samples: vec![0.0; capacity].into_boxed_slice(),
            delay: 0,
            counter: None,
        }
    }

    /// Clear samples, cursor and counter before handing the frame out again
    pub(crate) fn reset(&mut self) {
        self.samples.fill(0.0);
        self.delay = 0;
        self.counter = None;
    }

    pub fn id(&self) -> FrameId {
        self.id
    }

    /// Number of mono samples the frame holds
    #[inline]
    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut [f32] {
        &mut self.samples
    }

    pub fn delay(&self) -> i32 {
        self.delay
    }

    /// Set the scheduling cursor. A start `n` samples into the next tick is `-n`.
    pub fn set_delay(&mut self, delay: i32) {
        self.delay = delay;
    }

    /// Attach an in-flight counter, counting this frame as in flight
    pub fn track(&mut self, counter: &InFlightCounter) {
        if let Some(previous) = self.counter.take() {
            previous.decrement();
        }
        counter.increment();
        self.counter = Some(counter.clone());
    }

    /// Classify the frame for a tick producing `step` mono samples
    pub fn state(&self, step: usize) -> FrameState {
        let step = step as i64;
        let delay = i64::from(self.delay);
        if delay >= self.capacity() as i64 {
            FrameState::Drained
        } else if delay <= -step {
            FrameState::Pending
        } else {
            FrameState::Active
        }
    }
}
