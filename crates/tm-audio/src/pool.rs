//! Preallocated frame pool
//!
//! All frames are allocated once when the pool is built and live until it is
//! dropped. A frame is always in exactly one place: the free list, a
//! producer's hands, or the mixer's play list. Moving the `SoundFrame` value
//! is what moves its membership, so a frame can never be on two lists.
//!
//! The free list lock only covers the push/pop. Clearing and filling sample
//! data happens outside of it.

use parking_lot::Mutex;
use tm_core::pool_trace;

use crate::frame::{FrameId, SoundFrame};

/// Fixed-capacity pool of equally sized sound frames
#[derive(Debug)]
pub struct FramePool {
    capacity: usize,
    frame_capacity: usize,
    free: Mutex<Vec<SoundFrame>>,
}

impl FramePool {
    /// Allocate `capacity` frames of `frame_capacity` mono samples each
    pub fn new(capacity: usize, frame_capacity: usize) -> Self {
        assert!(capacity > 0, "frame pool needs at least one frame");
        assert!(frame_capacity > 0, "frames need at least one sample");
        assert!(
            capacity <= u32::MAX as usize,
            "frame pool capacity exceeds frame id range"
        );

        // Reversed so the first acquire hands out slot 0.
        let free = (0..capacity)
            .rev()
            .map(|index| SoundFrame::new(FrameId(index as u32), frame_capacity))
            .collect();

        Self {
            capacity,
            frame_capacity,
            free: Mutex::new(free),
        }
    }

    /// Total number of frames owned by the pool
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Mono samples per frame
    pub fn frame_capacity(&self) -> usize {
        self.frame_capacity
    }

    /// Frames currently on the free list
    pub fn free_count(&self) -> usize {
        self.free.lock().len()
    }

    /// Frames currently handed out (playing or being filled)
    pub fn in_use(&self) -> usize {
        self.capacity - self.free_count()
    }

    /// Take a cleared frame from the free list.
    ///
    /// # Panics
    ///
    /// Panics when the pool is exhausted. Callers must keep the number of
    /// frames in flight below the pool capacity.
    pub fn acquire(&self) -> SoundFrame {
        match self.try_acquire() {
            Some(frame) => frame,
            None => {
                tracing::error!(
                    target: "pool",
                    "Frame pool exhausted ({} frames in use)",
                    self.capacity
                );
                panic!("frame pool exhausted: all {} frames in use", self.capacity);
            }
        }
    }

    /// Take a cleared frame, or `None` when the pool is exhausted
    pub fn try_acquire(&self) -> Option<SoundFrame> {
        let mut frame = self.free.lock().pop()?;
        frame.reset();
        pool_trace!("acquire frame {}", frame.id().index());
        Some(frame)
    }

    /// Return a frame to the free list, decrementing its in-flight counter
    pub fn release(&self, mut frame: SoundFrame) {
        debug_assert_eq!(frame.capacity(), self.frame_capacity);
        if let Some(counter) = frame.counter.take() {
            counter.decrement();
        }
        pool_trace!("release frame {}", frame.id().index());

        let mut free = self.free.lock();
        debug_assert!(free.len() < self.capacity, "frame released twice");
        free.push(frame);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use super::*;
    use crate::counter::InFlightCounter;

    #[test]
    fn test_acquire_returns_cleared_frame() {
        let pool = FramePool::new(1, 4);
        let mut frame = pool.acquire();
        frame.samples_mut().fill(0.5);
        frame.set_delay(-7);
        pool.release(frame);

        let frame = pool.acquire();
        assert_eq!(frame.samples(), &[0.0; 4]);
        assert_eq!(frame.delay(), 0);
        pool.release(frame);
    }

    #[test]
    fn test_frames_are_unique_while_held() {
        let pool = FramePool::new(16, 8);
        let held: Vec<_> = (0..16).map(|_| pool.acquire()).collect();

        let ids: HashSet<_> = held.iter().map(|f| f.id()).collect();
        assert_eq!(ids.len(), 16);
        assert_eq!(pool.free_count(), 0);
        assert!(pool.try_acquire().is_none());

        for frame in held {
            pool.release(frame);
        }
        assert_eq!(pool.free_count(), 16);
    }

    #[test]
    fn test_count_invariant_over_mixed_sequence() {
        let pool = FramePool::new(8, 2);
        let mut held = Vec::new();

        for round in 0..50 {
            if round % 3 == 2 {
                if let Some(frame) = held.pop() {
                    pool.release(frame);
                }
            } else if held.len() < pool.capacity() {
                held.push(pool.acquire());
            }
            assert_eq!(pool.free_count() + held.len(), pool.capacity());
        }
    }

    #[test]
    fn test_release_decrements_counter() {
        let pool = FramePool::new(2, 2);
        let counter = InFlightCounter::new();

        let mut a = pool.acquire();
        let mut b = pool.acquire();
        a.track(&counter);
        b.track(&counter);
        assert_eq!(counter.get(), 2);

        pool.release(a);
        assert_eq!(counter.get(), 1);
        pool.release(b);
        assert!(counter.is_drained());
    }

    #[test]
    #[should_panic(expected = "frame pool exhausted")]
    fn test_exhaustion_panics() {
        let pool = FramePool::new(1, 1);
        let _held = pool.acquire();
        let _ = pool.acquire();
    }

    #[test]
    fn test_concurrent_acquire_release() {
        let pool = Arc::new(FramePool::new(32, 16));

        let workers: Vec<_> = (0..4)
            .map(|_| {
                let pool = Arc::clone(&pool);
                std::thread::spawn(move || {
                    for _ in 0..500 {
                        let a = pool.acquire();
                        let b = pool.acquire();
                        assert_ne!(a.id(), b.id());
                        pool.release(a);
                        pool.release(b);
                    }
                })
            })
            .collect();

        for worker in workers {
            worker.join().unwrap();
        }
        assert_eq!(pool.free_count(), 32);
    }
}
