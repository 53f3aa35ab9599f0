//! Per-tick mixer counters for debugging overlays

use crate::ring_buffer::RingBuffer;

/// Number of ticks kept by [`MixHistory`]
pub const HISTORY_LEN: usize = 64;

/// What one mixer tick did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Interleaved samples the device asked for
    pub samples_needed: usize,
    /// Interleaved samples mixed and handed to the device
    pub samples_produced: usize,
    /// Frames left on the play list after the tick
    pub frames_playing: usize,
    /// Frames on the pool's free list after the tick
    pub frames_free: usize,
    /// Frames released back to the pool during the tick
    pub frames_drained: usize,
    /// The device rejected the tick's output
    pub enqueue_failed: bool,
}

/// Receives a report after every mixer tick
pub trait MixObserver {
    fn on_tick(&mut self, report: &TickReport);
}

/// Rolling history of produced and required sample counts.
///
/// Keeps the last [`HISTORY_LEN`] ticks, dropping the oldest entry to make
/// room for a new one.
#[derive(Debug, Clone, Default)]
pub struct MixHistory {
    produced: RingBuffer<i32, HISTORY_LEN>,
    required: RingBuffer<i32, HISTORY_LEN>,
}

impl MixHistory {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(buffer: &mut RingBuffer<i32, HISTORY_LEN>, value: usize) {
        if buffer.is_full() {
            buffer.read_one();
        }
        buffer.write_one(i32::try_from(value).unwrap_or(i32::MAX));
    }

    /// Ticks currently recorded
    pub fn len(&self) -> usize {
        self.produced.len()
    }

    pub fn is_empty(&self) -> bool {
        self.produced.is_empty()
    }

    /// Produced and required counts of the most recent tick
    pub fn latest(&self) -> Option<(i32, i32)> {
        Some((*self.produced.peek_at(0)?, *self.required.peek_at(0)?))
    }

    /// The most recent tick produced less than the device asked for
    pub fn underrun(&self) -> bool {
        self.latest()
            .is_some_and(|(produced, required)| produced < required)
    }

    /// Produced counts, newest first
    pub fn produced(&self) -> impl Iterator<Item = i32> + '_ {
        self.produced.iter_newest().copied()
    }

    /// Required counts, newest first
    pub fn required(&self) -> impl Iterator<Item = i32> + '_ {
        self.required.iter_newest().copied()
    }
}

impl MixObserver for MixHistory {
    fn on_tick(&mut self, report: &TickReport) {
        let produced = if report.enqueue_failed {
            0
        } else {
            report.samples_produced
        };
        Self::record(&mut self.produced, produced);
        Self::record(&mut self.required, report.samples_needed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(needed: usize, produced: usize) -> TickReport {
        TickReport {
            samples_needed: needed,
            samples_produced: produced,
            ..TickReport::default()
        }
    }

    #[test]
    fn test_history_keeps_latest() {
        let mut history = MixHistory::new();
        assert!(history.latest().is_none());
        assert!(!history.underrun());

        history.on_tick(&report(512, 512));
        history.on_tick(&report(256, 256));
        assert_eq!(history.latest(), Some((256, 256)));
        assert_eq!(history.produced().collect::<Vec<_>>(), vec![256, 512]);
    }

    #[test]
    fn test_history_evicts_oldest_when_full() {
        let mut history = MixHistory::new();
        for tick in 0..(HISTORY_LEN + 10) {
            history.on_tick(&report(tick, tick));
        }
        assert_eq!(history.len(), HISTORY_LEN);
        assert_eq!(history.required().next(), Some((HISTORY_LEN + 9) as i32));
        assert_eq!(history.required().last(), Some(10));
    }

    #[test]
    fn test_failed_enqueue_counts_as_underrun() {
        let mut history = MixHistory::new();
        history.on_tick(&TickReport {
            enqueue_failed: true,
            ..report(128, 128)
        });
        assert!(history.underrun());
    }
}
