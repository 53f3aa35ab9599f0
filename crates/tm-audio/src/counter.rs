//! In-flight counter shared between an effect's owner and the frame pool

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Counts what is left of one effect instance before it has finished playing.
///
/// Playing an effect takes one count, which the component swaps for one count
/// per frame when it converts the effect. The pool decrements once per
/// released frame. Polling never blocks.
#[derive(Debug, Clone, Default)]
pub struct InFlightCounter {
    inner: Arc<AtomicUsize>,
}

impl InFlightCounter {
    /// Create a counter with nothing in flight
    pub fn new() -> Self {
        Self::default()
    }

    /// Queued effects plus frames still playing
    #[inline]
    pub fn get(&self) -> usize {
        self.inner.load(Ordering::Acquire)
    }

    /// True once nothing tracked by this counter is queued or playing
    #[inline]
    pub fn is_drained(&self) -> bool {
        self.get() == 0
    }

    #[inline]
    pub(crate) fn increment(&self) {
        self.inner.fetch_add(1, Ordering::AcqRel);
    }

    #[inline]
    pub(crate) fn decrement(&self) {
        let previous = self.inner.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(previous > 0, "in-flight counter underflow");
    }
}
