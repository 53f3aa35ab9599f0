//! Listener snapshots and where they come from

use std::sync::Arc;

use glam::Vec3;
use parking_lot::RwLock;

/// Position and facing of the listener for one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoundListener {
    pub position: Vec3,
    pub direction: Vec3,
}

impl SoundListener {
    pub fn new(position: Vec3, direction: Vec3) -> Self {
        Self {
            position,
            direction,
        }
    }
}

impl Default for SoundListener {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Vec3::NEG_Z)
    }
}

/// Supplies the listener snapshot at the start of every tick
pub trait ListenerSource {
    fn listener(&self) -> SoundListener;
}

impl ListenerSource for SoundListener {
    fn listener(&self) -> SoundListener {
        *self
    }
}

impl<F> ListenerSource for F
where
    F: Fn() -> SoundListener,
{
    fn listener(&self) -> SoundListener {
        self()
    }
}

/// Listener owned by the camera side and read by the sound system.
///
/// Clones share the same snapshot; the camera calls [`SharedListener::set`]
/// whenever it moves.
#[derive(Debug, Clone, Default)]
pub struct SharedListener {
    inner: Arc<RwLock<SoundListener>>,
}

impl SharedListener {
    pub fn new(listener: SoundListener) -> Self {
        Self {
            inner: Arc::new(RwLock::new(listener)),
        }
    }

    pub fn set(&self, listener: SoundListener) {
        *self.inner.write() = listener;
    }
}

impl ListenerSource for SharedListener {
    fn listener(&self) -> SoundListener {
        *self.inner.read()
    }
}
