//! Pooled real-time sound effect mixer
//!
//! Gameplay code queues [`SoundEffect`]s on a per-entity [`SoundComponent`].
//! Once per tick the [`SoundSystem`] turns them into chains of pooled
//! [`SoundFrame`]s with distance attenuation baked in, mixes every playing
//! frame into an interleaved stereo buffer sized to what the device can take,
//! and hands that buffer to the [`AudioSink`].

pub mod backend;
pub mod component;
pub mod counter;
pub mod diagnostics;
pub mod error;
pub mod frame;
pub mod listener;
pub mod mixer;
pub mod pool;
pub mod ring_buffer;
pub mod stream;

pub use backend::{open_sink, AudioSink, DeviceSpec};
pub use component::{EntityId, Falloff, ResourceHandle, SoundComponent, SoundEffect};
pub use counter::InFlightCounter;
pub use error::{AudioError, Result};
pub use frame::{FrameId, SoundFrame};
pub use listener::{ListenerSource, SharedListener, SoundListener};
pub use mixer::{FrameSubmitter, MixerSettings, SoundSystem};
pub use pool::FramePool;
pub use stream::SoundStream;
