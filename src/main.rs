//! Tidemix - pooled sound effect mixer
//!
//! Demo driver: plays synthetic effects around a moving listener and ticks
//! the sound system at a fixed rate.
//!
//! Usage: `tidemix [--muted] [--seconds N]`

use std::env;
use std::f32::consts::TAU;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use glam::Vec3;
use tm_audio::backend::NullAudioSink;
use tm_audio::diagnostics::{MixHistory, MixObserver, TickReport};
use tm_audio::{
    open_sink, AudioSink, DeviceSpec, EntityId, InFlightCounter, SharedListener, SoundEffect,
    SoundListener, SoundStream, SoundSystem,
};
use tm_core::config::{AudioBackendKind, AudioConfig, Config};

const TICK: Duration = Duration::from_millis(16);

struct Options {
    muted: bool,
    seconds: f32,
}

fn parse_args() -> Result<Options> {
    let mut options = Options {
        muted: false,
        seconds: 10.0,
    };
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--muted" => options.muted = true,
            "--seconds" => {
                let value = args.next().context("--seconds needs a value")?;
                options.seconds = value
                    .parse()
                    .with_context(|| format!("Invalid duration: {value}"))?;
            }
            other => bail!("Unknown argument: {other}\nUsage: tidemix [--muted] [--seconds N]"),
        }
    }
    Ok(options)
}

/// Decaying sine blip
fn tone(frequency: f32, seconds: f32, sample_rate: u32) -> SoundStream {
    let len = (seconds * sample_rate as f32) as usize;
    let samples: Vec<f32> = (0..len)
        .map(|n| {
            let t = n as f32 / sample_rate as f32;
            let envelope = (1.0 - t / seconds).max(0.0).powi(2);
            0.4 * envelope * (TAU * frequency * t).sin()
        })
        .collect();
    SoundStream::new(samples, sample_rate)
}

/// Sink that consumes exactly one tick of audio per tick
fn muted_sink(config: &AudioConfig) -> Box<dyn AudioSink> {
    let per_tick = (config.sample_rate as f32 * TICK.as_secs_f32()) as usize * 2;
    Box::new(NullAudioSink::with_fixed_demand(
        DeviceSpec::from(config),
        per_tick,
    ))
}

/// Mix history that logs every underrun
#[derive(Default)]
struct UnderrunLog {
    history: MixHistory,
}

impl MixObserver for UnderrunLog {
    fn on_tick(&mut self, report: &TickReport) {
        self.history.on_tick(report);
        if let Some((produced, required)) = self.history.latest() {
            if produced < required {
                tracing::debug!("Audio underrun: {} / {}", produced, required);
            }
        }
    }
}

fn main() -> Result<()> {
    let options = parse_args()?;

    let mut config = Config::load().unwrap_or_default();
    tm_core::logging::init(&config.debug);
    if options.muted {
        config.audio.backend = AudioBackendKind::Null;
    }

    tracing::info!("Starting tidemix");

    let sink = match config.audio.backend {
        AudioBackendKind::Null => muted_sink(&config.audio),
        AudioBackendKind::Cpal => match open_sink(&config.audio) {
            Ok(sink) => sink,
            Err(e) => {
                tracing::warn!("Couldn't open audio ({}), running muted", e);
                muted_sink(&config.audio)
            }
        },
    };

    let listener = SharedListener::new(SoundListener::default());
    let mut system = SoundSystem::from_config(&config.audio, sink, Box::new(listener.clone()))
        .context("Failed to create sound system")?;
    if config.debug.mix_history {
        system.set_observer(Box::<UnderrunLog>::default());
    }
    system.start().context("Failed to start audio output")?;

    let sample_rate = config.audio.sample_rate;
    let gull = EntityId(1);
    let surf = EntityId(2);

    let component = system.attach_entity(gull)?;
    let chirp = component.add_resource(Arc::new(tone(1760.0, 0.15, sample_rate)))?;
    let call = component.add_resource(Arc::new(tone(1320.0, 0.3, sample_rate)))?;
    let component = system.attach_entity(surf)?;
    let swell = component.add_resource(Arc::new(tone(110.0, 0.6, sample_rate)))?;

    let start = Instant::now();
    let mut next_tick = start;
    let mut last_tick = start;
    let mut tick_count: u64 = 0;
    let mut in_flight: Vec<(&'static str, InFlightCounter)> = Vec::new();

    while start.elapsed().as_secs_f32() < options.seconds {
        let now = Instant::now();
        let delta_time = now.duration_since(last_tick).as_secs_f32();
        last_tick = now;
        let elapsed = now.duration_since(start).as_secs_f32();

        // Slowly turn the listener around the origin.
        let heading = elapsed * 0.3;
        listener.set(SoundListener::new(
            Vec3::ZERO,
            Vec3::new(heading.cos(), 0.0, heading.sin()),
        ));

        if tick_count % 30 == 0 {
            // The gull circles at a distance between 5 and 45 units.
            let radius = 25.0 + 20.0 * (elapsed * 0.5).sin();
            let angle = elapsed * 1.3;
            let position = Vec3::new(radius * angle.cos(), 10.0, radius * angle.sin());
            let (name, resource) = if tick_count % 90 == 0 {
                ("call", call)
            } else {
                ("chirp", chirp)
            };
            let counter = InFlightCounter::new();
            if let Some(component) = system.component_mut(gull) {
                component.play(SoundEffect::new(resource, position).with_counter(counter.clone()))?;
                in_flight.push((name, counter));
            }
        }
        if tick_count % 75 == 0 {
            if let Some(component) = system.component_mut(surf) {
                component.play(SoundEffect::new(swell, Vec3::new(0.0, -5.0, 8.0)))?;
            }
        }

        system.update(delta_time);

        in_flight.retain(|(name, counter)| {
            if counter.is_drained() {
                tracing::debug!("Effect {} finished", name);
                false
            } else {
                true
            }
        });

        tick_count += 1;
        next_tick += TICK;
        if let Some(wait) = next_tick.checked_duration_since(Instant::now()) {
            std::thread::sleep(wait);
        }
    }

    system.stop();
    tracing::info!(
        "Stopped after {} ticks, {} dropped, {} frames still playing",
        tick_count,
        system.dropped_ticks(),
        system.playing_count()
    );
    Ok(())
}
