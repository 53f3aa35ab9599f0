//! Mixer tick benchmarks

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::Vec3;
use tm_audio::backend::NullAudioSink;
use tm_audio::{
    DeviceSpec, EntityId, Falloff, MixerSettings, SoundEffect, SoundListener, SoundStream,
    SoundSystem,
};

fn bench_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("sound_system_update");
    let stream = Arc::new(SoundStream::new(
        (0..2400).map(|n| (n as f32 * 0.05).sin()).collect::<Vec<_>>(),
        48_000,
    ));

    for effects in [1usize, 8, 32] {
        group.bench_with_input(BenchmarkId::from_parameter(effects), &effects, |b, &effects| {
            let spec = DeviceSpec::new(48_000, 2, 2048);
            let sink = NullAudioSink::with_fixed_demand(spec, 1600);
            let settings = MixerSettings {
                pool_capacity: 1024,
                frame_capacity: 256,
                falloff: Falloff::default(),
            };
            let mut system =
                SoundSystem::new(settings, Box::new(sink), Box::new(SoundListener::default()))
                    .unwrap();
            system.start().unwrap();
            let component = system.attach_entity(EntityId(0)).unwrap();
            let handle = component.add_resource(Arc::clone(&stream)).unwrap();

            b.iter(|| {
                // Keep the play list saturated without exhausting the pool.
                if system.playing_count() < 512 {
                    let component = system.component_mut(EntityId(0)).unwrap();
                    for index in 0..effects {
                        let position = Vec3::new(index as f32, 0.0, 0.0);
                        component.play(SoundEffect::new(handle, position)).unwrap();
                    }
                }
                black_box(system.update(1.0 / 60.0));
            });
        });
    }
    group.finish();
}

fn bench_pool(c: &mut Criterion) {
    let pool = tm_audio::FramePool::new(512, 256);
    c.bench_function("frame_pool_acquire_release", |b| {
        b.iter(|| {
            let frame = pool.acquire();
            pool.release(black_box(frame));
        });
    });
}

criterion_group!(benches, bench_update, bench_pool);
criterion_main!(benches);
