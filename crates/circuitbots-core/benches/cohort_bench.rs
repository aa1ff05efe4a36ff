use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use circuitbots_core::{
    Controls, OccupancyGrid, Rect, SensorArray, SimulationConfig, Steer, Track, Vehicle,
    default_checkpoints,
};
use std::time::Duration;

/// Elliptical ring roughly matching the default circuit layout.
fn ring_track(config: &SimulationConfig) -> Track {
    let (w, h) = (config.canvas_width as f32, config.canvas_height as f32);
    let (cx, cy) = (w / 2.0, h / 2.0);
    let grid = OccupancyGrid::from_fn(config.canvas_width, config.canvas_height, |x, y| {
        let dx = (x as f32 - cx) / (w * 0.45);
        let dy = (y as f32 - cy) / (h * 0.45);
        let r = dx * dx + dy * dy;
        !(0.35..=1.0).contains(&r)
    })
    .expect("grid");
    Track::new(grid, Rect::new(270, 200, 160, 40), default_checkpoints()).expect("track")
}

fn env_or(name: &str, fallback: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(fallback)
}

fn bench_cohort_steps(c: &mut Criterion) {
    let mut group = c.benchmark_group("cohort_step");
    group.sample_size(env_or("CB_BENCH_SAMPLES", 20));
    group.measurement_time(Duration::from_secs(env_or("CB_BENCH_MEASURE_SECS", 5) as u64));
    let steps = env_or("CB_BENCH_STEPS", 60);

    let mut config = SimulationConfig::default();
    config.spawn.x = 1_080.0;
    config.spawn.heading = 90.0;
    let track = ring_track(&config);

    for population in [20_usize, 100] {
        group.bench_function(format!("steps{steps}_population{population}"), |b| {
            b.iter_batched(
                || {
                    (1..=population as u32)
                        .map(|id| Vehicle::new(id, &config, &track))
                        .collect::<Vec<_>>()
                },
                |mut cohort| {
                    for tick in 0..steps {
                        let now = tick as f32 / config.tick_rate as f32;
                        for (i, vehicle) in cohort.iter_mut().enumerate() {
                            let steer = match i % 3 {
                                0 => Steer::Left,
                                1 => Steer::Straight,
                                _ => Steer::Right,
                            };
                            vehicle.step(Controls::new(true, false, steer), &track, &config, now);
                        }
                    }
                    cohort
                },
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

fn bench_sensor_scan(c: &mut Criterion) {
    let config = SimulationConfig::default();
    let track = ring_track(&config);
    let vehicle = Vehicle::new(1, &config, &track);
    c.bench_function("sensor_scan_open_range", |b| {
        b.iter(|| {
            SensorArray::scan(
                vehicle.position(),
                vehicle.heading(),
                config.vehicle.width,
                track.grid(),
                &config.sensors,
            )
        });
    });
}

criterion_group!(benches, bench_cohort_steps, bench_sensor_scan);
criterion_main!(benches);
