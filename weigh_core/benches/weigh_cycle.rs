use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use weigh_core::mocks::FixedAnalog;
use weigh_core::speed::SpeedEstimator;
use weigh_core::{DistanceSample, LoadCellCalibration, StateSnapshot, WeighEvent, WeighingController};

const ARMED: StateSnapshot = StateSnapshot {
    armed: true,
    barrier_open: true,
    off: false,
};

fn sample_size(g: &mut criterion::BenchmarkGroup<'_, criterion::measurement::WallTime>) {
    // BENCH_SAMPLE_SIZE=10 cargo bench -p weigh_core --bench weigh_cycle
    let n = std::env::var("BENCH_SAMPLE_SIZE")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(50);
    g.sample_size(n.max(10));
}

pub fn bench_full_cycle(c: &mut Criterion) {
    let mut g = c.benchmark_group("weigh_cycle");
    sample_size(&mut g);
    g.bench_function("50_ticks_two_channels", |b| {
        b.iter_batched(
            || {
                (
                    WeighingController::new([1, 2], LoadCellCalibration::default()),
                    FixedAnalog::new([(1, 1650), (2, 1650)]),
                )
            },
            |(mut ctrl, mut adc)| {
                loop {
                    if let WeighEvent::Completed(r) = ctrl.tick(ARMED, Some(0.0), &mut adc) {
                        break black_box(r);
                    }
                }
            },
            BatchSize::SmallInput,
        );
    });
    g.finish();
}

pub fn bench_speed_updates(c: &mut Criterion) {
    let mut g = c.benchmark_group("speed_estimator");
    sample_size(&mut g);
    let samples: Vec<DistanceSample> = (0..1000u16)
        .map(|i| DistanceSample {
            timestamp_ms: u64::from(i) * 100,
            distance_cm: 1200u16.saturating_sub(i),
        })
        .collect();
    g.bench_function("1000_samples", |b| {
        b.iter(|| {
            let mut est = SpeedEstimator::new();
            let mut last = None;
            for s in &samples {
                last = est.update(black_box(*s));
            }
            last
        });
    });
    g.finish();
}

criterion_group!(benches, bench_full_cycle, bench_speed_updates);
criterion_main!(benches);
