//! Benchmarks for eventcar-model estimation.
#![allow(missing_docs)]

use chrono::{Days, NaiveDate};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use eventcar_model::{AlignedObservation, EventWindowAggregator, RollingConfig, RollingFactorModel};
use eventcar_primitives::{
    AbnormalReturnObservation, EarningsEvent, EntityId, EventId, EventTimestamp, N_FACTORS,
    TradingCalendar,
};
use rand::{Rng, SeedableRng, rngs::StdRng};
use rand_distr::{Distribution, Normal};

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2010, 1, 4).unwrap()
}

fn synthetic_rows(n: usize) -> Vec<AlignedObservation> {
    let mut rng = StdRng::seed_from_u64(7);
    let factor = Normal::new(0.0, 1.0).unwrap();
    let noise = Normal::new(0.0, 0.5).unwrap();
    let loadings = [1.1, 0.4, -0.2, 0.1, 0.3, -0.1];

    (0..n)
        .map(|i| {
            let mut factors = [0.0; N_FACTORS];
            for f in &mut factors {
                *f = factor.sample(&mut rng);
            }
            let fitted: f64 = loadings.iter().zip(&factors).map(|(b, f)| b * f).sum();
            let missing = rng.gen_bool(0.01);
            AlignedObservation {
                date: start() + Days::new(i as u64),
                excess_return: (!missing).then(|| fitted + noise.sample(&mut rng)),
                factors,
            }
        })
        .collect()
}

fn bench_rolling_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("rolling_factor_model");
    group.sample_size(20);

    for years in [2, 5, 10] {
        let n = years * 252;
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("years", years), &n, |b, &n| {
            let rows = synthetic_rows(n);
            let model = RollingFactorModel::with_config(RollingConfig {
                window: 252,
                min_observations: 240,
            });
            b.iter(|| model.fit(black_box(&rows)));
        });
    }

    group.finish();
}

fn bench_event_windows(c: &mut Criterion) {
    let mut group = c.benchmark_group("event_window");

    let mut rng = StdRng::seed_from_u64(11);
    let noise = Normal::new(0.0, 1.5).unwrap();
    let series: Vec<AbnormalReturnObservation> = (0..2520)
        .map(|i| {
            let r = noise.sample(&mut rng);
            AbnormalReturnObservation::new(EntityId::new(1), start() + Days::new(i), Some(r), 0.0)
        })
        .collect();
    let calendar = TradingCalendar::new(series.iter().map(|r| r.date));

    for n_events in [10, 100, 1000] {
        let events: Vec<EarningsEvent> = (0..n_events)
            .map(|i| {
                let day = start() + Days::new(rng.gen_range(0..2520));
                let hour = if i % 2 == 0 { 7 } else { 17 };
                EarningsEvent {
                    event_id: EventId::new(format!("ev{i}")),
                    entity_id: EntityId::new(1),
                    timestamp: EventTimestamp::Local(day.and_hms_opt(hour, 0, 0).unwrap()),
                }
            })
            .collect();

        group.throughput(Throughput::Elements(n_events as u64));
        group.bench_with_input(BenchmarkId::new("events", n_events), &events, |b, events| {
            let aggregator = EventWindowAggregator::new();
            b.iter(|| {
                for event in events {
                    black_box(aggregator.aggregate_one(event, &series, &calendar).unwrap());
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_rolling_fit, bench_event_windows);
criterion_main!(benches);
