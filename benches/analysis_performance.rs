//! Benchmarks for the analysis algorithms on synthetic sessions
//!
//! Sizes mirror a full Grand Prix:
//! - 20 drivers over 57 laps for gap and degradation analysis
//! - 5.4 km telemetry traces sampled every 2 m for ghost delta and
//!   theoretical best
//!
//! Platform: Cross-platform (synthetic data, CI-safe)

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use overcut::analysis::{ghost_delta, race_gaps, theoretical_best, tyre_degradation};
use overcut::config::DegradationConfig;
use overcut::stats::theil_sen;
use overcut::test_utils::{green_lap, race_table, stint_laps, trace_from_speed};
use overcut::types::{Compound, LapTable, TelemetrySeries};
use std::collections::BTreeMap;
use std::hint::black_box;

const DRIVERS: usize = 20;
const LAPS: usize = 57;
const LAP_LENGTH_M: f64 = 5412.0;

fn driver_codes() -> Vec<String> {
    (0..DRIVERS).map(|i| format!("D{i:02}")).collect()
}

/// Cumulative times where driver `i` is `0.1 * i` s/lap slower than the leader.
fn full_race() -> LapTable {
    let codes = driver_codes();
    let entries: Vec<(&str, Vec<f64>)> = codes
        .iter()
        .enumerate()
        .map(|(i, code)| {
            let pace = 92.0 + 0.1 * i as f64;
            let times = (1..=LAPS).map(|lap| pace * lap as f64).collect();
            (code.as_str(), times)
        })
        .collect();
    race_table(&entries)
}

/// Two-stop strategy for every driver with slightly different wear rates.
fn stint_session() -> LapTable {
    let mut laps = Vec::new();
    for (i, code) in driver_codes().iter().enumerate() {
        let wear = 0.03 + 0.002 * i as f64;
        laps.extend(stint_laps(code, Compound::Soft, 1, 15, 91.0, wear * 2.0));
        laps.extend(stint_laps(code, Compound::Medium, 16, 22, 91.6, wear));
        laps.extend(stint_laps(code, Compound::Hard, 38, 20, 92.0, wear * 0.6));
    }
    LapTable::new(laps)
}

/// Speed profile with a slow corner every kilometre, shifted per lap.
fn lap_trace(offset: f64) -> TelemetrySeries {
    trace_from_speed(LAP_LENGTH_M, 2.0, move |d| {
        let phase = ((d + offset) % 1000.0) / 1000.0;
        if phase < 0.15 { 30.0 + 200.0 * phase } else { 75.0 }
    })
}

fn bench_gaps(c: &mut Criterion) {
    let table = full_race();
    let codes = driver_codes();

    let mut group = c.benchmark_group("race_gaps");
    for drivers in [1, 5, DRIVERS] {
        group.bench_function(BenchmarkId::new("drivers", drivers), |b| {
            b.iter(|| black_box(race_gaps(black_box(&table), &codes[..drivers])))
        });
    }
    group.finish();
}

fn bench_degradation(c: &mut Criterion) {
    let table = stint_session();
    let config = DegradationConfig::default();

    let mut group = c.benchmark_group("degradation");
    group.bench_function("full_field", |b| {
        b.iter(|| black_box(tyre_degradation(black_box(&table), &config)))
    });

    for n in [10, 30, 60] {
        let x: Vec<f64> = (1..=n).map(f64::from).collect();
        let y: Vec<f64> = x.iter().map(|v| 90.0 + 0.05 * v + (v * 7.0).sin() * 0.2).collect();
        group.bench_function(BenchmarkId::new("theil_sen", n), |b| {
            b.iter(|| black_box(theil_sen(black_box(&x), black_box(&y), 0.90)))
        });
    }
    group.finish();
}

fn bench_telemetry(c: &mut Criterion) {
    let a = lap_trace(0.0);
    let b = lap_trace(37.0);

    let mut group = c.benchmark_group("telemetry");
    group.bench_function("ghost_delta_5m", |bench| {
        bench.iter(|| black_box(ghost_delta(black_box(&a), black_box(&b), 5.0)))
    });

    let laps: Vec<_> = (1..=10u32)
        .map(|lap| green_lap("D00", lap, 90.0 + f64::from(lap) * 0.05))
        .collect();
    let table = LapTable::new(laps);
    let telemetry: BTreeMap<u32, TelemetrySeries> =
        (1..=10u32).map(|lap| (lap, lap_trace(f64::from(lap) * 13.0))).collect();
    group.bench_function("theoretical_best_10_laps", |bench| {
        bench.iter(|| {
            black_box(theoretical_best(black_box(&table), "D00", black_box(&telemetry), 25))
        })
    });
    group.finish();
}

criterion_group!(benches, bench_gaps, bench_degradation, bench_telemetry);
criterion_main!(benches);
