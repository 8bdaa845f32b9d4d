//! Synthetic session builders for tests and benchmarks
//!
//! Real sessions come from the data provider; these helpers build small,
//! fully controlled tables and traces whose expected analysis results can be
//! worked out by hand.

#![cfg(any(test, feature = "benchmark"))]

use crate::types::{Compound, LapRecord, LapTable, TelemetrySample, TelemetrySeries};

/// Build a race table from cumulative session times per driver.
///
/// Lap times are the differences between consecutive cumulative times and
/// positions are ranked by cumulative time at each lap (ties keep entry
/// order). Every lap is green, accurate and on used mediums.
pub fn race_table<S, T>(entries: &[(S, T)]) -> LapTable
where
    S: AsRef<str>,
    T: AsRef<[f64]>,
{
    let max_laps = entries.iter().map(|(_, times)| times.as_ref().len()).max().unwrap_or(0);
    let mut laps = Vec::new();

    for lap_index in 0..max_laps {
        let mut running: Vec<(usize, f64)> = entries
            .iter()
            .enumerate()
            .filter_map(|(i, (_, times))| times.as_ref().get(lap_index).map(|t| (i, *t)))
            .collect();
        running.sort_by(|a, b| a.1.total_cmp(&b.1));

        for (rank, (entry, cumulative)) in running.into_iter().enumerate() {
            let (driver, times) = &entries[entry];
            let previous = if lap_index == 0 { 0.0 } else { times.as_ref()[lap_index - 1] };
            let lap_number = lap_index as u32 + 1;

            let mut lap = green_lap(driver.as_ref(), lap_number, cumulative - previous);
            lap.session_time = Some(cumulative);
            lap.position = Some(rank as u32 + 1);
            laps.push(lap);
        }
    }

    LapTable::new(laps)
}

/// A green-flag, accurate lap on mediums with tyre life equal to the lap.
pub fn green_lap(driver: &str, lap_number: u32, lap_time: f64) -> LapRecord {
    let mut lap = LapRecord::new(driver, lap_number, Some(lap_time));
    lap.is_accurate = true;
    lap.track_status = Some("1".to_string());
    lap.compound = Compound::Medium;
    lap.tyre_life = Some(lap_number);
    lap
}

/// One stint of clean laps with a linear wear rate.
///
/// Lap `k` of the stint (tyre life `k`, starting at 1) takes
/// `base + wear_per_lap * k` seconds.
pub fn stint_laps(
    driver: &str,
    compound: Compound,
    first_lap: u32,
    count: u32,
    base: f64,
    wear_per_lap: f64,
) -> Vec<LapRecord> {
    (0..count)
        .map(|k| {
            let tyre_life = k + 1;
            let time = base + wear_per_lap * f64::from(tyre_life);
            let mut lap = green_lap(driver, first_lap + k, time);
            lap.compound = compound;
            lap.tyre_life = Some(tyre_life);
            lap
        })
        .collect()
}

/// Telemetry for a lap of `length_m` sampled every `step_m`, at a speed
/// (m/s) given as a function of distance. Samples carry X/Y on a circle of
/// the same circumference.
pub fn trace_from_speed(length_m: f64, step_m: f64, speed: impl Fn(f64) -> f64) -> TelemetrySeries {
    let radius = length_m / std::f64::consts::TAU;
    let mut samples = Vec::new();
    let mut time = 0.0;
    let mut distance = 0.0;

    while distance <= length_m {
        let v = speed(distance);
        let angle = distance / radius;
        samples.push(TelemetrySample {
            time: Some(time),
            distance: Some(distance),
            speed: Some(v * 3.6),
            throttle: Some(100.0),
            brake: Some(0.0),
            rpm: Some(11_000.0),
            gear: Some(7),
            x: Some(radius * angle.cos()),
            y: Some(radius * angle.sin()),
        });
        time += step_m / v;
        distance += step_m;
    }

    TelemetrySeries::new(samples)
}

/// Same as [`trace_from_speed`] with a constant speed.
pub fn constant_speed_trace(length_m: f64, step_m: f64, speed_mps: f64) -> TelemetrySeries {
    trace_from_speed(length_m, step_m, |_| speed_mps)
}

/// Remove the X/Y channels from a trace.
pub fn without_position(series: &TelemetrySeries) -> TelemetrySeries {
    series
        .samples()
        .iter()
        .map(|sample| TelemetrySample { x: None, y: None, ..sample.clone() })
        .collect()
}

/// Install a test subscriber honouring `RUST_LOG`; repeated calls are no-ops.
#[cfg(test)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
