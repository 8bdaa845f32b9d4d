//! Per-driver lap views: listings, summaries, classification and pace

use serde::Serialize;

use crate::stats::std_dev;
use crate::types::finite::finite_vec;
use crate::types::{Compound, LapTable};

/// Position reported for a driver whose best lap has no classification.
const UNCLASSIFIED_POSITION: u32 = 99;

/// One timed lap as listed for a driver.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
pub struct DriverLap {
    pub lap_number: u32,
    pub lap_time: f64,
    pub sector1: Option<f64>,
    pub sector2: Option<f64>,
    pub sector3: Option<f64>,
    pub compound: Compound,
    /// 0 when the tyre age was not recorded
    pub tyre_life: u32,
    pub is_personal_best: bool,
    pub is_pit_out: bool,
    pub is_pit_in: bool,
}

/// Timed laps of one driver; untimed laps are left out.
pub fn driver_laps(table: &LapTable, driver: &str) -> Vec<DriverLap> {
    let finite = |value: Option<f64>| value.filter(|v| v.is_finite());
    table
        .driver_laps(driver)
        .into_iter()
        .filter_map(|lap| {
            Some(DriverLap {
                lap_number: lap.lap_number,
                lap_time: lap.duration()?,
                sector1: finite(lap.sector1_time),
                sector2: finite(lap.sector2_time),
                sector3: finite(lap.sector3_time),
                compound: lap.compound,
                tyre_life: lap.tyre_life.unwrap_or(0),
                is_personal_best: lap.is_personal_best,
                is_pit_out: lap.pit_out,
                is_pit_in: lap.pit_in,
            })
        })
        .collect()
}

/// Best lap of one driver with the position held on that lap.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
pub struct DriverSummary {
    pub code: String,
    /// Formatted as `HH:MM:SS.mmm`
    pub best_lap: String,
    #[serde(skip)]
    pub best_lap_seconds: f64,
    pub position: u32,
}

/// Format a lap duration as `HH:MM:SS.mmm`, rounded to the millisecond.
pub fn format_lap_time(seconds: f64) -> String {
    let millis = (seconds.max(0.0) * 1000.0).round() as u64;
    let (hours, rest) = (millis / 3_600_000, millis % 3_600_000);
    let (minutes, rest) = (rest / 60_000, rest % 60_000);
    let (secs, millis) = (rest / 1000, rest % 1000);
    format!("{hours:02}:{minutes:02}:{secs:02}.{millis:03}")
}

/// Best lap of every driver, ordered by the position held on that lap.
///
/// Drivers without a timed lap are left out; an unclassified best lap sorts
/// last. Equal positions keep session order.
pub fn driver_summaries(table: &LapTable) -> Vec<DriverSummary> {
    let mut summaries: Vec<DriverSummary> = table
        .drivers()
        .iter()
        .filter_map(|driver| {
            let fastest = table.fastest_lap(driver)?;
            let best_lap_seconds = fastest.duration()?;
            Some(DriverSummary {
                code: driver.clone(),
                best_lap: format_lap_time(best_lap_seconds),
                best_lap_seconds,
                position: fastest.position.unwrap_or(UNCLASSIFIED_POSITION),
            })
        })
        .collect();
    summaries.sort_by_key(|summary| summary.position);
    summaries
}

/// How a lap was driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(rename_all = "UPPERCASE")]
pub enum LapType {
    /// Within the push threshold of the personal best
    Push,
    Slow,
    /// Ended in the pit lane
    In,
    /// Started from the pit lane
    Out,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedLap {
    pub lap_number: u32,
    pub lap_time: Option<f64>,
    pub lap_type: LapType,
}

/// Label every lap of a driver relative to their personal best.
///
/// Laps faster than `threshold` times the personal best are push laps,
/// everything else (including untimed laps) is slow. Pit laps override
/// both, and an out lap wins over an in lap. A driver without any timed
/// lap gets no labels.
pub fn classify_laps(table: &LapTable, driver: &str, threshold: f64) -> Vec<ClassifiedLap> {
    let Some(personal_best) = table.fastest_lap(driver).and_then(|lap| lap.duration()) else {
        return Vec::new();
    };
    let push_limit = personal_best * threshold;

    table
        .driver_laps(driver)
        .into_iter()
        .map(|lap| {
            let lap_type = if lap.pit_out {
                LapType::Out
            } else if lap.pit_in {
                LapType::In
            } else if lap.duration().is_some_and(|t| t < push_limit) {
                LapType::Push
            } else {
                LapType::Slow
            };
            ClassifiedLap { lap_number: lap.lap_number, lap_time: lap.duration(), lap_type }
        })
        .collect()
}

/// Cumulative pace of a driver against the session's fastest lap.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct PaceTrend {
    /// Lap numbers
    pub x: Vec<u32>,
    /// Seconds lost to the session's fastest lap, accumulated
    #[serde(serialize_with = "finite_vec")]
    pub y: Vec<f64>,
}

/// Running sum of `lap time - session fastest lap` over a driver's timed
/// laps.
pub fn race_pace_trend(table: &LapTable, driver: &str) -> PaceTrend {
    let Some(reference) = table.fastest_overall().and_then(|lap| lap.duration()) else {
        return PaceTrend::default();
    };

    let mut trend = PaceTrend::default();
    let mut total = 0.0;
    for lap in table.driver_laps(driver) {
        let Some(time) = lap.duration() else { continue };
        total += time - reference;
        trend.x.push(lap.lap_number);
        trend.y.push(total);
    }
    trend
}

/// Population standard deviation of a driver's timed laps; 0 without any.
pub fn consistency_score(table: &LapTable, driver: &str) -> f64 {
    let times: Vec<f64> =
        table.driver_laps(driver).iter().filter_map(|lap| lap.duration()).collect();
    std_dev(&times)
}
