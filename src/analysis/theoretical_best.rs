//! Theoretical best lap from micro-sectors
//!
//! The reference lap (the driver's fastest valid lap with telemetry) is cut
//! into equal-length micro-sectors. Every valid lap is timed over the same
//! distances, and the best time in each micro-sector is kept. Because the
//! reference lap is one of the candidates, the sum of the bests can never
//! exceed the reference lap.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, trace};

use super::{Analysis, SkipReport, distance_time_interpolant};
use crate::AnalysisError;
use crate::stats::boundaries;
use crate::types::finite::{finite, finite_vec};
use crate::types::{LapRecord, LapTable, TelemetrySeries};

/// One micro-sector of the reference lap.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct SectorSegment {
    pub sector_index: usize,
    /// Reference lap X coordinates within the sector; empty without position data
    #[serde(serialize_with = "finite_vec")]
    pub x: Vec<f64>,
    #[serde(serialize_with = "finite_vec")]
    pub y: Vec<f64>,
    /// Seconds the reference lap lost to the best time in this sector
    #[serde(serialize_with = "finite")]
    pub time_lost: f64,
    /// `time_lost` as a fraction of the reference sector time
    #[serde(serialize_with = "finite")]
    pub pct_lost: f64,
    /// Best time over all valid laps
    #[serde(skip)]
    pub best: f64,
    /// Reference lap time in this sector
    #[serde(skip)]
    pub reference: f64,
}

/// Theoretical best of one driver.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct TheoreticalBest {
    pub driver: String,
    /// Sum of the best micro-sector times
    #[serde(serialize_with = "finite")]
    pub theoretical_best: f64,
    /// Reference lap time measured over the same micro-sectors
    #[serde(serialize_with = "finite")]
    pub actual_best: f64,
    /// `actual_best - theoretical_best`, never negative
    #[serde(serialize_with = "finite")]
    pub diff: f64,
    pub segments: Vec<SectorSegment>,
    /// Whether the reference lap carried X/Y coordinates
    pub position_available: bool,
    #[serde(skip)]
    pub reference_lap: u32,
    /// Timed duration of the reference lap as recorded
    #[serde(skip)]
    pub reference_lap_time: f64,
    /// Laps whose micro-sectors entered the minimum
    #[serde(skip)]
    pub laps_used: usize,
}

impl TheoreticalBest {
    /// Best time of every micro-sector in order.
    pub fn sector_bests(&self) -> impl Iterator<Item = f64> + '_ {
        self.segments.iter().map(|segment| segment.best)
    }
}

/// Laps eligible for the theoretical best, fastest first.
///
/// Accurate timed laps are preferred; a driver without any falls back to
/// every timed lap outside the pit lane. Equal times keep lap order.
pub fn theoretical_best_laps<'a>(table: &'a LapTable, driver: &str) -> Vec<&'a LapRecord> {
    let timed: Vec<&LapRecord> =
        table.driver_laps(driver).into_iter().filter(|lap| lap.duration().is_some()).collect();

    let mut valid: Vec<&LapRecord> = timed.iter().copied().filter(|lap| lap.is_accurate).collect();
    if valid.is_empty() {
        valid = timed.into_iter().filter(|lap| !lap.is_pit_lap()).collect();
    }
    valid.sort_by(|a, b| {
        let ta = a.duration().unwrap_or(f64::INFINITY);
        let tb = b.duration().unwrap_or(f64::INFINITY);
        ta.total_cmp(&tb).then(a.lap_number.cmp(&b.lap_number))
    });
    valid
}

/// Micro-sector durations of every valid lap with usable telemetry, fastest
/// lap first. Laps without usable telemetry are noted in `skipped`.
fn sector_rows<'a>(
    driver: &str,
    laps: &[&'a LapRecord],
    telemetry: &'a BTreeMap<u32, TelemetrySeries>,
    micro_sectors: usize,
    skipped: &mut SkipReport,
) -> Option<(Vec<f64>, Vec<(&'a LapRecord, &'a TelemetrySeries, Vec<f64>)>)> {
    let mut bounds: Option<Vec<f64>> = None;
    let mut rows = Vec::new();

    for &lap in laps {
        let unit = format!("{driver} lap {}", lap.lap_number);
        let Some(series) = telemetry.get(&lap.lap_number) else {
            skipped.note(unit, "no telemetry");
            continue;
        };
        let interpolant = match distance_time_interpolant(series) {
            Ok(interpolant) => interpolant,
            Err(error) => {
                skipped.record(unit, &error);
                continue;
            }
        };

        // The first usable lap is the reference and fixes the boundaries.
        if bounds.is_none() {
            match series.max_distance().filter(|d| *d > 0.0) {
                Some(max_distance) => bounds = Some(boundaries(max_distance, micro_sectors)),
                None => {
                    skipped.record(unit, &AnalysisError::insufficient_data("lap distance", 1, 0));
                    continue;
                }
            }
        }
        let Some(axis) = bounds.as_deref() else {
            continue;
        };

        let times = interpolant.eval_many(axis);
        let sectors: Vec<f64> = times.windows(2).map(|w| w[1] - w[0]).collect();
        if sectors.iter().any(|s| !s.is_finite()) {
            skipped.note(unit, "non-finite micro-sector time");
            continue;
        }
        trace!(driver, lap = lap.lap_number, "Timed micro-sectors");
        rows.push((lap, series, sectors));
    }

    bounds.map(|bounds| (bounds, rows))
}

/// Theoretical best lap of one driver.
///
/// `telemetry` maps lap numbers to that lap's telemetry; laps without an
/// entry are skipped. Returns `None` when no valid lap has usable
/// telemetry.
pub fn theoretical_best(
    table: &LapTable,
    driver: &str,
    telemetry: &BTreeMap<u32, TelemetrySeries>,
    micro_sectors: usize,
) -> Analysis<Option<TheoreticalBest>> {
    let mut skipped = SkipReport::new();
    if micro_sectors == 0 {
        skipped.record(driver, &AnalysisError::insufficient_data("micro-sectors", 1, 0));
        return Analysis::new(None, skipped);
    }

    let laps = theoretical_best_laps(table, driver);
    if laps.is_empty() {
        let error = AnalysisError::insufficient_data("valid laps for theoretical best", 1, 0);
        skipped.record(driver, &error);
        return Analysis::new(None, skipped);
    }

    let Some((bounds, rows)) = sector_rows(driver, &laps, telemetry, micro_sectors, &mut skipped)
        .filter(|(_, rows)| !rows.is_empty())
    else {
        let error = AnalysisError::insufficient_data("valid laps with telemetry", 1, 0);
        skipped.record(driver, &error);
        return Analysis::new(None, skipped);
    };

    let mut best = vec![f64::INFINITY; micro_sectors];
    for (_, _, sectors) in &rows {
        for (slot, sector) in best.iter_mut().zip(sectors) {
            *slot = slot.min(*sector);
        }
    }

    let (reference_lap, reference_series, reference) = &rows[0];
    let position_available = reference_series.has_position();
    if !position_available {
        let lap = reference_lap.lap_number;
        let error = AnalysisError::missing_channel("X/Y", format!("{driver} lap {lap}"));
        skipped.record(format!("{driver} lap {lap} position"), &error);
    }

    let segments: Vec<SectorSegment> = bounds
        .windows(2)
        .enumerate()
        .map(|(index, window)| {
            let (x, y): (Vec<f64>, Vec<f64>) = if position_available {
                reference_series
                    .samples()
                    .iter()
                    .filter(|s| s.distance.is_some_and(|d| d >= window[0] && d <= window[1]))
                    .filter_map(|s| Some((s.x?, s.y?)))
                    .unzip()
            } else {
                (Vec::new(), Vec::new())
            };
            let time_lost = reference[index] - best[index];
            let pct_lost = if reference[index] == 0.0 { 0.0 } else { time_lost / reference[index] };
            SectorSegment {
                sector_index: index,
                x,
                y,
                time_lost,
                pct_lost,
                best: best[index],
                reference: reference[index],
            }
        })
        .collect();

    let theoretical_best: f64 = best.iter().sum();
    let actual_best: f64 = reference.iter().sum();
    let result = TheoreticalBest {
        driver: driver.to_string(),
        theoretical_best,
        actual_best,
        diff: actual_best - theoretical_best,
        segments,
        position_available,
        reference_lap: reference_lap.lap_number,
        reference_lap_time: reference_lap.duration().unwrap_or(f64::NAN),
        laps_used: rows.len(),
    };

    debug!(
        driver,
        reference_lap = result.reference_lap,
        laps_used = result.laps_used,
        diff = result.diff,
        "Computed theoretical best"
    );
    Analysis::new(Some(result), skipped)
}
