//! Race analysis algorithms.
//!
//! Every function here is a pure, synchronous computation over an explicitly
//! passed [`LapTable`](crate::types::LapTable) or
//! [`TelemetrySeries`](crate::types::TelemetrySeries). None of them hold
//! state between calls, so sessions can be analysed concurrently and each
//! function may be run on a blocking worker by the
//! [`AnalysisEngine`](crate::AnalysisEngine).
//!
//! Partial failures (one driver, one lap, one compound) never abort a call.
//! They are recorded in the [`SkipReport`] returned with the result.

mod braking;
mod comparison;
mod degradation;
mod fuel;
mod gap;
mod ghost;
mod laps;
mod stints;
mod theoretical_best;
mod zones;

pub use braking::{BrakingZone, braking_zones};
pub use comparison::{SpeedComparison, compare_speed};
pub use degradation::{
    DegradationEntry, DegradationReport, FieldCorrection, driver_degradation, is_clean_lap,
    tyre_degradation,
};
pub use fuel::{FuelCorrectedLap, fuel_corrected_laps};
pub use gap::{GapChart, GapPoint, LeaderTimes, driver_gaps, race_gaps};
pub use ghost::{GhostDelta, distance_time_interpolant, ghost_delta};
pub use laps::{
    ClassifiedLap, DriverLap, DriverSummary, LapType, PaceTrend, classify_laps, consistency_score,
    driver_laps, driver_summaries, format_lap_time, race_pace_trend,
};
pub use stints::{DriverStrategy, Stint, driver_stints, session_stints};
pub use theoretical_best::{SectorSegment, TheoreticalBest, theoretical_best, theoretical_best_laps};
pub use zones::{Zone, ZoneScanner};

use serde::Serialize;
use tracing::debug;

use crate::AnalysisError;

/// One unit of work left out of a result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct Skipped {
    /// The unit, e.g. `"VER lap 12"` or `"HAM SOFT"`
    pub unit: String,
    pub reason: String,
}

/// Units excluded from a result and why.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(transparent)]
pub struct SkipReport {
    entries: Vec<Skipped>,
}

impl SkipReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a unit skipped because of a partial failure.
    pub fn record(&mut self, unit: impl Into<String>, error: &AnalysisError) {
        let unit = unit.into();
        debug!(unit = %unit, reason = %error, "Skipping unit");
        self.entries.push(Skipped { unit, reason: error.to_string() });
    }

    /// Record a unit skipped by a filter rather than an error.
    pub fn note(&mut self, unit: impl Into<String>, reason: impl Into<String>) {
        self.entries.push(Skipped { unit: unit.into(), reason: reason.into() });
    }

    /// Append another report, keeping its order.
    pub fn extend(&mut self, other: SkipReport) {
        self.entries.extend(other.entries);
    }

    pub fn entries(&self) -> &[Skipped] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a unit with this exact name was skipped.
    pub fn contains(&self, unit: &str) -> bool {
        self.entries.iter().any(|entry| entry.unit == unit)
    }
}

/// A result together with the units that were left out of it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis<T> {
    pub result: T,
    pub skipped: SkipReport,
}

impl<T> Analysis<T> {
    pub fn new(result: T, skipped: SkipReport) -> Self {
        Self { result, skipped }
    }

    /// A result with nothing skipped.
    pub fn complete(result: T) -> Self {
        Self { result, skipped: SkipReport::default() }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Analysis<U> {
        Analysis { result: f(self.result), skipped: self.skipped }
    }
}
