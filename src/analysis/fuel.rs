//! Fuel-corrected lap times
//!
//! Each representative lap is normalised to an empty tank:
//! `corrected = actual - max(0, start - lap * burn) * loss`.

use serde::Serialize;
use tracing::debug;

use super::{Analysis, SkipReport};
use crate::config::FuelModel;
use crate::types::LapRecord;
use crate::types::finite::finite;

/// One lap with the estimated fuel weight penalty removed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct FuelCorrectedLap {
    pub lap: u32,
    #[serde(serialize_with = "finite")]
    pub actual: f64,
    #[serde(serialize_with = "finite")]
    pub corrected: f64,
    /// Fuel on board in kilograms
    #[serde(rename = "fuelLoad", serialize_with = "finite")]
    pub fuel_load: f64,
}

impl FuelModel {
    /// Fuel left after `lap` laps, never negative.
    pub fn remaining_fuel(&self, lap: u32) -> f64 {
        (self.start_fuel_kg - f64::from(lap) * self.burn_rate_kg_per_lap).max(0.0)
    }

    /// Seconds the remaining fuel costs on lap `lap`.
    pub fn time_effect(&self, lap: u32) -> f64 {
        self.remaining_fuel(lap) * self.time_loss_s_per_kg
    }

    /// Correct a single lap; `None` for untimed and pit laps.
    pub fn correct(&self, lap: &LapRecord) -> Option<FuelCorrectedLap> {
        if lap.is_pit_lap() {
            return None;
        }
        let actual = lap.duration()?;
        Some(FuelCorrectedLap {
            lap: lap.lap_number,
            actual,
            corrected: actual - self.time_effect(lap.lap_number),
            fuel_load: self.remaining_fuel(lap.lap_number),
        })
    }
}

/// Fuel-corrected times of one driver's laps, in input order.
///
/// Untimed laps and pit-in/pit-out laps are left out and noted in the skip
/// report.
pub fn fuel_corrected_laps<'a, I>(laps: I, model: &FuelModel) -> Analysis<Vec<FuelCorrectedLap>>
where
    I: IntoIterator<Item = &'a LapRecord>,
{
    let mut corrected = Vec::new();
    let mut skipped = SkipReport::new();

    for lap in laps {
        match model.correct(lap) {
            Some(entry) => corrected.push(entry),
            None if lap.is_pit_lap() => {
                skipped.note(format!("{} lap {}", lap.driver, lap.lap_number), "pit lap")
            }
            None => skipped.note(format!("{} lap {}", lap.driver, lap.lap_number), "no lap time"),
        }
    }

    debug!(laps = corrected.len(), skipped = skipped.len(), "Computed fuel-corrected laps");
    Analysis::new(corrected, skipped)
}
