//! Tyre stints per driver
//!
//! A stint is a run of consecutive laps on the same compound. The scan is
//! two-state: outside a stint before the first lap, then inside one until
//! the compound changes.

use serde::Serialize;

use crate::types::{Compound, LapTable};

/// Laps driven on one compound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
pub struct Stint {
    pub compound: Compound,
    pub start_lap: u32,
    pub end_lap: u32,
}

impl Stint {
    pub fn laps(&self) -> u32 {
        self.end_lap.saturating_sub(self.start_lap) + 1
    }
}

/// Stints of one driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct DriverStrategy {
    pub driver: String,
    pub stints: Vec<Stint>,
}

/// Stints of one driver in lap order.
///
/// A stint ends on the lap before the compound changes; the last stint
/// ends on the driver's final lap. Laps without a recorded compound form
/// `UNKNOWN` stints.
pub fn driver_stints(table: &LapTable, driver: &str) -> Vec<Stint> {
    let laps = table.driver_laps(driver);
    let mut stints = Vec::new();
    let mut current: Option<(Compound, u32)> = None;

    for lap in &laps {
        match current {
            Some((compound, _)) if compound == lap.compound => {}
            Some((compound, start_lap)) => {
                let end_lap = lap.lap_number.saturating_sub(1);
                stints.push(Stint { compound, start_lap, end_lap });
                current = Some((lap.compound, lap.lap_number));
            }
            None => current = Some((lap.compound, lap.lap_number)),
        }
    }

    if let (Some((compound, start_lap)), Some(last)) = (current, laps.last()) {
        stints.push(Stint { compound, start_lap, end_lap: last.lap_number });
    }
    stints
}

/// Stints of every driver, in session order.
pub fn session_stints(table: &LapTable) -> Vec<DriverStrategy> {
    table
        .drivers()
        .iter()
        .map(|driver| DriverStrategy {
            driver: driver.clone(),
            stints: driver_stints(table, driver),
        })
        .collect()
}
