//! Gap-to-leader evolution ("worm chart")
//!
//! Gaps are aligned by lap number, not by time window: at lap N a driver's
//! gap is their cumulative session time at the end of lap N minus that of
//! whoever was classified P1 at the end of lap N.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, trace};

use super::{Analysis, SkipReport};
use crate::types::LapTable;
use crate::types::finite::finite;

/// Gap of one driver at the end of one lap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct GapPoint {
    pub lap: u32,
    /// Seconds behind the leader
    #[serde(serialize_with = "finite")]
    pub gap: f64,
    pub position: Option<u32>,
}

/// Gap series of every requested driver, in request order.
///
/// Serializes as `{driver: [{lap, gap, position}]}`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GapChart {
    drivers: Vec<(String, Vec<GapPoint>)>,
}

impl GapChart {
    pub fn push(&mut self, driver: impl Into<String>, gaps: Vec<GapPoint>) {
        self.drivers.push((driver.into(), gaps));
    }

    /// Gap series of one driver.
    pub fn get(&self, driver: &str) -> Option<&[GapPoint]> {
        self.drivers.iter().find(|(code, _)| code == driver).map(|(_, gaps)| gaps.as_slice())
    }

    /// Driver codes in output order.
    pub fn drivers(&self) -> impl Iterator<Item = &str> {
        self.drivers.iter().map(|(code, _)| code.as_str())
    }

    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }
}

impl Serialize for GapChart {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.drivers.len()))?;
        for (driver, gaps) in &self.drivers {
            map.serialize_entry(driver, gaps)?;
        }
        map.end()
    }
}

/// Cumulative session time of the P1 car at the end of each lap.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeaderTimes {
    by_lap: BTreeMap<u32, f64>,
}

impl LeaderTimes {
    /// Collect leader times from a session.
    ///
    /// Should two records both claim P1 on the same lap, the earlier session
    /// time wins.
    pub fn from_table(table: &LapTable) -> Self {
        let mut by_lap: BTreeMap<u32, f64> = BTreeMap::new();
        for lap in table.laps().iter().filter(|lap| lap.position == Some(1)) {
            let Some(time) = lap.session_time.filter(|t| t.is_finite()) else {
                continue;
            };
            by_lap
                .entry(lap.lap_number)
                .and_modify(|leader| *leader = leader.min(time))
                .or_insert(time);
        }
        Self { by_lap }
    }

    pub fn at(&self, lap: u32) -> Option<f64> {
        self.by_lap.get(&lap).copied()
    }

    /// Number of laps with an identified leader.
    pub fn len(&self) -> usize {
        self.by_lap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_lap.is_empty()
    }
}

/// Gap series of a single driver, or `None` when the driver is not in the
/// session.
///
/// Laps without a leader, or without a session time for this driver, are
/// left out.
pub fn driver_gaps(table: &LapTable, leaders: &LeaderTimes, driver: &str) -> Option<Vec<GapPoint>> {
    if !table.contains_driver(driver) {
        return None;
    }

    let gaps: Vec<GapPoint> = table
        .driver_laps(driver)
        .into_iter()
        .filter_map(|lap| {
            let time = lap.session_time.filter(|t| t.is_finite())?;
            let Some(leader) = leaders.at(lap.lap_number) else {
                trace!(driver, lap = lap.lap_number, "No leader on lap");
                return None;
            };
            Some(GapPoint { lap: lap.lap_number, gap: time - leader, position: lap.position })
        })
        .collect();
    Some(gaps)
}

/// Gap-to-leader series for the requested drivers.
///
/// Drivers missing from the session are omitted from the chart and noted in
/// the skip report. Repeated driver codes are reported once.
pub fn race_gaps<S: AsRef<str>>(table: &LapTable, drivers: &[S]) -> Analysis<GapChart> {
    let leaders = LeaderTimes::from_table(table);
    let mut chart = GapChart::default();
    let mut skipped = SkipReport::new();
    let mut seen = HashSet::new();

    for driver in drivers.iter().map(AsRef::as_ref) {
        if !seen.insert(driver) {
            continue;
        }
        match driver_gaps(table, &leaders, driver) {
            Some(gaps) => chart.push(driver, gaps),
            None => skipped.note(driver, "driver not in session"),
        }
    }

    debug!(drivers = chart.len(), leader_laps = leaders.len(), "Computed race gaps");
    Analysis::new(chart, skipped)
}
