//! Immutable lap table for one session

use std::collections::HashMap;
use tracing::debug;

use super::LapRecord;

/// All laps of one session, indexed by driver.
///
/// Drivers keep the order in which they first appear in the provider data;
/// each driver's laps are sorted by lap number. The table is never mutated
/// after construction.
#[derive(Debug, Clone, Default)]
pub struct LapTable {
    laps: Vec<LapRecord>,
    drivers: Vec<String>,
    by_driver: HashMap<String, Vec<usize>>,
}

impl LapTable {
    /// Build a table from provider records.
    ///
    /// A repeated lap number for the same driver keeps the first record.
    pub fn new(records: Vec<LapRecord>) -> Self {
        let mut drivers: Vec<String> = Vec::new();
        let mut grouped: HashMap<String, Vec<LapRecord>> = HashMap::new();

        for record in records {
            if !grouped.contains_key(&record.driver) {
                drivers.push(record.driver.clone());
            }
            grouped.entry(record.driver.clone()).or_default().push(record);
        }

        let mut laps = Vec::new();
        let mut by_driver = HashMap::with_capacity(drivers.len());
        for driver in &drivers {
            let mut driver_laps = grouped.remove(driver).unwrap_or_default();
            driver_laps.sort_by_key(|lap| lap.lap_number);
            let before = driver_laps.len();
            driver_laps.dedup_by_key(|lap| lap.lap_number);
            if driver_laps.len() != before {
                let dropped = before - driver_laps.len();
                debug!(driver = %driver, dropped, "Dropped duplicate lap numbers");
            }

            let start = laps.len();
            laps.extend(driver_laps);
            by_driver.insert(driver.clone(), (start..laps.len()).collect());
        }

        Self { laps, drivers, by_driver }
    }

    /// Every lap, grouped by driver.
    pub fn laps(&self) -> &[LapRecord] {
        &self.laps
    }

    /// Driver codes in first-seen order.
    pub fn drivers(&self) -> &[String] {
        &self.drivers
    }

    pub fn contains_driver(&self, driver: &str) -> bool {
        self.by_driver.contains_key(driver)
    }

    /// Laps of one driver in lap-number order; empty for unknown drivers.
    pub fn driver_laps(&self, driver: &str) -> Vec<&LapRecord> {
        self.by_driver
            .get(driver)
            .map(|indices| indices.iter().map(|&i| &self.laps[i]).collect())
            .unwrap_or_default()
    }

    /// One lap of one driver.
    pub fn lap(&self, driver: &str, lap_number: u32) -> Option<&LapRecord> {
        self.driver_laps(driver).into_iter().find(|lap| lap.lap_number == lap_number)
    }

    /// Highest lap number in the session, 0 when empty.
    pub fn max_lap(&self) -> u32 {
        self.laps.iter().map(|lap| lap.lap_number).max().unwrap_or(0)
    }

    /// Fastest timed lap of one driver; ties keep the earliest lap.
    pub fn fastest_lap(&self, driver: &str) -> Option<&LapRecord> {
        fastest(self.driver_laps(driver))
    }

    /// Fastest timed lap of the whole session.
    pub fn fastest_overall(&self) -> Option<&LapRecord> {
        fastest(self.laps.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.laps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.laps.len()
    }
}

fn fastest<'a, I>(laps: I) -> Option<&'a LapRecord>
where
    I: IntoIterator<Item = &'a LapRecord>,
{
    laps.into_iter()
        .filter_map(|lap| lap.duration().map(|time| (time, lap)))
        .fold(None, |best: Option<(f64, &LapRecord)>, (time, lap)| match best {
            Some((best_time, _)) if best_time <= time => best,
            _ => Some((time, lap)),
        })
        .map(|(_, lap)| lap)
}

impl From<Vec<LapRecord>> for LapTable {
    fn from(records: Vec<LapRecord>) -> Self {
        Self::new(records)
    }
}
