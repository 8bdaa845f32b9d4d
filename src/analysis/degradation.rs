//! Tyre degradation isolated from fuel burn and track evolution
//!
//! Pace loss is regressed against tyre age after two corrections: a fixed
//! per-lap fuel penalty is added back to hold the fuel load constant, and
//! the field-wide improvement trend (rubber going down) is added back so a
//! track that gets faster does not hide tyre wear. Both fits use Theil-Sen,
//! so a few laps in traffic do not move the estimate.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use tracing::{debug, trace};

use super::{Analysis, SkipReport};
use crate::AnalysisError;
use crate::config::DegradationConfig;
use crate::stats::theil_sen;
use crate::types::finite::finite;
use crate::types::{Compound, LapRecord, LapTable};

/// Degradation rate of one driver on one compound.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct DegradationEntry {
    pub driver: String,
    /// Seconds lost per lap of tyre age
    #[serde(serialize_with = "finite")]
    pub deg_per_lap: f64,
    pub laps_analyzed: usize,
}

/// Degradation rates grouped by compound.
///
/// Always carries every racing compound, each list sorted from the lowest
/// rate to the highest. Serializes as `{COMPOUND: [entry]}`.
#[derive(Debug, Clone, PartialEq)]
pub struct DegradationReport {
    by_compound: BTreeMap<Compound, Vec<DegradationEntry>>,
    track_evolution_per_lap: f64,
}

impl DegradationReport {
    /// Group entries by compound and sort each group.
    ///
    /// Ties on rate are broken by driver code so the order never depends on
    /// the order entries were produced in.
    pub fn from_entries<I>(track_evolution_per_lap: f64, entries: I) -> Self
    where
        I: IntoIterator<Item = (Compound, DegradationEntry)>,
    {
        let mut by_compound: BTreeMap<Compound, Vec<DegradationEntry>> =
            Compound::RACING.iter().map(|&compound| (compound, Vec::new())).collect();
        for (compound, entry) in entries {
            if let Some(list) = by_compound.get_mut(&compound) {
                list.push(entry);
            }
        }
        for list in by_compound.values_mut() {
            list.sort_by(|a, b| {
                a.deg_per_lap.total_cmp(&b.deg_per_lap).then_with(|| a.driver.cmp(&b.driver))
            });
        }
        Self { by_compound, track_evolution_per_lap }
    }

    /// Entries for one compound, best tyre management first.
    pub fn get(&self, compound: Compound) -> &[DegradationEntry] {
        self.by_compound.get(&compound).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Compound, &[DegradationEntry])> {
        self.by_compound.iter().map(|(compound, list)| (*compound, list.as_slice()))
    }

    /// Field-wide improvement removed before fitting, seconds per lap.
    pub fn track_evolution_per_lap(&self) -> f64 {
        self.track_evolution_per_lap
    }

    /// Whether no driver received a rate on any compound.
    pub fn is_empty(&self) -> bool {
        self.by_compound.values().all(Vec::is_empty)
    }
}

impl Default for DegradationReport {
    fn default() -> Self {
        Self::from_entries(0.0, [])
    }
}

impl Serialize for DegradationReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.by_compound.len()))?;
        for (compound, entries) in &self.by_compound {
            map.serialize_entry(compound, entries)?;
        }
        map.end()
    }
}

/// Whether a lap is representative enough for the degradation fits.
///
/// Green flag, flagged accurate, timed, and neither entering nor leaving
/// the pits.
pub fn is_clean_lap(lap: &LapRecord) -> bool {
    lap.is_green_flag() && lap.is_accurate && !lap.is_pit_lap() && lap.duration().is_some()
}

/// Field-wide corrections applied to every clean lap before the per-driver
/// fits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldCorrection {
    fuel_penalty_per_lap: f64,
    track_evolution_per_lap: f64,
}

impl FieldCorrection {
    /// Estimate track evolution from every clean lap of the session.
    ///
    /// Evolution can only make the track faster: a flat or rising field
    /// trend counts as no evolution.
    pub fn prepare(table: &LapTable, config: &DegradationConfig) -> Self {
        let fuel_penalty_per_lap = config.fuel_penalty_per_lap();
        let (x, y): (Vec<f64>, Vec<f64>) = table
            .laps()
            .iter()
            .filter(|lap| is_clean_lap(lap))
            .filter_map(|lap| {
                let lap_number = f64::from(lap.lap_number);
                lap.duration().map(|t| (lap_number, t + lap_number * fuel_penalty_per_lap))
            })
            .unzip();

        let track_evolution_per_lap = match theil_sen(&x, &y, config.confidence) {
            Some(fit) if fit.slope < 0.0 => -fit.slope,
            Some(_) => 0.0,
            None => {
                debug!(clean_laps = x.len(), "No field trend, assuming no track evolution");
                0.0
            }
        };

        debug!(clean_laps = x.len(), track_evolution_per_lap, "Prepared field correction");
        Self { fuel_penalty_per_lap, track_evolution_per_lap }
    }

    pub fn track_evolution_per_lap(&self) -> f64 {
        self.track_evolution_per_lap
    }

    /// Lap time with fuel burn and track evolution both added back.
    pub fn corrected_time(&self, lap: &LapRecord) -> Option<f64> {
        let lap_number = f64::from(lap.lap_number);
        let penalty = lap_number * (self.fuel_penalty_per_lap + self.track_evolution_per_lap);
        lap.duration().map(|t| t + penalty)
    }
}

/// Degradation rates of one driver on every racing compound they ran.
///
/// Compounds with fewer than `min_laps` clean laps of known tyre age, or
/// with no spread in tyre age, are skipped.
pub fn driver_degradation(
    table: &LapTable,
    driver: &str,
    correction: &FieldCorrection,
    config: &DegradationConfig,
) -> Analysis<Vec<(Compound, DegradationEntry)>> {
    let clean: Vec<&LapRecord> =
        table.driver_laps(driver).into_iter().filter(|lap| is_clean_lap(lap)).collect();
    let mut entries = Vec::new();
    let mut skipped = SkipReport::new();

    if clean.iter().any(|lap| lap.compound == Compound::Unknown) {
        skipped.note(format!("{driver} {}", Compound::Unknown), "compound not recorded");
    }

    for compound in Compound::RACING {
        let (x, y): (Vec<f64>, Vec<f64>) = clean
            .iter()
            .filter(|lap| lap.compound == compound)
            .filter_map(|lap| Some((f64::from(lap.tyre_life?), correction.corrected_time(lap)?)))
            .unzip();
        if x.is_empty() {
            continue;
        }

        let unit = format!("{driver} {compound}");
        if x.len() < config.min_laps {
            let error = AnalysisError::insufficient_data(
                format!("{compound} regression for {driver}"),
                config.min_laps,
                x.len(),
            );
            skipped.record(unit, &error);
            continue;
        }

        let Some(fit) = theil_sen(&x, &y, config.confidence) else {
            let error = AnalysisError::insufficient_data(
                format!("distinct tyre ages on {compound} for {driver}"),
                2,
                1,
            );
            skipped.record(unit, &error);
            continue;
        };

        trace!(driver, %compound, slope = fit.slope, laps = x.len(), "Fitted degradation");
        let entry = DegradationEntry {
            driver: driver.to_string(),
            deg_per_lap: fit.slope,
            laps_analyzed: x.len(),
        };
        entries.push((compound, entry));
    }

    Analysis::new(entries, skipped)
}

/// Tyre degradation of the whole field, per compound.
///
/// A session without clean laps yields an empty list for every compound.
pub fn tyre_degradation(
    table: &LapTable,
    config: &DegradationConfig,
) -> Analysis<DegradationReport> {
    let correction = FieldCorrection::prepare(table, config);
    let mut entries = Vec::new();
    let mut skipped = SkipReport::new();

    for driver in table.drivers() {
        let analysis = driver_degradation(table, driver, &correction, config);
        entries.extend(analysis.result);
        skipped.extend(analysis.skipped);
    }

    let report = DegradationReport::from_entries(correction.track_evolution_per_lap(), entries);
    debug!(
        evolution = report.track_evolution_per_lap(),
        skipped = skipped.len(),
        "Computed tyre degradation"
    );
    Analysis::new(report, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{green_lap, stint_laps};
    use proptest::prelude::*;

    fn no_fuel() -> DegradationConfig {
        DegradationConfig { burn_rate_kg_per_lap: 0.0, ..DegradationConfig::default() }
    }

    #[test]
    fn recovers_injected_wear_rate() {
        let mut laps = stint_laps("VER", Compound::Medium, 1, 12, 91.0, 0.05);
        laps.extend(stint_laps("HAM", Compound::Medium, 1, 12, 91.4, 0.05));
        laps.extend(stint_laps("HAM", Compound::Hard, 13, 10, 92.0, 0.03));
        let table = LapTable::new(laps);

        let analysis = tyre_degradation(&table, &no_fuel());
        let medium = analysis.result.get(Compound::Medium);
        assert_eq!(medium.len(), 2);
        for entry in medium {
            assert!((entry.deg_per_lap - 0.05).abs() < 0.01, "{entry:?}");
            assert_eq!(entry.laps_analyzed, 12);
        }
        let hard = analysis.result.get(Compound::Hard);
        assert_eq!(hard.len(), 1);
        assert!((hard[0].deg_per_lap - 0.03).abs() < 0.01);
        assert!(analysis.skipped.is_empty());
    }

    #[test]
    fn short_stints_are_skipped() {
        let mut laps = stint_laps("LEC", Compound::Soft, 1, 3, 90.0, 0.1);
        laps.extend(stint_laps("LEC", Compound::Hard, 4, 8, 91.0, 0.02));
        let table = LapTable::new(laps);

        let analysis = tyre_degradation(&table, &no_fuel());
        assert!(analysis.result.get(Compound::Soft).is_empty());
        assert_eq!(analysis.result.get(Compound::Hard).len(), 1);
        assert!(analysis.skipped.contains("LEC SOFT"));
    }

    #[test]
    fn track_evolution_is_added_back() {
        // Every lap on a new tyre age, field 0.1 s/lap faster each lap.
        let laps: Vec<LapRecord> = (1..=10)
            .map(|lap| {
                let mut record = green_lap("SAI", lap, 95.0 - 0.1 * f64::from(lap));
                record.tyre_life = Some(lap);
                record
            })
            .collect();
        let table = LapTable::new(laps);
        let config = no_fuel();

        let correction = FieldCorrection::prepare(&table, &config);
        assert!((correction.track_evolution_per_lap() - 0.1).abs() < 1e-9);
        for lap in table.laps() {
            assert!((correction.corrected_time(lap).unwrap() - 95.0).abs() < 1e-9);
        }

        let report = tyre_degradation(&table, &config).result;
        assert!(report.get(Compound::Medium)[0].deg_per_lap.abs() < 1e-9);
    }

    #[test]
    fn fuel_penalty_is_added_per_lap() {
        let table = LapTable::new(stint_laps("RUS", Compound::Soft, 1, 5, 90.0, 0.2));
        let correction = FieldCorrection::prepare(&table, &DegradationConfig::default());
        assert_eq!(correction.track_evolution_per_lap(), 0.0);

        let lap = green_lap("RUS", 10, 90.0);
        let expected = 90.0 + 10.0 * 1.7 * 0.035;
        assert!((correction.corrected_time(&lap).unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn dirty_laps_are_filtered() {
        let mut laps = stint_laps("OCO", Compound::Soft, 1, 6, 90.0, 0.05);
        laps[0].track_status = Some("4".into());
        laps[1].is_accurate = false;
        laps[2].pit_out = true;
        let table = LapTable::new(laps);

        let analysis = tyre_degradation(&table, &no_fuel());
        assert!(analysis.result.is_empty());
        assert!(analysis.skipped.contains("OCO SOFT"));
    }

    #[test]
    fn empty_session_keeps_every_compound_key() {
        let report = tyre_degradation(&LapTable::default(), &DegradationConfig::default()).result;
        assert!(report.is_empty());
        let json = serde_json::to_value(&report).unwrap();
        let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 5);
        for compound in ["SOFT", "MEDIUM", "HARD", "INTERMEDIATE", "WET"] {
            assert_eq!(json[compound], serde_json::json!([]));
        }
    }

    #[test]
    fn entries_sort_by_rate_then_driver() {
        let entry = |driver: &str, deg: f64| {
            let entry =
                DegradationEntry { driver: driver.into(), deg_per_lap: deg, laps_analyzed: 5 };
            (Compound::Soft, entry)
        };
        let report = DegradationReport::from_entries(
            0.0,
            [entry("ZHO", 0.08), entry("BOT", 0.02), entry("ALB", 0.08), entry("XXX", 0.01)],
        );
        let order: Vec<&str> =
            report.get(Compound::Soft).iter().map(|e| e.driver.as_str()).collect();
        assert_eq!(order, vec!["XXX", "BOT", "ALB", "ZHO"]);
    }

    #[test]
    fn unknown_compound_is_noted() {
        let mut laps = stint_laps("MAG", Compound::Soft, 1, 5, 90.0, 0.05);
        laps[4].compound = Compound::Unknown;
        let table = LapTable::new(laps);
        let analysis = tyre_degradation(&table, &no_fuel());
        assert!(analysis.skipped.contains("MAG UNKNOWN"));
        assert_eq!(analysis.result.get(Compound::Soft)[0].laps_analyzed, 4);
    }

    proptest! {
        #[test]
        fn wear_rate_is_recovered(
            wear in 0.0f64..0.2,
            base in 80.0f64..100.0,
            count in 4u32..25,
        ) {
            let table = LapTable::new(stint_laps("PER", Compound::Hard, 1, count, base, wear));
            let report = tyre_degradation(&table, &no_fuel()).result;
            let hard = report.get(Compound::Hard);
            prop_assert_eq!(hard.len(), 1);
            prop_assert!((hard[0].deg_per_lap - wear).abs() < 0.01);
        }

        #[test]
        fn report_is_deterministic(
            wears in prop::collection::vec(0.0f64..0.2, 1..6),
        ) {
            let mut laps = Vec::new();
            for (i, wear) in wears.iter().enumerate() {
                laps.extend(stint_laps(&format!("D{i}"), Compound::Soft, 1, 6, 90.0, *wear));
            }
            let forward = LapTable::new(laps.clone());
            laps.reverse();
            let reversed = LapTable::new(laps);

            let a = serde_json::to_string(&tyre_degradation(&forward, &no_fuel()).result).unwrap();
            let b = serde_json::to_string(&tyre_degradation(&reversed, &no_fuel()).result).unwrap();
            prop_assert_eq!(a, b);
        }
    }
}
