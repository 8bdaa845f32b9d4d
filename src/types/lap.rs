//! Per-lap timing records

use serde::{Deserialize, Serialize};
use std::fmt;

/// Track status code the provider reports for an all-green lap.
pub const GREEN_FLAG_STATUS: &str = "1";

/// Tyre compound fitted for a lap.
///
/// Declaration order is the order compounds appear in degradation reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(rename_all = "UPPERCASE", from = "String")]
pub enum Compound {
    Soft,
    Medium,
    Hard,
    Intermediate,
    Wet,
    #[default]
    Unknown,
}

impl Compound {
    /// Compounds that carry a degradation report.
    pub const RACING: [Compound; 5] =
        [Compound::Soft, Compound::Medium, Compound::Hard, Compound::Intermediate, Compound::Wet];

    /// Upper-case name as used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Compound::Soft => "SOFT",
            Compound::Medium => "MEDIUM",
            Compound::Hard => "HARD",
            Compound::Intermediate => "INTERMEDIATE",
            Compound::Wet => "WET",
            Compound::Unknown => "UNKNOWN",
        }
    }
}

impl From<&str> for Compound {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "SOFT" => Compound::Soft,
            "MEDIUM" => Compound::Medium,
            "HARD" => Compound::Hard,
            "INTERMEDIATE" => Compound::Intermediate,
            "WET" => Compound::Wet,
            _ => Compound::Unknown,
        }
    }
}

impl From<String> for Compound {
    fn from(value: String) -> Self {
        Compound::from(value.as_str())
    }
}

impl fmt::Display for Compound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One lap of one driver, as supplied by the data provider.
///
/// Durations and session times are in seconds. Field names follow the
/// provider's column names when read from a session document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(rename_all = "PascalCase")]
pub struct LapRecord {
    /// Three-letter driver code
    pub driver: String,
    /// 1-based lap number
    pub lap_number: u32,
    /// Lap duration; `None` when the lap was not timed
    #[serde(default)]
    pub lap_time: Option<f64>,
    #[serde(default)]
    pub sector1_time: Option<f64>,
    #[serde(default)]
    pub sector2_time: Option<f64>,
    #[serde(default)]
    pub sector3_time: Option<f64>,
    /// Track position at the end of the lap
    #[serde(default)]
    pub position: Option<u32>,
    #[serde(default)]
    pub compound: Compound,
    /// Laps driven on the current tyre set
    #[serde(default)]
    pub tyre_life: Option<u32>,
    #[serde(default)]
    pub pit_in: bool,
    #[serde(default)]
    pub pit_out: bool,
    #[serde(default)]
    pub is_accurate: bool,
    #[serde(default)]
    pub is_personal_best: bool,
    /// Raw track status code for the lap ("1" is green)
    #[serde(default)]
    pub track_status: Option<String>,
    /// Session-relative time at which the lap was completed
    #[serde(default, rename = "Time")]
    pub session_time: Option<f64>,
}

impl LapRecord {
    /// Create a timed lap with every optional field left empty.
    pub fn new(driver: impl Into<String>, lap_number: u32, lap_time: Option<f64>) -> Self {
        Self {
            driver: driver.into(),
            lap_number,
            lap_time,
            sector1_time: None,
            sector2_time: None,
            sector3_time: None,
            position: None,
            compound: Compound::Unknown,
            tyre_life: None,
            pit_in: false,
            pit_out: false,
            is_accurate: false,
            is_personal_best: false,
            track_status: None,
            session_time: None,
        }
    }

    /// Lap duration when it is recorded and finite.
    pub fn duration(&self) -> Option<f64> {
        self.lap_time.filter(|t| t.is_finite())
    }

    /// Whether the car entered or left the pit lane on this lap.
    pub fn is_pit_lap(&self) -> bool {
        self.pit_in || self.pit_out
    }

    /// Whether the lap ran under an all-green track status.
    pub fn is_green_flag(&self) -> bool {
        self.track_status.as_deref() == Some(GREEN_FLAG_STATUS)
    }

    /// Sector durations in order.
    pub fn sectors(&self) -> [Option<f64>; 3] {
        [self.sector1_time, self.sector2_time, self.sector3_time]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compound_parses_leniently() {
        assert_eq!(Compound::from("soft"), Compound::Soft);
        assert_eq!(Compound::from(" Intermediate "), Compound::Intermediate);
        assert_eq!(Compound::from("HYPERSOFT"), Compound::Unknown);
        assert_eq!(Compound::from(""), Compound::Unknown);
    }

    #[test]
    fn compound_orders_for_reports() {
        let mut compounds = vec![Compound::Wet, Compound::Soft, Compound::Hard, Compound::Medium];
        compounds.sort();
        let expected = [Compound::Soft, Compound::Medium, Compound::Hard, Compound::Wet];
        assert_eq!(compounds, expected);
    }

    #[test]
    fn lap_record_reads_provider_columns() {
        let yaml = r#"
Driver: VER
LapNumber: 12
LapTime: 93.412
Sector1Time: 30.1
Compound: medium
TyreLife: 7
PitOut: true
IsAccurate: true
TrackStatus: "1"
Time: 1203.5
"#;
        let lap: LapRecord = serde_yaml_ng::from_str(yaml).expect("lap should parse");
        assert_eq!(lap.driver, "VER");
        assert_eq!(lap.lap_number, 12);
        assert_eq!(lap.compound, Compound::Medium);
        assert_eq!(lap.sectors(), [Some(30.1), None, None]);
        assert!(lap.is_pit_lap());
        assert!(lap.is_green_flag());
        assert_eq!(lap.session_time, Some(1203.5));
    }

    #[test]
    fn non_finite_duration_is_treated_as_missing() {
        let lap = LapRecord::new("HAM", 1, Some(f64::NAN));
        assert_eq!(lap.duration(), None);
    }
}
