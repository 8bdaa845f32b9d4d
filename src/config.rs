//! Analysis calibration and limits
//!
//! Every physical constant the analyses use lives here rather than in the
//! algorithms, so callers can recalibrate per car or per season. The
//! configuration reads from YAML:
//!
//! ```rust
//! use overcut::AnalysisConfig;
//!
//! let yaml = "fuel:\n  burn_rate_kg_per_lap: 1.6\nmicro_sectors: 40\n";
//! let config = AnalysisConfig::from_yaml_str(yaml)?;
//! assert_eq!(config.fuel.burn_rate_kg_per_lap, 1.6);
//! assert_eq!(config.fuel.start_fuel_kg, 110.0);
//! assert_eq!(config.micro_sectors, 40);
//! # Ok::<(), overcut::AnalysisError>(())
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::{AnalysisError, Result};

/// Finest distance step accepted for resampled traces, in metres.
pub const MIN_RESOLUTION_M: f64 = 0.1;

/// Upper bound on micro-sectors per lap.
pub const MAX_MICRO_SECTORS: usize = 1_000;

/// Fuel mass model used to normalise lap times to an empty tank.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuelModel {
    pub start_fuel_kg: f64,
    pub burn_rate_kg_per_lap: f64,
    pub time_loss_s_per_kg: f64,
}

impl Default for FuelModel {
    fn default() -> Self {
        Self { start_fuel_kg: 110.0, burn_rate_kg_per_lap: 1.8, time_loss_s_per_kg: 0.035 }
    }
}

/// Calibration for the tyre degradation estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DegradationConfig {
    pub burn_rate_kg_per_lap: f64,
    pub time_loss_s_per_kg: f64,
    /// Confidence level of the Theil-Sen slope interval
    pub confidence: f64,
    /// Minimum laps on one compound before a driver gets a rate
    pub min_laps: usize,
}

impl Default for DegradationConfig {
    fn default() -> Self {
        Self { burn_rate_kg_per_lap: 1.7, time_loss_s_per_kg: 0.035, confidence: 0.90, min_laps: 4 }
    }
}

impl DegradationConfig {
    /// Seconds added back per lap number to hold fuel load constant.
    pub fn fuel_penalty_per_lap(&self) -> f64 {
        self.burn_rate_kg_per_lap * self.time_loss_s_per_kg
    }
}

/// Braking zone detection thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrakingConfig {
    /// Zones must be strictly longer than this to be reported
    pub min_zone_length_m: f64,
    /// Throttle must be below this while braking
    pub throttle_ceiling: f64,
}

impl Default for BrakingConfig {
    fn default() -> Self {
        Self { min_zone_length_m: 10.0, throttle_ceiling: 10.0 }
    }
}

/// Complete analysis configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub fuel: FuelModel,
    pub degradation: DegradationConfig,
    pub braking: BrakingConfig,
    /// Ghost delta axis step in metres
    pub ghost_resolution_m: f64,
    /// Speed comparison axis step in metres
    pub comparison_resolution_m: f64,
    pub micro_sectors: usize,
    /// Laps faster than this multiple of the personal best are push laps
    pub push_lap_threshold: f64,
    /// Wall-clock budget for one engine request
    pub budget_ms: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            fuel: FuelModel::default(),
            degradation: DegradationConfig::default(),
            braking: BrakingConfig::default(),
            ghost_resolution_m: 5.0,
            comparison_resolution_m: 10.0,
            micro_sectors: 25,
            push_lap_threshold: 1.07,
            budget_ms: 5_000,
        }
    }
}

impl AnalysisConfig {
    /// Parse and validate a YAML configuration. Missing keys take defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: AnalysisConfig = if yaml.trim().is_empty() {
            AnalysisConfig::default()
        } else {
            serde_yaml_ng::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| AnalysisError::file_error(path.to_path_buf(), e))?;
        debug!(path = %path.display(), "Loaded analysis configuration");
        Self::from_yaml_str(&yaml)
    }

    pub fn budget(&self) -> Duration {
        Duration::from_millis(self.budget_ms)
    }

    /// Reject constants the analyses cannot work with.
    pub fn validate(&self) -> Result<()> {
        let non_negative = [
            ("fuel.start_fuel_kg", self.fuel.start_fuel_kg),
            ("fuel.burn_rate_kg_per_lap", self.fuel.burn_rate_kg_per_lap),
            ("fuel.time_loss_s_per_kg", self.fuel.time_loss_s_per_kg),
            ("degradation.burn_rate_kg_per_lap", self.degradation.burn_rate_kg_per_lap),
            ("degradation.time_loss_s_per_kg", self.degradation.time_loss_s_per_kg),
            ("braking.min_zone_length_m", self.braking.min_zone_length_m),
            ("braking.throttle_ceiling", self.braking.throttle_ceiling),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                let details = format!("{name} must be finite and >= 0, got {value}");
                return Err(AnalysisError::config(details));
            }
        }

        if !self.push_lap_threshold.is_finite() || self.push_lap_threshold <= 0.0 {
            return Err(AnalysisError::config(format!(
                "push_lap_threshold must be finite and > 0, got {}",
                self.push_lap_threshold
            )));
        }

        let resolutions = [
            ("ghost_resolution_m", self.ghost_resolution_m),
            ("comparison_resolution_m", self.comparison_resolution_m),
        ];
        for (name, value) in resolutions {
            if !value.is_finite() || value < MIN_RESOLUTION_M {
                return Err(AnalysisError::config(format!(
                    "{name} must be finite and >= {MIN_RESOLUTION_M}, got {value}"
                )));
            }
        }

        let confidence = self.degradation.confidence;
        if !(confidence > 0.0 && confidence < 1.0) {
            return Err(AnalysisError::config(format!(
                "degradation.confidence must be in (0, 1), got {confidence}"
            )));
        }
        if self.degradation.min_laps < 2 {
            return Err(AnalysisError::config("degradation.min_laps must be at least 2"));
        }
        if !(1..=MAX_MICRO_SECTORS).contains(&self.micro_sectors) {
            return Err(AnalysisError::config(format!(
                "micro_sectors must be in 1..={MAX_MICRO_SECTORS}, got {}",
                self.micro_sectors
            )));
        }
        if self.budget_ms == 0 {
            return Err(AnalysisError::config("budget_ms must be at least 1"));
        }
        Ok(())
    }
}
