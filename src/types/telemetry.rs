//! Per-lap telemetry samples and channel access

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::{AnalysisError, Result};

/// Telemetry channels a sample may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Time,
    Distance,
    Speed,
    Throttle,
    Brake,
    Rpm,
    Gear,
    X,
    Y,
}

impl Channel {
    /// Provider column name of this channel.
    pub fn name(self) -> &'static str {
        match self {
            Channel::Time => "Time",
            Channel::Distance => "Distance",
            Channel::Speed => "Speed",
            Channel::Throttle => "Throttle",
            Channel::Brake => "Brake",
            Channel::Rpm => "RPM",
            Channel::Gear => "nGear",
            Channel::X => "X",
            Channel::Y => "Y",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One telemetry sample within a lap.
///
/// Every channel is optional because providers omit whole columns when the
/// car data was not captured.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(default)]
pub struct TelemetrySample {
    /// Seconds since the start of the lap
    #[serde(rename = "Time")]
    pub time: Option<f64>,
    /// Metres travelled since the start of the lap
    #[serde(rename = "Distance")]
    pub distance: Option<f64>,
    /// km/h
    #[serde(rename = "Speed")]
    pub speed: Option<f64>,
    /// Throttle application, 0-100
    #[serde(rename = "Throttle")]
    pub throttle: Option<f64>,
    /// Brake application, 0-100 (boolean sources map to 0 or 100)
    #[serde(rename = "Brake", deserialize_with = "brake_level")]
    pub brake: Option<f64>,
    #[serde(rename = "RPM")]
    pub rpm: Option<f64>,
    #[serde(rename = "nGear")]
    pub gear: Option<u8>,
    #[serde(rename = "X")]
    pub x: Option<f64>,
    #[serde(rename = "Y")]
    pub y: Option<f64>,
}

impl TelemetrySample {
    /// Value of a channel on this sample.
    pub fn get(&self, channel: Channel) -> Option<f64> {
        match channel {
            Channel::Time => self.time,
            Channel::Distance => self.distance,
            Channel::Speed => self.speed,
            Channel::Throttle => self.throttle,
            Channel::Brake => self.brake,
            Channel::Rpm => self.rpm,
            Channel::Gear => self.gear.map(f64::from),
            Channel::X => self.x,
            Channel::Y => self.y,
        }
    }
}

fn brake_level<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Brake {
        Pressed(bool),
        Level(f64),
    }

    Ok(Option::<Brake>::deserialize(deserializer)?.map(|brake| match brake {
        Brake::Pressed(true) => 100.0,
        Brake::Pressed(false) => 0.0,
        Brake::Level(level) => level,
    }))
}

/// Ordered telemetry for one lap, non-strictly increasing in distance.
///
/// An empty series means telemetry was never captured for the lap, which is
/// a different condition from the lap time being absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(transparent)]
pub struct TelemetrySeries {
    samples: Vec<TelemetrySample>,
}

impl TelemetrySeries {
    pub fn new(samples: Vec<TelemetrySample>) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &[TelemetrySample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Whether any sample carries the channel.
    ///
    /// An empty series carries no channel.
    pub fn has(&self, channel: Channel) -> bool {
        self.samples.iter().any(|s| s.get(channel).is_some())
    }

    /// Whether any sample carries both X and Y track coordinates.
    pub fn has_position(&self) -> bool {
        self.samples.iter().any(|s| s.x.is_some() && s.y.is_some())
    }

    /// Values of one channel, index-aligned with the samples.
    ///
    /// Samples without a value read as `NaN` so interpolation skips them.
    /// Fails with [`AnalysisError::MissingChannel`] only when no sample
    /// carries the channel; an empty series yields an empty vector.
    pub fn channel(&self, channel: Channel) -> Result<Vec<f64>> {
        if !self.samples.is_empty() && !self.has(channel) {
            let context = format!("all {} samples", self.len());
            return Err(AnalysisError::missing_channel(channel.name(), context));
        }
        Ok(self.channel_lossy(channel).into_iter().map(|value| value.unwrap_or(f64::NAN)).collect())
    }

    /// Values of one channel with gaps left as `None`.
    pub fn channel_lossy(&self, channel: Channel) -> Vec<Option<f64>> {
        self.samples.iter().map(|sample| sample.get(channel)).collect()
    }

    /// Largest recorded distance, ignoring samples without one.
    pub fn max_distance(&self) -> Option<f64> {
        self.samples.iter().filter_map(|s| s.distance).filter(|d| d.is_finite()).reduce(f64::max)
    }
}

impl From<Vec<TelemetrySample>> for TelemetrySeries {
    fn from(samples: Vec<TelemetrySample>) -> Self {
        Self::new(samples)
    }
}

impl FromIterator<TelemetrySample> for TelemetrySeries {
    fn from_iter<I: IntoIterator<Item = TelemetrySample>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(time: f64, distance: f64) -> TelemetrySample {
        TelemetrySample { time: Some(time), distance: Some(distance), ..Default::default() }
    }

    #[test]
    fn channel_access_reports_missing_columns() {
        let series: TelemetrySeries = vec![sample(0.0, 0.0), sample(1.0, 50.0)].into();

        assert_eq!(series.channel(Channel::Distance).unwrap(), vec![0.0, 50.0]);
        let err = series.channel(Channel::Speed).unwrap_err();
        assert!(
            matches!(err, AnalysisError::MissingChannel { ref channel, .. } if channel == "Speed")
        );
        assert!(!series.has_position());
    }

    #[test]
    fn gaps_read_as_nan() {
        let mut gap = sample(1.0, 50.0);
        gap.time = None;
        gap.x = Some(10.0);
        gap.y = Some(20.0);
        let series: TelemetrySeries = vec![sample(0.0, 0.0), gap, sample(2.0, 100.0)].into();

        let time = series.channel(Channel::Time).unwrap();
        assert_eq!(time[0], 0.0);
        assert!(time[1].is_nan());
        assert_eq!(time[2], 2.0);
        assert!(series.has(Channel::Time));
        assert!(series.has_position());
        assert_eq!(series.channel_lossy(Channel::X), vec![None, Some(10.0), None]);
    }

    #[test]
    fn empty_series_has_no_channels() {
        let series = TelemetrySeries::default();
        assert!(series.is_empty());
        assert!(!series.has(Channel::Distance));
        assert_eq!(series.channel(Channel::Distance).unwrap(), Vec::<f64>::new());
        assert_eq!(series.max_distance(), None);
    }

    #[test]
    fn brake_accepts_boolean_and_level() {
        let yaml = r#"
- { Time: 0.0, Distance: 0.0, Brake: true, Throttle: 0 }
- { Time: 0.1, Distance: 4.0, Brake: false, Throttle: 100 }
- { Time: 0.2, Distance: 8.0, Brake: 37.5 }
- { Time: 0.3, Distance: 12.0 }
"#;
        let series: TelemetrySeries = serde_yaml_ng::from_str(yaml).expect("series should parse");
        assert_eq!(
            series.channel_lossy(Channel::Brake),
            vec![Some(100.0), Some(0.0), Some(37.5), None]
        );
    }
}
