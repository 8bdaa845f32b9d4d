//! Braking zones of one lap

use serde::{Serialize, Serializer};
use tracing::trace;

use super::ZoneScanner;
use crate::Result;
use crate::config::BrakingConfig;
use crate::types::{Channel, TelemetrySeries};

/// Distance range over which the driver was braking.
///
/// Serializes as a `[start, end]` pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrakingZone {
    pub start: f64,
    pub end: f64,
}

impl BrakingZone {
    pub fn length(&self) -> f64 {
        self.end - self.start
    }
}

impl Serialize for BrakingZone {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        [self.start, self.end].serialize(serializer)
    }
}

/// Braking zones along one lap.
///
/// A sample counts as braking when the brake is applied and the throttle
/// is below the configured ceiling. Samples missing any of the three
/// channels are passed over. Fails with `MissingChannel` when the lap has
/// no distance, brake or throttle data at all.
pub fn braking_zones(
    series: &TelemetrySeries,
    config: &BrakingConfig,
) -> Result<Vec<BrakingZone>> {
    let distance = series.channel(Channel::Distance)?;
    let brake = series.channel(Channel::Brake)?;
    let throttle = series.channel(Channel::Throttle)?;

    let braking = distance
        .into_iter()
        .zip(brake.into_iter().zip(throttle))
        .filter(|(d, (b, t))| d.is_finite() && b.is_finite() && t.is_finite())
        .map(|(d, (b, t))| (d, b > 0.0 && t < config.throttle_ceiling));
    let zones: Vec<BrakingZone> = ZoneScanner::scan(config.min_zone_length_m, braking)
        .into_iter()
        .map(|zone| BrakingZone { start: zone.start, end: zone.end })
        .collect();

    trace!(zones = zones.len(), samples = series.len(), "Detected braking zones");
    Ok(zones)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AnalysisError;
    use crate::types::TelemetrySample;

    fn sample(distance: f64, brake: f64, throttle: f64) -> TelemetrySample {
        TelemetrySample {
            time: Some(distance / 50.0),
            distance: Some(distance),
            brake: Some(brake),
            throttle: Some(throttle),
            ..Default::default()
        }
    }

    #[test]
    fn detects_hard_braking() {
        let series: TelemetrySeries = vec![
            sample(0.0, 0.0, 100.0),
            sample(100.0, 100.0, 0.0),
            sample(150.0, 100.0, 0.0),
            sample(180.0, 0.0, 40.0),
            sample(300.0, 100.0, 0.0),
            sample(305.0, 0.0, 100.0),
            sample(400.0, 100.0, 20.0),
            sample(500.0, 0.0, 100.0),
        ]
        .into();

        let zones = braking_zones(&series, &BrakingConfig::default()).unwrap();
        assert_eq!(zones, vec![BrakingZone { start: 100.0, end: 180.0 }]);
        assert_eq!(zones[0].length(), 80.0);
    }

    #[test]
    fn serializes_as_pairs() {
        let zones = vec![BrakingZone { start: 100.0, end: 180.0 }];
        assert_eq!(serde_json::to_string(&zones).unwrap(), "[[100.0,180.0]]");
    }

    #[test]
    fn samples_with_gaps_are_passed_over() {
        let mut gap = sample(150.0, 100.0, 0.0);
        gap.throttle = None;
        let series: TelemetrySeries = vec![
            sample(0.0, 0.0, 100.0),
            sample(100.0, 100.0, 0.0),
            gap,
            sample(180.0, 0.0, 40.0),
        ]
        .into();

        let zones = braking_zones(&series, &BrakingConfig::default()).unwrap();
        assert_eq!(zones, vec![BrakingZone { start: 100.0, end: 180.0 }]);
    }

    #[test]
    fn missing_brake_channel_is_reported() {
        let sample =
            TelemetrySample { distance: Some(0.0), throttle: Some(100.0), ..Default::default() };
        let series: TelemetrySeries = vec![sample].into();
        let err = braking_zones(&series, &BrakingConfig::default()).unwrap_err();
        assert!(
            matches!(err, AnalysisError::MissingChannel { ref channel, .. } if channel == "Brake")
        );
    }
}
