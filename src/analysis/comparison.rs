//! Speed traces of two laps on a shared distance axis

use serde::Serialize;
use tracing::debug;

use super::{Analysis, SkipReport};
use crate::stats::{LinearInterpolant, common_axis};
use crate::types::finite::finite_vec;
use crate::types::{Channel, TelemetrySeries};
use crate::{AnalysisError, Result};

/// Speeds of two laps sampled at the same distances, in km/h.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct SpeedComparison {
    #[serde(serialize_with = "finite_vec")]
    pub distance: Vec<f64>,
    #[serde(serialize_with = "finite_vec")]
    pub speed_a: Vec<f64>,
    #[serde(serialize_with = "finite_vec")]
    pub speed_b: Vec<f64>,
    /// `speed_a - speed_b`
    #[serde(serialize_with = "finite_vec")]
    pub delta: Vec<f64>,
}

impl SpeedComparison {
    pub fn len(&self) -> usize {
        self.distance.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distance.is_empty()
    }
}

fn distance_speed(series: &TelemetrySeries) -> Result<LinearInterpolant> {
    let distance = series.channel(Channel::Distance)?;
    let speed = series.channel(Channel::Speed)?;
    LinearInterpolant::new(&distance, &speed)
        .ok_or_else(|| AnalysisError::insufficient_data("finite distance and speed samples", 1, 0))
}

/// Compare two laps' speed every `resolution` metres up to the shorter
/// lap's maximum distance.
///
/// A lap without distance or speed data yields an empty comparison.
pub fn compare_speed(
    a: &TelemetrySeries,
    b: &TelemetrySeries,
    resolution: f64,
) -> Analysis<SpeedComparison> {
    let mut skipped = SkipReport::new();
    let (speed_a, speed_b) = match (distance_speed(a), distance_speed(b)) {
        (Ok(speed_a), Ok(speed_b)) => (speed_a, speed_b),
        (result_a, result_b) => {
            if let Err(error) = result_a {
                skipped.record("trace A", &error);
            }
            if let Err(error) = result_b {
                skipped.record("trace B", &error);
            }
            return Analysis::new(SpeedComparison::default(), skipped);
        }
    };

    let max_distance = a.max_distance().zip(b.max_distance()).map_or(0.0, |(ma, mb)| ma.min(mb));
    let distance = common_axis(max_distance, resolution);
    let speed_a = speed_a.eval_many(&distance);
    let speed_b = speed_b.eval_many(&distance);
    let delta = speed_a.iter().zip(&speed_b).map(|(a, b)| a - b).collect();

    debug!(points = distance.len(), "Compared speed traces");
    Analysis::new(SpeedComparison { distance, speed_a, speed_b, delta }, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{constant_speed_trace, trace_from_speed};
    use crate::types::TelemetrySample;

    #[test]
    fn delta_is_a_minus_b() {
        let a = constant_speed_trace(1000.0, 10.0, 80.0);
        let b = trace_from_speed(900.0, 10.0, |d| if d < 500.0 { 70.0 } else { 85.0 });
        let comparison = compare_speed(&a, &b, 10.0).result;

        assert_eq!(comparison.len(), 90);
        assert_eq!(comparison.distance[1], 10.0);
        assert!((comparison.delta[0] - (288.0 - 252.0)).abs() < 1e-9);
        assert!((comparison.delta[60] - (288.0 - 306.0)).abs() < 1e-9);
        assert_eq!(comparison.speed_a.len(), comparison.delta.len());
    }

    #[test]
    fn missing_speed_gives_empty_comparison() {
        let a = constant_speed_trace(100.0, 10.0, 50.0);
        let b: TelemetrySeries =
            a.samples().iter().map(|s| TelemetrySample { speed: None, ..s.clone() }).collect();
        let analysis = compare_speed(&a, &b, 10.0);
        assert!(analysis.result.is_empty());
        assert!(analysis.skipped.contains("trace B"));
        assert!(!analysis.skipped.contains("trace A"));
    }
}
