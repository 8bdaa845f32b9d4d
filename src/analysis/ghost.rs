//! Distance-aligned time delta between two laps
//!
//! Both laps are mapped to elapsed time as a function of distance and
//! compared on a shared distance axis, so the delta at a point on track
//! does not depend on when each car got there.

use serde::Serialize;
use tracing::debug;

use super::{Analysis, SkipReport};
use crate::stats::{LinearInterpolant, common_axis};
use crate::types::finite::finite_vec;
use crate::types::{Channel, TelemetrySeries};
use crate::{AnalysisError, Result};

/// Time delta trace; `delta[i]` is measured at `distance[i]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct GhostDelta {
    #[serde(serialize_with = "finite_vec")]
    pub distance: Vec<f64>,
    /// Seconds B is behind A; positive means B is slower at that point
    #[serde(serialize_with = "finite_vec")]
    pub delta: Vec<f64>,
}

impl GhostDelta {
    pub fn len(&self) -> usize {
        self.distance.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distance.is_empty()
    }

    /// Delta at the last point of the axis.
    pub fn final_delta(&self) -> Option<f64> {
        self.delta.last().copied()
    }
}

/// Map from lap distance to elapsed lap time for one trace.
///
/// Fails with `MissingChannel` when the distance or time channel is absent
/// and with `InsufficientData` when the trace has no usable sample.
pub fn distance_time_interpolant(series: &TelemetrySeries) -> Result<LinearInterpolant> {
    if series.is_empty() {
        return Err(AnalysisError::insufficient_data("telemetry samples", 1, 0));
    }
    let distance = series.channel(Channel::Distance)?;
    let time = series.channel(Channel::Time)?;
    LinearInterpolant::new(&distance, &time)
        .ok_or_else(|| AnalysisError::insufficient_data("finite distance and time samples", 1, 0))
}

/// Delta `time_B - time_A` every `resolution` metres from 0 up to the
/// shorter lap's maximum distance.
///
/// A trace without distance or time yields an empty delta, with the trace
/// noted in the skip report.
pub fn ghost_delta(
    a: &TelemetrySeries,
    b: &TelemetrySeries,
    resolution: f64,
) -> Analysis<GhostDelta> {
    let mut skipped = SkipReport::new();
    let interpolant_a =
        distance_time_interpolant(a).map_err(|e| skipped.record("trace A", &e)).ok();
    let interpolant_b =
        distance_time_interpolant(b).map_err(|e| skipped.record("trace B", &e)).ok();
    let (Some(interpolant_a), Some(interpolant_b)) = (interpolant_a, interpolant_b) else {
        return Analysis::new(GhostDelta::default(), skipped);
    };

    let max_distance = match (a.max_distance(), b.max_distance()) {
        (Some(max_a), Some(max_b)) => max_a.min(max_b),
        _ => 0.0,
    };
    let distance = common_axis(max_distance, resolution);
    let delta: Vec<f64> =
        distance.iter().map(|&d| interpolant_b.eval(d) - interpolant_a.eval(d)).collect();

    debug!(points = distance.len(), max_distance, resolution, "Computed ghost delta");
    Analysis::new(GhostDelta { distance, delta }, skipped)
}
