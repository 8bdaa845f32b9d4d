//! Piecewise-linear interpolation with linear extrapolation

/// Piecewise-linear map from a monotone axis (distance) to a value (time).
///
/// Outside the sampled range the boundary segment is extended, because lap
/// start and end distances rarely line up between two laps.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearInterpolant {
    xs: Vec<f64>,
    ys: Vec<f64>,
}

impl LinearInterpolant {
    /// Build from paired samples.
    ///
    /// Non-finite pairs are dropped, the rest are stably sorted by x and
    /// repeated x values keep their first sample. Returns `None` when no
    /// usable pair remains.
    pub fn new(x: &[f64], y: &[f64]) -> Option<Self> {
        let mut points: Vec<(f64, f64)> = x
            .iter()
            .zip(y)
            .map(|(&x, &y)| (x, y))
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .collect();
        if points.is_empty() {
            return None;
        }
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
        points.dedup_by(|later, earlier| later.0 == earlier.0);

        let (xs, ys) = points.into_iter().unzip();
        Some(Self { xs, ys })
    }

    /// Number of distinct knots.
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    /// Value at `x`.
    pub fn eval(&self, x: f64) -> f64 {
        if self.xs.len() == 1 {
            return self.ys[0];
        }

        let last = self.xs.len() - 1;
        // Segment [i, i + 1] containing x, clamped to the boundary segments.
        let i = self.xs.partition_point(|&knot| knot <= x).saturating_sub(1).min(last - 1);
        let (x0, x1) = (self.xs[i], self.xs[i + 1]);
        let (y0, y1) = (self.ys[i], self.ys[i + 1]);
        y0 + (x - x0) * (y1 - y0) / (x1 - x0)
    }

    /// Values at each point of `axis`.
    pub fn eval_many(&self, axis: &[f64]) -> Vec<f64> {
        axis.iter().map(|&x| self.eval(x)).collect()
    }
}

/// Evenly spaced axis `0, step, 2 * step, ...` strictly below `max`.
///
/// Empty when `max` is not positive or either argument is not finite.
pub fn common_axis(max: f64, step: f64) -> Vec<f64> {
    if !(max.is_finite() && step.is_finite() && max > 0.0 && step > 0.0) {
        return Vec::new();
    }
    let count = (max / step).ceil() as usize;
    (0..count).map(|i| i as f64 * step).take_while(|&d| d < max).collect()
}

/// `count + 1` evenly spaced boundaries from 0 to `max` inclusive.
pub fn boundaries(max: f64, count: usize) -> Vec<f64> {
    (0..=count).map(|i| max * i as f64 / count as f64).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn interpolates_inside_range() {
        let f = LinearInterpolant::new(&[0.0, 100.0, 200.0], &[0.0, 2.0, 3.0]).unwrap();
        assert_eq!(f.eval(50.0), 1.0);
        assert_eq!(f.eval(150.0), 2.5);
        assert_eq!(f.eval(100.0), 2.0);
    }

    #[test]
    fn extrapolates_with_boundary_slopes() {
        let f = LinearInterpolant::new(&[10.0, 20.0, 30.0], &[1.0, 2.0, 4.0]).unwrap();
        assert!((f.eval(0.0) - 0.0).abs() < 1e-12);
        assert!((f.eval(40.0) - 6.0).abs() < 1e-12);
    }

    #[test]
    fn sorts_and_collapses_duplicate_knots() {
        let f = LinearInterpolant::new(&[20.0, 0.0, 0.0, 10.0], &[2.0, 0.0, 0.5, 1.0]).unwrap();
        assert_eq!(f.len(), 3);
        assert_eq!(f.eval(0.0), 0.0);
        assert_eq!(f.eval(15.0), 1.5);
    }

    #[test]
    fn degenerate_inputs() {
        assert!(LinearInterpolant::new(&[], &[]).is_none());
        assert!(LinearInterpolant::new(&[f64::NAN], &[1.0]).is_none());
        let constant = LinearInterpolant::new(&[5.0], &[7.0]).unwrap();
        assert_eq!(constant.eval(-100.0), 7.0);
    }

    #[test]
    fn axis_is_half_open() {
        assert_eq!(common_axis(20.0, 5.0), vec![0.0, 5.0, 10.0, 15.0]);
        assert_eq!(common_axis(21.0, 5.0), vec![0.0, 5.0, 10.0, 15.0, 20.0]);
        assert!(common_axis(0.0, 5.0).is_empty());
        assert!(common_axis(f64::NAN, 5.0).is_empty());
        assert_eq!(boundaries(100.0, 4), vec![0.0, 25.0, 50.0, 75.0, 100.0]);
    }

    proptest! {
        #[test]
        fn knots_are_reproduced(ys in prop::collection::vec(-1e3f64..1e3, 2..30)) {
            let xs: Vec<f64> = (0..ys.len()).map(|i| i as f64 * 3.5).collect();
            let f = LinearInterpolant::new(&xs, &ys).unwrap();
            for (x, y) in xs.iter().zip(&ys) {
                prop_assert!((f.eval(*x) - y).abs() < 1e-9);
            }
        }
    }
}
