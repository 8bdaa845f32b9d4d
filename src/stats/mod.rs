//! Numerical building blocks shared by the analyses.

mod interpolate;
mod theil_sen;

pub use interpolate::{LinearInterpolant, boundaries, common_axis};
pub use theil_sen::{TheilSenFit, theil_sen};

/// Population standard deviation; 0 for empty input.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
}
