//! Theil-Sen robust slope estimation
//!
//! The slope is the median of the slopes between every pair of points with
//! distinct x. A handful of outlier laps (traffic, yellow flags, a lock-up)
//! move the median very little, unlike an ordinary least-squares fit.

/// Result of a Theil-Sen fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TheilSenFit {
    pub slope: f64,
    /// `median(y) - slope * median(x)`
    pub intercept: f64,
    /// Lower bound of the slope confidence interval
    pub low_slope: f64,
    /// Upper bound of the slope confidence interval
    pub high_slope: f64,
}

/// Fit `y = intercept + slope * x`.
///
/// `confidence` is the two-sided confidence level of the slope interval
/// (e.g. 0.90); levels below 0.5 are read as their complement. Non-finite
/// points are ignored. Returns `None` when fewer than two distinct x values
/// remain.
pub fn theil_sen(x: &[f64], y: &[f64], confidence: f64) -> Option<TheilSenFit> {
    let points: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .map(|(&x, &y)| (x, y))
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .collect();

    let mut slopes = Vec::with_capacity(points.len() * points.len().saturating_sub(1) / 2);
    for (i, &(xi, yi)) in points.iter().enumerate() {
        for &(xj, yj) in &points[..i] {
            let dx = xi - xj;
            if dx != 0.0 {
                slopes.push((yi - yj) / dx);
            }
        }
    }
    if slopes.is_empty() {
        return None;
    }
    slopes.sort_by(f64::total_cmp);

    let slope = median_sorted(&slopes);
    let mut xs: Vec<f64> = points.iter().map(|p| p.0).collect();
    let mut ys: Vec<f64> = points.iter().map(|p| p.1).collect();
    xs.sort_by(f64::total_cmp);
    ys.sort_by(f64::total_cmp);
    let intercept = median_sorted(&ys) - slope * median_sorted(&xs);

    let (low_slope, high_slope) = slope_interval(&slopes, &xs, &ys, confidence);

    Some(TheilSenFit { slope, intercept, low_slope, high_slope })
}

/// Confidence bounds from the normal approximation to Kendall's tau, with
/// tie correction on both axes. Inputs must be sorted.
fn slope_interval(
    slopes: &[f64],
    xs_sorted: &[f64],
    ys_sorted: &[f64],
    confidence: f64,
) -> (f64, f64) {
    let mut alpha = 1.0 - confidence;
    if alpha > 0.5 {
        alpha = 1.0 - alpha;
    }
    let z = normal_quantile(alpha / 2.0);

    let n = ys_sorted.len() as f64;
    let tie_term = |k: f64| k * (k - 1.0) * (2.0 * k + 5.0);
    let sigma_sq = (tie_term(n)
        - tie_runs(xs_sorted).map(tie_term).sum::<f64>()
        - tie_runs(ys_sorted).map(tie_term).sum::<f64>())
        / 18.0;
    let sigma = sigma_sq.max(0.0).sqrt();

    let nt = slopes.len() as f64;
    let last = slopes.len() - 1;
    let upper = (((nt - z * sigma) / 2.0).round().max(0.0) as usize).min(last);
    let lower = (((nt + z * sigma) / 2.0).round() as i64 - 1).clamp(0, last as i64) as usize;

    (slopes[lower], slopes[upper])
}

/// Lengths of runs of equal values longer than one in a sorted slice.
fn tie_runs(sorted: &[f64]) -> impl Iterator<Item = f64> + '_ {
    sorted
        .chunk_by(|a, b| a == b)
        .map(|run| run.len())
        .filter(|&len| len > 1)
        .map(|len| len as f64)
}

/// Median of an already sorted, non-empty slice.
pub(crate) fn median_sorted(sorted: &[f64]) -> f64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 { (sorted[mid - 1] + sorted[mid]) / 2.0 } else { sorted[mid] }
}

/// Inverse of the standard normal CDF (Acklam's rational approximation,
/// relative error below 1.2e-9).
pub(crate) fn normal_quantile(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969683028665376e+01,
        2.209460984245205e+02,
        -2.759285104469687e+02,
        1.383577518672690e+02,
        -3.066479806614716e+01,
        2.506628277459239e+00,
    ];
    const B: [f64; 5] = [
        -5.447609879822406e+01,
        1.615858368580409e+02,
        -1.556989798598866e+02,
        6.680131188771972e+01,
        -1.328068155288572e+01,
    ];
    const C: [f64; 6] = [
        -7.784894002430293e-03,
        -3.223964580411365e-01,
        -2.400758277161838e+00,
        -2.549732539343734e+00,
        4.374664141464968e+00,
        2.938163982698783e+00,
    ];
    const D: [f64; 4] = [
        7.784695709041462e-03,
        3.224671290700398e-01,
        2.445134137142996e+00,
        3.754408661907416e+00,
    ];
    const P_LOW: f64 = 0.02425;

    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }

    if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -(((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn recovers_exact_line() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y: Vec<f64> = x.iter().map(|x| 90.0 + 0.05 * x).collect();
        let fit = theil_sen(&x, &y, 0.90).unwrap();
        assert!((fit.slope - 0.05).abs() < 1e-12);
        assert!((fit.intercept - 90.0).abs() < 1e-9);
        assert!((fit.low_slope - 0.05).abs() < 1e-12);
        assert!((fit.high_slope - 0.05).abs() < 1e-12);
    }

    #[test]
    fn ignores_a_single_outlier() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
        let mut y: Vec<f64> = x.iter().map(|x| 80.0 + 0.1 * x).collect();
        y[3] += 25.0;
        let fit = theil_sen(&x, &y, 0.90).unwrap();
        assert!((fit.slope - 0.1).abs() < 1e-9, "slope {}", fit.slope);
    }

    #[test]
    fn needs_two_distinct_x_values() {
        assert!(theil_sen(&[], &[], 0.9).is_none());
        assert!(theil_sen(&[3.0], &[1.0], 0.9).is_none());
        assert!(theil_sen(&[3.0, 3.0, 3.0], &[1.0, 2.0, 3.0], 0.9).is_none());
        assert!(theil_sen(&[1.0, f64::NAN], &[1.0, 2.0], 0.9).is_none());
    }

    #[test]
    fn interval_brackets_the_slope() {
        let x: Vec<f64> = (1..=12).map(f64::from).collect();
        let y = [
            90.1, 90.3, 90.2, 90.6, 90.4, 90.9, 90.7, 91.2, 90.9, 91.4, 91.3, 91.6,
        ];
        let fit = theil_sen(&x, &y, 0.90).unwrap();
        assert!(fit.low_slope <= fit.slope && fit.slope <= fit.high_slope);
        assert!(fit.low_slope < fit.high_slope);
    }

    #[test]
    fn normal_quantile_matches_tables() {
        assert!((normal_quantile(0.05) + 1.6448536269514722).abs() < 1e-8);
        assert!((normal_quantile(0.5)).abs() < 1e-12);
        assert!((normal_quantile(0.975) - 1.959963984540054).abs() < 1e-8);
        assert!((normal_quantile(0.001) + 3.090232306167813).abs() < 1e-7);
    }

    #[test]
    fn median_of_even_and_odd() {
        assert_eq!(median_sorted(&[1.0, 2.0, 4.0]), 2.0);
        assert_eq!(median_sorted(&[1.0, 2.0, 4.0, 10.0]), 3.0);
    }

    proptest! {
        #[test]
        fn slope_is_invariant_to_shifting_y(
            slope in -1.0f64..1.0,
            offset in -100.0f64..100.0,
            n in 3usize..20,
        ) {
            let x: Vec<f64> = (0..n).map(|i| i as f64).collect();
            let y: Vec<f64> = x.iter().map(|x| slope * x).collect();
            let shifted: Vec<f64> = y.iter().map(|y| y + offset).collect();

            let a = theil_sen(&x, &y, 0.9).unwrap();
            let b = theil_sen(&x, &shifted, 0.9).unwrap();
            prop_assert!((a.slope - b.slope).abs() < 1e-9);
            prop_assert!((a.slope - slope).abs() < 1e-9);
        }
    }
}
