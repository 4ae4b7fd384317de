//! Two-sample Kolmogorov-Smirnov test and small numeric helpers

use crate::{Error, Result};
use std::f64::consts::PI;

/// Outcome of a two-sample Kolmogorov-Smirnov test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KsTest {
    /// Largest absolute difference between the two empirical CDFs
    pub statistic: f64,
    /// Asymptotic two-sided p-value
    pub p_value: f64,
}

/// Runs the two-sample Kolmogorov-Smirnov test.
///
/// Fails with `DegenerateSample` when either sample is empty.
pub fn ks_2samp(reference: &[f64], comparison: &[f64]) -> Result<KsTest> {
    if reference.is_empty() || comparison.is_empty() {
        return Err(Error::DegenerateSample {
            reference: reference.len(),
            comparison: comparison.len(),
        });
    }

    let mut a = reference.to_vec();
    let mut b = comparison.to_vec();
    a.sort_by(f64::total_cmp);
    b.sort_by(f64::total_cmp);

    let n = a.len() as f64;
    let m = b.len() as f64;

    // Walk both sorted samples, stepping past every value equal to the
    // current minimum so tied values move both CDFs together.
    let (mut i, mut j) = (0usize, 0usize);
    let mut statistic: f64 = 0.0;
    while i < a.len() && j < b.len() {
        let x = a[i].min(b[j]);
        while i < a.len() && a[i] <= x {
            i += 1;
        }
        while j < b.len() && b[j] <= x {
            j += 1;
        }
        statistic = statistic.max((i as f64 / n - j as f64 / m).abs());
    }

    let effective_n = (n * m / (n + m)).sqrt();
    let p_value = kolmogorov_sf(effective_n * statistic).clamp(0.0, 1.0);

    Ok(KsTest { statistic, p_value })
}

/// Survival function of the Kolmogorov distribution, `P(K > x)`
pub fn kolmogorov_sf(x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    if x <= 0.0 {
        return 1.0;
    }

    if x < 1.0 {
        // Small-x series for the CDF: sqrt(2 pi) / x * sum exp(-(2k-1)^2 pi^2 / (8 x^2))
        let w = PI * PI / (8.0 * x * x);
        let mut cdf = 0.0;
        for k in 1..=20 {
            let odd = (2 * k - 1) as f64;
            let term = (-odd * odd * w).exp();
            cdf += term;
            if term < 1e-300 {
                break;
            }
        }
        1.0 - (2.0 * PI).sqrt() / x * cdf
    } else {
        // Alternating series: 2 * sum (-1)^(k-1) exp(-2 k^2 x^2)
        let mut sf = 0.0;
        let mut sign = 1.0;
        for k in 1..=100 {
            let k = k as f64;
            let term = (-2.0 * k * k * x * x).exp();
            sf += sign * term;
            if term < 1e-17 {
                break;
            }
            sign = -sign;
        }
        2.0 * sf
    }
}

/// Arithmetic mean; `None` for an empty sample
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Rounds half away from zero to two decimal places.
///
/// The decision is taken on the exact binary value, so `1.115` (stored as
/// `1.11499999...`) rounds to `1.11`.
pub fn round2(value: f64) -> f64 {
    if !value.is_finite() || value.abs() >= 1e13 {
        return value;
    }

    let magnitude = value.abs();
    let lower = (magnitude * 100.0).floor();
    let midpoint = 2.0 * lower + 1.0;

    // magnitude * 200 == doubled + residual exactly
    let doubled = magnitude * 200.0;
    let residual = magnitude.mul_add(200.0, -doubled);
    let round_up = doubled > midpoint || (doubled == midpoint && residual >= 0.0);

    let cents = if round_up { lower + 1.0 } else { lower };
    (cents / 100.0).copysign(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_samples() {
        let sample = [3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0];
        let test = ks_2samp(&sample, &sample).unwrap();
        assert_eq!(test.statistic, 0.0);
        assert_eq!(test.p_value, 1.0);
    }

    #[test]
    fn test_separated_samples() {
        let low = vec![10.0; 20];
        let high = vec![250.0; 20];
        let test = ks_2samp(&low, &high).unwrap();
        assert_eq!(test.statistic, 1.0);
        assert!(test.p_value < 0.005);
    }

    #[test]
    fn test_statistic_with_ties() {
        // ECDFs: a = {1: .5, 2: 1}, b = {1: .25, 2: .5, 3: 1}
        let a = [1.0, 1.0, 2.0, 2.0];
        let b = [1.0, 2.0, 3.0, 3.0];
        let test = ks_2samp(&a, &b).unwrap();
        assert!((test.statistic - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_statistic_is_symmetric() {
        let a = [0.1, 0.4, 0.7, 0.9, 1.3];
        let b = [0.2, 0.25, 0.3, 1.1];
        let ab = ks_2samp(&a, &b).unwrap();
        let ba = ks_2samp(&b, &a).unwrap();
        assert_eq!(ab.statistic, ba.statistic);
        assert_eq!(ab.p_value, ba.p_value);
    }

    #[test]
    fn test_empty_side_is_degenerate() {
        let result = ks_2samp(&[1.0, 2.0], &[]);
        assert!(matches!(
            result,
            Err(Error::DegenerateSample {
                reference: 2,
                comparison: 0
            })
        ));
    }

    #[test]
    fn test_kolmogorov_sf_known_values() {
        // Reference values of the Kolmogorov distribution
        assert!((kolmogorov_sf(0.5) - 0.963_945_243_664_875).abs() < 1e-9);
        assert!((kolmogorov_sf(1.0) - 0.269_999_671_677_356).abs() < 1e-9);
        assert!((kolmogorov_sf(1.36) - 0.049_485_876_755_378).abs() < 1e-9);
        assert!(kolmogorov_sf(0.05) > 0.999_999);
        assert!(kolmogorov_sf(5.0) < 1e-20);
    }

    #[test]
    fn test_kolmogorov_sf_branches_agree() {
        let below = kolmogorov_sf(1.0 - 1e-9);
        let above = kolmogorov_sf(1.0);
        assert!((below - above).abs() < 1e-8);
    }

    #[test]
    fn test_mean_and_rounding() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[1.0, 2.0, 6.0]), Some(3.0));

        assert_eq!(round2(0.125), 0.13);
        assert_eq!(round2(-0.125), -0.13);
        assert_eq!(round2(2.0 / 3.0), 0.67);
        assert_eq!(round2(1.115), 1.11);
        assert_eq!(round2(147_456.0), 147_456.0);
    }

    #[test]
    fn test_rounding_uses_exact_value() {
        // 1.115 and 2.675 sit just below their midpoints once stored
        assert_eq!(round2(-1.115), -1.11);
        assert_eq!(round2(2.675), 2.67);
        // 1.125 is an exact tie
        assert_eq!(round2(1.125), 1.13);
        assert_eq!(round2(0.0), 0.0);
        assert_eq!(round2(0.004_999), 0.0);
        assert_eq!(round2(0.005), 0.01);
        assert_eq!(round2(0.99999), 1.0);
    }
}
