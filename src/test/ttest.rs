//! Two-sample significance test on correlation distributions.
//!
//! The statistic is Welch's t, `(mean_a - mean_b) / sqrt(var_a/n_a + var_b/n_b)`,
//! with sample variances. The p-value is taken from the standard normal
//! distribution rather than Student's t: correlation vectors from modules and
//! null distributions are large, and the normal approximation is what the
//! reported p-values are defined against.
//!
//! Degenerate inputs never error. Fewer than two observations, zero variance,
//! a zero standard error or a NaN result all yield [`Significance::NONE`],
//! i.e. statistic 0 and p-value 1.

use serde::{Deserialize, Serialize};
use statrs::function::erf::erf;
use statrs::statistics::Statistics;
use std::f64::consts::SQRT_2;

/// Test statistic and two-sided p-value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Significance {
    /// Welch t-statistic.
    pub statistic: f64,
    /// Two-sided p-value under the normal approximation.
    pub p_value: f64,
}

impl Significance {
    /// No-significance sentinel.
    pub const NONE: Significance = Significance {
        statistic: 0.0,
        p_value: 1.0,
    };
}

impl Default for Significance {
    fn default() -> Self {
        Self::NONE
    }
}

/// Standard normal cumulative distribution function.
pub fn normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / SQRT_2))
}

/// Compare two samples of raw values.
///
/// Used for module-vs-module comparisons, where the sign of a correlation
/// matters.
pub fn test_two_sample(sample_a: &[f64], sample_b: &[f64]) -> Significance {
    if sample_a.len() < 2 || sample_b.len() < 2 {
        return Significance::NONE;
    }

    let mean_a = sample_a.mean();
    let mean_b = sample_b.mean();
    let var_a = sample_a.variance();
    let var_b = sample_b.variance();

    if var_a == 0.0 || var_b == 0.0 {
        return Significance::NONE;
    }

    let se = (var_a / sample_a.len() as f64 + var_b / sample_b.len() as f64).sqrt();
    if se == 0.0 {
        return Significance::NONE;
    }

    let statistic = (mean_a - mean_b) / se;
    let p_value = 2.0 * (1.0 - normal_cdf(statistic.abs()));

    if statistic.is_nan() || p_value.is_nan() {
        return Significance::NONE;
    }

    Significance { statistic, p_value }
}

/// Compare two samples on absolute values.
///
/// Used for module-vs-null comparisons, which measure correlation strength
/// irrespective of sign.
pub fn test_two_sample_abs(sample_a: &[f64], sample_b: &[f64]) -> Significance {
    let abs_a: Vec<f64> = sample_a.iter().map(|v| v.abs()).collect();
    let abs_b: Vec<f64> = sample_b.iter().map(|v| v.abs()).collect();
    test_two_sample(&abs_a, &abs_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_few_observations() {
        assert_eq!(test_two_sample(&[], &[1.0, 2.0, 3.0]), Significance::NONE);
        assert_eq!(test_two_sample(&[1.0], &[1.0, 2.0, 3.0]), Significance::NONE);
        assert_eq!(test_two_sample(&[1.0, 2.0, 3.0], &[2.0]), Significance::NONE);
    }

    #[test]
    fn test_zero_variance() {
        assert_eq!(
            test_two_sample(&[1.0, 1.0, 1.0], &[2.0, 2.0, 2.0]),
            Significance::NONE
        );
        assert_eq!(
            test_two_sample(&[1.0, 2.0, 3.0], &[2.0, 2.0, 2.0]),
            Significance::NONE
        );
    }

    #[test]
    fn test_direction_of_statistic() {
        let result = test_two_sample(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]);
        assert!(result.statistic < 0.0);
        assert!(result.p_value >= 0.0 && result.p_value <= 1.0);

        let reversed = test_two_sample(&[4.0, 5.0, 6.0], &[1.0, 2.0, 3.0]);
        assert!(reversed.statistic > 0.0);
        assert!((reversed.p_value - result.p_value).abs() < 1e-12);
    }

    #[test]
    fn test_known_value() {
        // means 2 and 5, sample variances 1 and 1, se = sqrt(2/3)
        let result = test_two_sample(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]);
        let expected_t = -3.0 / (2.0f64 / 3.0).sqrt();
        assert!((result.statistic - expected_t).abs() < 1e-12);

        let expected_p = 2.0 * (1.0 - normal_cdf(expected_t.abs()));
        assert!((result.p_value - expected_p).abs() < 1e-12);
        assert!(result.p_value < 0.001);
    }

    #[test]
    fn test_identical_samples_not_significant() {
        let a = [0.1, 0.4, 0.2, 0.5, 0.3];
        let result = test_two_sample(&a, &a);
        assert_eq!(result.statistic, 0.0);
        assert!((result.p_value - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_nan_input_clamped() {
        let result = test_two_sample(&[1.0, f64::NAN, 3.0], &[4.0, 5.0, 6.0]);
        assert_eq!(result, Significance::NONE);
    }

    #[test]
    fn test_abs_variant_ignores_sign() {
        let positive = [0.8, 0.9, 0.7, 0.85];
        let negative = [-0.8, -0.9, -0.7, -0.85];

        let raw = test_two_sample(&positive, &negative);
        assert!(raw.statistic > 0.0);
        assert!(raw.p_value < 0.05);

        let abs = test_two_sample_abs(&positive, &negative);
        assert_eq!(abs.statistic, 0.0);
        assert!((abs.p_value - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_normal_cdf() {
        assert!((normal_cdf(0.0) - 0.5).abs() < 1e-12);
        assert!((normal_cdf(1.959964) - 0.975).abs() < 1e-6);
        assert!((normal_cdf(-1.959964) - 0.025).abs() < 1e-6);
    }
}
