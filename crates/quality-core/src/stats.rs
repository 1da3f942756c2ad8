//! Statistics helpers shared by the calculators.
//!
//! Stateless functions only. Every ratio branches on its denominator and
//! returns 0 instead of dividing by zero.

use statrs::distribution::{ContinuousCDF, Normal};

use crate::{ConfidenceInterval, EngineError, EngineResult};

/// Closure rate in percent; 0 when `total` is 0.
pub fn success_rate(successes: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    successes as f64 / total as f64 * 100.0
}

/// `numerator / denominator`, or 0 when the denominator is not positive.
pub fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Sample standard deviation (n - 1 denominator).
pub fn std_dev(data: &[f64]) -> f64 {
    if data.len() < 2 {
        return 0.0;
    }
    let m = mean(data);
    let variance = data.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (data.len() - 1) as f64;
    variance.sqrt()
}

/// Two-sided critical value of the standard normal for `confidence_level`.
///
/// Fails with a configuration error unless 0 < level < 1, so callers resolve
/// it once at construction time.
pub fn z_for_confidence(confidence_level: f64) -> EngineResult<f64> {
    if !(confidence_level > 0.0 && confidence_level < 1.0) {
        return Err(EngineError::Configuration(format!(
            "confidence_level must be within (0, 1), got {}",
            confidence_level
        )));
    }
    let normal =
        Normal::new(0.0, 1.0).map_err(|e| EngineError::Configuration(e.to_string()))?;
    Ok(normal.inverse_cdf((1.0 + confidence_level) / 2.0))
}

/// Wilson score interval for a binomial proportion, in percent.
///
/// The result is clamped to 0-100 and always brackets the point estimate.
pub fn wilson_interval(successes: u64, total: u64, z: f64, level: f64) -> ConfidenceInterval {
    if total == 0 {
        return ConfidenceInterval::zero(level);
    }

    let n = total as f64;
    let p = successes as f64 / n;
    let z2 = z * z;

    let denominator = 1.0 + z2 / n;
    let centre = (p + z2 / (2.0 * n)) / denominator;
    let spread = ((p * (1.0 - p) + z2 / (4.0 * n)) / n).sqrt() / denominator;

    ConfidenceInterval {
        lower: (centre - z * spread) * 100.0,
        upper: (centre + z * spread) * 100.0,
        level,
    }
    .bracketing(p * 100.0)
}

/// Least-squares line through `values` indexed 0, 1, 2, ...
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub intercept: f64,
    pub slope: f64,
}

impl LinearFit {
    pub fn at(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Degree-1 polynomial fit. A single point gives a flat line through it.
pub fn linear_trend(values: &[f64]) -> LinearFit {
    match values.len() {
        0 => LinearFit {
            intercept: 0.0,
            slope: 0.0,
        },
        1 => LinearFit {
            intercept: values[0],
            slope: 0.0,
        },
        n => {
            let nf = n as f64;
            let x_mean = (nf - 1.0) / 2.0;
            let y_mean = mean(values);

            let mut ss_xy = 0.0;
            let mut ss_xx = 0.0;
            for (i, y) in values.iter().enumerate() {
                let dx = i as f64 - x_mean;
                ss_xy += dx * (y - y_mean);
                ss_xx += dx * dx;
            }

            let slope = safe_ratio(ss_xy, ss_xx);
            LinearFit {
                intercept: y_mean - slope * x_mean,
                slope,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_success_rate_example() {
        assert_relative_eq!(success_rate(750, 1000), 75.0);
        assert_eq!(success_rate(0, 0), 0.0);
    }

    #[test]
    fn test_z_for_95_percent() {
        let z = z_for_confidence(0.95).unwrap();
        assert_relative_eq!(z, 1.959964, epsilon = 1e-5);
    }

    #[test]
    fn test_z_rejects_invalid_level() {
        assert!(z_for_confidence(1.0).is_err());
        assert!(z_for_confidence(0.0).is_err());
    }

    #[test]
    fn test_wilson_brackets_point() {
        let z = z_for_confidence(0.95).unwrap();
        for (s, n) in [(0, 10), (10, 10), (750, 1000), (1, 3), (49, 50)] {
            let ci = wilson_interval(s, n, z, 0.95);
            let p = success_rate(s, n);
            assert!(ci.lower <= p && p <= ci.upper, "{}/{} -> {:?}", s, n, ci);
            assert!(ci.lower >= 0.0 && ci.upper <= 100.0);
        }
    }

    #[test]
    fn test_wilson_known_values() {
        // 75/100 at 95%: roughly 65.7% - 82.5%
        let z = z_for_confidence(0.95).unwrap();
        let ci = wilson_interval(75, 100, z, 0.95);
        assert_relative_eq!(ci.lower, 65.7, epsilon = 0.1);
        assert_relative_eq!(ci.upper, 82.5, epsilon = 0.1);
    }

    #[test]
    fn test_linear_trend_exact_line() {
        let fit = linear_trend(&[2.0, 4.0, 6.0, 8.0]);
        assert_relative_eq!(fit.slope, 2.0, epsilon = 1e-10);
        assert_relative_eq!(fit.intercept, 2.0, epsilon = 1e-10);
        assert_relative_eq!(fit.at(4.0), 10.0, epsilon = 1e-10);
    }

    #[test]
    fn test_std_dev_sample() {
        let sd = std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_relative_eq!(sd, 2.138, epsilon = 1e-3);
    }
}
