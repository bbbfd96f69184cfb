//! Absolute-residual summary statistics.

use serde::{Deserialize, Serialize};

use crate::math::Real;

/// Mean, standard deviation and median of `|r|` over a residual vector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub mean: Real,
    pub stddev: Real,
    pub median: Real,
}

impl Statistics {
    /// Summarize the absolute values of `residuals`. Empty input yields zeros.
    pub fn from_residuals(residuals: &[Real]) -> Self {
        if residuals.is_empty() {
            return Self::default();
        }

        let mut abs: Vec<Real> = residuals.iter().map(|r| r.abs()).collect();
        let n = abs.len() as Real;
        let mean = abs.iter().sum::<Real>() / n;
        let var = abs.iter().map(|r| (r - mean) * (r - mean)).sum::<Real>() / n;

        abs.sort_by(|a, b| a.total_cmp(b));
        let median = abs[abs.len() / 2];

        Self {
            mean,
            stddev: var.sqrt(),
            median,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_residuals_yield_zeros() {
        assert_eq!(Statistics::from_residuals(&[]), Statistics::default());
    }

    #[test]
    fn statistics_use_absolute_values() {
        let stats = Statistics::from_residuals(&[-2.0, 1.0, -1.0, 2.0]);
        assert!((stats.mean - 1.5).abs() < 1e-12);
        assert!((stats.stddev - 0.5).abs() < 1e-12);
        assert!((stats.median - 2.0).abs() < 1e-12);
    }

    #[test]
    fn statistics_are_nonnegative_and_bounded() {
        let residuals = [0.3, -0.7, 0.1, -0.2, 0.5];
        let stats = Statistics::from_residuals(&residuals);
        let max = residuals.iter().fold(0.0_f64, |m, r| m.max(r.abs()));
        assert!(stats.mean >= 0.0);
        assert!(stats.stddev >= 0.0);
        assert!(stats.median >= 0.0);
        assert!(stats.median <= max);
    }
}
