//! Method-of-moments Gamma prior for a Poisson rate.
//!
//! The Gamma is always in shape/rate form, so the prior mean is
//! `shape / rate` and the prior variance is `shape / rate^2`.
use crate::rv::dist::{Gamma, GammaError};
use serde::Serialize;
use shoprate_utils::{mean, sample_var};
use thiserror::Error;

/// Errors that can arise when estimating Gamma parameters from counts
#[derive(Clone, Debug, PartialEq, Error)]
pub enum EstimateError {
    /// The variance needs at least two points
    #[error("at least two observations are required, got {n}")]
    TooFewObservations { n: usize },
    /// All counts are identical so the moments do not pin down a Gamma.
    /// Counts that are all zero land here too.
    #[error("observed counts have zero variance (mean = {mean})")]
    ZeroVariance { mean: f64 },
}

/// Shape and rate of a Gamma distribution. Both are finite and positive.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct GammaParams {
    shape: f64,
    rate: f64,
}

impl GammaParams {
    pub fn new(shape: f64, rate: f64) -> Result<Self, GammaError> {
        Gamma::new(shape, rate)?;
        Ok(Self { shape, rate })
    }

    pub fn shape(&self) -> f64 {
        self.shape
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Mean of the Gamma, `shape / rate`
    pub fn mean(&self) -> f64 {
        self.shape / self.rate
    }

    /// Variance of the Gamma, `shape / rate^2`
    pub fn variance(&self) -> f64 {
        self.shape / (self.rate * self.rate)
    }

    /// The Gamma distribution with these parameters
    pub fn to_gamma(&self) -> Gamma {
        Gamma::new_unchecked(self.shape, self.rate)
    }
}

impl From<GammaParams> for Gamma {
    fn from(params: GammaParams) -> Self {
        params.to_gamma()
    }
}

/// Match a Gamma to the sample mean and unbiased sample variance of `xs`.
///
/// With `m` the mean and `v` the variance, `shape = m^2 / v` and
/// `rate = m / v`, so `shape / rate == m`.
///
/// # Example
///
/// ```rust
/// # use shoprate_stats::prior::gamma::estimate;
/// let params = estimate(&[5, 3, 2, 6]).unwrap();
/// assert!((params.mean() - 4.0).abs() < 1E-12);
///
/// assert!(estimate(&[0, 0, 0, 0]).is_err());
/// ```
pub fn estimate(xs: &[u32]) -> Result<GammaParams, EstimateError> {
    if xs.len() < 2 {
        return Err(EstimateError::TooFewObservations { n: xs.len() });
    }

    let xs: Vec<f64> = xs.iter().map(|&x| f64::from(x)).collect();
    let m = mean(&xs);
    let v = sample_var(&xs);

    // counts are non-negative, so a positive variance means a positive mean
    if v == 0.0 {
        return Err(EstimateError::ZeroVariance { mean: m });
    }

    Ok(GammaParams {
        shape: m * m / v,
        rate: m / v,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rv::traits::{Mean, Variance};
    use approx::*;

    const TOL: f64 = 1E-10;

    #[test]
    fn estimate_weekday_counts() {
        // mean 4, sample variance 10/3
        let params = estimate(&[5, 3, 2, 6]).unwrap();
        assert_relative_eq!(params.shape(), 4.8, epsilon = TOL);
        assert_relative_eq!(params.rate(), 1.2, epsilon = TOL);
    }

    #[test]
    fn estimate_recovers_sample_moments() {
        let xs = [7, 9, 3, 7, 1, 12];
        let fxs: Vec<f64> = xs.iter().map(|&x| f64::from(x)).collect();
        let params = estimate(&xs).unwrap();

        assert!(params.shape() > 0.0);
        assert!(params.rate() > 0.0);
        assert_relative_eq!(params.mean(), mean(&fxs), epsilon = TOL);
        assert_relative_eq!(params.variance(), sample_var(&fxs), epsilon = TOL);
    }

    #[test]
    fn gamma_conversion_keeps_moments() {
        let params = estimate(&[3, 8, 4, 8]).unwrap();
        let gamma: Gamma = params.into();
        let gamma_mean: f64 = gamma.mean().unwrap();
        let gamma_var: f64 = gamma.variance().unwrap();
        assert_relative_eq!(gamma_mean, params.mean(), epsilon = TOL);
        assert_relative_eq!(gamma_var, params.variance(), epsilon = TOL);
    }

    #[test]
    fn all_zero_counts_are_degenerate() {
        assert_eq!(
            estimate(&[0, 0, 0, 0]),
            Err(EstimateError::ZeroVariance { mean: 0.0 })
        );
    }

    #[test]
    fn constant_counts_are_degenerate() {
        assert_eq!(
            estimate(&[3, 3, 3]),
            Err(EstimateError::ZeroVariance { mean: 3.0 })
        );
    }

    #[test]
    fn params_must_be_positive_and_finite() {
        assert!(GammaParams::new(4.8, 1.2).is_ok());
        assert!(GammaParams::new(0.0, 1.2).is_err());
        assert!(GammaParams::new(4.8, -1.0).is_err());
        assert!(GammaParams::new(f64::NAN, 1.0).is_err());
        assert!(GammaParams::new(1.0, f64::INFINITY).is_err());
    }

    #[test]
    fn sparse_counts_give_positive_params() {
        // one purchase in four weeks
        let params = estimate(&[0, 0, 1, 0]).unwrap();
        assert!(params.shape() > 0.0);
        assert!(params.rate() > 0.0);
        assert_relative_eq!(params.mean(), 0.25, epsilon = TOL);
    }

    #[test]
    fn single_count_is_too_few() {
        assert_eq!(
            estimate(&[4]),
            Err(EstimateError::TooFewObservations { n: 1 })
        );
    }

    #[test]
    fn no_counts_is_too_few() {
        assert_eq!(
            estimate(&[]),
            Err(EstimateError::TooFewObservations { n: 0 })
        );
    }
}
