//! Target densities for gradient-based MCMC.
use rand::Rng;
use thiserror::Error;

use crate::prior::GammaParams;
use crate::rv::dist::{Gamma, Poisson};
use crate::rv::traits::Rv;

/// A differentiable log density over an unconstrained real space.
///
/// Samplers only ever see unconstrained coordinates. Constrained parameters
/// are handled by the model through a change of variables whose log Jacobian
/// is part of `ln_f`; `constrain` maps a draw back to parameter space.
pub trait Model {
    /// Number of unconstrained coordinates
    fn n_dims(&self) -> usize;

    /// Log density, up to an additive constant, at unconstrained `x`
    fn ln_f(&self, x: &[f64]) -> f64;

    /// Gradient of `ln_f` at `x`
    fn grad_ln_f(&self, x: &[f64]) -> Vec<f64>;

    /// Draw a starting point for a chain
    fn draw_init<R: Rng>(&self, rng: &mut R) -> Vec<f64>;

    /// Map an unconstrained point to parameter space
    fn constrain(&self, x: &[f64]) -> Vec<f64> {
        x.to_vec()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ModelError {
    /// A rate cannot be inferred from nothing
    #[error("no observations supplied")]
    NoObservations,
}

/// A Poisson rate with a Gamma prior.
///
/// ```text
/// lambda ~ Gamma(shape, rate)
/// x_i    ~ Poisson(lambda)
/// ```
///
/// The sampler works on `u = ln(lambda)`; the Jacobian adds `u` to the log
/// density.
#[derive(Clone, Debug)]
pub struct GammaPoisson {
    prior: Gamma,
    xs: Vec<u32>,
    sum_x: f64,
}

impl GammaPoisson {
    pub fn new(xs: &[u32], prior: GammaParams) -> Result<Self, ModelError> {
        if xs.is_empty() {
            return Err(ModelError::NoObservations);
        }
        Ok(Self {
            prior: prior.to_gamma(),
            xs: xs.to_vec(),
            sum_x: xs.iter().map(|&x| f64::from(x)).sum(),
        })
    }

    pub fn prior(&self) -> &Gamma {
        &self.prior
    }

    pub fn observations(&self) -> &[u32] {
        &self.xs
    }

    /// The closed form posterior, `Gamma(shape + sum(x), rate + n)`
    pub fn conjugate_posterior(&self) -> Gamma {
        Gamma::new_unchecked(
            self.prior.shape() + self.sum_x,
            self.prior.rate() + self.xs.len() as f64,
        )
    }
}

impl Model for GammaPoisson {
    fn n_dims(&self) -> usize {
        1
    }

    fn ln_f(&self, x: &[f64]) -> f64 {
        let u = x[0];
        let lambda = u.exp();
        if !(lambda.is_finite() && lambda > 0.0) {
            return f64::NEG_INFINITY;
        }

        let likelihood = Poisson::new_unchecked(lambda);
        let loglike: f64 = self.xs.iter().map(|x| likelihood.ln_f(x)).sum();
        self.prior.ln_f(&lambda) + loglike + u
    }

    fn grad_ln_f(&self, x: &[f64]) -> Vec<f64> {
        let lambda = x[0].exp();
        let n = self.xs.len() as f64;
        vec![(self.prior.rate() + n).mul_add(-lambda, self.prior.shape() + self.sum_x)]
    }

    fn draw_init<R: Rng>(&self, rng: &mut R) -> Vec<f64> {
        vec![rng.gen_range(-2.0..2.0)]
    }

    fn constrain(&self, x: &[f64]) -> Vec<f64> {
        vec![x[0].exp()]
    }
}
