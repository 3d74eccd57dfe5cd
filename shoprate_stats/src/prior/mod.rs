//! Priors derived from observed data
pub mod gamma;

pub use gamma::{estimate, EstimateError, GammaParams};
