#![warn(unused_extern_crates)]
#![warn(
    clippy::all,
    clippy::imprecise_flops,
    clippy::suboptimal_flops,
    clippy::unseparated_literal_suffix,
    clippy::unreadable_literal,
    clippy::option_option,
    clippy::implicit_clone
)]
//! Bayesian inference of a Poisson rate: method-of-moments Gamma priors, a
//! No-U-Turn sampler over any differentiable [`Model`], and posterior
//! summaries.
pub mod model;
pub mod nuts;
pub mod prior;
pub mod summary;

pub use shoprate_consts::rv;

pub use model::{GammaPoisson, Model, ModelError};
pub use nuts::{
    sample_rate, Chain, Diagnostics, Nuts, NutsConfig, PosteriorSamples,
    SampleError,
};
pub use prior::{estimate, EstimateError, GammaParams};
pub use summary::{PosteriorSummary, SummaryError};
