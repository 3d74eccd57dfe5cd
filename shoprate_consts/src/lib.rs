#![warn(
    clippy::all,
    clippy::imprecise_flops,
    clippy::suboptimal_flops,
    clippy::unseparated_literal_suffix,
    clippy::unreadable_literal,
    clippy::option_option,
    clippy::implicit_clone
)]
//! Default values for the rate inference engine and weekday simulations
pub use rv;

/// Default number of weeks of history fed into each weekday bucket
pub const TRAILING_WEEKS: usize = 4;

/// Default number of posterior draws retained after warm-up
pub const N_SAMPLES: usize = 1000;

/// Default number of warm-up transitions used for adaptation
pub const N_WARMUP: usize = 200;

/// Maximum depth of the NUTS trajectory tree. Each transition takes at most
/// `2^MAX_TREE_DEPTH` leapfrog steps.
pub const MAX_TREE_DEPTH: usize = 10;

/// Target mean acceptance statistic for dual averaging
pub const TARGET_ACCEPT: f64 = 0.8;

/// Number of consecutive divergent transitions after which the chain is
/// considered lost
pub const MAX_DIVERGENCES_IN_A_ROW: usize = 100;

/// Hamiltonian error past which a trajectory is flagged as divergent
pub const DIVERGENCE_THRESHOLD: f64 = 1000.0;

/// Default credible interval mass
pub const CREDIBLE_LEVEL: f64 = 0.95;

/// Default number of decimals used when binning draws for display
pub const FREQUENCY_PRECISION: u32 = 2;

/// Default number of decimals of the per-weekday point estimate
pub const RESULT_PRECISION: u32 = 2;

/// Number of draws attempted when looking for a finite initial point
pub const MAX_INIT_ATTEMPTS: usize = 100;
