pub mod numbers;
pub mod stats;

pub use numbers::{round_to, rounded_key};
pub use stats::{mean, quantile_sorted, sample_var, std, var};
