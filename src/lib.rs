//! Bayesian estimates of how often a user buys at a store on each day of the
//! week.
//!
//! A short history of daily purchase counts is split into one bucket per
//! weekday. For each bucket a Gamma prior on the Poisson purchase rate is
//! fit by method of moments, the posterior of the rate is drawn with the
//! No-U-Turn sampler, and the draws are summarized.
//!
//! # Example
//!
//! Run the bundled demo history for user "123". Fixing the seed makes the
//! result reproducible.
//!
//! ```rust
//! use shoprate::prelude::*;
//! use chrono::Weekday;
//!
//! let simulator = SimulatorBuilder::new(PurchaseHistory::demo())
//!     .sampler(NutsConfig::new().n_samples(200).n_warmup(100))
//!     .seed_from_u64(1337)
//!     .build()
//!     .unwrap();
//!
//! let medians = simulator.simulate("123").unwrap();
//!
//! assert_eq!(medians.len(), 7);
//! assert_eq!(medians.keys().next(), Some(&Weekday::Mon));
//! ```
//!
//! A weekday with no variation in its counts, say no purchases at all,
//! does not pin down a prior, and the whole simulation fails rather than
//! guessing.
//!
//! ```rust
//! # use shoprate::prelude::*;
//! use shoprate::error::SimulateError;
//! use std::collections::BTreeMap;
//!
//! let buckets = [vec![3, 8, 4, 8], vec![2, 1, 5, 9], vec![6, 4, 6, 3],
//!     vec![5, 6, 7, 5], vec![3, 3, 2, 6], vec![7, 9, 3, 7], vec![0, 0, 0, 0]];
//! let mut source = BTreeMap::new();
//! source.insert(String::from("123"), WeekdayBuckets::new(buckets));
//!
//! let simulator = SimulatorBuilder::new(source).build().unwrap();
//! let err = simulator.simulate("123").unwrap_err();
//!
//! assert!(matches!(err, SimulateError::WeekdayInference { .. }));
//! ```
#![warn(unused_extern_crates)]
#![warn(
    clippy::all,
    clippy::imprecise_flops,
    clippy::suboptimal_flops,
    clippy::unseparated_literal_suffix,
    clippy::unreadable_literal,
    clippy::option_option,
    clippy::implicit_clone,
    clippy::perf
)]

pub mod config;
pub mod data;
mod interface;
pub mod prelude;

pub use config::SimulatorConfig;

pub use interface::{
    error, infer_weekday, SimulatorBuilder, WeekdayResult, WeekdaySimulator,
};

pub use shoprate_consts as consts;
pub use shoprate_stats as stats;
pub use shoprate_utils as utils;
