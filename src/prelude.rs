//! Common import for general use.

pub use crate::{
    data::{BucketSource, PurchaseHistory, WeekdayBuckets},
    error::{SimulateError, WeekdayInferenceError},
    SimulatorBuilder, SimulatorConfig, WeekdayResult, WeekdaySimulator,
};

pub use shoprate_stats::{
    GammaParams, Model, NutsConfig, PosteriorSamples, PosteriorSummary,
};
pub use shoprate_stats::rv;
pub use shoprate_utils as utils;
