use chrono::Weekday;
use shoprate_stats::{EstimateError, SampleError, SummaryError};
use thiserror::Error;

use crate::data::FetchError;

/// Errors that can arise in the estimate-sample-summarize pipeline of a
/// single weekday
#[derive(Clone, Debug, PartialEq, Error)]
pub enum WeekdayInferenceError {
    /// The counts do not give a usable Gamma prior
    #[error("prior estimation failed: {0}")]
    Estimate(#[from] EstimateError),
    /// The sampler could not produce the requested draws
    #[error("posterior sampling failed: {0}")]
    Sample(#[from] SampleError),
    /// The draws could not be summarized
    #[error("posterior summary failed: {0}")]
    Summary(#[from] SummaryError),
}

/// Errors that can arise when running a simulation
#[derive(Clone, Debug, PartialEq, Error)]
pub enum SimulateError {
    /// The bucket source could not supply data for the user
    #[error("no data available for user '{user_id}': {source}")]
    DataUnavailable {
        user_id: String,
        #[source]
        source: FetchError,
    },
    /// Inference failed for one weekday. No partial results are returned.
    #[error("inference failed for {weekday}: {source}")]
    WeekdayInference {
        weekday: Weekday,
        #[source]
        source: WeekdayInferenceError,
    },
}

/// Errors that can arise when building a `WeekdaySimulator`
#[derive(Clone, Debug, PartialEq, Error)]
pub enum BuildSimulatorError {
    #[error("the trailing window must span at least one week")]
    ZeroTrailingWeeks,
    #[error("the number of samples must be greater than zero")]
    ZeroSamples,
    #[error("credible level must be in (0, 1), got {0}")]
    InvalidCredibleLevel(f64),
    #[error("target acceptance must be in (0, 1), got {0}")]
    InvalidTargetAccept(f64),
}
