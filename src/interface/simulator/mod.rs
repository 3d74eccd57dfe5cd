mod builder;
pub mod error;
mod result;

pub use builder::SimulatorBuilder;
pub use result::WeekdayResult;

use chrono::Weekday;
use indexmap::IndexMap;
use log::{debug, info};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;
use rayon::prelude::*;
use shoprate_stats::{estimate, sample_rate, PosteriorSummary};

use crate::config::SimulatorConfig;
use crate::data::{BucketSource, WEEKDAYS};
use error::{SimulateError, WeekdayInferenceError};

/// Estimates a user's purchase rate for every day of the week.
///
/// Each weekday runs its own pipeline: method-of-moments Gamma prior, NUTS
/// draws of the Poisson rate, posterior summary. The seven pipelines share
/// nothing and run in parallel; each gets an RNG split off a master RNG
/// before the fan-out, so results do not depend on scheduling.
pub struct WeekdaySimulator<S: BucketSource> {
    source: S,
    config: SimulatorConfig,
}

impl<S: BucketSource> WeekdaySimulator<S> {
    pub fn new(source: S, config: SimulatorConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Rounded posterior median purchase count per weekday, Monday first,
    /// over the configured trailing window.
    ///
    /// Any weekday failing fails the whole call.
    pub fn simulate(
        &self,
        user_id: &str,
    ) -> Result<IndexMap<Weekday, f64>, SimulateError> {
        self.simulate_with_weeks(user_id, self.config.trailing_weeks)
    }

    /// Same as `simulate` with a different window length
    pub fn simulate_with_weeks(
        &self,
        user_id: &str,
        trailing_weeks: usize,
    ) -> Result<IndexMap<Weekday, f64>, SimulateError> {
        self.run(user_id, trailing_weeks)
            .map(|result| result.medians(self.config.result_precision))
    }

    /// Full posterior summaries per weekday over the configured window
    pub fn simulate_summaries(
        &self,
        user_id: &str,
    ) -> Result<WeekdayResult, SimulateError> {
        self.run(user_id, self.config.trailing_weeks)
    }

    fn run(
        &self,
        user_id: &str,
        trailing_weeks: usize,
    ) -> Result<WeekdayResult, SimulateError> {
        info!(
            "simulating weekday purchases of user '{}' over {} weeks",
            user_id, trailing_weeks
        );

        let buckets = self
            .source
            .weekday_buckets(user_id, trailing_weeks)
            .map_err(|source| SimulateError::DataUnavailable {
                user_id: user_id.to_owned(),
                source,
            })?;

        let mut rng = match self.config.seed {
            Some(seed) => Xoshiro256Plus::seed_from_u64(seed),
            None => Xoshiro256Plus::from_entropy(),
        };
        let mut trngs: Vec<Xoshiro256Plus> = WEEKDAYS
            .iter()
            .map(|_| Xoshiro256Plus::seed_from_u64(rng.gen()))
            .collect();

        let config = &self.config;
        let outcomes: Vec<Result<PosteriorSummary, WeekdayInferenceError>> =
            WEEKDAYS
                .par_iter()
                .zip(trngs.par_iter_mut())
                .map(|(&weekday, trng)| {
                    let outcome = infer_weekday(&buckets[weekday], config, trng);
                    if let Ok(ref summary) = outcome {
                        debug!(
                            "{}: median {:.4}, {}% CI {:?}",
                            weekday,
                            summary.median(),
                            100.0 * summary.level(),
                            summary.credible_interval()
                        );
                    }
                    outcome
                })
                .collect();

        let summaries = WEEKDAYS
            .iter()
            .zip(outcomes)
            .map(|(&weekday, outcome)| {
                outcome
                    .map(|summary| (weekday, summary))
                    .map_err(|source| SimulateError::WeekdayInference {
                        weekday,
                        source,
                    })
            })
            .collect::<Result<IndexMap<Weekday, PosteriorSummary>, _>>()?;

        Ok(WeekdayResult::new(user_id, trailing_weeks, summaries))
    }
}

/// Estimate a prior from `counts`, draw the posterior rate, and summarize it
pub fn infer_weekday<R: Rng>(
    counts: &[u32],
    config: &SimulatorConfig,
    rng: &mut R,
) -> Result<PosteriorSummary, WeekdayInferenceError> {
    let prior = estimate(counts)?;
    let samples = sample_rate(counts, prior, &config.sampler, rng)?;
    let summary = PosteriorSummary::with_level(samples, config.credible_level)?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{FetchError, PurchaseHistory, WeekdayBuckets};
    use shoprate_stats::{EstimateError, NutsConfig};
    use std::collections::BTreeMap;

    fn quick_config() -> SimulatorConfig {
        SimulatorConfig::new()
            .sampler(NutsConfig::new().n_samples(200).n_warmup(100))
            .seed(Some(1337))
    }

    fn demo_simulator() -> WeekdaySimulator<PurchaseHistory> {
        WeekdaySimulator::new(PurchaseHistory::demo(), quick_config())
    }

    #[test]
    fn infer_weekday_pipeline() {
        let mut rng = Xoshiro256Plus::seed_from_u64(1);
        let summary =
            infer_weekday(&[5, 3, 2, 6], &quick_config(), &mut rng).unwrap();
        assert_eq!(summary.n_samples(), 200);
        let (lower, upper) = summary.credible_interval();
        assert!(lower <= summary.median() && summary.median() <= upper);
    }

    #[test]
    fn infer_weekday_degenerate() {
        let mut rng = Xoshiro256Plus::seed_from_u64(1);
        let err = infer_weekday(&[0, 0, 0, 0], &quick_config(), &mut rng)
            .unwrap_err();
        assert_eq!(
            err,
            WeekdayInferenceError::Estimate(EstimateError::ZeroVariance {
                mean: 0.0
            })
        );
    }

    #[test]
    fn summaries_are_in_weekday_order() {
        let result = demo_simulator().simulate_summaries("123").unwrap();
        let weekdays: Vec<Weekday> =
            result.summaries().keys().copied().collect();
        assert_eq!(weekdays, WEEKDAYS.to_vec());
        assert_eq!(result.user_id(), "123");
        assert_eq!(result.trailing_weeks(), 4);
    }

    #[test]
    fn seeded_runs_repeat() {
        let simulator = demo_simulator();
        assert_eq!(
            simulator.simulate("123").unwrap(),
            simulator.simulate("123").unwrap()
        );
    }

    #[test]
    fn unknown_user_is_data_unavailable() {
        let err = demo_simulator().simulate("nobody").unwrap_err();
        assert_eq!(
            err,
            SimulateError::DataUnavailable {
                user_id: String::from("nobody"),
                source: FetchError::UnknownUser(String::from("nobody")),
            }
        );
    }

    #[test]
    fn first_failing_weekday_is_reported() {
        let buckets = WeekdayBuckets::new([
            vec![3, 8, 4, 8],
            vec![2, 1, 5, 9],
            vec![6, 4, 6, 3],
            vec![2, 2, 2, 2],
            vec![3, 3, 2, 6],
            vec![0, 0, 0, 0],
            vec![3, 2, 5, 0],
        ]);
        let mut source = BTreeMap::new();
        source.insert(String::from("u"), buckets);

        let simulator = WeekdaySimulator::new(source, quick_config());
        match simulator.simulate("u").unwrap_err() {
            SimulateError::WeekdayInference { weekday, source } => {
                assert_eq!(weekday, Weekday::Thu);
                assert_eq!(
                    source,
                    WeekdayInferenceError::Estimate(
                        EstimateError::ZeroVariance { mean: 2.0 }
                    )
                );
            }
            err => panic!("unexpected error: {err}"),
        }
    }
}
