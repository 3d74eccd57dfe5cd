//! Point and interval summaries of posterior draws.
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use shoprate_consts::CREDIBLE_LEVEL;
use shoprate_utils::{mean, quantile_sorted, round_to, rounded_key, std};
use thiserror::Error;

use crate::nuts::PosteriorSamples;

#[derive(Clone, Debug, PartialEq, Error)]
pub enum SummaryError {
    /// There is nothing to summarize
    #[error("cannot summarize zero posterior samples")]
    EmptySamples,
    /// Credible mass must be strictly between zero and one
    #[error("credible level must be in (0, 1), got {0}")]
    InvalidLevel(f64),
}

/// Read-only statistics over a set of posterior draws.
///
/// Takes ownership of the draws. The mean and the credible interval at the
/// configured level are computed once on construction; everything else is
/// read off a sorted copy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PosteriorSummary {
    samples: PosteriorSamples,
    sorted: Vec<f64>,
    level: f64,
    mean: f64,
    lower_credible: f64,
    upper_credible: f64,
}

impl PosteriorSummary {
    /// Summarize with the default 95% credible level
    pub fn new(samples: PosteriorSamples) -> Result<Self, SummaryError> {
        Self::with_level(samples, CREDIBLE_LEVEL)
    }

    pub fn with_level(
        samples: PosteriorSamples,
        level: f64,
    ) -> Result<Self, SummaryError> {
        if samples.is_empty() {
            return Err(SummaryError::EmptySamples);
        }
        check_level(level)?;

        let mut sorted = samples.draws.clone();
        sorted.sort_unstable_by(|a, b| a.total_cmp(b));

        let (lower_credible, upper_credible) = interval(&sorted, level);
        Ok(Self {
            mean: mean(&sorted),
            samples,
            sorted,
            level,
            lower_credible,
            upper_credible,
        })
    }

    pub fn samples(&self) -> &PosteriorSamples {
        &self.samples
    }

    pub fn n_samples(&self) -> usize {
        self.sorted.len()
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn median(&self) -> f64 {
        quantile_sorted(&self.sorted, 0.5)
    }

    pub fn std(&self) -> f64 {
        std(&self.sorted)
    }

    /// Quantile by linear interpolation between order statistics.
    ///
    /// # Panics
    /// Panics if `p` is outside [0, 1].
    pub fn quantile(&self, p: f64) -> f64 {
        quantile_sorted(&self.sorted, p)
    }

    /// Equal-tailed credible interval at the summary's level. At 95% these
    /// are the 2.5th and 97.5th percentiles.
    pub fn credible_interval(&self) -> (f64, f64) {
        (self.lower_credible, self.upper_credible)
    }

    pub fn lower_credible(&self) -> f64 {
        self.lower_credible
    }

    pub fn upper_credible(&self) -> f64 {
        self.upper_credible
    }

    /// Equal-tailed credible interval at another level
    pub fn credible_interval_at(
        &self,
        level: f64,
    ) -> Result<(f64, f64), SummaryError> {
        check_level(level)?;
        Ok(interval(&self.sorted, level))
    }

    /// Number of draws at each value after rounding to `precision` decimals,
    /// ascending by value.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use shoprate_stats::nuts::{Diagnostics, PosteriorSamples};
    /// # use shoprate_stats::summary::PosteriorSummary;
    /// # let diagnostics = Diagnostics {
    /// #     step_size: 1.0,
    /// #     inv_metric: vec![1.0],
    /// #     mean_accept: 1.0,
    /// #     n_divergent: 0,
    /// #     n_leapfrog: 0,
    /// # };
    /// let samples = PosteriorSamples {
    ///     draws: vec![1.234, 0.5, 1.231, 0.501],
    ///     diagnostics,
    /// };
    /// let summary = PosteriorSummary::new(samples).unwrap();
    ///
    /// assert_eq!(summary.frequency_table(2), vec![(0.5, 2), (1.23, 2)]);
    /// ```
    pub fn frequency_table(&self, precision: u32) -> Vec<(f64, usize)> {
        self.sorted
            .iter()
            .map(|&x| rounded_key(x, precision))
            .dedup_with_count()
            .map(|(count, key)| {
                let scale = 10_f64.powi(precision as i32);
                (round_to(key as f64 / scale, precision), count)
            })
            .collect()
    }
}

fn check_level(level: f64) -> Result<(), SummaryError> {
    if level > 0.0 && level < 1.0 {
        Ok(())
    } else {
        Err(SummaryError::InvalidLevel(level))
    }
}

fn interval(sorted: &[f64], level: f64) -> (f64, f64) {
    let tail = (1.0 - level) / 2.0;
    (
        quantile_sorted(sorted, tail),
        quantile_sorted(sorted, 1.0 - tail),
    )
}
