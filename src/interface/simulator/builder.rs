use shoprate_stats::NutsConfig;

use super::error::BuildSimulatorError;
use super::WeekdaySimulator;
use crate::config::SimulatorConfig;
use crate::data::BucketSource;

/// Builds `WeekdaySimulator`s
pub struct SimulatorBuilder<S: BucketSource> {
    source: S,
    config: Option<SimulatorConfig>,
    trailing_weeks: Option<usize>,
    sampler: Option<NutsConfig>,
    seed: Option<u64>,
}

impl<S: BucketSource> SimulatorBuilder<S> {
    #[must_use]
    pub fn new(source: S) -> Self {
        Self {
            source,
            config: None,
            trailing_weeks: None,
            sampler: None,
            seed: None,
        }
    }

    /// With a complete configuration. Settings given through the other
    /// builder methods take precedence.
    #[must_use]
    pub fn config(mut self, config: SimulatorConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// With a window of `trailing_weeks` weeks
    #[must_use]
    pub fn trailing_weeks(mut self, trailing_weeks: usize) -> Self {
        self.trailing_weeks = Some(trailing_weeks);
        self
    }

    /// With specific sampler settings
    #[must_use]
    pub fn sampler(mut self, sampler: NutsConfig) -> Self {
        self.sampler = Some(sampler);
        self
    }

    /// With a given random number generator seed
    #[must_use]
    pub fn seed_from_u64(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    // Build the `WeekdaySimulator`; consume the `Builder`.
    pub fn build(self) -> Result<WeekdaySimulator<S>, BuildSimulatorError> {
        let mut config = self.config.unwrap_or_default();
        if let Some(trailing_weeks) = self.trailing_weeks {
            config.trailing_weeks = trailing_weeks;
        }
        if let Some(sampler) = self.sampler {
            config.sampler = sampler;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }

        validate(&config)?;
        Ok(WeekdaySimulator::new(self.source, config))
    }
}

fn validate(config: &SimulatorConfig) -> Result<(), BuildSimulatorError> {
    if config.trailing_weeks == 0 {
        return Err(BuildSimulatorError::ZeroTrailingWeeks);
    }
    if config.sampler.n_samples == 0 {
        return Err(BuildSimulatorError::ZeroSamples);
    }
    if !(config.credible_level > 0.0 && config.credible_level < 1.0) {
        return Err(BuildSimulatorError::InvalidCredibleLevel(
            config.credible_level,
        ));
    }
    let target = config.sampler.target_accept;
    if !(target > 0.0 && target < 1.0) {
        return Err(BuildSimulatorError::InvalidTargetAccept(target));
    }
    Ok(())
}
