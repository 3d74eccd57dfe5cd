use serde::{Deserialize, Serialize};
use shoprate_consts::{
    CREDIBLE_LEVEL, FREQUENCY_PRECISION, RESULT_PRECISION, TRAILING_WEEKS,
};
use shoprate_stats::NutsConfig;

fn default_credible_level() -> f64 {
    CREDIBLE_LEVEL
}

fn default_frequency_precision() -> u32 {
    FREQUENCY_PRECISION
}

fn default_result_precision() -> u32 {
    RESULT_PRECISION
}

/// Configuration for `WeekdaySimulator`
///
/// Sets the window length, sampler settings, seed, and how results are
/// summarized and rounded.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SimulatorConfig {
    /// Number of weeks of history in each weekday bucket
    pub trailing_weeks: usize,
    /// Sampler settings shared by every weekday
    #[serde(default)]
    pub sampler: NutsConfig,
    /// PRNG seed. Without one every run draws fresh entropy.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Mass of the equal-tailed credible interval
    #[serde(default = "default_credible_level")]
    pub credible_level: f64,
    /// Decimals used to bin draws in frequency tables
    #[serde(default = "default_frequency_precision")]
    pub frequency_precision: u32,
    /// Decimals of the per-weekday median returned by `simulate`
    #[serde(default = "default_result_precision")]
    pub result_precision: u32,
}

impl SimulatorConfig {
    pub fn new() -> Self {
        Self {
            trailing_weeks: TRAILING_WEEKS,
            sampler: NutsConfig::new(),
            seed: None,
            credible_level: CREDIBLE_LEVEL,
            frequency_precision: FREQUENCY_PRECISION,
            result_precision: RESULT_PRECISION,
        }
    }

    pub fn trailing_weeks(mut self, trailing_weeks: usize) -> Self {
        self.trailing_weeks = trailing_weeks;
        self
    }

    pub fn n_samples(mut self, n_samples: usize) -> Self {
        self.sampler.n_samples = n_samples;
        self
    }

    pub fn n_warmup(mut self, n_warmup: usize) -> Self {
        self.sampler.n_warmup = n_warmup;
        self
    }

    pub fn sampler(mut self, sampler: NutsConfig) -> Self {
        self.sampler = sampler;
        self
    }

    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn credible_level(mut self, credible_level: f64) -> Self {
        self.credible_level = credible_level;
        self
    }

    pub fn frequency_precision(mut self, precision: u32) -> Self {
        self.frequency_precision = precision;
        self
    }

    pub fn result_precision(mut self, precision: u32) -> Self {
        self.result_precision = precision;
        self
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn defaults() {
        let config = SimulatorConfig::default();
        assert_eq!(config.trailing_weeks, 4);
        assert_eq!(config.sampler.n_samples, 1000);
        assert_eq!(config.sampler.n_warmup, 200);
        assert_eq!(config.seed, None);
        assert_eq!(config.credible_level, 0.95);
        assert_eq!(config.frequency_precision, 2);
        assert_eq!(config.result_precision, 2);
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let yaml = indoc! {"
            trailing_weeks: 6
            seed: 1337
            sampler:
              n_samples: 500
              n_warmup: 100
        "};
        let config: SimulatorConfig = serde_yaml::from_str(yaml).unwrap();
        let expected = SimulatorConfig::new()
            .trailing_weeks(6)
            .seed(Some(1337))
            .n_samples(500)
            .n_warmup(100);
        assert_eq!(config, expected);
    }

    #[test]
    fn unknown_fields_rejected() {
        let yaml = "trailing_weeks: 4\nn_chains: 2\n";
        assert!(serde_yaml::from_str::<SimulatorConfig>(yaml).is_err());
    }
}
