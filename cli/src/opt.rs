use std::fs::File;
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Parser;
use shoprate::consts::{CREDIBLE_LEVEL, FREQUENCY_PRECISION, N_SAMPLES, N_WARMUP};
use shoprate::data::{HistoryLoadError, PurchaseHistory};
use shoprate::stats::NutsConfig;
use shoprate::SimulatorConfig;

#[derive(Parser, Debug)]
pub struct SimulateArgs {
    /// The user whose purchases to simulate
    #[clap(name = "USER_ID")]
    pub user_id: String,
    /// Path to a purchase history in yaml or json. Uses the bundled demo
    /// history if omitted.
    #[clap(long = "history")]
    pub history: Option<PathBuf>,
    /// Bucket the weeks before this date (YYYY-MM-DD) instead of the
    /// history's own `as_of`
    #[clap(long = "as-of")]
    pub as_of: Option<NaiveDate>,
    /// The number of trailing weeks in each weekday bucket
    #[clap(long = "weeks", short = 'w')]
    pub weeks: Option<usize>,
    /// The number of posterior draws per weekday
    #[clap(long = "n-samples", short = 'n', conflicts_with = "config")]
    pub n_samples: Option<usize>,
    /// The number of warm-up iterations per weekday
    #[clap(long = "n-warmup", conflicts_with = "config")]
    pub n_warmup: Option<usize>,
    /// The PRNG seed
    #[clap(long = "seed")]
    pub seed: Option<u64>,
    /// Path to a simulator config yaml
    #[clap(long = "config")]
    pub config: Option<PathBuf>,
    /// Print the credible interval of each weekday next to its median
    #[clap(long)]
    pub intervals: bool,
    /// Print json instead of a table
    #[clap(long)]
    pub json: bool,
}

impl SimulateArgs {
    /// The simulator config from `--config` if given, otherwise the defaults,
    /// with the command line overrides applied on top
    pub fn simulator_config(&self) -> Result<SimulatorConfig, String> {
        let mut config = match self.config {
            Some(ref path) => {
                let f = File::open(path).map_err(|err| {
                    format!("could not open {}: {err}", path.display())
                })?;
                serde_yaml::from_reader(f).map_err(|err| {
                    format!("invalid config {}: {err}", path.display())
                })?
            }
            None => SimulatorConfig::new(),
        };

        if let Some(weeks) = self.weeks {
            config = config.trailing_weeks(weeks);
        }
        if let Some(n_samples) = self.n_samples {
            config = config.n_samples(n_samples);
        }
        if let Some(n_warmup) = self.n_warmup {
            config = config.n_warmup(n_warmup);
        }
        if self.seed.is_some() {
            config = config.seed(self.seed);
        }

        Ok(config)
    }

    pub fn purchase_history(&self) -> Result<PurchaseHistory, HistoryLoadError> {
        let mut history = match self.history {
            Some(ref path) => PurchaseHistory::from_path(path)?,
            None => PurchaseHistory::demo(),
        };
        if let Some(as_of) = self.as_of {
            history.as_of = as_of;
        }
        Ok(history)
    }
}

#[derive(Parser, Debug)]
pub struct PosteriorArgs {
    /// Comma separated purchase counts, e.g. "5,3,2,6"
    #[clap(name = "COUNTS", value_delimiter = ',', required = true)]
    pub counts: Vec<u32>,
    /// The number of posterior draws
    #[clap(long = "n-samples", short = 'n', default_value_t = N_SAMPLES)]
    pub n_samples: usize,
    /// The number of warm-up iterations
    #[clap(long = "n-warmup", default_value_t = N_WARMUP)]
    pub n_warmup: usize,
    /// Mass of the credible interval
    #[clap(long = "level", default_value_t = CREDIBLE_LEVEL)]
    pub level: f64,
    /// Decimals used to bin draws in the frequency table
    #[clap(long = "precision", short = 'p', default_value_t = FREQUENCY_PRECISION)]
    pub precision: u32,
    /// The PRNG seed
    #[clap(long = "seed")]
    pub seed: Option<u64>,
    /// Print json instead of tables
    #[clap(long)]
    pub json: bool,
}

impl PosteriorArgs {
    pub fn simulator_config(&self) -> SimulatorConfig {
        SimulatorConfig::new()
            .sampler(
                NutsConfig::new()
                    .n_samples(self.n_samples)
                    .n_warmup(self.n_warmup),
            )
            .credible_level(self.level)
            .frequency_precision(self.precision)
            .seed(self.seed)
    }
}

#[derive(Parser, Debug)]
#[clap(
    name = "shoprate",
    about = "Bayesian estimates of weekday purchase rates",
    version
)]
pub enum Opt {
    /// Estimate the purchases of a user on each day of the week
    #[clap(name = "simulate")]
    Simulate(SimulateArgs),
    /// Summarize the posterior rate of a single list of counts
    #[clap(name = "posterior")]
    Posterior(PosteriorArgs),
}
