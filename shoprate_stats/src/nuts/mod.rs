//! The No-U-Turn sampler.
//!
//! Each transition draws a Gaussian momentum, then doubles a leapfrog
//! trajectory forward or backward in time until it makes a U-turn, diverges,
//! or reaches `2^max_tree_depth` steps. The next state is picked uniformly
//! (progressively) from the points inside the slice. Warm-up tunes the step
//! size by dual averaging and a diagonal metric over doubling windows.
mod adapt;
mod tree;

pub use adapt::{DualAveraging, RunningVariance, WindowSchedule};
pub use tree::{kinetic, leapfrog, ln_joint, no_u_turn, Point, Trajectory, Tree};

use log::{debug, warn};
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{GammaPoisson, Model, ModelError};
use crate::prior::GammaParams;
use shoprate_consts::{
    MAX_DIVERGENCES_IN_A_ROW, MAX_INIT_ATTEMPTS, MAX_TREE_DEPTH, N_SAMPLES,
    N_WARMUP, TARGET_ACCEPT,
};

const MAX_STEP_SIZE_SEARCH: usize = 100;

/// Errors that can arise while sampling a posterior
#[derive(Clone, Debug, PartialEq, Error)]
pub enum SampleError {
    /// No observed counts were supplied
    #[error("cannot infer a rate from zero observations")]
    NoObservations,
    /// Asked for zero posterior draws
    #[error("the number of samples must be greater than zero")]
    ZeroSamples,
    /// Every initial point tried had a non-finite density or gradient
    #[error("no finite initial point found in {attempts} attempts")]
    InitializationFailed { attempts: usize },
    /// Too many transitions in a row diverged
    #[error(
        "sampler diverged at transition {transition} ({n_divergent} divergent \
         transitions in a row)"
    )]
    Diverged {
        transition: usize,
        n_divergent: usize,
    },
    /// A retained draw is not a finite number
    #[error("draw {draw} is not finite")]
    NonFiniteDraw { draw: usize },
}

impl From<ModelError> for SampleError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::NoObservations => Self::NoObservations,
        }
    }
}

/// Configuration for a NUTS run
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct NutsConfig {
    /// Number of draws to keep after warm-up
    pub n_samples: usize,
    /// Number of adaptation transitions to discard
    pub n_warmup: usize,
    /// Maximum number of trajectory doublings per transition
    #[serde(default = "default_max_tree_depth")]
    pub max_tree_depth: usize,
    /// Acceptance statistic targeted by step size adaptation
    #[serde(default = "default_target_accept")]
    pub target_accept: f64,
    /// Number of consecutive divergent transitions tolerated before giving up
    #[serde(default = "default_max_divergences_in_a_row")]
    pub max_divergences_in_a_row: usize,
}

fn default_max_tree_depth() -> usize {
    MAX_TREE_DEPTH
}

fn default_target_accept() -> f64 {
    TARGET_ACCEPT
}

fn default_max_divergences_in_a_row() -> usize {
    MAX_DIVERGENCES_IN_A_ROW
}

impl NutsConfig {
    pub fn new() -> Self {
        Self {
            n_samples: N_SAMPLES,
            n_warmup: N_WARMUP,
            max_tree_depth: MAX_TREE_DEPTH,
            target_accept: TARGET_ACCEPT,
            max_divergences_in_a_row: MAX_DIVERGENCES_IN_A_ROW,
        }
    }

    pub fn n_samples(mut self, n_samples: usize) -> Self {
        self.n_samples = n_samples;
        self
    }

    pub fn n_warmup(mut self, n_warmup: usize) -> Self {
        self.n_warmup = n_warmup;
        self
    }

    pub fn max_tree_depth(mut self, max_tree_depth: usize) -> Self {
        self.max_tree_depth = max_tree_depth;
        self
    }

    pub fn target_accept(mut self, target_accept: f64) -> Self {
        self.target_accept = target_accept;
        self
    }

    pub fn max_divergences_in_a_row(mut self, n: usize) -> Self {
        self.max_divergences_in_a_row = n;
        self
    }
}

impl Default for NutsConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Sampler state reported alongside the draws
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Diagnostics {
    /// Step size used after warm-up
    pub step_size: f64,
    /// Diagonal of the adapted inverse metric
    pub inv_metric: Vec<f64>,
    /// Mean acceptance statistic over the retained transitions
    pub mean_accept: f64,
    /// Number of divergent retained transitions
    pub n_divergent: usize,
    /// Total leapfrog steps, warm-up included
    pub n_leapfrog: usize,
}

/// Draws of every model parameter
#[derive(Clone, Debug)]
pub struct Chain {
    pub draws: Vec<Vec<f64>>,
    pub diagnostics: Diagnostics,
}

/// Posterior draws of a single rate parameter
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PosteriorSamples {
    pub draws: Vec<f64>,
    pub diagnostics: Diagnostics,
}

impl PosteriorSamples {
    pub fn len(&self) -> usize {
        self.draws.len()
    }

    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }
}

struct Transition {
    point: Point,
    accept_stat: f64,
    n_steps: usize,
    diverged: bool,
}

/// No-U-Turn sampler
#[derive(Clone, Debug, Default)]
pub struct Nuts {
    config: NutsConfig,
}

impl Nuts {
    pub fn new(config: NutsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NutsConfig {
        &self.config
    }

    /// Run warm-up and then draw `n_samples` states from `model`.
    ///
    /// The total work is bounded by `(n_warmup + n_samples) *
    /// 2^max_tree_depth` leapfrog steps.
    pub fn sample<M: Model, R: Rng>(
        &self,
        model: &M,
        rng: &mut R,
    ) -> Result<Chain, SampleError> {
        if self.config.n_samples == 0 {
            return Err(SampleError::ZeroSamples);
        }

        let mut current = init_point(model, rng)?;
        let n_dims = model.n_dims();
        let mut inv_metric = vec![1.0; n_dims];
        let mut eps = find_step_size(model, &current, &inv_metric, rng);
        let mut dual_avg = DualAveraging::new(eps, self.config.target_accept);
        let schedule = WindowSchedule::new(self.config.n_warmup);
        let mut metric_acc = RunningVariance::new(n_dims);

        let mut n_leapfrog = 0;
        let mut divergent_in_a_row = 0;

        for ix in 0..self.config.n_warmup {
            let trans = self.transition(model, &current, eps, &inv_metric, rng);
            n_leapfrog += trans.n_steps;
            self.check_divergence(&trans, ix, &mut divergent_in_a_row)?;

            dual_avg.update(trans.accept_stat);
            eps = dual_avg.step_size();
            current = trans.point;

            if schedule.in_window(ix) {
                metric_acc.push(&current.x);
            }

            if schedule.closes_window(ix + 1) {
                inv_metric = metric_acc.regularized_variance();
                metric_acc.reset();
                eps = find_step_size(model, &current, &inv_metric, rng);
                dual_avg = DualAveraging::new(eps, self.config.target_accept);
                debug!(
                    "metric window closed after {} warm-up iterations: \
                     inv_metric = {:?}, step size = {}",
                    ix + 1,
                    inv_metric,
                    eps
                );
            }
        }

        eps = dual_avg.final_step_size();
        debug!("warm-up done, step size = {}", eps);

        let mut draws = Vec::with_capacity(self.config.n_samples);
        let mut sum_accept = 0.0;
        let mut n_divergent = 0;
        for ix in 0..self.config.n_samples {
            let trans = self.transition(model, &current, eps, &inv_metric, rng);
            n_leapfrog += trans.n_steps;
            self.check_divergence(
                &trans,
                self.config.n_warmup + ix,
                &mut divergent_in_a_row,
            )?;

            if trans.diverged {
                n_divergent += 1;
            }
            sum_accept += trans.accept_stat;
            current = trans.point;

            let draw = model.constrain(&current.x);
            if draw.iter().any(|x| !x.is_finite()) {
                return Err(SampleError::NonFiniteDraw { draw: ix });
            }
            draws.push(draw);
        }

        if n_divergent > 0 {
            warn!(
                "{} of {} transitions diverged after warm-up",
                n_divergent, self.config.n_samples
            );
        }

        Ok(Chain {
            draws,
            diagnostics: Diagnostics {
                step_size: eps,
                inv_metric,
                mean_accept: sum_accept / self.config.n_samples as f64,
                n_divergent,
                n_leapfrog,
            },
        })
    }

    fn check_divergence(
        &self,
        trans: &Transition,
        transition: usize,
        in_a_row: &mut usize,
    ) -> Result<(), SampleError> {
        if !trans.diverged {
            *in_a_row = 0;
            return Ok(());
        }

        *in_a_row += 1;
        if *in_a_row > self.config.max_divergences_in_a_row {
            Err(SampleError::Diverged {
                transition,
                n_divergent: *in_a_row,
            })
        } else {
            Ok(())
        }
    }

    fn transition<M: Model, R: Rng>(
        &self,
        model: &M,
        current: &Point,
        eps: f64,
        inv_metric: &[f64],
        rng: &mut R,
    ) -> Transition {
        let r0 = draw_momentum(inv_metric, rng);
        let joint_0 = ln_joint(current, &r0, inv_metric);
        // slice variable: ln(u) with u ~ U(0, exp(joint_0))
        let log_u = joint_0 + (1.0 - rng.gen::<f64>()).ln();

        let traj = Trajectory {
            model,
            inv_metric,
            eps,
            log_u,
            joint_0,
        };

        let mut minus = current.clone();
        let mut plus = current.clone();
        let mut r_minus = r0.clone();
        let mut r_plus = r0;
        let mut proposal = current.clone();
        let mut n_valid: usize = 1;
        let mut keep_going = true;
        let mut sum_accept = 0.0;
        let mut n_steps = 0;
        let mut diverged = false;
        let mut depth = 0;

        while keep_going && depth < self.config.max_tree_depth {
            let direction = if rng.gen::<bool>() { 1.0 } else { -1.0 };
            let tree = if direction < 0.0 {
                traj.build_tree(&minus, &r_minus, direction, depth, rng)
            } else {
                traj.build_tree(&plus, &r_plus, direction, depth, rng)
            };

            if tree.keep_going
                && rng.gen::<f64>() < tree.n_valid as f64 / n_valid as f64
            {
                proposal = tree.proposal;
            }

            if direction < 0.0 {
                minus = tree.minus;
                r_minus = tree.r_minus;
            } else {
                plus = tree.plus;
                r_plus = tree.r_plus;
            }

            n_valid += tree.n_valid;
            sum_accept += tree.sum_accept;
            n_steps += tree.n_steps;
            diverged |= tree.diverged;
            keep_going = tree.keep_going
                && no_u_turn(&minus, &plus, &r_minus, &r_plus, inv_metric);
            depth += 1;
        }

        Transition {
            point: proposal,
            accept_stat: if n_steps > 0 {
                sum_accept / n_steps as f64
            } else {
                0.0
            },
            n_steps,
            diverged,
        }
    }
}

fn draw_momentum<R: Rng>(inv_metric: &[f64], rng: &mut R) -> Vec<f64> {
    inv_metric
        .iter()
        .map(|mi| {
            let z: f64 = rng.sample(StandardNormal);
            z / mi.sqrt()
        })
        .collect()
}

fn init_point<M: Model, R: Rng>(
    model: &M,
    rng: &mut R,
) -> Result<Point, SampleError> {
    (0..MAX_INIT_ATTEMPTS)
        .map(|_| Point::new(model, model.draw_init(rng)))
        .find(Point::is_finite)
        .ok_or(SampleError::InitializationFailed {
            attempts: MAX_INIT_ATTEMPTS,
        })
}

/// Double or halve a unit step until a single leapfrog step has an
/// acceptance probability that crosses 1/2 (Hoffman & Gelman 2014,
/// algorithm 4).
fn find_step_size<M: Model, R: Rng>(
    model: &M,
    point: &Point,
    inv_metric: &[f64],
    rng: &mut R,
) -> f64 {
    let r = draw_momentum(inv_metric, rng);
    let joint_0 = ln_joint(point, &r, inv_metric);
    let ln_ratio = |eps: f64| {
        let (next, r_next) = leapfrog(model, point, &r, eps, inv_metric);
        ln_joint(&next, &r_next, inv_metric) - joint_0
    };

    let mut eps = 1.0;
    let mut log_ratio = ln_ratio(eps);
    let a: f64 = if log_ratio > 0.5_f64.ln() { 1.0 } else { -1.0 };

    for _ in 0..MAX_STEP_SIZE_SEARCH {
        if a * log_ratio <= -a * std::f64::consts::LN_2 {
            break;
        }
        eps *= 2_f64.powf(a);
        log_ratio = ln_ratio(eps);
    }
    eps
}

/// Draw the posterior of a Poisson rate under a Gamma prior.
///
/// # Example
///
/// ```rust
/// # use shoprate_stats::nuts::{sample_rate, NutsConfig};
/// # use shoprate_stats::prior::estimate;
/// let xs = [5, 3, 2, 6];
/// let prior = estimate(&xs).unwrap();
/// let config = NutsConfig::new().n_samples(100).n_warmup(50);
///
/// let mut rng = rand::thread_rng();
/// let samples = sample_rate(&xs, prior, &config, &mut rng).unwrap();
///
/// assert_eq!(samples.len(), 100);
/// assert!(samples.draws.iter().all(|&x| x >= 0.0));
/// ```
pub fn sample_rate<R: Rng>(
    xs: &[u32],
    prior: GammaParams,
    config: &NutsConfig,
    rng: &mut R,
) -> Result<PosteriorSamples, SampleError> {
    let model = GammaPoisson::new(xs, prior)?;
    let chain = Nuts::new(config.clone()).sample(&model, rng)?;
    Ok(PosteriorSamples {
        draws: chain.draws.into_iter().map(|draw| draw[0]).collect(),
        diagnostics: chain.diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rv::dist::Gaussian;
    use crate::rv::misc::ks_test;
    use crate::rv::traits::{Cdf, Mean};
    use approx::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256Plus;

    const KS_PVAL: f64 = 0.2;
    const N_FLAKY_TEST: usize = 10;

    /// Gaussian with mean `mu` and standard deviation `sigma` in one dim
    struct Normal1 {
        mu: f64,
        sigma: f64,
    }

    impl Model for Normal1 {
        fn n_dims(&self) -> usize {
            1
        }

        fn ln_f(&self, x: &[f64]) -> f64 {
            let z = (x[0] - self.mu) / self.sigma;
            -0.5 * z * z
        }

        fn grad_ln_f(&self, x: &[f64]) -> Vec<f64> {
            vec![-(x[0] - self.mu) / (self.sigma * self.sigma)]
        }

        fn draw_init<R: Rng>(&self, rng: &mut R) -> Vec<f64> {
            vec![rng.gen_range(-2.0..2.0)]
        }
    }

    /// A density that is never finite
    struct Broken;

    impl Model for Broken {
        fn n_dims(&self) -> usize {
            1
        }

        fn ln_f(&self, _x: &[f64]) -> f64 {
            f64::NAN
        }

        fn grad_ln_f(&self, _x: &[f64]) -> Vec<f64> {
            vec![f64::NAN]
        }

        fn draw_init<R: Rng>(&self, _rng: &mut R) -> Vec<f64> {
            vec![0.0]
        }
    }

    fn weekday_prior() -> GammaParams {
        GammaParams::new(4.8, 1.2).unwrap()
    }

    #[test]
    fn returns_exactly_n_samples() {
        let config = NutsConfig::new().n_samples(1000).n_warmup(200);
        let mut rng = Xoshiro256Plus::seed_from_u64(1337);
        let samples =
            sample_rate(&[5, 3, 2, 6], weekday_prior(), &config, &mut rng)
                .unwrap();
        assert_eq!(samples.len(), 1000);
        assert!(samples.draws.iter().all(|&x| x.is_finite() && x >= 0.0));
    }

    #[test]
    fn same_seed_same_draws() {
        let config = NutsConfig::new().n_samples(200).n_warmup(100);
        let draw = |seed: u64| {
            let mut rng = Xoshiro256Plus::seed_from_u64(seed);
            sample_rate(&[5, 3, 2, 6], weekday_prior(), &config, &mut rng)
                .unwrap()
        };
        assert_eq!(draw(8_675_309), draw(8_675_309));
        assert_ne!(draw(8_675_309).draws, draw(42).draws);
    }

    #[test]
    fn posterior_mean_matches_conjugate_posterior() {
        let xs = [5, 3, 2, 6];
        let model = GammaPoisson::new(&xs, weekday_prior()).unwrap();
        let target: f64 = model.conjugate_posterior().mean().unwrap();

        let config = NutsConfig::new().n_samples(2000).n_warmup(500);
        let mut rng = Xoshiro256Plus::seed_from_u64(0xABCD);
        let samples = sample_rate(&xs, weekday_prior(), &config, &mut rng)
            .unwrap();

        let mean = shoprate_utils::mean(&samples.draws);
        assert_relative_eq!(mean, target, epsilon = 0.2);
    }

    #[test]
    fn draws_follow_conjugate_posterior() {
        let xs = [3, 8, 4, 8];
        let prior = crate::prior::estimate(&xs).unwrap();
        let model = GammaPoisson::new(&xs, prior).unwrap();
        let posterior = model.conjugate_posterior();
        let config = NutsConfig::new().n_samples(500).n_warmup(200);

        let mut rng = rand::thread_rng();
        let n_passes = (0..N_FLAKY_TEST).fold(0, |acc, _| {
            let samples =
                sample_rate(&xs, prior, &config, &mut rng).unwrap();
            // thin to take the edge off autocorrelation
            let thinned: Vec<f64> =
                samples.draws.iter().step_by(5).copied().collect();
            let (_, p) = ks_test(&thinned, |x| posterior.cdf(&x));

            if p > KS_PVAL {
                acc + 1
            } else {
                acc
            }
        });

        assert!(n_passes > 0);
    }

    #[test]
    fn gaussian_target_recovered() {
        let model = Normal1 {
            mu: 1.0,
            sigma: 1.5,
        };
        let gauss = Gaussian::new(1.0, 1.5).unwrap();
        let nuts = Nuts::new(NutsConfig::new().n_samples(500).n_warmup(200));

        let mut rng = rand::thread_rng();
        let n_passes = (0..N_FLAKY_TEST).fold(0, |acc, _| {
            let chain = nuts.sample(&model, &mut rng).unwrap();
            let xs: Vec<f64> =
                chain.draws.iter().step_by(5).map(|x| x[0]).collect();
            let (_, p) = ks_test(&xs, |x| gauss.cdf(&x));

            if p > KS_PVAL {
                acc + 1
            } else {
                acc
            }
        });

        assert!(n_passes > 0);
    }

    #[test]
    fn adapted_metric_tracks_target_variance() {
        let model = Normal1 {
            mu: 0.0,
            sigma: 3.0,
        };
        let nuts = Nuts::new(NutsConfig::new().n_samples(10).n_warmup(1000));
        let mut rng = Xoshiro256Plus::seed_from_u64(7);
        let chain = nuts.sample(&model, &mut rng).unwrap();
        let inv_metric = chain.diagnostics.inv_metric[0];
        assert!(2.0 < inv_metric && inv_metric < 20.0);
    }

    #[test]
    fn warmup_tunes_acceptance_toward_target() {
        let config = NutsConfig::new().n_samples(1000).n_warmup(500);
        let mut rng = Xoshiro256Plus::seed_from_u64(99);
        let samples =
            sample_rate(&[5, 3, 2, 6], weekday_prior(), &config, &mut rng)
                .unwrap();
        let accept = samples.diagnostics.mean_accept;
        assert!(0.6 < accept && accept <= 1.0);
        assert_eq!(samples.diagnostics.n_divergent, 0);
    }

    #[test]
    fn zero_warmup_still_samples() {
        let config = NutsConfig::new().n_samples(50).n_warmup(0);
        let mut rng = Xoshiro256Plus::seed_from_u64(3);
        let samples =
            sample_rate(&[1, 0, 2, 1], weekday_prior(), &config, &mut rng)
                .unwrap();
        assert_eq!(samples.len(), 50);
    }

    #[test]
    fn zero_samples_is_an_error() {
        let config = NutsConfig::new().n_samples(0);
        let mut rng = Xoshiro256Plus::seed_from_u64(3);
        let res = sample_rate(&[5, 3], weekday_prior(), &config, &mut rng);
        assert_eq!(res.unwrap_err(), SampleError::ZeroSamples);
    }

    #[test]
    fn empty_observations_is_an_error() {
        let config = NutsConfig::new();
        let mut rng = Xoshiro256Plus::seed_from_u64(3);
        let res = sample_rate(&[], weekday_prior(), &config, &mut rng);
        assert_eq!(res.unwrap_err(), SampleError::NoObservations);
    }

    #[test]
    fn non_finite_density_fails_to_initialize() {
        let nuts = Nuts::new(NutsConfig::new().n_samples(10).n_warmup(10));
        let mut rng = Xoshiro256Plus::seed_from_u64(3);
        let res = nuts.sample(&Broken, &mut rng);
        assert_eq!(
            res.unwrap_err(),
            SampleError::InitializationFailed {
                attempts: MAX_INIT_ATTEMPTS
            }
        );
    }

    #[test]
    fn persistent_divergence_is_reported() {
        /// Finite only at the origin's neighborhood so every step off it
        /// diverges
        struct Cliff;

        impl Model for Cliff {
            fn n_dims(&self) -> usize {
                1
            }

            fn ln_f(&self, x: &[f64]) -> f64 {
                if x[0].abs() < 1E-300 {
                    0.0
                } else {
                    f64::NEG_INFINITY
                }
            }

            fn grad_ln_f(&self, _x: &[f64]) -> Vec<f64> {
                vec![0.0]
            }

            fn draw_init<R: Rng>(&self, _rng: &mut R) -> Vec<f64> {
                vec![0.0]
            }
        }

        let config = NutsConfig::new()
            .n_samples(10)
            .n_warmup(10)
            .max_divergences_in_a_row(5);
        let mut rng = Xoshiro256Plus::seed_from_u64(3);
        let res = Nuts::new(config).sample(&Cliff, &mut rng);
        assert_eq!(
            res.unwrap_err(),
            SampleError::Diverged {
                transition: 5,
                n_divergent: 6
            }
        );
    }

    #[test]
    fn config_serde_fills_defaults() {
        let config: NutsConfig =
            serde_json::from_str(r#"{"n_samples": 10, "n_warmup": 5}"#)
                .unwrap();
        assert_eq!(config, NutsConfig::new().n_samples(10).n_warmup(5));
    }
}
