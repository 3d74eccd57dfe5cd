//! Warm-up adaptation: dual averaging of the step size and windowed
//! estimation of a diagonal metric.

const DA_GAMMA: f64 = 0.05;
const DA_T0: f64 = 10.0;
const DA_KAPPA: f64 = 0.75;

/// Nesterov dual averaging of `ln(step_size)` toward a target acceptance
/// statistic (Hoffman & Gelman 2014, algorithm 5).
#[derive(Clone, Debug)]
pub struct DualAveraging {
    mu: f64,
    target: f64,
    log_eps: f64,
    log_eps_bar: f64,
    h_bar: f64,
    counter: f64,
}

impl DualAveraging {
    pub fn new(step_size: f64, target: f64) -> Self {
        Self {
            mu: (10.0 * step_size).ln(),
            target,
            log_eps: step_size.ln(),
            log_eps_bar: 0.0,
            h_bar: 0.0,
            counter: 0.0,
        }
    }

    /// Feed the acceptance statistic of the last transition
    pub fn update(&mut self, accept_stat: f64) {
        self.counter += 1.0;
        let eta = (self.counter + DA_T0).recip();
        self.h_bar = (1.0 - eta).mul_add(self.h_bar, eta * (self.target - accept_stat));
        self.log_eps = (self.counter.sqrt() / DA_GAMMA).mul_add(-self.h_bar, self.mu);
        let x_eta = self.counter.powf(-DA_KAPPA);
        self.log_eps_bar = x_eta.mul_add(self.log_eps, (1.0 - x_eta) * self.log_eps_bar);
    }

    /// Step size to use for the next warm-up transition
    pub fn step_size(&self) -> f64 {
        self.log_eps.exp()
    }

    /// Averaged step size to use once warm-up is over
    pub fn final_step_size(&self) -> f64 {
        if self.counter == 0.0 {
            self.step_size()
        } else {
            self.log_eps_bar.exp()
        }
    }
}

/// Welford accumulator of per-coordinate variance
#[derive(Clone, Debug)]
pub struct RunningVariance {
    n: usize,
    mean: Vec<f64>,
    m2: Vec<f64>,
}

impl RunningVariance {
    pub fn new(n_dims: usize) -> Self {
        Self {
            n: 0,
            mean: vec![0.0; n_dims],
            m2: vec![0.0; n_dims],
        }
    }

    pub fn push(&mut self, x: &[f64]) {
        self.n += 1;
        let nf = self.n as f64;
        self.mean
            .iter_mut()
            .zip(self.m2.iter_mut())
            .zip(x.iter())
            .for_each(|((mean, m2), &xi)| {
                let delta = xi - *mean;
                *mean += delta / nf;
                *m2 = delta.mul_add(xi - *mean, *m2);
            });
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Sample variance shrunk toward `1e-3`, the regularization Stan applies
    /// to windowed metric estimates.
    pub fn regularized_variance(&self) -> Vec<f64> {
        let nf = self.n as f64;
        let shrink = 5.0 / (nf + 5.0);
        self.m2
            .iter()
            .map(|&m2| {
                let var = if self.n > 1 { m2 / (nf - 1.0) } else { 1.0 };
                (1.0 - shrink).mul_add(var, 1E-3 * shrink)
            })
            .collect()
    }

    pub fn reset(&mut self) {
        self.n = 0;
        self.mean.iter_mut().for_each(|x| *x = 0.0);
        self.m2.iter_mut().for_each(|x| *x = 0.0);
    }
}

const INIT_BUFFER: usize = 75;
const TERM_BUFFER: usize = 50;
const BASE_WINDOW: usize = 25;

/// Which warm-up iterations feed the metric estimate, and where each
/// estimation window closes.
///
/// Warm-up is split into a fast initial buffer, a run of doubling slow
/// windows, and a fast terminal buffer. Short warm-ups scale the three
/// parts to 15% / 75% / 10%. Below 20 iterations only the step size is
/// adapted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WindowSchedule {
    start: usize,
    end: usize,
    window_ends: Vec<usize>,
}

impl WindowSchedule {
    pub fn new(n_warmup: usize) -> Self {
        if n_warmup < 20 {
            return Self {
                start: 0,
                end: 0,
                window_ends: Vec::new(),
            };
        }

        let (init, term, base) =
            if INIT_BUFFER + TERM_BUFFER + BASE_WINDOW > n_warmup {
                let init = (0.15 * n_warmup as f64) as usize;
                let term = (0.1 * n_warmup as f64) as usize;
                (init, term, n_warmup - init - term)
            } else {
                (INIT_BUFFER, TERM_BUFFER, BASE_WINDOW)
            };

        let end = n_warmup - term;
        let mut window_ends = Vec::new();
        let mut window_start = init;
        let mut size = base;
        loop {
            let window_end = window_start + size;
            if window_end + 2 * size > end {
                window_ends.push(end);
                break;
            }
            window_ends.push(window_end);
            window_start = window_end;
            size *= 2;
        }

        Self {
            start: init,
            end,
            window_ends,
        }
    }

    /// Whether the draw of warm-up iteration `ix` is used for the metric
    pub fn in_window(&self, ix: usize) -> bool {
        self.start <= ix && ix < self.end
    }

    /// Whether a window closes once `n_done` warm-up iterations are done
    pub fn closes_window(&self, n_done: usize) -> bool {
        self.window_ends.contains(&n_done)
    }

    pub fn window_ends(&self) -> &[usize] {
        &self.window_ends
    }
}
