//! Leapfrog integration and recursive trajectory doubling.
use rand::Rng;

use crate::model::Model;
use shoprate_consts::DIVERGENCE_THRESHOLD;

/// A position with its cached log density and gradient
#[derive(Clone, Debug)]
pub struct Point {
    pub x: Vec<f64>,
    pub grad: Vec<f64>,
    pub ln_f: f64,
}

impl Point {
    pub fn new<M: Model>(model: &M, x: Vec<f64>) -> Self {
        let grad = model.grad_ln_f(&x);
        let ln_f = model.ln_f(&x);
        Self { x, grad, ln_f }
    }

    pub fn is_finite(&self) -> bool {
        self.ln_f.is_finite() && self.grad.iter().all(|g| g.is_finite())
    }
}

/// Kinetic energy of momentum `r` under a diagonal inverse metric
pub fn kinetic(r: &[f64], inv_metric: &[f64]) -> f64 {
    0.5 * r
        .iter()
        .zip(inv_metric)
        .fold(0.0, |acc, (ri, mi)| (ri * ri).mul_add(*mi, acc))
}

/// Log joint density of a phase space point; `NaN` becomes `-inf`
pub fn ln_joint(point: &Point, r: &[f64], inv_metric: &[f64]) -> f64 {
    let h = point.ln_f - kinetic(r, inv_metric);
    if h.is_nan() {
        f64::NEG_INFINITY
    } else {
        h
    }
}

/// One leapfrog step of size `eps` (negative to integrate backward)
pub fn leapfrog<M: Model>(
    model: &M,
    point: &Point,
    r: &[f64],
    eps: f64,
    inv_metric: &[f64],
) -> (Point, Vec<f64>) {
    let r_half: Vec<f64> = r
        .iter()
        .zip(point.grad.iter())
        .map(|(ri, gi)| (0.5 * eps).mul_add(*gi, *ri))
        .collect();

    let x: Vec<f64> = point
        .x
        .iter()
        .zip(r_half.iter().zip(inv_metric))
        .map(|(xi, (ri, mi))| (eps * mi).mul_add(*ri, *xi))
        .collect();

    let next = Point::new(model, x);
    let r_next = r_half
        .iter()
        .zip(next.grad.iter())
        .map(|(ri, gi)| (0.5 * eps).mul_add(*gi, *ri))
        .collect();

    (next, r_next)
}

/// `true` while the trajectory between the two ends has not started to turn
/// back on itself
pub fn no_u_turn(
    minus: &Point,
    plus: &Point,
    r_minus: &[f64],
    r_plus: &[f64],
    inv_metric: &[f64],
) -> bool {
    let (dot_minus, dot_plus) = plus
        .x
        .iter()
        .zip(minus.x.iter())
        .zip(r_minus.iter().zip(r_plus.iter()))
        .zip(inv_metric)
        .fold((0.0, 0.0), |(dm, dp), (((xp, xm), (rm, rp)), mi)| {
            let dx = xp - xm;
            ((dx * mi).mul_add(*rm, dm), (dx * mi).mul_add(*rp, dp))
        });
    dot_minus >= 0.0 && dot_plus >= 0.0
}

/// A balanced subtree of the trajectory
#[derive(Clone, Debug)]
pub struct Tree {
    pub minus: Point,
    pub r_minus: Vec<f64>,
    pub plus: Point,
    pub r_plus: Vec<f64>,
    pub proposal: Point,
    /// Number of points inside the slice
    pub n_valid: usize,
    pub keep_going: bool,
    pub sum_accept: f64,
    pub n_steps: usize,
    pub diverged: bool,
}

/// Fixed inputs shared by every node of one transition's trajectory
pub struct Trajectory<'a, M: Model> {
    pub model: &'a M,
    pub inv_metric: &'a [f64],
    pub eps: f64,
    pub log_u: f64,
    pub joint_0: f64,
}

impl<'a, M: Model> Trajectory<'a, M> {
    /// Build a subtree of `2^depth` leapfrog steps starting from `(point, r)`
    /// in `direction` (+1 or -1).
    pub fn build_tree<R: Rng>(
        &self,
        point: &Point,
        r: &[f64],
        direction: f64,
        depth: usize,
        rng: &mut R,
    ) -> Tree {
        if depth == 0 {
            return self.leaf(point, r, direction);
        }

        let mut tree = self.build_tree(point, r, direction, depth - 1, rng);
        if !tree.keep_going {
            return tree;
        }

        let other = if direction < 0.0 {
            self.build_tree(&tree.minus, &tree.r_minus, direction, depth - 1, rng)
        } else {
            self.build_tree(&tree.plus, &tree.r_plus, direction, depth - 1, rng)
        };

        let Tree {
            minus,
            r_minus,
            plus,
            r_plus,
            proposal,
            n_valid,
            keep_going,
            sum_accept,
            n_steps,
            diverged,
        } = other;

        let total = tree.n_valid + n_valid;
        if total > 0 && rng.gen::<f64>() < n_valid as f64 / total as f64 {
            tree.proposal = proposal;
        }

        if direction < 0.0 {
            tree.minus = minus;
            tree.r_minus = r_minus;
        } else {
            tree.plus = plus;
            tree.r_plus = r_plus;
        }

        tree.keep_going = keep_going
            && no_u_turn(
                &tree.minus,
                &tree.plus,
                &tree.r_minus,
                &tree.r_plus,
                self.inv_metric,
            );
        tree.n_valid = total;
        tree.sum_accept += sum_accept;
        tree.n_steps += n_steps;
        tree.diverged |= diverged;
        tree
    }

    fn leaf(&self, point: &Point, r: &[f64], direction: f64) -> Tree {
        let (next, r_next) = leapfrog(
            self.model,
            point,
            r,
            direction * self.eps,
            self.inv_metric,
        );
        let joint = ln_joint(&next, &r_next, self.inv_metric);
        let diverged = !(self.log_u < DIVERGENCE_THRESHOLD + joint);
        let accept = (joint - self.joint_0).exp().min(1.0);

        Tree {
            minus: next.clone(),
            r_minus: r_next.clone(),
            plus: next.clone(),
            r_plus: r_next,
            proposal: next,
            n_valid: usize::from(self.log_u <= joint),
            keep_going: !diverged,
            sum_accept: if accept.is_nan() { 0.0 } else { accept },
            n_steps: 1,
            diverged,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::*;

    /// Standard normal in `n` dims
    struct StdNormal(usize);

    impl Model for StdNormal {
        fn n_dims(&self) -> usize {
            self.0
        }

        fn ln_f(&self, x: &[f64]) -> f64 {
            -0.5 * x.iter().map(|xi| xi * xi).sum::<f64>()
        }

        fn grad_ln_f(&self, x: &[f64]) -> Vec<f64> {
            x.iter().map(|xi| -xi).collect()
        }

        fn draw_init<R: Rng>(&self, _rng: &mut R) -> Vec<f64> {
            vec![0.0; self.0]
        }
    }

    #[test]
    fn leapfrog_is_reversible() {
        let model = StdNormal(2);
        let inv_metric = [1.0, 0.5];
        let start = Point::new(&model, vec![0.3, -1.2]);
        let r = vec![0.7, 0.1];

        let (mid, r_mid) = leapfrog(&model, &start, &r, 0.1, &inv_metric);
        let (back, r_back) = leapfrog(&model, &mid, &r_mid, -0.1, &inv_metric);

        for (a, b) in back.x.iter().zip(start.x.iter()) {
            assert_relative_eq!(a, b, epsilon = 1E-12);
        }
        for (a, b) in r_back.iter().zip(r.iter()) {
            assert_relative_eq!(a, b, epsilon = 1E-12);
        }
    }

    #[test]
    fn leapfrog_nearly_conserves_energy() {
        let model = StdNormal(1);
        let inv_metric = [1.0];
        let start = Point::new(&model, vec![1.0]);
        let r = vec![0.5];
        let h0 = ln_joint(&start, &r, &inv_metric);

        let (mut p, mut r) = (start, r);
        for _ in 0..100 {
            let (p_next, r_next) = leapfrog(&model, &p, &r, 0.05, &inv_metric);
            p = p_next;
            r = r_next;
        }
        assert_relative_eq!(ln_joint(&p, &r, &inv_metric), h0, epsilon = 1E-2);
    }

    #[test]
    fn kinetic_uses_inverse_metric() {
        assert_relative_eq!(kinetic(&[2.0, 1.0], &[0.5, 2.0]), 2.0);
    }

    #[test]
    fn u_turn_detected_when_momenta_oppose() {
        let model = StdNormal(1);
        let minus = Point::new(&model, vec![-1.0]);
        let plus = Point::new(&model, vec![1.0]);
        assert!(no_u_turn(&minus, &plus, &[1.0], &[1.0], &[1.0]));
        assert!(!no_u_turn(&minus, &plus, &[1.0], &[-1.0], &[1.0]));
    }

    #[test]
    fn tree_of_depth_d_takes_2_pow_d_steps() {
        let model = StdNormal(1);
        let inv_metric = [1.0];
        let start = Point::new(&model, vec![0.0]);
        let r = vec![1.0];
        let joint_0 = ln_joint(&start, &r, &inv_metric);
        let traj = Trajectory {
            model: &model,
            inv_metric: &inv_metric,
            eps: 0.01,
            log_u: joint_0 - 1.0,
            joint_0,
        };

        let mut rng = rand::thread_rng();
        let tree = traj.build_tree(&start, &r, 1.0, 3, &mut rng);
        assert!(tree.keep_going);
        assert!(!tree.diverged);
        assert_eq!(tree.n_steps, 8);
        assert_eq!(tree.n_valid, 8);
        assert!(tree.plus.x[0] > tree.minus.x[0]);
    }

    #[test]
    fn huge_step_diverges() {
        let model = StdNormal(1);
        let inv_metric = [1.0];
        let start = Point::new(&model, vec![0.0]);
        let r = vec![1.0];
        let joint_0 = ln_joint(&start, &r, &inv_metric);
        let traj = Trajectory {
            model: &model,
            inv_metric: &inv_metric,
            eps: 1E4,
            log_u: joint_0 - 1.0,
            joint_0,
        };

        let mut rng = rand::thread_rng();
        let tree = traj.build_tree(&start, &r, 1.0, 0, &mut rng);
        assert!(tree.diverged);
        assert!(!tree.keep_going);
        assert_eq!(tree.n_valid, 0);
    }
}
