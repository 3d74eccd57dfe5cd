/// The mean of a vector of f64
pub fn mean(xs: &[f64]) -> f64 {
    let n: f64 = xs.len() as f64;
    xs.iter().fold(0.0, |acc, x| x + acc) / n
}

fn sum_sq_dev(xs: &[f64]) -> f64 {
    let m = mean(xs);
    xs.iter().fold(0.0, |acc, x| (x - m).mul_add(x - m, acc))
}

/// The population variance of a vector of f64
pub fn var(xs: &[f64]) -> f64 {
    let n: f64 = xs.len() as f64;
    sum_sq_dev(xs) / n
}

/// The unbiased sample variance of a vector of f64 (divisor `n - 1`).
///
/// Returns `NaN` for fewer than two values.
pub fn sample_var(xs: &[f64]) -> f64 {
    if xs.len() < 2 {
        return f64::NAN;
    }
    let n: f64 = xs.len() as f64;
    sum_sq_dev(xs) / (n - 1.0)
}

/// The population standard deviation of a vector of f64
pub fn std(xs: &[f64]) -> f64 {
    let v: f64 = var(xs);
    v.sqrt()
}

/// Quantile of already sorted data by linear interpolation between order
/// statistics (the R-7 rule, which is also numpy's default).
///
/// For `n` values and probability `p` the fractional rank is
/// `h = (n - 1) * p`; the result is `x[floor(h)] + frac(h) * (x[floor(h) + 1]
/// - x[floor(h)])`.
///
/// # Panics
/// Panics if `xs_sorted` is empty or `p` is outside [0, 1].
pub fn quantile_sorted(xs_sorted: &[f64], p: f64) -> f64 {
    assert!(!xs_sorted.is_empty(), "Cannot compute quantile of empty slice");
    assert!(
        (0.0..=1.0).contains(&p),
        "Quantile probability must be in [0, 1]"
    );

    let n = xs_sorted.len();
    if n == 1 {
        return xs_sorted[0];
    }

    let h = (n - 1) as f64 * p;
    let ix = h.floor() as usize;
    if ix >= n - 1 {
        return xs_sorted[n - 1];
    }

    let frac = h - h.floor();
    let lower = xs_sorted[ix];
    frac.mul_add(xs_sorted[ix + 1] - lower, lower)
}
