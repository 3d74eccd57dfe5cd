/// Round `x` to `decimals` decimal digits, ties away from zero.
///
/// # Example
///
/// ```rust
/// # use shoprate_utils::round_to;
/// assert_eq!(round_to(3.14159, 2), 3.14);
/// assert_eq!(round_to(2.5, 0), 3.0);
/// ```
pub fn round_to(x: f64, decimals: u32) -> f64 {
    let scale = 10_f64.powi(decimals as i32);
    (x * scale).round() / scale
}

/// The integer bin a value falls in after rounding to `decimals` digits.
/// Used to group values without comparing floats for equality.
pub fn rounded_key(x: f64, decimals: u32) -> i64 {
    let scale = 10_f64.powi(decimals as i32);
    (x * scale).round() as i64
}
