//! Null-safe arithmetic shared by every detector and benchmark.
//!
//! Nothing in this crate divides with `/` directly; ratios go through
//! [`divide`] so that zero or non-finite inputs collapse to 0 instead of
//! leaking `NaN`/`Infinity` into comparisons or alert text.

/// `n / d` when `d > 0`, otherwise 0. Non-finite inputs or results yield 0.
pub fn divide(numerator: f64, denominator: f64) -> f64 {
    if !(denominator > 0.0) || !numerator.is_finite() || !denominator.is_finite() {
        return 0.0;
    }
    let q = numerator / denominator;
    if q.is_finite() { q } else { 0.0 }
}

/// Relative change of `current` against `prior`, e.g. 0.04 -> 0.2 is 4.0.
pub fn relative_change(current: f64, prior: f64) -> f64 {
    divide(current - prior, prior)
}

/// Arithmetic mean; 0 for an empty sample.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    divide(values.iter().sum::<f64>(), values.len() as f64)
}

/// Population standard deviation (denominator N, not N-1); 0 for an empty sample.
pub fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = divide(
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>(),
        values.len() as f64,
    );
    variance.sqrt()
}

/// z-score of `value` against a baseline, or `None` when the baseline has no spread.
pub fn z_score(value: f64, baseline_mean: f64, baseline_std: f64) -> Option<f64> {
    if !(baseline_std > 0.0) || !baseline_std.is_finite() {
        return None;
    }
    let z = (value - baseline_mean) / baseline_std;
    z.is_finite().then_some(z)
}

/// Coerce a raw summed quantity: absent or non-finite contributes 0.
pub fn coerce(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}
