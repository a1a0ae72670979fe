//! Order statistics shared by the estimators.

/// Partially reorder `values` and return its `k`-th smallest element.
///
/// Runs in expected linear time. After the call, `values[..k]` holds elements
/// that are not greater than the result and `values[k + 1..]` elements that are
/// not smaller; neither side is sorted. NaN sorts above every number.
///
/// # Panics
/// If `k >= values.len()`.
pub fn select_k(values: &mut [f64], k: usize) -> f64 {
    let (_, kth, _) = values.select_nth_unstable_by(k, f64::total_cmp);
    *kth
}

/// Rank of the generalized median at `fraction` in a set of `n` values:
/// `round(n * fraction)`, clamped to the last valid index.
///
/// `n` must be at least 1.
pub fn quantile_rank(n: usize, fraction: f64) -> usize {
    debug_assert!(n > 0);
    ((n as f64 * fraction).round() as usize).min(n - 1)
}

/// Mean and population standard deviation of `values`.
///
/// Returns `(NaN, NaN)` for an empty slice.
pub fn mean_stdev(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    (mean, var.sqrt())
}
