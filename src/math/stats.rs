//! Small windowed statistics over price series.
//!
//! All helpers degrade to 0.0 on degenerate inputs (empty or length-1
//! windows, zero denominators) instead of returning NaN/Infinity, so the
//! feature vector stays finite for every valid price history.

/// Arithmetic mean; 0.0 for an empty slice.
pub fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// Population standard deviation (divide by `n`, not `n - 1`).
///
/// Population rather than sample so the result is defined (0.0) for a
/// single observation and the computation is fully deterministic.
pub fn population_std(xs: &[f64]) -> f64 {
    if xs.len() < 2 {
        return 0.0;
    }
    let m = mean(xs);
    let variance = xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / xs.len() as f64;
    variance.sqrt()
}

/// Percentage change from `base` to `current`, as a fraction.
/// 0.0 when the base is zero.
pub fn pct_change(current: f64, base: f64) -> f64 {
    if base == 0.0 {
        return 0.0;
    }
    (current - base) / base
}

/// The value `periods` back from the end of the series, clamped to the
/// oldest available entry when the history is shorter than the lag.
///
/// Panics on an empty slice; callers validate non-emptiness first.
pub fn lag(xs: &[f64], periods: usize) -> f64 {
    let idx = xs.len().checked_sub(periods).unwrap_or(0);
    xs[idx]
}

/// The trailing window of at most `window` entries.
pub fn tail(xs: &[f64], window: usize) -> &[f64] {
    let start = xs.len().saturating_sub(window);
    &xs[start..]
}
