//! ACF and PACF vectors for the diagnostics chart.
//!
//! Per-lag values come from `anofox_forecast`'s autocorrelation features.

use anofox_forecast::features::autocorrelation::{autocorrelation, partial_autocorrelation};

/// Two-sided 95% band for white noise with `n` observations.
pub fn confidence_band(n: usize) -> f64 {
    if n == 0 {
        return f64::NAN;
    }
    1.96 / (n as f64).sqrt()
}

/// Autocorrelation for lags `0..=max_lag`, clamped to `len - 1`.
pub fn acf(series: &[f64], max_lag: usize) -> Vec<f64> {
    if series.is_empty() {
        return Vec::new();
    }
    let max_lag = max_lag.min(series.len() - 1);
    (0..=max_lag)
        .map(|lag| {
            if lag == 0 {
                1.0
            } else {
                autocorrelation(series, lag)
            }
        })
        .collect()
}

/// Partial autocorrelation for lags `0..=max_lag`, clamped to `len - 1`.
///
/// Lags where the recursion degenerates are reported as zero.
pub fn pacf(series: &[f64], max_lag: usize) -> Vec<f64> {
    if series.is_empty() {
        return Vec::new();
    }
    let max_lag = max_lag.min(series.len() - 1);
    (0..=max_lag)
        .map(|lag| {
            let value = partial_autocorrelation(series, lag);
            if value.is_finite() {
                value
            } else {
                0.0
            }
        })
        .collect()
}
