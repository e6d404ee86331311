//! Temporal train/test split.
//!
//! The split never shuffles: the training part is the leading block of the
//! series and the test part the trailing block, so forecasting always looks
//! forward in time.

use crate::error::{DashboardError, Result};
use crate::models::Series;

/// Share of observations held out for testing.
pub const DEFAULT_TEST_FRACTION: f64 = 0.25;

/// Number of test observations for a series of `len` elements.
///
/// `ceil(len * DEFAULT_TEST_FRACTION)`, kept within `1..len` so both parts are
/// non-empty.
pub fn test_size(len: usize) -> usize {
    let n_test = (len as f64 * DEFAULT_TEST_FRACTION).ceil() as usize;
    n_test.clamp(1, len.saturating_sub(1).max(1))
}

/// Split `series` into a training prefix and a test suffix.
///
/// Fails with `InsufficientData` when fewer than two observations exist.
pub fn split(series: &Series) -> Result<(Series, Series)> {
    let len = series.len();
    if len < 2 {
        return Err(DashboardError::InsufficientData { needed: 2, got: len });
    }

    let n_train = len - test_size(len);
    let (head, tail) = series.values.split_at(n_train);

    let train = Series::new(series.name.clone(), head.to_vec()).with_offset(series.offset);
    let test = Series::new(series.name.clone(), tail.to_vec()).with_offset(series.offset + n_train);

    Ok((train, test))
}
