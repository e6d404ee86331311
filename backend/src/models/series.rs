//! One-dimensional numeric series indexed by position.

use serde::{Deserialize, Serialize};

use crate::error::{DashboardError, Result};

/// A numeric column reinterpreted as an ordered sequence.
///
/// Row order is temporal order; `None` marks a missing observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    pub values: Vec<Option<f64>>,
    /// Position of the first element in the source column.
    #[serde(default)]
    pub offset: usize,
}

impl Series {
    pub fn new(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            values,
            offset: 0,
        }
    }

    /// Series with every observation present.
    pub fn from_values(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self::new(name, values.into_iter().map(Some).collect())
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn observed_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    /// Row positions covered by this series in the source column.
    pub fn positions(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.values.len()
    }

    /// Dense copy with gaps filled by linear interpolation.
    ///
    /// Leading and trailing gaps take the nearest observed value. A series
    /// without any observation cannot be filled.
    pub fn interpolated(&self) -> Result<Vec<f64>> {
        let observed: Vec<(usize, f64)> = self
            .values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.filter(|x| x.is_finite()).map(|x| (i, x)))
            .collect();

        let (first_idx, first_val) = *observed.first().ok_or(DashboardError::InsufficientData {
            needed: 1,
            got: 0,
        })?;
        let (last_idx, last_val) = *observed.last().unwrap_or(&(first_idx, first_val));

        let mut dense = vec![0.0; self.values.len()];
        for slot in dense.iter_mut().take(first_idx + 1) {
            *slot = first_val;
        }
        for slot in dense.iter_mut().skip(last_idx) {
            *slot = last_val;
        }
        for pair in observed.windows(2) {
            let (i0, v0) = pair[0];
            let (i1, v1) = pair[1];
            let span = (i1 - i0) as f64;
            for (step, slot) in dense[i0..=i1].iter_mut().enumerate() {
                *slot = v0 + (v1 - v0) * step as f64 / span;
            }
        }

        Ok(dense)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolated_fills_interior_gaps() {
        let series = Series::new("y", vec![Some(1.0), None, None, Some(4.0)]);
        assert_eq!(series.interpolated().unwrap(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_interpolated_fills_edges_with_nearest() {
        let series = Series::new("y", vec![None, Some(2.0), None, Some(6.0), None]);
        assert_eq!(
            series.interpolated().unwrap(),
            vec![2.0, 2.0, 4.0, 6.0, 6.0]
        );
    }

    #[test]
    fn test_interpolated_requires_an_observation() {
        let series = Series::new("y", vec![None, None]);
        assert!(matches!(
            series.interpolated(),
            Err(DashboardError::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_positions_follow_offset() {
        let series = Series::from_values("y", vec![1.0, 2.0]).with_offset(3);
        assert_eq!(series.positions(), 3..5);
        assert_eq!(series.observed_count(), 2);
    }
}
