//! Column statistics used to seed the iterative imputer.
//!
//! Provides the mean and median initial fills applied before the first
//! regression round.

use crate::config::InitialStrategy;

/// Single-value fills computed from the observed entries of a column.
pub struct StatisticalImputer;

impl StatisticalImputer {
    /// Mean of the observed values, `None` when nothing is observed.
    pub fn mean(values: &[Option<f64>]) -> Option<f64> {
        let (sum, count) = values
            .iter()
            .flatten()
            .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
        (count > 0).then(|| sum / count as f64)
    }

    /// Median of the observed values, `None` when nothing is observed.
    pub fn median(values: &[Option<f64>]) -> Option<f64> {
        let mut observed: Vec<f64> = values.iter().flatten().copied().collect();
        if observed.is_empty() {
            return None;
        }
        observed.sort_by(f64::total_cmp);

        let mid = observed.len() / 2;
        if observed.len() % 2 == 0 {
            Some((observed[mid - 1] + observed[mid]) / 2.0)
        } else {
            Some(observed[mid])
        }
    }

    /// Fill value for the given strategy.
    pub fn initial_value(values: &[Option<f64>], strategy: InitialStrategy) -> Option<f64> {
        match strategy {
            InitialStrategy::Mean => Self::mean(values),
            InitialStrategy::Median => Self::median(values),
        }
    }

    /// Replace every absent entry with the strategy's fill value.
    ///
    /// Returns `None` when the column has no observed values.
    pub fn fill(values: &[Option<f64>], strategy: InitialStrategy) -> Option<Vec<f64>> {
        let fill_value = Self::initial_value(values, strategy)?;
        Some(values.iter().map(|v| v.unwrap_or(fill_value)).collect())
    }
}
