//! Imputation module for handling missing values.
//!
//! This module provides:
//! - Bayesian ridge regression, the estimator behind each imputation step
//! - Iterative (round-robin) multivariate imputation over the numeric fields
//! - Statistical fills (mean, median) used to seed the first round

mod bayesian_ridge;
mod iterative;
mod statistical;

pub use bayesian_ridge::{BayesianRidge, FittedBayesianRidge};
pub use iterative::{ImputationOutcome, ImputationStats, IterativeImputer};
pub use statistical::StatisticalImputer;
