//! Iterative multivariate regression imputation.
//!
//! Each round visits every incomplete numeric field, regresses it on the
//! other numeric fields with [`BayesianRidge`] and overwrites the cells that
//! were originally absent. Rounds repeat until the imputed values settle or
//! the round limit is reached.

use super::bayesian_ridge::BayesianRidge;
use super::statistical::StatisticalImputer;
use crate::config::{ImputationOrder, ImputerConfig};
use crate::error::{EmissionsError, Result};
use crate::types::{EmissionRecord, ImputedRecord, NumericField};
use nalgebra::{DMatrix, DVector};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// How an imputation run went.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImputationStats {
    /// Rounds actually performed (0 when nothing was absent).
    pub rounds: usize,
    /// Whether the change between the last two rounds fell below tolerance.
    ///
    /// Always `false` when sampling from the posterior, since draws never settle.
    pub converged: bool,
    /// Cells filled per field.
    pub imputed_counts: BTreeMap<NumericField, usize>,
    /// Largest per-row sum of absolute changes in the final round.
    pub final_change: f64,
}

impl ImputationStats {
    pub fn total_imputed(&self) -> usize {
        self.imputed_counts.values().sum()
    }
}

/// Imputed records plus run statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct ImputationOutcome {
    pub records: Vec<ImputedRecord>,
    pub stats: ImputationStats,
}

/// Round-robin Bayesian ridge imputer over the numeric fields.
pub struct IterativeImputer {
    config: ImputerConfig,
    estimator: BayesianRidge,
}

impl IterativeImputer {
    pub fn new(config: ImputerConfig) -> Self {
        Self {
            config,
            estimator: BayesianRidge::default(),
        }
    }

    pub fn config(&self) -> &ImputerConfig {
        &self.config
    }

    /// Fill every absent numeric value.
    ///
    /// Fails with `InsufficientData` when a field has no observed value, which
    /// includes an empty record set.
    pub fn fit_transform(&self, records: &[EmissionRecord]) -> Result<ImputationOutcome> {
        self.config.validate()?;

        let observed: Vec<Vec<Option<f64>>> = NumericField::ALL
            .iter()
            .map(|&field| records.iter().map(|r| r.value(field)).collect())
            .collect();

        let mut filled: Vec<Vec<f64>> = Vec::with_capacity(NumericField::ALL.len());
        for (field, values) in NumericField::ALL.iter().zip(&observed) {
            let column = StatisticalImputer::fill(values, self.config.initial_strategy)
                .ok_or_else(|| EmissionsError::insufficient_data(field.name()))?;
            filled.push(column);
        }

        let missing: Vec<Vec<usize>> = observed
            .iter()
            .map(|values| {
                values
                    .iter()
                    .enumerate()
                    .filter_map(|(row, v)| v.is_none().then_some(row))
                    .collect()
            })
            .collect();

        let mut stats = ImputationStats {
            imputed_counts: NumericField::ALL
                .iter()
                .map(|&field| (field, missing[field.index()].len()))
                .collect(),
            ..Default::default()
        };

        if stats.total_imputed() == 0 {
            debug!("No absent numeric values; imputation skipped");
            stats.converged = true;
            return Ok(ImputationOutcome {
                records: Self::assemble(records, &filled),
                stats,
            });
        }

        let threshold = self.config.tolerance * Self::max_abs_observed(&observed);
        let mut rng = StdRng::seed_from_u64(self.config.random_seed);
        let mut order = self.visiting_order(&missing);

        for round in 1..=self.config.max_rounds {
            if self.config.imputation_order == ImputationOrder::Random {
                order.shuffle(&mut rng);
            }

            let previous = filled.clone();
            for &target in &order {
                self.impute_field(target, &observed, &missing, &mut filled, &mut rng)?;
            }

            let change = Self::max_change(&previous, &filled);
            stats.rounds = round;
            stats.final_change = change;
            debug!("Imputation round {}: change {:.6}", round, change);

            if !self.config.sample_posterior && change < threshold {
                stats.converged = true;
                break;
            }
        }

        if !stats.converged && !self.config.sample_posterior {
            warn!(
                "Imputation did not converge within {} rounds (last change {:.6})",
                self.config.max_rounds, stats.final_change
            );
        }
        info!(
            "Imputed {} values in {} rounds",
            stats.total_imputed(),
            stats.rounds
        );

        Ok(ImputationOutcome {
            records: Self::assemble(records, &filled),
            stats,
        })
    }

    /// Incomplete fields in the configured visiting order.
    ///
    /// For `Random` this is the canonical order, shuffled again every round.
    fn visiting_order(&self, missing: &[Vec<usize>]) -> Vec<NumericField> {
        let mut order: Vec<NumericField> = NumericField::ALL
            .into_iter()
            .filter(|field| !missing[field.index()].is_empty())
            .collect();

        match self.config.imputation_order {
            ImputationOrder::Ascending => order.sort_by_key(|f| missing[f.index()].len()),
            ImputationOrder::Descending => {
                order.sort_by_key(|f| std::cmp::Reverse(missing[f.index()].len()))
            }
            ImputationOrder::Roman | ImputationOrder::Random => {}
        }
        order
    }

    fn impute_field(
        &self,
        target: NumericField,
        observed: &[Vec<Option<f64>>],
        missing: &[Vec<usize>],
        filled: &mut [Vec<f64>],
        rng: &mut StdRng,
    ) -> Result<()> {
        let t = target.index();
        let predictors: Vec<usize> = NumericField::ALL
            .iter()
            .map(|f| f.index())
            .filter(|&i| i != t)
            .collect();

        let train_rows: Vec<usize> = observed[t]
            .iter()
            .enumerate()
            .filter_map(|(row, v)| v.is_some().then_some(row))
            .collect();

        let x = DMatrix::from_fn(train_rows.len(), predictors.len(), |i, j| {
            filled[predictors[j]][train_rows[i]]
        });
        let y = DVector::from_iterator(
            train_rows.len(),
            train_rows.iter().map(|&row| filled[t][row]),
        );
        let model = self.estimator.fit(&x, &y, target.name())?;

        for &row in &missing[t] {
            let features: Vec<f64> = predictors.iter().map(|&p| filled[p][row]).collect();
            let value = if self.config.sample_posterior {
                let (mean, std) = model.predict_with_std(&features);
                match Normal::new(mean, std) {
                    Ok(normal) if std > 0.0 => normal.sample(rng),
                    _ => mean,
                }
            } else {
                model.predict(&features)
            };
            // Emissions are non-negative quantities
            filled[t][row] = value.max(0.0);
        }
        Ok(())
    }

    fn max_abs_observed(observed: &[Vec<Option<f64>>]) -> f64 {
        observed
            .iter()
            .flatten()
            .flatten()
            .fold(0.0_f64, |acc, v| acc.max(v.abs()))
    }

    /// Infinity norm of the round's change: the largest per-row sum of
    /// absolute changes across fields. Observed cells never move.
    fn max_change(previous: &[Vec<f64>], current: &[Vec<f64>]) -> f64 {
        let rows = current.first().map_or(0, Vec::len);
        (0..rows)
            .map(|row| {
                current
                    .iter()
                    .zip(previous)
                    .map(|(cur, prev)| (cur[row] - prev[row]).abs())
                    .sum::<f64>()
            })
            .fold(0.0_f64, f64::max)
    }

    fn assemble(records: &[EmissionRecord], filled: &[Vec<f64>]) -> Vec<ImputedRecord> {
        let kilotons = &filled[NumericField::Co2Kilotons.index()];
        let per_capita = &filled[NumericField::Co2PerCapita.index()];
        records
            .iter()
            .enumerate()
            .map(|(row, r)| ImputedRecord {
                country: r.country.clone(),
                region: r.region.clone(),
                date: r.date,
                year: r.year,
                co2_kilotons: kilotons[row],
                co2_per_capita: per_capita[row],
            })
            .collect()
    }
}
