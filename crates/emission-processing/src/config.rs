//! Configuration types for the emissions pipeline.
//!
//! This module provides configuration options using the builder pattern
//! for flexible and ergonomic pipeline setup.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default round limit of the iterative imputer.
pub const DEFAULT_MAX_ROUNDS: usize = 20;

/// Default seed of the imputer's random number generator.
pub const DEFAULT_RANDOM_SEED: u64 = 42;

/// Default convergence tolerance (scaled by the largest observed magnitude).
pub const DEFAULT_TOLERANCE: f64 = 1e-3;

/// Default number of countries kept by the per-capita ranking.
pub const DEFAULT_TOP_N: usize = 10;

/// How absent values are seeded before the first regression round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InitialStrategy {
    /// Use the mean of observed values
    #[default]
    Mean,
    /// Use the median of observed values
    Median,
}

/// Order in which fields are visited within one imputation round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ImputationOrder {
    /// Fewest missing values first
    #[default]
    Ascending,
    /// Most missing values first
    Descending,
    /// Canonical column order
    Roman,
    /// Seeded shuffle, redrawn every round
    Random,
}

/// Settings of the iterative regression imputer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImputerConfig {
    /// Maximum number of imputation rounds.
    /// Default: 20
    pub max_rounds: usize,

    /// Seed for every random draw made by the imputer.
    /// Default: 42
    pub random_seed: u64,

    /// Convergence tolerance, relative to the largest observed magnitude.
    /// Default: 1e-3
    pub tolerance: f64,

    /// Initial fill used before the first round.
    /// Default: Mean
    pub initial_strategy: InitialStrategy,

    /// Visiting order of the fields within a round.
    /// Default: Ascending
    pub imputation_order: ImputationOrder,

    /// Draw imputed values from the predictive distribution instead of
    /// using its mean.
    /// Default: false
    pub sample_posterior: bool,
}

impl ImputerConfig {
    /// Validate the round limit and tolerance.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.max_rounds == 0 {
            return Err(ConfigValidationError::InvalidMaxRounds(self.max_rounds));
        }

        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(ConfigValidationError::InvalidTolerance(self.tolerance));
        }

        Ok(())
    }
}

impl Default for ImputerConfig {
    fn default() -> Self {
        Self {
            max_rounds: DEFAULT_MAX_ROUNDS,
            random_seed: DEFAULT_RANDOM_SEED,
            tolerance: DEFAULT_TOLERANCE,
            initial_strategy: InitialStrategy::default(),
            imputation_order: ImputationOrder::default(),
            sample_posterior: false,
        }
    }
}

/// Configuration for the emissions pipeline.
///
/// Use [`PipelineConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use emission_processing::config::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .max_rounds(10)
///     .random_seed(7)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Imputer settings.
    pub imputer: ImputerConfig,

    /// Number of countries kept by the per-capita ranking.
    /// Default: 10
    pub top_n: usize,

    /// Output directory for the cleaned table, chart data and reports.
    /// Default: "outputs"
    pub output_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            imputer: ImputerConfig::default(),
            top_n: DEFAULT_TOP_N,
            output_dir: PathBuf::from("outputs"),
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        self.imputer.validate()?;

        if self.top_n == 0 {
            return Err(ConfigValidationError::InvalidTopN(self.top_n));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid round limit: {0} (must be at least 1)")]
    InvalidMaxRounds(usize),

    #[error("Invalid tolerance: {0} (must be finite and greater than 0.0)")]
    InvalidTolerance(f64),

    #[error("Invalid ranking size: {0} (must be at least 1)")]
    InvalidTopN(usize),
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    max_rounds: Option<usize>,
    random_seed: Option<u64>,
    tolerance: Option<f64>,
    initial_strategy: Option<InitialStrategy>,
    imputation_order: Option<ImputationOrder>,
    sample_posterior: Option<bool>,
    top_n: Option<usize>,
    output_dir: Option<PathBuf>,
}

impl PipelineConfigBuilder {
    /// Set the maximum number of imputation rounds.
    pub fn max_rounds(mut self, rounds: usize) -> Self {
        self.max_rounds = Some(rounds);
        self
    }

    /// Set the seed used by the imputer.
    pub fn random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Set the convergence tolerance.
    ///
    /// The imputer stops once the largest change between two rounds drops
    /// below `tolerance * max(|observed value|)`.
    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    /// Set the initial fill strategy.
    pub fn initial_strategy(mut self, strategy: InitialStrategy) -> Self {
        self.initial_strategy = Some(strategy);
        self
    }

    /// Set the order fields are visited within a round.
    pub fn imputation_order(mut self, order: ImputationOrder) -> Self {
        self.imputation_order = Some(order);
        self
    }

    /// Enable or disable sampling from the predictive distribution.
    pub fn sample_posterior(mut self, sample: bool) -> Self {
        self.sample_posterior = Some(sample);
        self
    }

    /// Set how many countries the per-capita ranking keeps.
    pub fn top_n(mut self, n: usize) -> Self {
        self.top_n = Some(n);
        self
    }

    /// Set the output directory.
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if validation fails.
    pub fn build(self) -> Result<PipelineConfig, ConfigValidationError> {
        let config = PipelineConfig {
            imputer: ImputerConfig {
                max_rounds: self.max_rounds.unwrap_or(DEFAULT_MAX_ROUNDS),
                random_seed: self.random_seed.unwrap_or(DEFAULT_RANDOM_SEED),
                tolerance: self.tolerance.unwrap_or(DEFAULT_TOLERANCE),
                initial_strategy: self.initial_strategy.unwrap_or_default(),
                imputation_order: self.imputation_order.unwrap_or_default(),
                sample_posterior: self.sample_posterior.unwrap_or(false),
            },
            top_n: self.top_n.unwrap_or(DEFAULT_TOP_N),
            output_dir: self
                .output_dir
                .unwrap_or_else(|| PathBuf::from("outputs")),
        };

        config.validate()?;
        Ok(config)
    }
}
