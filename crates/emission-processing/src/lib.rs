//! CO₂ Emissions Processing Library
//!
//! Cleans a national CO₂ emissions time series and derives the aggregate
//! views used for reporting and visualization.
//!
//! # Overview
//!
//! The pipeline runs three stages, strictly forward:
//!
//! - **Schema Normalization**: maps the raw columns onto the canonical schema
//!   and derives each record's year from its `DD-MM-YYYY` date
//! - **Imputation**: fills absent `co2_kilotons` / `co2_per_capita` values
//!   with round-robin Bayesian ridge regression, seeded for reproducibility
//! - **Aggregation**: yearly and regional totals, a per-capita country
//!   ranking, the Pearson correlation matrix and summary statistics
//!
//! The cleaned table and views are handed to a
//! [`presentation::PresentationAdapter`]; the shipped
//! [`presentation::ChartDataExporter`] writes chart-ready CSV tables.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use emission_processing::{Pipeline, PipelineConfig};
//! use polars::prelude::*;
//!
//! let df = CsvReadOptions::default()
//!     .with_has_header(true)
//!     .try_into_reader_with_file_path(Some("dataset/carbon_emissions.csv".into()))?
//!     .finish()?;
//!
//! let result = Pipeline::builder()
//!     .config(PipelineConfig::builder().random_seed(42).build()?)
//!     .build()?
//!     .process(df)?;
//!
//! for row in &result.views.yearly {
//!     println!("{}: {:.0} kt", row.year, row.total_co2_kilotons);
//! }
//! ```
//!
//! # Configuration
//!
//! Use [`PipelineConfig`] to customize the imputer and the ranking:
//!
//! ```rust,ignore
//! use emission_processing::config::*;
//!
//! let config = PipelineConfig::builder()
//!     .max_rounds(20)                              // Imputation round limit
//!     .tolerance(1e-3)                             // Relative convergence tolerance
//!     .imputation_order(ImputationOrder::Ascending)
//!     .sample_posterior(false)
//!     .top_n(10)                                   // Countries kept by the ranking
//!     .build()?;
//! ```

pub mod aggregation;
pub mod config;
pub mod error;
pub mod frames;
pub mod imputers;
pub mod pipeline;
pub mod presentation;
pub mod reporting;
pub mod schema;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use aggregation::{AggregationEngine, DerivedViews};
pub use config::{
    ConfigValidationError, ImputationOrder, ImputerConfig, InitialStrategy, PipelineConfig,
    PipelineConfigBuilder,
};
pub use error::{EmissionsError, Result as EmissionsResult, ResultExt};
pub use imputers::{BayesianRidge, ImputationOutcome, ImputationStats, IterativeImputer};
pub use pipeline::{Pipeline, PipelineBuilder, PipelineResult, PipelineSummary};
pub use presentation::{ChartDataExporter, ChartKind, ChartManifest, PresentationAdapter};
pub use reporting::{
    CLEANED_FILE_NAME, EmissionsReport, ProcessingSummaryReport, ReportGenerator,
    SUMMARY_FILE_NAME,
};
pub use schema::{DateParseWarning, DateParseWarnings, NormalizedTable, SchemaNormalizer};
pub use types::{
    CorrelationMatrix, CountryAverage, EmissionRecord, FieldSummary, ImputedRecord,
    LatestYearSnapshot, MissingValueCensus, NumericField, RegionYearlyAggregate, YearlyAggregate,
};
pub use utils::{clean_numeric_string, is_error_marker, is_numeric_dtype, parse_numeric_string};
