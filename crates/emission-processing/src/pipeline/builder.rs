//! Main emissions pipeline.
//!
//! This module provides the core `Pipeline` struct and builder. A pipeline
//! run is a pure function of the input frame and the configuration: it reads
//! no files and writes none.

use super::{PipelineResult, PipelineSummary};
use crate::aggregation::AggregationEngine;
use crate::config::{ConfigValidationError, PipelineConfig};
use crate::error::{EmissionsError, Result, ResultExt};
use crate::imputers::IterativeImputer;
use crate::schema::SchemaNormalizer;
use crate::types::MissingValueCensus;
use polars::prelude::*;
use std::time::Instant;
use tracing::{debug, error, info};

/// The emissions pipeline: normalize, impute, aggregate.
///
/// Use [`Pipeline::builder()`] to create a pipeline with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// use emission_processing::{Pipeline, PipelineConfig};
///
/// let result = Pipeline::builder()
///     .config(PipelineConfig::builder().max_rounds(10).random_seed(7).build()?)
///     .build()?
///     .process(dataframe)?;
///
/// println!("{} yearly rows", result.views.yearly.len());
/// ```
pub struct Pipeline {
    config: PipelineConfig,
    imputer: IterativeImputer,
    engine: AggregationEngine,
}

static_assertions::assert_impl_all!(Pipeline: Send, Sync);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the pipeline over a raw emissions table.
    ///
    /// # Errors
    ///
    /// - `Schema` when a required source column is missing
    /// - `EmptyInput` when the table has no rows
    /// - `InsufficientData` when a numeric field has no observed value
    pub fn process(&self, df: DataFrame) -> Result<PipelineResult> {
        match self.process_internal(df) {
            Ok(result) => Ok(result),
            Err(e) => {
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    fn process_internal(&self, df: DataFrame) -> Result<PipelineResult> {
        let start_time = Instant::now();
        info!("Starting emissions pipeline on {} rows", df.height());

        let table = SchemaNormalizer::normalize(&df)?;
        if table.is_empty() {
            return Err(EmissionsError::empty_input("input table"));
        }
        let missing_before = table.missing_values();
        debug!("Missing before imputation: {:?}", missing_before);

        let outcome = self
            .imputer
            .fit_transform(&table.records)
            .context("Imputing missing values")?;
        let missing_after = MissingValueCensus::of_imputed(&outcome.records);

        let views = self
            .engine
            .compute_all(&outcome.records)
            .context("Computing derived views")?;

        let summary = PipelineSummary {
            rows: outcome.records.len(),
            duration_ms: start_time.elapsed().as_millis() as u64,
            missing_before,
            missing_after,
            date_warnings: table.date_warnings,
            blank_countries: table.blank_countries,
            imputation: outcome.stats,
        };

        info!(
            "Pipeline finished in {} ms: {} rows, {} values imputed",
            summary.duration_ms,
            summary.rows,
            summary.imputation.total_imputed()
        );

        Ok(PipelineResult {
            records: outcome.records,
            views,
            summary,
        })
    }
}

/// Builder for creating a [`Pipeline`] instance.
///
/// Use [`Pipeline::builder()`] to get started.
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<PipelineConfig>,
}

impl PipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<Pipeline, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(Pipeline {
            imputer: IterativeImputer::new(config.imputer.clone()),
            engine: AggregationEngine::new(config.top_n),
            config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_frame() -> DataFrame {
        df![
            "Country" => ["A", "A", "A", "B"],
            "Region" => [Some("Europe"), Some("Europe"), Some("Europe"), None],
            "Date" => ["01-01-2019", "01-01-2020", "01-01-2021", "01-01-2021"],
            "Kilotons of Co2" => [Some(100.0), None, Some(300.0), Some(80.0)],
            "Metric Tons Per Capita" => [1.0, 2.0, 3.0, 0.5],
        ]
        .unwrap()
    }

    #[test]
    fn test_pipeline_builder_default() {
        let pipeline = Pipeline::builder().build().unwrap();
        assert_eq!(pipeline.config().top_n, 10);
        assert_eq!(pipeline.config().imputer.random_seed, 42);
    }

    #[test]
    fn test_pipeline_builder_rejects_invalid_config() {
        let config = PipelineConfig {
            top_n: 0,
            ..Default::default()
        };
        assert!(Pipeline::builder().config(config).build().is_err());
    }

    #[test]
    fn test_process_scenario() {
        let result = Pipeline::builder()
            .build()
            .unwrap()
            .process(scenario_frame())
            .unwrap();

        assert_eq!(result.records.len(), 4);
        let imputed = result.records[1].co2_kilotons;
        assert!(imputed.is_finite());

        assert_eq!(result.views.yearly[0].year, 2019);
        assert_eq!(result.views.yearly[0].total_co2_kilotons, 100.0);

        // Country B has no region: kept in country views, not in regional ones
        assert!(result.views.regional_yearly.iter().all(|r| r.region == "Europe"));
        assert!(result.views.top_countries.iter().any(|c| c.country == "B"));

        assert_eq!(result.summary.missing_before.co2_kilotons, 1);
        assert_eq!(result.summary.missing_after.numeric_total(), 0);
        assert_eq!(result.summary.imputation.total_imputed(), 1);
    }

    #[test]
    fn test_process_reports_schema_error() {
        let df = scenario_frame().drop("Date").unwrap();
        let err = Pipeline::builder().build().unwrap().process(df).unwrap_err();
        assert_eq!(err.error_code(), "SCHEMA_ERROR");
    }

    #[test]
    fn test_process_empty_table() {
        let df = scenario_frame().head(Some(0));
        let err = Pipeline::builder().build().unwrap().process(df).unwrap_err();
        assert_eq!(err.error_code(), "EMPTY_INPUT");
    }

    #[test]
    fn test_process_field_without_observations() {
        let df = df![
            "Country" => ["A", "B"],
            "Region" => ["Europe", "Asia"],
            "Date" => ["01-01-2019", "01-01-2019"],
            "Kilotons of Co2" => [None::<f64>, None],
            "Metric Tons Per Capita" => [1.0, 2.0],
        ]
        .unwrap();
        let err = Pipeline::builder().build().unwrap().process(df).unwrap_err();
        assert_eq!(err.error_code(), "INSUFFICIENT_DATA");
    }

    #[test]
    fn test_cleaned_frame_has_canonical_columns() {
        let result = Pipeline::builder()
            .build()
            .unwrap()
            .process(scenario_frame())
            .unwrap();
        let df = result.cleaned_frame().unwrap();
        assert_eq!(df.shape(), (4, 6));
        assert_eq!(df.column("co2_kilotons").unwrap().null_count(), 0);
    }
}
