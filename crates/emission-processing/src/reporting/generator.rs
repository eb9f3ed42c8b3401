use crate::aggregation::DerivedViews;
use crate::config::PipelineConfig;
use crate::frames;
use crate::imputers::ImputationStats;
use crate::pipeline::PipelineResult;
use crate::schema::DateParseWarning;
use crate::types::MissingValueCensus;
use anyhow::{Context, Result};
use chrono::Local;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

/// File name of the cleaned table inside the output directory.
pub const CLEANED_FILE_NAME: &str = "cleaned_carbon_emissions.csv";

/// File name of the describe-style statistics table.
pub const SUMMARY_FILE_NAME: &str = "summary_statistics.csv";

// ============================================================================
// Report Types
// ============================================================================

/// Everything known about one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmissionsReport {
    /// Timestamp when the report was generated
    pub generated_at: String,
    /// Path to the input file
    pub input_file: String,
    /// Path to the cleaned table (if written)
    pub output_file: Option<String>,

    pub processing_summary: ProcessingSummaryReport,

    pub missing_before: MissingValueCensus,
    pub missing_after: MissingValueCensus,
    /// First few unparseable dates
    pub date_warning_samples: Vec<DateParseWarning>,
    pub imputation: ImputationStats,

    /// Derived views, including summary statistics and correlation
    pub views: DerivedViews,

    /// Configuration the run used
    pub config: PipelineConfig,
}

/// Headline numbers of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingSummaryReport {
    /// Total execution time in milliseconds
    pub duration_ms: u64,
    pub rows: usize,
    pub values_imputed: usize,
    pub imputation_rounds: usize,
    pub imputation_converged: bool,
    pub date_parse_failures: usize,
    pub blank_countries: usize,
    /// Warnings generated during processing
    pub warnings: Vec<String>,
}

// ============================================================================
// Report Generator
// ============================================================================

/// Writes run artifacts into the output directory.
#[derive(Debug, Clone)]
pub struct ReportGenerator {
    output_dir: PathBuf,
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("outputs"),
        }
    }
}

impl ReportGenerator {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    pub fn output_dir(&self) -> &PathBuf {
        &self.output_dir
    }

    /// Write the cleaned table as `cleaned_carbon_emissions.csv`.
    pub fn write_cleaned(&self, result: &PipelineResult) -> Result<PathBuf> {
        let mut df = result.cleaned_frame()?;

        fs::create_dir_all(&self.output_dir)
            .with_context(|| format!("Creating {}", self.output_dir.display()))?;
        let output_path = self.output_dir.join(CLEANED_FILE_NAME);
        let mut file = File::create(&output_path)?;

        CsvWriter::new(&mut file)
            .include_header(true)
            .with_separator(b',')
            .finish(&mut df)?;

        info!("Cleaned dataset saved: {}", output_path.display());
        Ok(output_path)
    }

    /// Write the per-field summary statistics as `summary_statistics.csv`.
    pub fn write_summary_statistics(&self, views: &DerivedViews) -> Result<PathBuf> {
        let mut df = frames::summary_frame(&views.summaries)?;

        fs::create_dir_all(&self.output_dir)
            .with_context(|| format!("Creating {}", self.output_dir.display()))?;
        let output_path = self.output_dir.join(SUMMARY_FILE_NAME);
        let mut file = File::create(&output_path)?;

        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(&mut df)?;

        info!("Summary statistics saved: {}", output_path.display());
        Ok(output_path)
    }

    /// Human-readable warnings derived from a run summary.
    fn collect_warnings(result: &PipelineResult) -> Vec<String> {
        let summary = &result.summary;
        let mut warnings = Vec::new();

        if summary.date_warnings.count > 0 {
            warnings.push(format!(
                "{} dates could not be parsed; those rows are left out of yearly views",
                summary.date_warnings.count
            ));
        }
        if summary.blank_countries > 0 {
            warnings.push(format!(
                "{} rows have no country identifier",
                summary.blank_countries
            ));
        }
        if !summary.imputation.converged && summary.imputation.rounds > 0 {
            warnings.push(format!(
                "Imputation stopped after {} rounds without converging",
                summary.imputation.rounds
            ));
        }
        warnings
    }

    /// Build the run report from pipeline results.
    pub fn build_report(
        input_file: &str,
        output_file: Option<&str>,
        result: &PipelineResult,
        config: &PipelineConfig,
    ) -> EmissionsReport {
        let summary = &result.summary;

        let processing_summary = ProcessingSummaryReport {
            duration_ms: summary.duration_ms,
            rows: summary.rows,
            values_imputed: summary.imputation.total_imputed(),
            imputation_rounds: summary.imputation.rounds,
            imputation_converged: summary.imputation.converged,
            date_parse_failures: summary.date_warnings.count,
            blank_countries: summary.blank_countries,
            warnings: Self::collect_warnings(result),
        };

        EmissionsReport {
            generated_at: Local::now().to_rfc3339(),
            input_file: input_file.to_string(),
            output_file: output_file.map(String::from),
            processing_summary,
            missing_before: summary.missing_before.clone(),
            missing_after: summary.missing_after.clone(),
            date_warning_samples: summary.date_warnings.samples.clone(),
            imputation: summary.imputation.clone(),
            views: result.views.clone(),
            config: config.clone(),
        }
    }

    /// Write a report to `<base name>_report.json` in the output directory.
    pub fn write_report_to_file(
        &self,
        report: &EmissionsReport,
        report_base_name: &str,
    ) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;

        let report_path = self
            .output_dir
            .join(format!("{}_report.json", report_base_name));
        let mut file = File::create(&report_path)?;
        file.write_all(serde_json::to_string_pretty(report)?.as_bytes())?;

        info!("Report saved: {}", report_path.display());

        Ok(report_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Pipeline;
    use tempfile::TempDir;

    fn run() -> PipelineResult {
        let df = df![
            "Country" => ["A", "A", "B"],
            "Region" => ["Europe", "Europe", "Asia"],
            "Date" => ["01-01-2019", "bad", "01-01-2019"],
            "Kilotons of Co2" => [Some(10.0), None, Some(30.0)],
            "Metric Tons Per Capita" => [1.0, 2.0, 3.0],
        ]
        .unwrap();
        Pipeline::builder().build().unwrap().process(df).unwrap()
    }

    #[test]
    fn test_write_cleaned_csv() {
        let dir = TempDir::new().unwrap();
        let generator = ReportGenerator::new(dir.path().to_path_buf());

        let path = generator.write_cleaned(&run()).unwrap();
        assert_eq!(path.file_name().unwrap(), CLEANED_FILE_NAME);

        let content = fs::read_to_string(&path).unwrap();
        let header = content.lines().next().unwrap();
        assert_eq!(header, "Country,Region,Date,Year,co2_kilotons,co2_per_capita");
        assert_eq!(content.lines().count(), 4);
        assert!(content.contains("2019-01-01"));
    }

    #[test]
    fn test_write_summary_statistics_csv() {
        let dir = TempDir::new().unwrap();
        let generator = ReportGenerator::new(dir.path().to_path_buf());

        let path = generator.write_summary_statistics(&run().views).unwrap();
        assert_eq!(path.file_name().unwrap(), SUMMARY_FILE_NAME);

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "field,count,mean,std,min,25%,50%,75%,max");
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("co2_kilotons,3,"));
        assert!(lines[2].starts_with("co2_per_capita,3,"));
    }

    #[test]
    fn test_report_carries_warnings_and_census() {
        let result = run();
        let report = ReportGenerator::build_report(
            "carbon.csv",
            None,
            &result,
            &PipelineConfig::default(),
        );

        assert_eq!(report.processing_summary.rows, 3);
        assert_eq!(report.processing_summary.values_imputed, 1);
        assert_eq!(report.processing_summary.date_parse_failures, 1);
        assert_eq!(report.missing_before.co2_kilotons, 1);
        assert_eq!(report.missing_after.co2_kilotons, 0);
        assert_eq!(report.missing_after.year, 1);
        assert!(
            report
                .processing_summary
                .warnings
                .iter()
                .any(|w| w.contains("dates could not be parsed"))
        );
    }

    #[test]
    fn test_write_report_to_file() {
        let dir = TempDir::new().unwrap();
        let generator = ReportGenerator::new(dir.path().to_path_buf());
        let report =
            ReportGenerator::build_report("carbon.csv", None, &run(), &PipelineConfig::default());

        let path = generator.write_report_to_file(&report, "carbon").unwrap();
        assert!(path.ends_with("carbon_report.json"));

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["processing_summary"]["rows"], 3);
        assert!(json["views"]["correlation"]["values"].is_array());
    }
}
