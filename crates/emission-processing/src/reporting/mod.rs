//! Report generation module.
//!
//! This module persists the cleaned table and builds the JSON run report.
//!
//! # Run Reports
//!
//! Use [`EmissionsReport`] for both outputs of the CLI:
//! - JSON output to stdout (`--json` CLI flag)
//! - JSON file output (`--emit-report` CLI flag)
//!
//! # Example
//!
//! ```rust,ignore
//! use emission_processing::reporting::ReportGenerator;
//!
//! let generator = ReportGenerator::new(PathBuf::from("outputs"));
//! let cleaned_path = generator.write_cleaned(&result)?;
//! generator.write_summary_statistics(&result.views)?;
//!
//! let report = ReportGenerator::build_report(
//!     "dataset/carbon_emissions.csv",
//!     Some(&cleaned_path.to_string_lossy()),
//!     &result,
//!     &config,
//! );
//! generator.write_report_to_file(&report, "carbon_emissions")?;
//! ```

mod generator;

pub use generator::{
    CLEANED_FILE_NAME, EmissionsReport, ProcessingSummaryReport, ReportGenerator,
    SUMMARY_FILE_NAME,
};
