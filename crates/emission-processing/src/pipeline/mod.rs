//! Pipeline module.
//!
//! This module orchestrates normalization, imputation and aggregation and
//! defines the result handed back to callers.

mod builder;

pub use builder::{Pipeline, PipelineBuilder};

use crate::aggregation::DerivedViews;
use crate::error::Result;
use crate::frames;
use crate::imputers::ImputationStats;
use crate::schema::DateParseWarnings;
use crate::types::{ImputedRecord, MissingValueCensus};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};

/// Counters collected while the pipeline ran.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineSummary {
    pub rows: usize,
    pub duration_ms: u64,
    /// Absent values right after normalization.
    pub missing_before: MissingValueCensus,
    /// Absent values in the cleaned table (only dates can remain absent).
    pub missing_after: MissingValueCensus,
    pub date_warnings: DateParseWarnings,
    pub blank_countries: usize,
    pub imputation: ImputationStats,
}

/// Cleaned table plus every derived view.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineResult {
    pub records: Vec<ImputedRecord>,
    pub views: DerivedViews,
    pub summary: PipelineSummary,
}

impl PipelineResult {
    /// The cleaned table as a DataFrame.
    pub fn cleaned_frame(&self) -> Result<DataFrame> {
        Ok(frames::cleaned_frame(&self.records)?)
    }
}

static_assertions::assert_impl_all!(PipelineResult: Send, Sync);
static_assertions::assert_impl_all!(DerivedViews: Send, Sync);
