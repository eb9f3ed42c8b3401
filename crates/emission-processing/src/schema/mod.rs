//! Schema normalization for the raw emissions table.
//!
//! This module maps the source column names onto the canonical schema and
//! derives the `year` of every record from its `DD-MM-YYYY` date string.
//! Date parsing is fail-soft: an unparseable date leaves `date` and `year`
//! absent and is counted as a warning, never raised.

mod dates;

pub use dates::{DateParseWarning, DateParseWarnings, SOURCE_DATE_FORMAT, parse_date};

use crate::error::{EmissionsError, Result, ResultExt};
use crate::frames;
use crate::types::{EmissionRecord, MissingValueCensus};
use crate::utils::{numeric_values, string_values};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Source column names of the raw dataset.
pub mod source {
    pub const COUNTRY: &str = "Country";
    pub const REGION: &str = "Region";
    pub const DATE: &str = "Date";
    pub const KILOTONS: &str = "Kilotons of Co2";
    pub const PER_CAPITA: &str = "Metric Tons Per Capita";

    /// Every column the normalizer requires.
    pub const REQUIRED: [&str; 5] = [COUNTRY, REGION, DATE, KILOTONS, PER_CAPITA];
}

/// Output of the schema normalizer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedTable {
    /// One record per input row, in input order.
    pub records: Vec<EmissionRecord>,
    /// Rows whose date could not be parsed.
    pub date_warnings: DateParseWarnings,
    /// Rows with a blank country identifier (kept, outside the data contract).
    pub blank_countries: usize,
}

impl NormalizedTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Absent values per canonical column.
    pub fn missing_values(&self) -> MissingValueCensus {
        MissingValueCensus::of_normalized(&self.records)
    }

    /// Canonical frame of the table, absent values as nulls.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        Ok(frames::normalized_frame(&self.records)?)
    }
}

/// Renames and validates raw columns into the canonical schema.
pub struct SchemaNormalizer;

impl SchemaNormalizer {
    /// Fail with a schema error naming the first missing source column.
    pub fn validate_columns(df: &DataFrame) -> Result<()> {
        let present: Vec<&str> = df.get_column_names().iter().map(|c| c.as_str()).collect();
        for required in source::REQUIRED {
            if !present.contains(&required) {
                return Err(EmissionsError::schema(required));
            }
        }
        Ok(())
    }

    /// Normalize a raw table into typed records.
    pub fn normalize(df: &DataFrame) -> Result<NormalizedTable> {
        Self::validate_columns(df)?;

        let countries = Self::strings(df, source::COUNTRY)?;
        let regions = Self::strings(df, source::REGION)?;
        let dates = Self::strings(df, source::DATE)?;
        let kilotons = Self::numbers(df, source::KILOTONS)?;
        let per_capita = Self::numbers(df, source::PER_CAPITA)?;

        let mut table = NormalizedTable {
            records: Vec::with_capacity(df.height()),
            ..Default::default()
        };

        for row in 0..df.height() {
            let raw_date = dates[row].as_deref();
            let (date, year) = dates::parse_date_and_year(raw_date);
            if date.is_none() {
                table.date_warnings.record(row, raw_date);
            }

            let country = countries[row].clone().unwrap_or_else(|| {
                table.blank_countries += 1;
                String::new()
            });

            table.records.push(EmissionRecord {
                country,
                region: regions[row].clone().unwrap_or_default(),
                date,
                year,
                co2_kilotons: kilotons[row],
                co2_per_capita: per_capita[row],
            });
        }

        if !table.date_warnings.is_empty() {
            warn!(
                "{} of {} dates could not be parsed as {}; their year is left empty",
                table.date_warnings.count,
                table.len(),
                SOURCE_DATE_FORMAT
            );
        }
        if table.blank_countries > 0 {
            warn!("{} rows have no country identifier", table.blank_countries);
        }

        info!("Normalized {} records", table.len());
        debug!("Missing values after normalization: {:?}", table.missing_values());

        Ok(table)
    }

    fn strings(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
        let column = df.column(name)?;
        string_values(column.as_materialized_series())
            .context(format!("Reading column '{}'", name))
    }

    fn numbers(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
        let column = df.column(name)?;
        numeric_values(column.as_materialized_series())
            .context(format!("Reading column '{}'", name))
    }
}
