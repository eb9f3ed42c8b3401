//! Fail-soft parsing of the source date column.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Fixed source date format (day-month-year).
pub const SOURCE_DATE_FORMAT: &str = "%d-%m-%Y";

/// Offending values kept as examples in the warning summary.
const MAX_WARNING_SAMPLES: usize = 5;

/// Parse a `DD-MM-YYYY` date string.
///
/// Returns `None` instead of failing for anything that does not match.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), SOURCE_DATE_FORMAT).ok()
}

/// Parse a date and derive its year.
pub(crate) fn parse_date_and_year(raw: Option<&str>) -> (Option<NaiveDate>, Option<i32>) {
    match raw.and_then(parse_date) {
        Some(date) => (Some(date), Some(date.year())),
        None => (None, None),
    }
}

/// One record whose date could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateParseWarning {
    /// Zero-based row index in the input table.
    pub row: usize,
    /// The raw value, `None` when the cell was empty.
    pub value: Option<String>,
}

/// Accumulated date parse failures.
///
/// Every failure is counted; only the first few are kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateParseWarnings {
    pub count: usize,
    pub samples: Vec<DateParseWarning>,
}

impl DateParseWarnings {
    pub(crate) fn record(&mut self, row: usize, value: Option<&str>) {
        self.count += 1;
        if self.samples.len() < MAX_WARNING_SAMPLES {
            self.samples.push(DateParseWarning {
                row,
                value: value.map(str::to_string),
            });
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}
