//! Shared utilities for reading typed values out of polars columns.
//!
//! The raw CSV reader infers column types, so a numeric source column may
//! arrive as floats, integers, or strings. These helpers turn any of those
//! into plain Rust values with explicit absence.

use polars::prelude::*;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

// =============================================================================
// String Parsing Utilities
// =============================================================================

/// Characters commonly used in numeric formatting that should be stripped.
pub const NUMERIC_FORMAT_CHARS: [char; 2] = [',', ' '];

/// Common error/missing value markers in data.
pub const ERROR_MARKERS: [&str; 9] = [
    "error", "unknown", "n/a", "na", "nan", "null", "missing", "none", "#n/a",
];

/// Clean a string for numeric parsing by removing formatting characters.
pub fn clean_numeric_string(s: &str) -> String {
    let mut result = s.trim().to_string();
    for c in NUMERIC_FORMAT_CHARS {
        result = result.replace(c, "");
    }
    result
}

/// Check if a string is an error/missing value marker.
pub fn is_error_marker(s: &str) -> bool {
    let lower = s.trim().to_ascii_lowercase();
    ERROR_MARKERS.iter().any(|&marker| lower == marker)
}

/// Try to parse a string as a finite numeric value.
///
/// Blank strings, error markers and non-finite results are absent.
pub fn parse_numeric_string(s: &str) -> Option<f64> {
    if is_error_marker(s) {
        return None;
    }
    let cleaned = clean_numeric_string(s);
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

// =============================================================================
// Series Extraction Utilities
// =============================================================================

/// Read a column as optional floats.
///
/// Nulls and non-finite values (NaN, ±inf) become `None`; string columns are
/// parsed with [`parse_numeric_string`]. Other non-numeric types are an error.
pub fn numeric_values(series: &Series) -> PolarsResult<Vec<Option<f64>>> {
    if series.dtype() == &DataType::String {
        let str_series = series.str()?;
        return Ok(str_series
            .into_iter()
            .map(|opt| opt.and_then(parse_numeric_string))
            .collect());
    }

    if !is_numeric_dtype(series.dtype()) && series.dtype() != &DataType::Null {
        return Err(PolarsError::ComputeError(
            format!(
                "column '{}' has non-numeric type {}",
                series.name(),
                series.dtype()
            )
            .into(),
        ));
    }

    let float_series = series.cast(&DataType::Float64)?;
    let values = float_series
        .f64()?
        .into_iter()
        .map(|opt| opt.filter(|v| v.is_finite()))
        .collect();
    Ok(values)
}

/// Read a column as optional strings, trimming surrounding whitespace.
///
/// Blank cells become `None`.
pub fn string_values(series: &Series) -> PolarsResult<Vec<Option<String>>> {
    let str_series = series.cast(&DataType::String)?;
    let values = str_series
        .str()?
        .into_iter()
        .map(|opt| {
            opt.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        })
        .collect();
    Ok(values)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_numeric_dtype() {
        assert!(is_numeric_dtype(&DataType::Int64));
        assert!(is_numeric_dtype(&DataType::Float64));
        assert!(!is_numeric_dtype(&DataType::String));
        assert!(!is_numeric_dtype(&DataType::Boolean));
    }

    #[test]
    fn test_clean_numeric_string() {
        assert_eq!(clean_numeric_string("1,234.56"), "1234.56");
        assert_eq!(clean_numeric_string("  42  "), "42");
        assert_eq!(clean_numeric_string("1 000"), "1000");
    }

    #[test]
    fn test_is_error_marker() {
        assert!(is_error_marker("N/A"));
        assert!(is_error_marker("NaN"));
        assert!(is_error_marker("  MISSING  "));
        assert!(!is_error_marker("42"));
    }

    #[test]
    fn test_parse_numeric_string() {
        assert_eq!(parse_numeric_string("42"), Some(42.0));
        assert_eq!(parse_numeric_string("1,234.5"), Some(1234.5));
        assert_eq!(parse_numeric_string(""), None);
        assert_eq!(parse_numeric_string("nan"), None);
        assert_eq!(parse_numeric_string("inf"), None);
        assert_eq!(parse_numeric_string("hello"), None);
    }

    #[test]
    fn test_numeric_values_from_floats() {
        let series = Series::new("v".into(), &[Some(1.5), None, Some(f64::NAN)]);
        let values = numeric_values(&series).unwrap();
        assert_eq!(values, vec![Some(1.5), None, None]);
    }

    #[test]
    fn test_numeric_values_from_integers() {
        let series = Series::new("v".into(), &[Some(3i64), None]);
        let values = numeric_values(&series).unwrap();
        assert_eq!(values, vec![Some(3.0), None]);
    }

    #[test]
    fn test_numeric_values_from_strings() {
        let series = Series::new("v".into(), &[Some("12,000.5"), Some("N/A"), None, Some(" 7 ")]);
        let values = numeric_values(&series).unwrap();
        assert_eq!(values, vec![Some(12000.5), None, None, Some(7.0)]);
    }

    #[test]
    fn test_numeric_values_rejects_booleans() {
        let series = Series::new("v".into(), &[true, false]);
        assert!(numeric_values(&series).is_err());
    }

    #[test]
    fn test_string_values_trims_and_blanks() {
        let series = Series::new("s".into(), &[Some(" Asia "), Some("  "), None]);
        let values = string_values(&series).unwrap();
        assert_eq!(values, vec![Some("Asia".to_string()), None, None]);
    }
}
