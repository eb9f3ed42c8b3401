//! Custom error types for the emissions pipeline.
//!
//! This module provides the error hierarchy using `thiserror` for the
//! fatal conditions of the pipeline. Per-record issues (unparseable dates)
//! are not errors: they are counted on the normalized table instead.
//!
//! Errors are serializable as `{ code, message }` so they can be embedded in
//! JSON run reports.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the emissions pipeline.
#[derive(Error, Debug)]
pub enum EmissionsError {
    /// A required raw column is missing from the input table.
    #[error("Required column '{column}' not found in input")]
    Schema { column: String },

    /// The imputer cannot fit because a field has no observed values.
    #[error("Cannot impute: field '{field}' has no observed values")]
    InsufficientData { field: String },

    /// An aggregation was invoked on zero rows.
    #[error("Cannot compute {view}: input has no rows")]
    EmptyInput { view: String },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] crate::config::ConfigValidationError),

    /// Numerical failure inside a regression fit.
    #[error("Regression fit failed for '{target}': {reason}")]
    FitFailed { target: String, reason: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<EmissionsError>,
    },
}

impl EmissionsError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        EmissionsError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Shorthand for [`EmissionsError::Schema`].
    pub fn schema(column: impl Into<String>) -> Self {
        Self::Schema {
            column: column.into(),
        }
    }

    /// Shorthand for [`EmissionsError::InsufficientData`].
    pub fn insufficient_data(field: impl Into<String>) -> Self {
        Self::InsufficientData {
            field: field.into(),
        }
    }

    /// Shorthand for [`EmissionsError::EmptyInput`].
    pub fn empty_input(view: impl Into<String>) -> Self {
        Self::EmptyInput { view: view.into() }
    }

    /// Get a stable error code for machine consumers.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Schema { .. } => "SCHEMA_ERROR",
            Self::InsufficientData { .. } => "INSUFFICIENT_DATA",
            Self::EmptyInput { .. } => "EMPTY_INPUT",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::FitFailed { .. } => "FIT_FAILED",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error aborts the whole run.
    ///
    /// An empty input only invalidates the aggregation step that hit it.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::EmptyInput { .. } => false,
            Self::WithContext { source, .. } => source.is_fatal(),
            _ => true,
        }
    }
}

impl Serialize for EmissionsError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("EmissionsError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, EmissionsError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| EmissionsError::Polars(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(EmissionsError::schema("Date").error_code(), "SCHEMA_ERROR");
        assert_eq!(
            EmissionsError::insufficient_data("co2_kilotons").error_code(),
            "INSUFFICIENT_DATA"
        );
        assert_eq!(
            EmissionsError::empty_input("yearly aggregate").error_code(),
            "EMPTY_INPUT"
        );
    }

    #[test]
    fn test_is_fatal() {
        assert!(EmissionsError::schema("Region").is_fatal());
        assert!(EmissionsError::insufficient_data("co2_per_capita").is_fatal());
        assert!(!EmissionsError::empty_input("correlation matrix").is_fatal());
        assert!(
            !EmissionsError::empty_input("yearly aggregate")
                .with_context("Aggregating")
                .is_fatal()
        );
    }

    #[test]
    fn test_error_message_names_column() {
        let error = EmissionsError::schema("Kilotons of Co2");
        assert_eq!(
            error.to_string(),
            "Required column 'Kilotons of Co2' not found in input"
        );
    }

    #[test]
    fn test_error_serialization() {
        let error = EmissionsError::insufficient_data("co2_kilotons");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("INSUFFICIENT_DATA"));
        assert!(json.contains("co2_kilotons"));
    }

    #[test]
    fn test_config_error_converts() {
        let error: EmissionsError = crate::config::ConfigValidationError::InvalidMaxRounds(0).into();
        assert_eq!(error.error_code(), "INVALID_CONFIG");
        assert!(error.to_string().contains("round limit"));
    }

    #[test]
    fn test_with_context() {
        let error = EmissionsError::schema("Country").with_context("During normalization");
        assert!(error.to_string().contains("During normalization"));
        assert_eq!(error.error_code(), "SCHEMA_ERROR"); // Preserves original code
    }
}
