use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Canonical column names of the cleaned table.
pub mod columns {
    pub const COUNTRY: &str = "Country";
    pub const REGION: &str = "Region";
    pub const DATE: &str = "Date";
    pub const YEAR: &str = "Year";
    pub const CO2_KILOTONS: &str = "co2_kilotons";
    pub const CO2_PER_CAPITA: &str = "co2_per_capita";

    /// Column order of the cleaned output file.
    pub const CLEANED: [&str; 6] = [COUNTRY, REGION, DATE, YEAR, CO2_KILOTONS, CO2_PER_CAPITA];
}

/// The numeric fields repaired by the imputer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericField {
    Co2Kilotons,
    Co2PerCapita,
}

impl NumericField {
    /// All numeric fields, in canonical column order.
    pub const ALL: [NumericField; 2] = [NumericField::Co2Kilotons, NumericField::Co2PerCapita];

    /// Canonical column name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Co2Kilotons => columns::CO2_KILOTONS,
            Self::Co2PerCapita => columns::CO2_PER_CAPITA,
        }
    }

    /// Position in [`NumericField::ALL`].
    pub fn index(&self) -> usize {
        match self {
            Self::Co2Kilotons => 0,
            Self::Co2PerCapita => 1,
        }
    }
}

impl std::fmt::Display for NumericField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One row of the normalized table.
///
/// Numeric observations may be absent; `date` and `year` are absent when the
/// source date string could not be parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionRecord {
    pub country: String,
    /// Empty when the source row carried no region.
    pub region: String,
    pub date: Option<NaiveDate>,
    pub year: Option<i32>,
    pub co2_kilotons: Option<f64>,
    pub co2_per_capita: Option<f64>,
}

impl EmissionRecord {
    /// Value of a numeric field, if observed.
    pub fn value(&self, field: NumericField) -> Option<f64> {
        match field {
            NumericField::Co2Kilotons => self.co2_kilotons,
            NumericField::Co2PerCapita => self.co2_per_capita,
        }
    }
}

/// One row of the cleaned table: both numeric fields are populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImputedRecord {
    pub country: String,
    pub region: String,
    pub date: Option<NaiveDate>,
    pub year: Option<i32>,
    pub co2_kilotons: f64,
    pub co2_per_capita: f64,
}

impl ImputedRecord {
    pub fn value(&self, field: NumericField) -> f64 {
        match field {
            NumericField::Co2Kilotons => self.co2_kilotons,
            NumericField::Co2PerCapita => self.co2_per_capita,
        }
    }
}

// ============================================================================
// Derived views
// ============================================================================

/// Global totals and means for one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyAggregate {
    pub year: i32,
    pub total_co2_kilotons: f64,
    pub avg_co2_per_capita: f64,
}

/// Totals and means for one region in one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionYearlyAggregate {
    pub region: String,
    pub year: i32,
    pub total_co2_kilotons: f64,
    pub avg_co2_per_capita: f64,
}

/// Per-country means across every year present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryAverage {
    pub country: String,
    pub avg_co2_kilotons: f64,
    pub avg_co2_per_capita: f64,
}

/// Square matrix of Pearson coefficients between the numeric fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    /// Row and column labels.
    pub fields: Vec<NumericField>,
    /// Row-major coefficients, `values[i][j]` correlates `fields[i]` with `fields[j]`.
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    /// Coefficient between two fields.
    pub fn get(&self, a: NumericField, b: NumericField) -> Option<f64> {
        let i = self.fields.iter().position(|f| *f == a)?;
        let j = self.fields.iter().position(|f| *f == b)?;
        Some(self.values[i][j])
    }
}

/// Descriptive statistics of one numeric field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSummary {
    pub field: NumericField,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1); 0.0 for a single value.
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

/// Records of the most recent year present in the cleaned table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatestYearSnapshot {
    pub year: i32,
    pub records: Vec<ImputedRecord>,
}

/// Number of absent values per canonical column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingValueCensus {
    pub date: usize,
    pub year: usize,
    pub co2_kilotons: usize,
    pub co2_per_capita: usize,
}

impl MissingValueCensus {
    /// Count absent values in the normalized table.
    pub fn of_normalized(records: &[EmissionRecord]) -> Self {
        records.iter().fold(Self::default(), |mut acc, r| {
            acc.date += usize::from(r.date.is_none());
            acc.year += usize::from(r.year.is_none());
            acc.co2_kilotons += usize::from(r.co2_kilotons.is_none());
            acc.co2_per_capita += usize::from(r.co2_per_capita.is_none());
            acc
        })
    }

    /// Count absent values in the cleaned table.
    ///
    /// Numeric fields are always populated there, so only date columns count.
    pub fn of_imputed(records: &[ImputedRecord]) -> Self {
        records.iter().fold(Self::default(), |mut acc, r| {
            acc.date += usize::from(r.date.is_none());
            acc.year += usize::from(r.year.is_none());
            acc
        })
    }

    /// Absent values across the numeric fields.
    pub fn numeric_total(&self) -> usize {
        self.co2_kilotons + self.co2_per_capita
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(kilotons: Option<f64>, per_capita: Option<f64>, year: Option<i32>) -> EmissionRecord {
        EmissionRecord {
            country: "A".to_string(),
            region: "Europe".to_string(),
            date: year.and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1)),
            year,
            co2_kilotons: kilotons,
            co2_per_capita: per_capita,
        }
    }

    #[test]
    fn test_numeric_field_names() {
        assert_eq!(NumericField::Co2Kilotons.name(), "co2_kilotons");
        assert_eq!(NumericField::Co2PerCapita.name(), "co2_per_capita");
        for (i, field) in NumericField::ALL.iter().enumerate() {
            assert_eq!(field.index(), i);
        }
    }

    #[test]
    fn test_numeric_field_json_values() {
        let json = serde_json::to_string(&NumericField::Co2PerCapita).unwrap();
        assert_eq!(json, "\"co2_per_capita\"");
    }

    #[test]
    fn test_missing_census_counts_each_column() {
        let records = vec![
            record(Some(1.0), None, Some(2000)),
            record(None, None, None),
            record(Some(3.0), Some(0.5), Some(2001)),
        ];

        let census = MissingValueCensus::of_normalized(&records);
        assert_eq!(census.co2_kilotons, 1);
        assert_eq!(census.co2_per_capita, 2);
        assert_eq!(census.year, 1);
        assert_eq!(census.date, 1);
        assert_eq!(census.numeric_total(), 3);
    }

    #[test]
    fn test_correlation_matrix_lookup() {
        let matrix = CorrelationMatrix {
            fields: NumericField::ALL.to_vec(),
            values: vec![vec![1.0, 0.25], vec![0.25, 1.0]],
        };
        assert_eq!(
            matrix.get(NumericField::Co2Kilotons, NumericField::Co2PerCapita),
            Some(0.25)
        );
        assert_eq!(
            matrix.get(NumericField::Co2PerCapita, NumericField::Co2PerCapita),
            Some(1.0)
        );
    }
}
