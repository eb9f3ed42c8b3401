//! Conversions from records and derived views into polars DataFrames.
//!
//! The core works on typed records; these tables are what gets written to
//! disk or handed to a presentation layer.

use crate::types::{
    CorrelationMatrix, CountryAverage, EmissionRecord, FieldSummary, ImputedRecord,
    LatestYearSnapshot, RegionYearlyAggregate, YearlyAggregate, columns,
};
use polars::prelude::*;

/// Format of the `Date` column in written tables.
pub const OUTPUT_DATE_FORMAT: &str = "%Y-%m-%d";

fn format_dates<'a>(dates: impl Iterator<Item = Option<&'a chrono::NaiveDate>>) -> Vec<Option<String>> {
    dates
        .map(|d| d.map(|d| d.format(OUTPUT_DATE_FORMAT).to_string()))
        .collect()
}

/// Canonical frame of the normalized table; absent values are null.
pub fn normalized_frame(records: &[EmissionRecord]) -> PolarsResult<DataFrame> {
    DataFrame::new(vec![
        Column::new(
            columns::COUNTRY.into(),
            records.iter().map(|r| r.country.as_str()).collect::<Vec<_>>(),
        ),
        Column::new(
            columns::REGION.into(),
            records.iter().map(|r| r.region.as_str()).collect::<Vec<_>>(),
        ),
        Column::new(
            columns::DATE.into(),
            format_dates(records.iter().map(|r| r.date.as_ref())),
        ),
        Column::new(
            columns::YEAR.into(),
            records.iter().map(|r| r.year).collect::<Vec<_>>(),
        ),
        Column::new(
            columns::CO2_KILOTONS.into(),
            records.iter().map(|r| r.co2_kilotons).collect::<Vec<_>>(),
        ),
        Column::new(
            columns::CO2_PER_CAPITA.into(),
            records.iter().map(|r| r.co2_per_capita).collect::<Vec<_>>(),
        ),
    ])
}

/// Frame of the cleaned table, columns in [`columns::CLEANED`] order.
pub fn cleaned_frame(records: &[ImputedRecord]) -> PolarsResult<DataFrame> {
    DataFrame::new(vec![
        Column::new(
            columns::COUNTRY.into(),
            records.iter().map(|r| r.country.as_str()).collect::<Vec<_>>(),
        ),
        Column::new(
            columns::REGION.into(),
            records.iter().map(|r| r.region.as_str()).collect::<Vec<_>>(),
        ),
        Column::new(
            columns::DATE.into(),
            format_dates(records.iter().map(|r| r.date.as_ref())),
        ),
        Column::new(
            columns::YEAR.into(),
            records.iter().map(|r| r.year).collect::<Vec<_>>(),
        ),
        Column::new(
            columns::CO2_KILOTONS.into(),
            records.iter().map(|r| r.co2_kilotons).collect::<Vec<_>>(),
        ),
        Column::new(
            columns::CO2_PER_CAPITA.into(),
            records.iter().map(|r| r.co2_per_capita).collect::<Vec<_>>(),
        ),
    ])
}

pub fn yearly_frame(rows: &[YearlyAggregate]) -> PolarsResult<DataFrame> {
    df![
        "year" => rows.iter().map(|r| r.year).collect::<Vec<_>>(),
        "total_co2_kilotons" => rows.iter().map(|r| r.total_co2_kilotons).collect::<Vec<_>>(),
        "avg_co2_per_capita" => rows.iter().map(|r| r.avg_co2_per_capita).collect::<Vec<_>>(),
    ]
}

pub fn regional_frame(rows: &[RegionYearlyAggregate]) -> PolarsResult<DataFrame> {
    df![
        "region" => rows.iter().map(|r| r.region.as_str()).collect::<Vec<_>>(),
        "year" => rows.iter().map(|r| r.year).collect::<Vec<_>>(),
        "total_co2_kilotons" => rows.iter().map(|r| r.total_co2_kilotons).collect::<Vec<_>>(),
        "avg_co2_per_capita" => rows.iter().map(|r| r.avg_co2_per_capita).collect::<Vec<_>>(),
    ]
}

/// Ranked countries, with a 1-based `rank` column.
pub fn country_frame(rows: &[CountryAverage]) -> PolarsResult<DataFrame> {
    df![
        "rank" => (1..=rows.len() as u32).collect::<Vec<_>>(),
        "country" => rows.iter().map(|r| r.country.as_str()).collect::<Vec<_>>(),
        "avg_co2_kilotons" => rows.iter().map(|r| r.avg_co2_kilotons).collect::<Vec<_>>(),
        "avg_co2_per_capita" => rows.iter().map(|r| r.avg_co2_per_capita).collect::<Vec<_>>(),
    ]
}

/// Square matrix with a leading `field` label column.
pub fn correlation_frame(matrix: &CorrelationMatrix) -> PolarsResult<DataFrame> {
    let mut frame_columns = vec![Column::new(
        "field".into(),
        matrix.fields.iter().map(|f| f.name()).collect::<Vec<_>>(),
    )];
    for (j, field) in matrix.fields.iter().enumerate() {
        frame_columns.push(Column::new(
            field.name().into(),
            matrix.values.iter().map(|row| row[j]).collect::<Vec<_>>(),
        ));
    }
    DataFrame::new(frame_columns)
}

/// One row per field, describe-style statistic columns.
pub fn summary_frame(rows: &[FieldSummary]) -> PolarsResult<DataFrame> {
    df![
        "field" => rows.iter().map(|r| r.field.name()).collect::<Vec<_>>(),
        "count" => rows.iter().map(|r| r.count as u64).collect::<Vec<_>>(),
        "mean" => rows.iter().map(|r| r.mean).collect::<Vec<_>>(),
        "std" => rows.iter().map(|r| r.std).collect::<Vec<_>>(),
        "min" => rows.iter().map(|r| r.min).collect::<Vec<_>>(),
        "25%" => rows.iter().map(|r| r.q25).collect::<Vec<_>>(),
        "50%" => rows.iter().map(|r| r.median).collect::<Vec<_>>(),
        "75%" => rows.iter().map(|r| r.q75).collect::<Vec<_>>(),
        "max" => rows.iter().map(|r| r.max).collect::<Vec<_>>(),
    ]
}

pub fn snapshot_frame(snapshot: &LatestYearSnapshot) -> PolarsResult<DataFrame> {
    let records = &snapshot.records;
    df![
        "country" => records.iter().map(|r| r.country.as_str()).collect::<Vec<_>>(),
        "region" => records.iter().map(|r| r.region.as_str()).collect::<Vec<_>>(),
        "year" => records.iter().map(|_| snapshot.year).collect::<Vec<_>>(),
        columns::CO2_KILOTONS => records.iter().map(|r| r.co2_kilotons).collect::<Vec<_>>(),
        columns::CO2_PER_CAPITA => records.iter().map(|r| r.co2_per_capita).collect::<Vec<_>>(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NumericField;
    use chrono::NaiveDate;

    fn cleaned() -> Vec<ImputedRecord> {
        vec![
            ImputedRecord {
                country: "A".to_string(),
                region: "Europe".to_string(),
                date: NaiveDate::from_ymd_opt(2019, 3, 1),
                year: Some(2019),
                co2_kilotons: 100.0,
                co2_per_capita: 1.5,
            },
            ImputedRecord {
                country: "B".to_string(),
                region: String::new(),
                date: None,
                year: None,
                co2_kilotons: 20.0,
                co2_per_capita: 0.5,
            },
        ]
    }

    #[test]
    fn test_cleaned_frame_columns_and_dates() {
        let df = cleaned_frame(&cleaned()).unwrap();
        let names: Vec<&str> = df.get_column_names().iter().map(|c| c.as_str()).collect();
        assert_eq!(names, columns::CLEANED.to_vec());

        let dates = df.column(columns::DATE).unwrap().as_materialized_series().str().unwrap();
        assert_eq!(dates.get(0), Some("2019-03-01"));
        assert_eq!(dates.get(1), None);

        let years = df.column(columns::YEAR).unwrap();
        assert_eq!(years.null_count(), 1);
    }

    #[test]
    fn test_normalized_frame_keeps_nulls() {
        let records = vec![EmissionRecord {
            country: "A".to_string(),
            region: "Asia".to_string(),
            date: None,
            year: None,
            co2_kilotons: None,
            co2_per_capita: Some(2.0),
        }];
        let df = normalized_frame(&records).unwrap();
        assert_eq!(df.height(), 1);
        assert_eq!(df.column(columns::CO2_KILOTONS).unwrap().null_count(), 1);
        assert_eq!(df.column(columns::CO2_PER_CAPITA).unwrap().null_count(), 0);
    }

    #[test]
    fn test_country_frame_ranks_from_one() {
        let rows = vec![
            CountryAverage {
                country: "X".to_string(),
                avg_co2_kilotons: 1.0,
                avg_co2_per_capita: 9.0,
            },
            CountryAverage {
                country: "Y".to_string(),
                avg_co2_kilotons: 2.0,
                avg_co2_per_capita: 3.0,
            },
        ];
        let df = country_frame(&rows).unwrap();
        let ranks = df.column("rank").unwrap().as_materialized_series().u32().unwrap();
        assert_eq!(ranks.get(0), Some(1));
        assert_eq!(ranks.get(1), Some(2));
    }

    #[test]
    fn test_correlation_frame_shape() {
        let matrix = CorrelationMatrix {
            fields: NumericField::ALL.to_vec(),
            values: vec![vec![1.0, 0.3], vec![0.3, 1.0]],
        };
        let df = correlation_frame(&matrix).unwrap();
        assert_eq!(df.shape(), (2, 3));
        let col = df
            .column("co2_per_capita")
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap();
        assert_eq!(col.get(0), Some(0.3));
    }
}
