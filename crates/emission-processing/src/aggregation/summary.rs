use super::ensure_non_empty;
use crate::error::Result;
use crate::types::{FieldSummary, ImputedRecord, LatestYearSnapshot, NumericField};

/// Quantile of sorted data with linear interpolation between closest ranks.
///
/// `sorted` must be non-empty and ascending; `q` is clamped to [0, 1].
/// Only reached through `describe`, which runs on non-empty views.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

fn describe(field: NumericField, records: &[ImputedRecord]) -> FieldSummary {
    let mut values: Vec<f64> = records.iter().map(|r| r.value(field)).collect();
    values.sort_by(f64::total_cmp);

    let count = values.len();
    let mean = values.iter().sum::<f64>() / count as f64;
    let std = if count > 1 {
        let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
        (ss / (count - 1) as f64).sqrt()
    } else {
        0.0
    };

    FieldSummary {
        field,
        count,
        mean,
        std,
        min: values[0],
        q25: quantile(&values, 0.25),
        median: quantile(&values, 0.5),
        q75: quantile(&values, 0.75),
        max: values[count - 1],
    }
}

pub(super) fn summarize(records: &[ImputedRecord]) -> Result<Vec<FieldSummary>> {
    ensure_non_empty(records, "summary statistics")?;
    Ok(NumericField::ALL
        .iter()
        .map(|&field| describe(field, records))
        .collect())
}

pub(super) fn latest_year_snapshot(records: &[ImputedRecord]) -> Result<Option<LatestYearSnapshot>> {
    ensure_non_empty(records, "latest year snapshot")?;

    let Some(year) = records.iter().filter_map(|r| r.year).max() else {
        return Ok(None);
    };
    Ok(Some(LatestYearSnapshot {
        year,
        records: records
            .iter()
            .filter(|r| r.year == Some(year))
            .cloned()
            .collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::test_support::imputed;

    #[test]
    fn test_quantile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&sorted, 0.0), 1.0);
        assert_eq!(quantile(&sorted, 0.5), 2.5);
        assert_eq!(quantile(&sorted, 0.25), 1.75);
        assert_eq!(quantile(&sorted, 1.0), 4.0);
        assert_eq!(quantile(&[7.0], 0.75), 7.0);
    }

    #[test]
    fn test_summarize_both_fields() {
        let records = vec![
            imputed("A", "R", Some(2019), 2.0, 1.0),
            imputed("B", "R", Some(2019), 4.0, 1.0),
            imputed("C", "R", Some(2019), 6.0, 1.0),
        ];

        let summaries = summarize(&records).unwrap();
        let kt = &summaries[0];
        assert_eq!(kt.field, NumericField::Co2Kilotons);
        assert_eq!(kt.count, 3);
        assert_eq!(kt.mean, 4.0);
        assert_eq!(kt.std, 2.0);
        assert_eq!((kt.min, kt.median, kt.max), (2.0, 4.0, 6.0));
        assert_eq!((kt.q25, kt.q75), (3.0, 5.0));

        assert_eq!(summaries[1].std, 0.0);
    }

    #[test]
    fn test_single_value_has_zero_std() {
        let records = vec![imputed("A", "R", None, 5.0, 0.5)];
        let summaries = summarize(&records).unwrap();
        assert_eq!(summaries[0].std, 0.0);
        assert_eq!(summaries[0].q25, 5.0);
    }

    #[test]
    fn test_summarize_empty_is_rejected_before_quantiles() {
        let err = summarize(&[]).unwrap_err();
        assert_eq!(err.error_code(), "EMPTY_INPUT");
    }

    #[test]
    fn test_latest_year_snapshot() {
        let records = vec![
            imputed("A", "R", Some(2020), 1.0, 1.0),
            imputed("B", "R", None, 2.0, 2.0),
            imputed("C", "R", Some(2021), 3.0, 3.0),
        ];

        let snapshot = latest_year_snapshot(&records).unwrap().unwrap();
        assert_eq!(snapshot.year, 2021);
        assert_eq!(snapshot.records.len(), 1);
        assert_eq!(snapshot.records[0].country, "C");

        let undated = vec![imputed("A", "R", None, 1.0, 1.0)];
        assert_eq!(latest_year_snapshot(&undated).unwrap(), None);
    }
}
