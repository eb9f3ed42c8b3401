use super::{Accumulator, ensure_non_empty};
use crate::error::Result;
use crate::types::{CountryAverage, ImputedRecord};
use std::collections::BTreeMap;

/// Per-country means, highest per-capita first, truncated to `top_n`.
///
/// Countries are grouped in ascending name order before the stable sort, so
/// ties rank alphabetically.
pub(super) fn top_by_per_capita(records: &[ImputedRecord], top_n: usize) -> Result<Vec<CountryAverage>> {
    ensure_non_empty(records, "country ranking")?;

    let mut groups: BTreeMap<&str, Accumulator> = BTreeMap::new();
    for record in records {
        groups.entry(record.country.as_str()).or_default().add(record);
    }

    let mut averages: Vec<CountryAverage> = groups
        .into_iter()
        .map(|(country, acc)| CountryAverage {
            country: country.to_string(),
            avg_co2_kilotons: acc.mean_kilotons(),
            avg_co2_per_capita: acc.mean_per_capita(),
        })
        .collect();

    averages.sort_by(|a, b| b.avg_co2_per_capita.total_cmp(&a.avg_co2_per_capita));
    averages.truncate(top_n);
    Ok(averages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::test_support::imputed;

    #[test]
    fn test_sorted_descending_and_truncated() {
        let records: Vec<ImputedRecord> = (0..15)
            .map(|i| imputed(&format!("C{}", i), "R", Some(2020), 1.0, i as f64))
            .collect();

        let top = top_by_per_capita(&records, 10).unwrap();
        assert_eq!(top.len(), 10);
        assert_eq!(top[0].country, "C14");
        assert!(
            top.windows(2)
                .all(|w| w[0].avg_co2_per_capita >= w[1].avg_co2_per_capita)
        );
    }

    #[test]
    fn test_means_include_records_without_year() {
        let records = vec![
            imputed("A", "Europe", Some(2019), 100.0, 1.0),
            imputed("A", "Europe", None, 300.0, 3.0),
        ];

        let top = top_by_per_capita(&records, 10).unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].avg_co2_kilotons, 200.0);
        assert_eq!(top[0].avg_co2_per_capita, 2.0);
    }

    #[test]
    fn test_ties_rank_by_country_name() {
        let records = vec![
            imputed("Zed", "R", Some(2020), 1.0, 5.0),
            imputed("Alpha", "R", Some(2020), 1.0, 5.0),
            imputed("Mid", "R", Some(2020), 1.0, 7.0),
            imputed("Zed", "R", Some(2021), 1.0, 5.0),
        ];

        let top = top_by_per_capita(&records, 10).unwrap();
        let names: Vec<&str> = top.iter().map(|c| c.country.as_str()).collect();
        assert_eq!(names, vec!["Mid", "Alpha", "Zed"]);
    }

    #[test]
    fn test_tie_order_ignores_input_order() {
        let forward = vec![
            imputed("Zed", "R", Some(2020), 1.0, 5.0),
            imputed("Alpha", "R", Some(2020), 1.0, 5.0),
        ];
        let reversed: Vec<ImputedRecord> = forward.iter().rev().cloned().collect();

        let a = top_by_per_capita(&forward, 10).unwrap();
        let b = top_by_per_capita(&reversed, 10).unwrap();
        assert_eq!(a, b);
        assert_eq!(a[0].country, "Alpha");
    }

    #[test]
    fn test_fewer_countries_than_limit() {
        let records = vec![imputed("A", "R", Some(2020), 1.0, 1.0)];
        assert_eq!(top_by_per_capita(&records, 10).unwrap().len(), 1);
    }
}
