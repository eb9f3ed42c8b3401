use super::{Accumulator, ensure_non_empty};
use crate::error::Result;
use crate::types::{ImputedRecord, RegionYearlyAggregate};
use std::collections::BTreeMap;

/// Records with an empty region or no year are left out.
pub(super) fn aggregate(records: &[ImputedRecord]) -> Result<Vec<RegionYearlyAggregate>> {
    ensure_non_empty(records, "regional aggregate")?;

    let mut groups: BTreeMap<(&str, i32), Accumulator> = BTreeMap::new();
    for record in records {
        let Some(year) = record.year else { continue };
        if record.region.is_empty() {
            continue;
        }
        groups.entry((record.region.as_str(), year)).or_default().add(record);
    }

    Ok(groups
        .into_iter()
        .map(|((region, year), acc)| RegionYearlyAggregate {
            region: region.to_string(),
            year,
            total_co2_kilotons: acc.total_kilotons(),
            avg_co2_per_capita: acc.mean_per_capita(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::test_support::imputed;

    #[test]
    fn test_ordered_by_region_then_year() {
        let records = vec![
            imputed("A", "Europe", Some(2020), 10.0, 1.0),
            imputed("B", "Asia", Some(2020), 20.0, 2.0),
            imputed("C", "Asia", Some(2019), 30.0, 3.0),
            imputed("D", "Asia", Some(2020), 40.0, 4.0),
        ];

        let regional = aggregate(&records).unwrap();
        let keys: Vec<(&str, i32)> = regional.iter().map(|r| (r.region.as_str(), r.year)).collect();
        assert_eq!(keys, vec![("Asia", 2019), ("Asia", 2020), ("Europe", 2020)]);

        assert_eq!(regional[1].total_co2_kilotons, 60.0);
        assert_eq!(regional[1].avg_co2_per_capita, 3.0);
    }

    #[test]
    fn test_empty_region_and_missing_year_are_excluded() {
        let records = vec![
            imputed("A", "", Some(2020), 10.0, 1.0),
            imputed("B", "Asia", None, 20.0, 2.0),
            imputed("C", "Asia", Some(2020), 30.0, 3.0),
        ];

        let regional = aggregate(&records).unwrap();
        assert_eq!(regional.len(), 1);
        assert_eq!(regional[0].region, "Asia");
        assert_eq!(regional[0].total_co2_kilotons, 30.0);
    }
}
