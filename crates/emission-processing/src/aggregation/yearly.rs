use super::{Accumulator, ensure_non_empty};
use crate::error::Result;
use crate::types::{ImputedRecord, YearlyAggregate};
use std::collections::BTreeMap;

/// Records without a year are left out.
pub(super) fn aggregate(records: &[ImputedRecord]) -> Result<Vec<YearlyAggregate>> {
    ensure_non_empty(records, "yearly aggregate")?;

    let groups = records
        .iter()
        .filter_map(|r| r.year.map(|year| (year, r)))
        .fold(BTreeMap::<i32, Accumulator>::new(), |mut groups, (year, r)| {
            groups.entry(year).or_default().add(r);
            groups
        });

    Ok(groups
        .into_iter()
        .map(|(year, acc)| YearlyAggregate {
            year,
            total_co2_kilotons: acc.total_kilotons(),
            avg_co2_per_capita: acc.mean_per_capita(),
        })
        .collect())
}
