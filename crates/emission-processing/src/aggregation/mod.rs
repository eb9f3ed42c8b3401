//! Aggregation engine for the cleaned emissions table.
//!
//! Every view is an independent, pure computation over the imputed records:
//! - Yearly totals and means (`yearly`)
//! - Regional-yearly totals and means (`regional`)
//! - Top-N countries by mean per-capita emissions (`ranking`)
//! - Pearson correlation between the numeric fields (`correlation`)
//! - Descriptive statistics and the latest-year snapshot (`summary`)
//!
//! Grouped views fold records into a key → [`Accumulator`] map and finalize
//! each accumulator into one output row. Each view fails with `EmptyInput`
//! when given zero records.

mod correlation;
mod ranking;
mod regional;
mod summary;
mod yearly;

pub use correlation::pearson;

use crate::config::DEFAULT_TOP_N;
use crate::error::{EmissionsError, Result};
use crate::types::{
    CorrelationMatrix, CountryAverage, FieldSummary, ImputedRecord, LatestYearSnapshot,
    RegionYearlyAggregate, YearlyAggregate,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Every derived view of one cleaned table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedViews {
    pub yearly: Vec<YearlyAggregate>,
    pub regional_yearly: Vec<RegionYearlyAggregate>,
    pub top_countries: Vec<CountryAverage>,
    pub correlation: CorrelationMatrix,
    pub summaries: Vec<FieldSummary>,
    /// `None` when no record carries a year.
    pub latest_year: Option<LatestYearSnapshot>,
}

/// Running sums for one group.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct Accumulator {
    kilotons_sum: f64,
    per_capita_sum: f64,
    count: usize,
}

impl Accumulator {
    pub(crate) fn add(&mut self, record: &ImputedRecord) {
        self.kilotons_sum += record.co2_kilotons;
        self.per_capita_sum += record.co2_per_capita;
        self.count += 1;
    }

    pub(crate) fn total_kilotons(&self) -> f64 {
        self.kilotons_sum
    }

    pub(crate) fn mean_kilotons(&self) -> f64 {
        self.kilotons_sum / self.count as f64
    }

    pub(crate) fn mean_per_capita(&self) -> f64 {
        self.per_capita_sum / self.count as f64
    }
}

pub(crate) fn ensure_non_empty(records: &[ImputedRecord], view: &str) -> Result<()> {
    if records.is_empty() {
        return Err(EmissionsError::empty_input(view));
    }
    Ok(())
}

/// Computes the derived views.
#[derive(Debug, Clone)]
pub struct AggregationEngine {
    top_n: usize,
}

impl Default for AggregationEngine {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_N)
    }
}

impl AggregationEngine {
    pub fn new(top_n: usize) -> Self {
        Self { top_n }
    }

    pub fn top_n(&self) -> usize {
        self.top_n
    }

    /// Global totals and means per year, ascending by year.
    pub fn yearly(&self, records: &[ImputedRecord]) -> Result<Vec<YearlyAggregate>> {
        yearly::aggregate(records)
    }

    /// Totals and means per `(region, year)`, ascending.
    pub fn regional_yearly(&self, records: &[ImputedRecord]) -> Result<Vec<RegionYearlyAggregate>> {
        regional::aggregate(records)
    }

    /// The `top_n` countries by mean per-capita emissions.
    pub fn top_countries(&self, records: &[ImputedRecord]) -> Result<Vec<CountryAverage>> {
        ranking::top_by_per_capita(records, self.top_n)
    }

    pub fn correlation(&self, records: &[ImputedRecord]) -> Result<CorrelationMatrix> {
        correlation::matrix(records)
    }

    pub fn summarize(&self, records: &[ImputedRecord]) -> Result<Vec<FieldSummary>> {
        summary::summarize(records)
    }

    pub fn latest_year_snapshot(&self, records: &[ImputedRecord]) -> Result<Option<LatestYearSnapshot>> {
        summary::latest_year_snapshot(records)
    }

    /// Compute every view.
    pub fn compute_all(&self, records: &[ImputedRecord]) -> Result<DerivedViews> {
        ensure_non_empty(records, "derived views")?;

        let views = DerivedViews {
            yearly: self.yearly(records)?,
            regional_yearly: self.regional_yearly(records)?,
            top_countries: self.top_countries(records)?,
            correlation: self.correlation(records)?,
            summaries: self.summarize(records)?,
            latest_year: self.latest_year_snapshot(records)?,
        };

        debug!(
            "Derived {} yearly rows, {} regional rows, {} ranked countries",
            views.yearly.len(),
            views.regional_yearly.len(),
            views.top_countries.len()
        );
        info!("Aggregated {} records", records.len());
        Ok(views)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::imputed;
    use super::*;

    #[test]
    fn test_compute_all_on_scenario() {
        let records = vec![
            imputed("A", "Europe", Some(2019), 100.0, 1.0),
            imputed("A", "Europe", Some(2020), 200.0, 2.0),
            imputed("A", "Europe", Some(2021), 300.0, 3.0),
            imputed("B", "", Some(2021), 50.0, 10.0),
        ];

        let views = AggregationEngine::default().compute_all(&records).unwrap();

        assert_eq!(views.yearly.len(), 3);
        assert_eq!(views.yearly[0].year, 2019);
        assert_eq!(views.yearly[0].total_co2_kilotons, 100.0);
        assert_eq!(views.regional_yearly.len(), 3);
        assert_eq!(views.top_countries[0].country, "B");
        assert_eq!(views.summaries.len(), 2);

        let latest = views.latest_year.unwrap();
        assert_eq!(latest.year, 2021);
        assert_eq!(latest.records.len(), 2);
    }

    #[test]
    fn test_every_view_rejects_empty_input() {
        let engine = AggregationEngine::default();
        assert!(engine.yearly(&[]).is_err());
        assert!(engine.regional_yearly(&[]).is_err());
        assert!(engine.top_countries(&[]).is_err());
        assert!(engine.correlation(&[]).is_err());
        assert!(engine.summarize(&[]).is_err());
        assert!(engine.latest_year_snapshot(&[]).is_err());

        let err = engine.compute_all(&[]).unwrap_err();
        assert_eq!(err.error_code(), "EMPTY_INPUT");
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_accumulator_means() {
        let mut acc = Accumulator::default();
        acc.add(&imputed("A", "X", None, 10.0, 1.0));
        acc.add(&imputed("A", "X", None, 30.0, 2.0));
        assert_eq!(acc.total_kilotons(), 40.0);
        assert_eq!(acc.mean_kilotons(), 20.0);
        assert_eq!(acc.mean_per_capita(), 1.5);
    }
}
