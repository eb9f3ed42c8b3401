//! Presentation seam for the cleaned table and derived views.
//!
//! Rendering is not done here. A [`PresentationAdapter`] receives the
//! cleaned records and [`DerivedViews`]; the shipped [`ChartDataExporter`]
//! writes one chart-ready CSV per chart plus a JSON manifest describing how
//! each table is meant to be plotted.

use crate::aggregation::DerivedViews;
use crate::error::{Result, ResultExt};
use crate::frames;
use crate::types::ImputedRecord;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Sub-directory of the output directory holding chart data.
pub const CHARTS_DIR: &str = "charts";

/// File name of the chart manifest.
pub const MANIFEST_FILE: &str = "charts_manifest.json";

/// Consumer of the pipeline's results.
pub trait PresentationAdapter {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Present the cleaned records and their derived views.
    fn present(&self, cleaned: &[ImputedRecord], views: &DerivedViews) -> Result<ChartManifest>;
}

/// How a chart draws its table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartStyle {
    Line,
    Bar,
    Scatter,
    Heatmap,
}

/// The charts of the emissions analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    GlobalCo2Trend,
    GlobalCo2PerCapitaTrend,
    RegionalCo2Trend,
    Top10PerCapita,
    ScatterLatestYear,
    CorrelationHeatmap,
}

impl ChartKind {
    pub const ALL: [ChartKind; 6] = [
        ChartKind::GlobalCo2Trend,
        ChartKind::GlobalCo2PerCapitaTrend,
        ChartKind::RegionalCo2Trend,
        ChartKind::Top10PerCapita,
        ChartKind::ScatterLatestYear,
        ChartKind::CorrelationHeatmap,
    ];

    /// File stem of the chart's data table.
    pub fn file_stem(&self) -> &'static str {
        match self {
            Self::GlobalCo2Trend => "global_co2_trend",
            Self::GlobalCo2PerCapitaTrend => "global_co2_per_capita_trend",
            Self::RegionalCo2Trend => "regional_co2_trend",
            Self::Top10PerCapita => "top10_per_capita",
            Self::ScatterLatestYear => "scatter_latest_year",
            Self::CorrelationHeatmap => "correlation_heatmap",
        }
    }

    /// Chart title. The scatter title names the year it shows.
    pub fn title(&self, latest_year: Option<i32>) -> String {
        match self {
            Self::GlobalCo2Trend => "Global CO₂ Emissions Over Time (Kilotons)".to_string(),
            Self::GlobalCo2PerCapitaTrend => "Global Average CO₂ Per Capita Over Time".to_string(),
            Self::RegionalCo2Trend => "Regional CO₂ Emissions Over Time".to_string(),
            Self::Top10PerCapita => {
                "Top 10 Countries by Average CO₂ Emissions Per Capita".to_string()
            }
            Self::ScatterLatestYear => match latest_year {
                Some(year) => format!("CO₂ Kilotons vs Per Capita ({})", year),
                None => "CO₂ Kilotons vs Per Capita".to_string(),
            },
            Self::CorrelationHeatmap => "Correlation: CO₂ Kilotons vs Per Capita".to_string(),
        }
    }

    pub fn style(&self) -> ChartStyle {
        match self {
            Self::GlobalCo2Trend | Self::GlobalCo2PerCapitaTrend | Self::RegionalCo2Trend => {
                ChartStyle::Line
            }
            Self::Top10PerCapita => ChartStyle::Bar,
            Self::ScatterLatestYear => ChartStyle::Scatter,
            Self::CorrelationHeatmap => ChartStyle::Heatmap,
        }
    }

    /// Columns for the x axis, the y axis and the optional colour grouping.
    fn encoding(&self) -> (&'static str, &'static str, Option<&'static str>) {
        match self {
            Self::GlobalCo2Trend => ("year", "total_co2_kilotons", None),
            Self::GlobalCo2PerCapitaTrend => ("year", "avg_co2_per_capita", None),
            Self::RegionalCo2Trend => ("year", "total_co2_kilotons", Some("region")),
            Self::Top10PerCapita => ("country", "avg_co2_per_capita", None),
            Self::ScatterLatestYear => ("co2_kilotons", "co2_per_capita", Some("region")),
            Self::CorrelationHeatmap => ("field", "field", None),
        }
    }
}

/// One written chart table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartEntry {
    pub kind: ChartKind,
    pub title: String,
    pub style: ChartStyle,
    /// File name relative to the charts directory.
    pub file: String,
    pub x: String,
    pub y: String,
    pub color: Option<String>,
    pub rows: usize,
}

/// Description of every chart table written in one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartManifest {
    pub charts: Vec<ChartEntry>,
}

impl ChartManifest {
    pub fn get(&self, kind: ChartKind) -> Option<&ChartEntry> {
        self.charts.iter().find(|c| c.kind == kind)
    }
}

/// Writes chart-ready CSV tables under `<output_dir>/charts`.
#[derive(Debug, Clone)]
pub struct ChartDataExporter {
    charts_dir: PathBuf,
}

impl ChartDataExporter {
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        Self {
            charts_dir: output_dir.as_ref().join(CHARTS_DIR),
        }
    }

    pub fn charts_dir(&self) -> &Path {
        &self.charts_dir
    }

    fn table_for(&self, kind: ChartKind, views: &DerivedViews) -> Result<Option<DataFrame>> {
        let frame = match kind {
            ChartKind::GlobalCo2Trend | ChartKind::GlobalCo2PerCapitaTrend => {
                frames::yearly_frame(&views.yearly)?
            }
            ChartKind::RegionalCo2Trend => frames::regional_frame(&views.regional_yearly)?,
            ChartKind::Top10PerCapita => frames::country_frame(&views.top_countries)?,
            ChartKind::ScatterLatestYear => match &views.latest_year {
                Some(snapshot) => frames::snapshot_frame(snapshot)?,
                None => return Ok(None),
            },
            ChartKind::CorrelationHeatmap => frames::correlation_frame(&views.correlation)?,
        };
        Ok(Some(frame))
    }

    fn write_table(&self, file_name: &str, df: &mut DataFrame) -> Result<()> {
        let path = self.charts_dir.join(file_name);
        let mut file = File::create(&path)?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(df)
            .context(format!("Writing chart table {}", path.display()))?;
        debug!("Chart table saved: {}", path.display());
        Ok(())
    }
}

impl PresentationAdapter for ChartDataExporter {
    fn name(&self) -> &str {
        "chart-data"
    }

    fn present(&self, _cleaned: &[ImputedRecord], views: &DerivedViews) -> Result<ChartManifest> {
        fs::create_dir_all(&self.charts_dir)?;

        let latest_year = views.latest_year.as_ref().map(|s| s.year);
        let mut manifest = ChartManifest::default();

        for kind in ChartKind::ALL {
            let Some(mut df) = self.table_for(kind, views)? else {
                warn!("No dated records; skipping chart '{}'", kind.file_stem());
                continue;
            };

            let file = format!("{}.csv", kind.file_stem());
            self.write_table(&file, &mut df)?;

            let (x, y, color) = kind.encoding();
            manifest.charts.push(ChartEntry {
                kind,
                title: kind.title(latest_year),
                style: kind.style(),
                file,
                x: x.to_string(),
                y: y.to_string(),
                color: color.map(str::to_string),
                rows: df.height(),
            });
        }

        let manifest_path = self.charts_dir.join(MANIFEST_FILE);
        let writer = File::create(&manifest_path)?;
        serde_json::to_writer_pretty(writer, &manifest)?;

        info!(
            "{} chart tables written to {}",
            manifest.charts.len(),
            self.charts_dir.display()
        );
        Ok(manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::AggregationEngine;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn record(country: &str, region: &str, year: Option<i32>, kt: f64, pc: f64) -> ImputedRecord {
        ImputedRecord {
            country: country.to_string(),
            region: region.to_string(),
            date: year.and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1)),
            year,
            co2_kilotons: kt,
            co2_per_capita: pc,
        }
    }

    #[test]
    fn test_titles_match_charts() {
        assert_eq!(
            ChartKind::ScatterLatestYear.title(Some(2021)),
            "CO₂ Kilotons vs Per Capita (2021)"
        );
        assert_eq!(ChartKind::Top10PerCapita.style(), ChartStyle::Bar);
        assert_eq!(ChartKind::RegionalCo2Trend.file_stem(), "regional_co2_trend");
    }

    #[test]
    fn test_exporter_writes_every_chart() {
        let dir = TempDir::new().unwrap();
        let records = vec![
            record("A", "Europe", Some(2019), 100.0, 1.0),
            record("A", "Europe", Some(2020), 200.0, 2.0),
            record("B", "Asia", Some(2020), 50.0, 4.0),
        ];
        let views = AggregationEngine::default().compute_all(&records).unwrap();

        let exporter = ChartDataExporter::new(dir.path());
        let manifest = exporter.present(&records, &views).unwrap();

        assert_eq!(manifest.charts.len(), 6);
        for kind in ChartKind::ALL {
            let path = exporter.charts_dir().join(format!("{}.csv", kind.file_stem()));
            assert!(path.exists(), "missing {}", path.display());
        }
        assert!(exporter.charts_dir().join(MANIFEST_FILE).exists());

        let scatter = manifest.get(ChartKind::ScatterLatestYear).unwrap();
        assert_eq!(scatter.rows, 2);
        assert_eq!(scatter.title, "CO₂ Kilotons vs Per Capita (2020)");
    }

    #[test]
    fn test_exporter_skips_scatter_without_years() {
        let dir = TempDir::new().unwrap();
        let records = vec![record("A", "Europe", None, 100.0, 1.0)];
        let views = AggregationEngine::default().compute_all(&records).unwrap();

        let manifest = ChartDataExporter::new(dir.path())
            .present(&records, &views)
            .unwrap();

        assert_eq!(manifest.charts.len(), 5);
        assert!(manifest.get(ChartKind::ScatterLatestYear).is_none());
    }
}
