//! CLI entry point for the CO₂ emissions pipeline.

use anyhow::{Result, anyhow};
use clap::{Parser, ValueEnum};
use dotenv::dotenv;
use emission_processing::config::{
    DEFAULT_MAX_ROUNDS, DEFAULT_RANDOM_SEED, DEFAULT_TOLERANCE, DEFAULT_TOP_N,
};
use emission_processing::{
    ChartDataExporter, ChartManifest, EmissionsReport, ImputationOrder, InitialStrategy,
    NumericField, Pipeline, PipelineConfig, PipelineResult, PresentationAdapter, ReportGenerator,
};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// CLI-compatible imputation order enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliImputationOrder {
    /// Fields with the fewest missing values first
    Ascending,
    /// Fields with the most missing values first
    Descending,
    /// Canonical column order
    Roman,
    /// Seeded shuffle every round
    Random,
}

impl From<CliImputationOrder> for ImputationOrder {
    fn from(cli: CliImputationOrder) -> Self {
        match cli {
            CliImputationOrder::Ascending => ImputationOrder::Ascending,
            CliImputationOrder::Descending => ImputationOrder::Descending,
            CliImputationOrder::Roman => ImputationOrder::Roman,
            CliImputationOrder::Random => ImputationOrder::Random,
        }
    }
}

/// CLI-compatible initial fill strategy enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliInitialStrategy {
    /// Seed absent values with the column mean
    Mean,
    /// Seed absent values with the column median
    Median,
}

impl From<CliInitialStrategy> for InitialStrategy {
    fn from(cli: CliInitialStrategy) -> Self {
        match cli {
            CliInitialStrategy::Mean => InitialStrategy::Mean,
            CliInitialStrategy::Median => InitialStrategy::Median,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "CO₂ emissions imputation and aggregation pipeline",
    long_about = "Cleans a national CO₂ emissions dataset and derives yearly, regional,\n\
                  per-country and correlation views.\n\n\
                  ENVIRONMENT VARIABLES (also read from .env):\n  \
                  CO2_INPUT                Input CSV path\n  \
                  CO2_OUTPUT_DIR           Output directory\n  \
                  CO2_IMPUTER_MAX_ROUNDS   Imputation round limit\n  \
                  CO2_IMPUTER_SEED         Imputer random seed\n\n\
                  EXAMPLES:\n  \
                  # Run on the default dataset\n  \
                  emission-processing\n\n  \
                  # Custom input and output, machine-readable summary\n  \
                  emission-processing -i data.csv -o results/ --json\n\n  \
                  # Posterior sampling with a different seed\n  \
                  emission-processing --sample-posterior --seed 7"
)]
struct Args {
    /// Path to the raw emissions CSV
    #[arg(short, long, env = "CO2_INPUT", default_value = "dataset/carbon_emissions.csv")]
    input: String,

    /// Output directory for the cleaned table, chart data and reports
    #[arg(short, long, env = "CO2_OUTPUT_DIR", default_value = "outputs")]
    output: String,

    /// Maximum number of imputation rounds
    #[arg(long, env = "CO2_IMPUTER_MAX_ROUNDS", default_value_t = DEFAULT_MAX_ROUNDS)]
    max_rounds: usize,

    /// Seed for every random draw of the imputer
    #[arg(long, env = "CO2_IMPUTER_SEED", default_value_t = DEFAULT_RANDOM_SEED)]
    seed: u64,

    /// Convergence tolerance, relative to the largest observed value
    #[arg(long, default_value_t = DEFAULT_TOLERANCE)]
    tolerance: f64,

    /// Number of countries kept by the per-capita ranking
    #[arg(long, default_value_t = DEFAULT_TOP_N)]
    top_n: usize,

    /// Order in which fields are imputed within a round
    #[arg(long, value_enum, default_value = "ascending")]
    imputation_order: CliImputationOrder,

    /// How absent values are seeded before the first round
    #[arg(long, value_enum, default_value = "mean")]
    initial_strategy: CliInitialStrategy,

    /// Draw imputed values from the predictive distribution instead of
    /// using its mean
    #[arg(long)]
    sample_posterior: bool,

    /// Skip writing chart data tables
    #[arg(long)]
    no_charts: bool,

    /// Write a detailed JSON report to the output directory
    ///
    /// The report will be saved as <input_name>_report.json
    #[arg(short = 'r', long)]
    emit_report: bool,

    /// Output JSON to stdout instead of human-readable summary
    ///
    /// Disables all logs; only outputs the final JSON report.
    #[arg(long)]
    json: bool,

    /// Suppress progress output (only show warnings, errors and final result)
    #[arg(short, long)]
    quiet: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    // Load .env first so its values act as flag fallbacks
    dotenv().ok();

    let args = Args::parse();
    init_logging(&args.log_level, args.quiet, args.json);

    if !Path::new(&args.input).exists() {
        return Err(anyhow!("Input file not found: {}", args.input));
    }

    info!("Loading dataset from: {}", args.input);
    let data = load_csv_with_fallbacks(&args.input)?;
    info!("Dataset loaded successfully: {:?}", data.shape());

    let config = PipelineConfig::builder()
        .output_dir(&args.output)
        .max_rounds(args.max_rounds)
        .random_seed(args.seed)
        .tolerance(args.tolerance)
        .imputation_order(args.imputation_order.into())
        .initial_strategy(args.initial_strategy.into())
        .sample_posterior(args.sample_posterior)
        .top_n(args.top_n)
        .build()?;

    let pipeline = Pipeline::builder().config(config.clone()).build()?;

    run_pipeline(&pipeline, &config, &args, data)
}

/// Run the pipeline and write its artifacts.
fn run_pipeline(
    pipeline: &Pipeline,
    config: &PipelineConfig,
    args: &Args,
    data: DataFrame,
) -> Result<()> {
    info!("{}", "=".repeat(80));
    info!("Starting emissions pipeline...");
    info!("{}", "=".repeat(80));

    let original_shape = data.shape();
    let result = match pipeline.process(data) {
        Ok(result) => result,
        Err(e) => {
            if args.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({ "error": e }))?
                );
            }
            error!("Pipeline failed: {}", e);
            return Err(anyhow!("Pipeline failed [{}]: {}", e.error_code(), e));
        }
    };

    handle_pipeline_output(&result, config, original_shape, args)
}

/// Handle pipeline output based on CLI flags.
///
/// Output behavior:
/// - Always: write the cleaned table and summary statistics (and chart data
///   unless `--no-charts`)
/// - Default: Print human-readable summary to stdout
/// - `--json`: Print JSON to stdout only (no logs)
/// - `--emit-report`: Write JSON report to file
fn handle_pipeline_output(
    result: &PipelineResult,
    config: &PipelineConfig,
    original_shape: (usize, usize),
    args: &Args,
) -> Result<()> {
    let generator = ReportGenerator::new(PathBuf::from(&args.output));
    let cleaned_path = generator.write_cleaned(result)?;
    generator.write_summary_statistics(&result.views)?;

    let manifest = if args.no_charts {
        None
    } else {
        let exporter = ChartDataExporter::new(&args.output);
        debug!("Presenting results with '{}'", exporter.name());
        Some(exporter.present(&result.records, &result.views)?)
    };

    let report = ReportGenerator::build_report(
        &args.input,
        Some(&cleaned_path.to_string_lossy()),
        result,
        config,
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if args.emit_report {
        let input_stem = extract_file_stem(&args.input);
        let report_path = generator.write_report_to_file(&report, &input_stem)?;
        info!("Report written to: {}", report_path.display());
    }

    print_human_readable_summary(&report, manifest.as_ref(), original_shape, args);

    Ok(())
}

/// Extract the file stem (name without extension) from a path.
fn extract_file_stem(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output")
        .to_string()
}

/// Print a human-readable summary of the run.
///
/// This is the default output when `--json` is not specified.
fn print_human_readable_summary(
    report: &EmissionsReport,
    manifest: Option<&ChartManifest>,
    original_shape: (usize, usize),
    args: &Args,
) {
    let summary = &report.processing_summary;
    let views = &report.views;

    println!();
    println!("{}", "=".repeat(80));
    println!("EMISSIONS PIPELINE COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    println!(
        "Input:  {} ({} rows x {} columns)",
        report.input_file, original_shape.0, original_shape.1
    );
    if let Some(ref output_file) = report.output_file {
        println!("Output: {} ({} rows)", output_file, summary.rows);
    }
    println!();

    println!("Missing Values (before -> after):");
    println!(
        "  co2_kilotons:   {} -> {}",
        report.missing_before.co2_kilotons, report.missing_after.co2_kilotons
    );
    println!(
        "  co2_per_capita: {} -> {}",
        report.missing_before.co2_per_capita, report.missing_after.co2_per_capita
    );
    println!("  Year:           {}", report.missing_after.year);
    println!();

    println!("Imputation:");
    println!("  Values imputed: {}", summary.values_imputed);
    println!(
        "  Rounds: {} ({})",
        summary.imputation_rounds,
        if summary.imputation_converged {
            "converged"
        } else {
            "round limit reached"
        }
    );
    println!("  Duration: {}ms", summary.duration_ms);
    println!();

    println!("Derived Views:");
    if let (Some(first), Some(last)) = (views.yearly.first(), views.yearly.last()) {
        println!(
            "  Yearly: {} years ({}-{})",
            views.yearly.len(),
            first.year,
            last.year
        );
    }
    println!("  Regional: {} region-years", views.regional_yearly.len());
    if let Some(r) = views
        .correlation
        .get(NumericField::Co2Kilotons, NumericField::Co2PerCapita)
    {
        println!("  Correlation (kilotons vs per capita): {:.3}", r);
    }
    if let Some(latest) = &views.latest_year {
        println!(
            "  Latest year: {} ({} records)",
            latest.year,
            latest.records.len()
        );
    }
    println!();

    if !views.summaries.is_empty() {
        println!("Summary Statistics:");
        println!(
            "  {:<16} {:>6} {:>14} {:>14} {:>12} {:>12} {:>12} {:>12} {:>14}",
            "field", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
        );
        for s in &views.summaries {
            println!(
                "  {:<16} {:>6} {:>14.3} {:>14.3} {:>12.3} {:>12.3} {:>12.3} {:>12.3} {:>14.3}",
                s.field.name(),
                s.count,
                s.mean,
                s.std,
                s.min,
                s.q25,
                s.median,
                s.q75,
                s.max
            );
        }
        println!();
    }

    if !views.top_countries.is_empty() {
        println!("Top Countries by Average CO₂ Per Capita:");
        for (rank, country) in views.top_countries.iter().enumerate() {
            println!(
                "  {:>2}. {:<30} {:>10.3}",
                rank + 1,
                truncate_str(&country.country, 30),
                country.avg_co2_per_capita
            );
        }
        println!();
    }

    if let Some(manifest) = manifest {
        println!(
            "Chart data: {} tables in {}/charts",
            manifest.charts.len(),
            args.output
        );
        println!();
    }

    if !summary.warnings.is_empty() {
        println!("Warnings:");
        for warning in &summary.warnings {
            println!("  ! {}", warning);
        }
        println!();
    }

    println!("Use --json for machine-readable output");
    println!("Use --emit-report to save detailed JSON report");
    println!("{}", "=".repeat(80));
}

/// Truncate a string to max length with ellipsis
fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Load CSV with multiple fallback strategies
fn load_csv_with_fallbacks(path: &str) -> Result<DataFrame> {
    // Strategy 1: Standard loading with quote handling
    match CsvReadOptions::default()
        .with_infer_schema_length(Some(100))
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()
    {
        Ok(df) => return Ok(df),
        Err(e) => {
            debug!("Standard loading failed: {}", e);
        }
    }

    // Strategy 2: Read every column as text; the normalizer parses numbers
    match CsvReadOptions::default()
        .with_infer_schema_length(Some(0))
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()
    {
        Ok(df) => return Ok(df),
        Err(e) => {
            debug!("Loading as text failed: {}", e);
        }
    }

    // Strategy 3: Pre-clean content
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let cleaned = clean_csv_content(&content);
            let cursor = std::io::Cursor::new(cleaned);

            CsvReadOptions::default()
                .with_infer_schema_length(Some(0))
                .with_has_header(true)
                .into_reader_with_file_handle(cursor)
                .finish()
                .map_err(|e| e.into())
        }
        Err(e) => {
            error!("Could not read file: {}", e);
            Err(e.into())
        }
    }
}

/// Clean CSV content
fn clean_csv_content(content: &str) -> String {
    content
        .replace("\"\"\"", "\"")
        .replace("\"\"", "\"")
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
