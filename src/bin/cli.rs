//! edsurv CLI
//!
//! Offline access to the surveillance pipeline:
//! - List selector options
//! - Print filtered and aggregated series
//! - Render the dashboard figures or a static page
//! - Generate a config file

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use edsurv::config::Config;
use edsurv::dashboard::{render_dashboard, render_page, run_pipeline, Controls, SelectorQuery};
use edsurv::data::Dataset;
use edsurv::query::AggregatedSeries;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "edsurv-cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Query emergency-department syndrome surveillance data")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search the standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Time series TSV, overrides the config
    #[arg(long, global = true)]
    pub timeseries: Option<PathBuf>,

    /// Locations TSV, overrides the config
    #[arg(long, global = true)]
    pub locations: Option<PathBuf>,
}

/// Selector values, each defaulting like the dashboard does
#[derive(Args)]
pub struct SelectorArgs {
    /// Syndrome (default: first in file)
    #[arg(short, long)]
    pub syndrome: Option<String>,
    /// Emergency department type (default: first in file)
    #[arg(short, long)]
    pub ed_type: Option<String>,
    /// Start date, YYYY-MM-DD or DD.MM.YYYY (default: earliest)
    #[arg(long)]
    pub start: Option<String>,
    /// End date, YYYY-MM-DD or DD.MM.YYYY (default: latest)
    #[arg(long)]
    pub end: Option<String>,
    /// Aggregation: daily, weekly, monthly
    #[arg(short, long)]
    pub granularity: Option<String>,
}

impl From<SelectorArgs> for SelectorQuery {
    fn from(args: SelectorArgs) -> Self {
        SelectorQuery {
            syndrome: args.syndrome,
            ed_type: args.ed_type,
            start: args.start,
            end: args.end,
            granularity: args.granularity,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// List selectable syndromes, ed_types and the date range
    Options,

    /// Print the filtered and aggregated series
    Series {
        #[command(flatten)]
        selector: SelectorArgs,
        /// Output format (table, csv, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Render the dashboard as figure JSON or a static HTML page
    Render {
        #[command(flatten)]
        selector: SelectorArgs,
        /// Write a complete HTML page instead of JSON
        #[arg(long)]
        html: bool,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Commands::Config { output } = &cli.command {
        let config = edsurv::config::generate_default_config();
        return write_output(output.as_deref(), &config, "Config");
    }

    let (mut config, source) =
        Config::resolve(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(path) = cli.timeseries {
        config.data.timeseries_path = path;
    }
    if let Some(path) = cli.locations {
        config.data.locations_path = path;
    }

    edsurv::logging::init_stderr(&config.logging);
    tracing::debug!("Config: {}", source);

    let dataset = config.data.load_dataset().with_context(|| {
        format!(
            "Failed to load {:?} and {:?}",
            config.data.timeseries_path, config.data.locations_path
        )
    })?;

    match cli.command {
        Commands::Options => print_options(&dataset),

        Commands::Series { selector, format } => {
            let (resolved, series) = run_pipeline(&dataset, &selector.into())?;

            match format.as_str() {
                "json" => {
                    let body = serde_json::json!({
                        "selection": resolved.selection,
                        "granularity": resolved.granularity,
                        "rows": series.rows,
                    });
                    println!("{}", serde_json::to_string_pretty(&body)?);
                }
                "csv" => print!("{}", series.to_csv()?),
                _ => print_table(&series),
            }
        }

        Commands::Render {
            selector,
            html,
            output,
        } => {
            let view = render_dashboard(&dataset, &selector.into())?;
            let content = if html {
                render_page(&view)
            } else {
                serde_json::to_string_pretty(&view)?
            };
            write_output(output.as_deref(), &content, "Dashboard")?;
        }

        // Written above without loading data
        Commands::Config { .. } => {}
    }

    Ok(())
}

fn write_output(path: Option<&Path>, content: &str, what: &str) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            // Create parent directory if needed
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Cannot create {:?}", parent))?;
            }
            std::fs::write(path, content).with_context(|| format!("Cannot write {:?}", path))?;
            println!("{} written to {:?}", what, path);
        }
        None => {
            print!("{}", content);
        }
    }
    Ok(())
}

fn print_options(dataset: &Dataset) {
    let controls = Controls::from_dataset(dataset);

    if controls.is_empty() {
        println!("No selectable data in the time series.");
        return;
    }

    println!("Syndromes:");
    for syndrome in &controls.syndromes {
        println!("  {}", syndrome);
    }
    println!();
    println!("ED types:");
    for ed_type in &controls.ed_types {
        println!("  {}", ed_type);
    }
    if let Some(bounds) = controls.date_bounds {
        println!();
        println!(
            "Date range: {} - {}",
            bounds.min.format("%d.%m.%Y"),
            bounds.max.format("%d.%m.%Y")
        );
    }
    println!();
    println!("Granularities:");
    for option in &controls.granularities {
        println!("  {:<8} {}", option.value.to_string(), option.label);
    }
    println!();
    println!(
        "{} time series rows, {} locations",
        dataset.timeseries().len(),
        dataset.locations().len()
    );
}

fn print_table(series: &AggregatedSeries) {
    if series.is_empty() {
        println!("No data for the selected filters");
        return;
    }

    let measures = series.measure_columns();

    // Header
    print!("{:<12} | {:<10} | {:<14}", "Date", "Age group", "Relative cases");
    for name in &measures {
        print!(" | {:<12}", name);
    }
    println!();

    // Separator
    println!("{}", "-".repeat(44 + measures.len() * 15));

    // Data rows
    for row in &series.rows {
        print!(
            "{:<12} | {:<10} | {:<14}",
            row.date.format("%Y-%m-%d").to_string(),
            row.age_group,
            format_value(row.relative_cases)
        );
        for name in &measures {
            print!(" | {:<12}", format_value(row.measures.get(*name).copied().flatten()));
        }
        println!();
    }
}

fn format_value(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.2}", v))
        .unwrap_or_else(|| "-".to_string())
}
