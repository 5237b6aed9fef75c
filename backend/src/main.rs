//! Coviddash CLI - normalize and reshape COVID-19 case tables
//!
//! ```bash
//! coviddash serve                         # Start HTTP server (port 3000)
//! coviddash report 03-23-2020             # Normalized daily report as JSON
//! coviddash map 2020-03-15 -c Deaths      # Map view data
//! coviddash timeseries --start 2020-03-01 # Tidy state time series
//! coviddash countries                     # Country time series
//! ```
//!
//! Data comes from upstream GitHub unless `COVIDDASH_DATA_DIR` points at a
//! local mirror.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use coviddash::api::TimeSeriesResponse;
use coviddash::{
    map_view, source_from_config, CaseType, DailyReportNormalizer, DashboardConfig, DateWindow,
    TimeSeriesReshaper,
};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "coviddash")]
#[command(about = "Normalize US COVID-19 case reports for dashboards", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalized daily report for a date
    Report {
        /// Date (MM-DD-YYYY, MM-DD-YY or YYYY-MM-DD)
        date: String,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Map view (state choropleth or county scatter) for a date
    Map {
        /// Date (MM-DD-YYYY, MM-DD-YY or YYYY-MM-DD)
        date: String,

        /// Confirmed, Deaths, Recovered or Active
        #[arg(short, long, default_value = "Confirmed")]
        case_type: CaseType,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Tidy per-state time series
    Timeseries {
        /// Window start (default: configured window)
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Window end (default: configured window)
        #[arg(long)]
        end: Option<NaiveDate>,

        /// Keep every date
        #[arg(long, conflicts_with_all = ["start", "end"])]
        all: bool,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Country time series for the configured allow-list
    Countries {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on (default: COVIDDASH_PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match DashboardConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Report { date, output } => cmd_report(&config, &date, output.as_deref()).await,

        Commands::Map {
            date,
            case_type,
            output,
        } => cmd_map(&config, &date, case_type, output.as_deref()).await,

        Commands::Timeseries {
            start,
            end,
            all,
            output,
        } => cmd_timeseries(&config, start, end, all, output.as_deref()).await,

        Commands::Countries { output } => cmd_countries(&config, output.as_deref()).await,

        Commands::Serve { port } => cmd_serve(config, port).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

async fn cmd_report(
    config: &DashboardConfig,
    date: &str,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let normalizer = DailyReportNormalizer::from_config(source_from_config(config)?, config);
    let report = normalizer.normalize_str(date).await?;

    eprintln!("   Date: {}", report.date);
    eprintln!("   Granularity: {:?}", report.granularity);
    eprintln!("✅ {} records", report.records.len());

    write_json(&report, output)
}

async fn cmd_map(
    config: &DashboardConfig,
    date: &str,
    case_type: CaseType,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let normalizer = DailyReportNormalizer::from_config(source_from_config(config)?, config);
    let report = normalizer.normalize_str(date).await?;
    let view = map_view(&report, case_type);

    eprintln!("🗺️  {} map entries for {} ({})", view.len(), report.date, case_type);

    write_json(&view, output)
}

async fn cmd_timeseries(
    config: &DashboardConfig,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    all: bool,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let window = if all {
        None
    } else {
        let window = DateWindow::new(
            start.unwrap_or(config.history_window.start),
            end.unwrap_or(config.history_window.end),
        );
        if window.start > window.end {
            return Err(format!("start {} is after end {}", window.start, window.end).into());
        }
        Some(window)
    };

    let reshaper = TimeSeriesReshaper::from_config(source_from_config(config)?, config).with_window(window);
    let result = reshaper.build_state_time_series().await;

    for (case_type, error) in &result.failures {
        eprintln!("⚠️  {} unavailable: {}", case_type, error);
    }
    if result.series.is_empty() {
        return Err("no case type could be loaded".into());
    }

    write_json(&TimeSeriesResponse::new(result, window), output)
}

async fn cmd_countries(
    config: &DashboardConfig,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let reshaper = TimeSeriesReshaper::from_config(source_from_config(config)?, config);
    let records = reshaper.build_country_time_series().await?;

    eprintln!("🌍 {} rows for {}", records.len(), config.countries.join(", "));

    write_json(&records, output)
}

async fn cmd_serve(mut config: DashboardConfig, port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(port) = port {
        config.port = port;
    }
    coviddash::server::start_server(config).await
}

fn write_json<T: Serialize>(value: &T, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let content = serde_json::to_string_pretty(value)?;
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
