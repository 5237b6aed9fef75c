//! # Coviddash - US COVID-19 report normalization for dashboards
//!
//! Coviddash fetches the public Johns Hopkins CSSE case tables and reshapes
//! them into per-state / per-county records and tidy time series, ready
//! for choropleth, scatter and trend charts.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌──────────────────┐     ┌─────────────┐
//! │ TableSource │────▶│   Parser    │────▶│  LocationFilter  │────▶│ Normalizer  │──▶ DailyReport
//! │ (http/file) │     │ (auto-enc)  │     │ (states/FIPS)    │  └─▶│ Reshaper    │──▶ TimeSeriesPoint
//! └─────────────┘     └─────────────┘     └──────────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use coviddash::{DailyReportNormalizer, DashboardConfig, source_from_config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DashboardConfig::from_env()?;
//!     let normalizer = DailyReportNormalizer::from_config(source_from_config(&config)?, &config);
//!     let report = normalizer.normalize_str("03-23-2020").await?;
//!     println!("{} counties", report.records.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Typed errors (source / schema / data format)
//! - [`config`] - Defaults and `COVIDDASH_*` overrides
//! - [`models`] - Domain models (CaseType, LocationKey, records, series points)
//! - [`parser`] - CSV parsing with encoding detection
//! - [`source`] - HTTP, local-mirror and in-memory table sources
//! - [`filter`] - US state / county restriction
//! - [`transform`] - Daily report normalization and time-series reshaping
//! - [`dashboard`] - Map view data
//! - [`api`] - HTTP API server

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Input
pub mod parser;
pub mod source;

// Transformation
pub mod filter;
pub mod transform;

// Presentation
pub mod dashboard;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Errors & config
// =============================================================================

pub use config::DashboardConfig;
pub use error::{
    ConfigError, DataFormatError, ErrorKind, PipelineError, PipelineResult, SchemaError,
    ServerError, SourceError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    CaseType, Coordinates, CountryRecord, DailyReport, DateWindow, LocationKey,
    NormalizedLocationRecord, RawLocationRecord, ReportGranularity, TimeSeriesPoint,
};

// =============================================================================
// Re-exports - Parsing & sources
// =============================================================================

pub use parser::{parse_bytes_auto, parse_table, RawTable};
pub use source::{
    source_from_config, AnySource, FileSource, HttpSource, MemorySource, Resource, TableSource,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use filter::{LocationFilter, StateAbbreviations};
pub use transform::{
    normalize_table, parse_report_date, reshape_state_table, DailyReportNormalizer,
    StateTimeSeries, TimeSeriesReshaper,
};
pub use dashboard::{map_view, MapView};

// Server
pub mod server {
    pub use crate::api::server::start_server;
}
