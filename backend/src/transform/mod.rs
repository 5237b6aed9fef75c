//! Transformation module.
//!
//! This module turns raw upstream tables into dashboard-ready data:
//! - Values: date, count and coordinate coercion
//! - Daily: per-date report normalization (state or county rows)
//! - Timeseries: wide per-case-type tables to tidy long form

pub mod daily;
pub mod timeseries;
pub mod values;

pub use daily::{normalize_table, DailyReportNormalizer};
pub use timeseries::{reshape_state_table, select_countries, StateTimeSeries, TimeSeriesReshaper};
pub use values::{parse_date_label, parse_report_date};
