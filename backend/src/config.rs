//! Application configuration.
//!
//! Defaults point at the public Johns Hopkins CSSE repository and reproduce
//! the dashboard's historical behaviour. Every value can be overridden from
//! the environment (or a `.env` file) via `COVIDDASH_*` variables.

use chrono::NaiveDate;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::models::DateWindow;

/// Base URL of the daily report files (`{base}/MM-DD-YYYY.csv`).
pub const DAILY_REPORT_URL: &str =
    "https://raw.githubusercontent.com/CSSEGISandData/COVID-19/master/csse_covid_19_data/csse_covid_19_daily_reports";

/// Base URL of the wide time-series files.
pub const TIME_SERIES_URL: &str =
    "https://raw.githubusercontent.com/CSSEGISandData/COVID-19/master/csse_covid_19_data/csse_covid_19_time_series";

/// Countries-aggregated table (`Date,Country,Confirmed,Recovered,Deaths`).
pub const COUNTRIES_URL: &str =
    "https://raw.githubusercontent.com/datasets/covid-19/master/data/countries-aggregated.csv";

/// Last date (inclusive) on which upstream daily reports carry one row per state.
/// From `03-22-2020.csv` on, reports carry one row per county (`FIPS`, `Admin2`).
pub const DEFAULT_STATE_LEVEL_CUTOFF: (i32, u32, u32) = (2020, 3, 21);

/// Default historical window of the state time series.
pub const DEFAULT_WINDOW_START: (i32, u32, u32) = (2020, 3, 10);
pub const DEFAULT_WINDOW_END: (i32, u32, u32) = (2020, 3, 22);

/// Earliest date the dashboard lets users pick.
pub const DEFAULT_MIN_REPORT_DATE: (i32, u32, u32) = (2020, 3, 10);

/// Countries shown in the country trend chart.
pub const DEFAULT_COUNTRIES: &[&str] = &[
    "China",
    "US",
    "United Kingdom",
    "Italy",
    "France",
    "Germany",
    "Spain",
    "Iran",
];

pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_PORT: u16 = 3000;

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub daily_report_url: String,
    pub time_series_url: String,
    pub countries_url: String,
    /// Local mirror; replaces HTTP when set.
    pub data_dir: Option<PathBuf>,
    pub state_level_cutoff: NaiveDate,
    pub history_window: DateWindow,
    pub min_report_date: NaiveDate,
    pub countries: Vec<String>,
    pub http_timeout: Duration,
    pub port: u16,
}

fn ymd((y, m, d): (i32, u32, u32)) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            daily_report_url: DAILY_REPORT_URL.to_string(),
            time_series_url: TIME_SERIES_URL.to_string(),
            countries_url: COUNTRIES_URL.to_string(),
            data_dir: None,
            state_level_cutoff: ymd(DEFAULT_STATE_LEVEL_CUTOFF),
            history_window: DateWindow::new(ymd(DEFAULT_WINDOW_START), ymd(DEFAULT_WINDOW_END)),
            min_report_date: ymd(DEFAULT_MIN_REPORT_DATE),
            countries: DEFAULT_COUNTRIES.iter().map(|c| c.to_string()).collect(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            port: DEFAULT_PORT,
        }
    }
}

impl DashboardConfig {
    /// Defaults overridden by `COVIDDASH_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Try loading .env file
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (testable without touching the process env).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(url) = lookup("COVIDDASH_DAILY_REPORT_URL") {
            config.daily_report_url = url.trim_end_matches('/').to_string();
        }
        if let Some(url) = lookup("COVIDDASH_TIME_SERIES_URL") {
            config.time_series_url = url.trim_end_matches('/').to_string();
        }
        if let Some(url) = lookup("COVIDDASH_COUNTRIES_URL") {
            config.countries_url = url;
        }
        if let Some(dir) = lookup("COVIDDASH_DATA_DIR").filter(|d| !d.trim().is_empty()) {
            config.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(value) = lookup("COVIDDASH_STATE_CUTOFF") {
            config.state_level_cutoff = parse_date("COVIDDASH_STATE_CUTOFF", &value)?;
        }
        if let Some(value) = lookup("COVIDDASH_WINDOW_START") {
            config.history_window.start = parse_date("COVIDDASH_WINDOW_START", &value)?;
        }
        if let Some(value) = lookup("COVIDDASH_WINDOW_END") {
            config.history_window.end = parse_date("COVIDDASH_WINDOW_END", &value)?;
        }
        if config.history_window.start > config.history_window.end {
            return Err(ConfigError::InvalidValue {
                key: "COVIDDASH_WINDOW_START".to_string(),
                value: config.history_window.start.to_string(),
                reason: format!("after window end {}", config.history_window.end),
            });
        }
        if let Some(value) = lookup("COVIDDASH_MIN_REPORT_DATE") {
            config.min_report_date = parse_date("COVIDDASH_MIN_REPORT_DATE", &value)?;
        }
        if let Some(value) = lookup("COVIDDASH_HTTP_TIMEOUT_SECS") {
            let secs = parse_number::<u64>("COVIDDASH_HTTP_TIMEOUT_SECS", &value)?;
            config.http_timeout = Duration::from_secs(secs);
        }
        if let Some(value) = lookup("COVIDDASH_PORT") {
            config.port = parse_number("COVIDDASH_PORT", &value)?;
        }

        Ok(config)
    }
}

fn parse_date(key: &str, value: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn parse_number<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}
