//! Domain models for the coviddash pipeline.
//!
//! - [`CaseType`] - Confirmed, Deaths, Recovered or the derived Active count
//! - [`LocationKey`] - canonical state abbreviation or zero-padded county code
//! - [`RawLocationRecord`] - one upstream row, typed but not yet normalized
//! - [`NormalizedLocationRecord`] - US row with canonical key and `active` count
//! - [`DailyReport`] - all normalized rows for one date
//! - [`TimeSeriesPoint`] - tidy (location, date, case type, count) tuple
//! - [`CountryRecord`] - one row of the countries-aggregated table

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Case Type
// =============================================================================

/// Kind of count a value represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CaseType {
    Confirmed,
    Deaths,
    Recovered,
    /// Derived: confirmed - deaths - recovered. Never reported upstream.
    Active,
}

impl CaseType {
    /// Case types with an upstream time-series table.
    pub const REPORTED: [CaseType; 3] = [CaseType::Confirmed, CaseType::Deaths, CaseType::Recovered];

    pub fn as_str(&self) -> &'static str {
        match self {
            CaseType::Confirmed => "Confirmed",
            CaseType::Deaths => "Deaths",
            CaseType::Recovered => "Recovered",
            CaseType::Active => "Active",
        }
    }

    /// Select this case type's count from a normalized record.
    pub fn value(&self, record: &NormalizedLocationRecord) -> i64 {
        match self {
            CaseType::Confirmed => record.confirmed,
            CaseType::Deaths => record.deaths,
            CaseType::Recovered => record.recovered,
            CaseType::Active => record.active,
        }
    }
}

impl fmt::Display for CaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CaseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "confirmed" => Ok(CaseType::Confirmed),
            "deaths" => Ok(CaseType::Deaths),
            "recovered" => Ok(CaseType::Recovered),
            "active" => Ok(CaseType::Active),
            other => Err(format!(
                "unknown case type '{}' (expected Confirmed, Deaths, Recovered or Active)",
                other
            )),
        }
    }
}

// =============================================================================
// Location Keys
// =============================================================================

/// Canonical key of a normalized row. A report carries exactly one form,
/// chosen by its [`ReportGranularity`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationKey {
    /// Two-letter US state abbreviation, e.g. `CA`.
    State(String),
    /// Five-digit county FIPS code, left-zero-padded, e.g. `03401`.
    #[serde(rename = "fips")]
    County(String),
}

impl LocationKey {
    pub fn as_str(&self) -> &str {
        match self {
            LocationKey::State(s) | LocationKey::County(s) => s,
        }
    }

    pub fn is_state(&self) -> bool {
        matches!(self, LocationKey::State(_))
    }
}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Representation of a daily report, fixed by the report date.
///
/// Upstream switched from state rows to county rows with the 2020-03-22 report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReportGranularity {
    StateLevel,
    CountyLevel,
}

impl ReportGranularity {
    /// State-level on or before `cutoff` (inclusive), county-level after.
    pub fn for_date(date: NaiveDate, cutoff: NaiveDate) -> Self {
        if date <= cutoff {
            ReportGranularity::StateLevel
        } else {
            ReportGranularity::CountyLevel
        }
    }
}

// =============================================================================
// Records
// =============================================================================

/// Latitude/longitude pair of a reporting unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// One reporting unit's counts on one date, as read from upstream.
#[derive(Debug, Clone, PartialEq)]
pub struct RawLocationRecord {
    pub country: Option<String>,
    pub province_state: Option<String>,
    pub fips: Option<String>,
    pub combined_key: Option<String>,
    pub coordinates: Option<Coordinates>,
    pub confirmed: i64,
    pub deaths: i64,
    pub recovered: i64,
}

/// US reporting unit with its canonical key and derived active count.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedLocationRecord {
    pub key: LocationKey,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub combined_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    pub confirmed: i64,
    pub deaths: i64,
    pub recovered: i64,
    /// May be negative when upstream counts are inconsistent.
    pub active: i64,
}

impl NormalizedLocationRecord {
    pub fn from_raw(raw: RawLocationRecord, key: LocationKey) -> Self {
        Self {
            key,
            combined_key: raw.combined_key,
            coordinates: raw.coordinates,
            confirmed: raw.confirmed,
            deaths: raw.deaths,
            recovered: raw.recovered,
            active: raw.confirmed - raw.deaths - raw.recovered,
        }
    }
}

/// Complete normalized report for one date.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyReport {
    pub date: NaiveDate,
    pub granularity: ReportGranularity,
    pub records: Vec<NormalizedLocationRecord>,
}

// =============================================================================
// Time Series
// =============================================================================

/// Tidy long-form observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesPoint {
    /// Canonical state abbreviation.
    pub location: String,
    pub date: NaiveDate,
    pub case_type: CaseType,
    pub count: i64,
}

/// Inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// One row of the countries-aggregated table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryRecord {
    pub date: NaiveDate,
    pub country: String,
    pub confirmed: i64,
    pub recovered: i64,
    pub deaths: i64,
}
