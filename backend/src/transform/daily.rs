//! Daily report normalization.
//!
//! ```text
//! ┌──────────────┐     ┌──────────────────┐     ┌────────────────┐     ┌─────────────┐
//! │ daily report │────▶│ date <= cutoff ? │─yes▶│ US states only │──┬─▶│ + Active    │
//! │  MM-DD-YYYY  │     └──────────────────┘     └────────────────┘  │  │ DailyReport │
//! └──────────────┘              │ no            ┌────────────────┐  │  └─────────────┘
//!                               └──────────────▶│ FIPS counties  │──┘
//!                                               └────────────────┘
//! ```

use chrono::NaiveDate;
use std::collections::HashMap;

use crate::api::logs::{log_error, log_info, log_success, log_warning};
use crate::config::DashboardConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::filter::LocationFilter;
use crate::models::{DailyReport, LocationKey, NormalizedLocationRecord, RawLocationRecord, ReportGranularity};
use crate::parser::{columns, RawTable};
use crate::source::{Resource, TableSource};

use super::values::{parse_coordinates, parse_count, parse_report_date};

/// Fetches one day's report and normalizes it.
#[derive(Debug, Clone)]
pub struct DailyReportNormalizer<S> {
    source: S,
    filter: LocationFilter,
    cutoff: NaiveDate,
}

impl<S: TableSource> DailyReportNormalizer<S> {
    /// Normalizer with the standard state lookup and the default cutoff.
    pub fn new(source: S) -> Self {
        Self::from_config(source, &DashboardConfig::default())
    }

    pub fn from_config(source: S, config: &DashboardConfig) -> Self {
        Self {
            source,
            filter: LocationFilter::default(),
            cutoff: config.state_level_cutoff,
        }
    }

    pub fn with_cutoff(mut self, cutoff: NaiveDate) -> Self {
        self.cutoff = cutoff;
        self
    }

    pub fn with_filter(mut self, filter: LocationFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn cutoff(&self) -> NaiveDate {
        self.cutoff
    }

    /// Normalize the report for a date given as `MM-DD-YY`, `MM-DD-YYYY` or `YYYY-MM-DD`.
    pub async fn normalize_str(&self, date: &str) -> PipelineResult<DailyReport> {
        let date = parse_report_date(date)?;
        self.normalize(date).await
    }

    /// Fetch and normalize the report for `date`.
    pub async fn normalize(&self, date: NaiveDate) -> PipelineResult<DailyReport> {
        let resource = Resource::DailyReport(date);
        log_info(format!("📄 Loading {}...", resource));

        let result = match self.source.fetch(&resource).await {
            Ok(table) => normalize_table(&self.filter, date, self.cutoff, &table),
            Err(e) => Err(e.into()),
        };

        match &result {
            Ok(report) => log_success(format!(
                "{} {} rows for {}",
                report.records.len(),
                match report.granularity {
                    ReportGranularity::StateLevel => "state",
                    ReportGranularity::CountyLevel => "county",
                },
                date
            )),
            Err(e) => log_error(format!("Failed to load {}: {}", resource, e)),
        }

        result
    }
}

/// Normalize an already-fetched daily table.
///
/// The date alone picks the representation: on or before `cutoff` the table
/// is read as state rows, after it as county rows. A state-level report has
/// one record per state; rows sharing an abbreviation are summed.
pub fn normalize_table(
    filter: &LocationFilter,
    date: NaiveDate,
    cutoff: NaiveDate,
    table: &RawTable,
) -> PipelineResult<DailyReport> {
    let granularity = ReportGranularity::for_date(date, cutoff);

    let (filtered, key_col) = match granularity {
        ReportGranularity::StateLevel => {
            let filtered = filter.restrict_to_us_states(table)?;
            let col = filtered.column(columns::PROVINCE_STATE)?;
            (filtered, col)
        }
        ReportGranularity::CountyLevel => {
            let filtered = filter.restrict_to_us_counties(table)?;
            let col = filtered.column(columns::FIPS)?;
            (filtered, col)
        }
    };

    let dropped = table.len() - filtered.len();
    if dropped > 0 {
        log_warning(format!("{} of {} rows dropped (non-US or unmapped location)", dropped, table.len()));
    }

    let cols = RecordColumns::locate(&filtered)?;
    let mut records = Vec::with_capacity(filtered.len());
    for row in 0..filtered.len() {
        let raw = cols.read(&filtered, row)?;
        let code = filtered.cell(row, key_col).to_string();
        let key = match granularity {
            ReportGranularity::StateLevel => LocationKey::State(code),
            ReportGranularity::CountyLevel => LocationKey::County(code),
        };
        records.push(NormalizedLocationRecord::from_raw(raw, key));
    }

    if granularity == ReportGranularity::StateLevel {
        let before = records.len();
        records = merge_by_key(records);
        if records.len() < before {
            log_warning(format!("{} rows merged into {} states", before, records.len()));
        }
    }

    Ok(DailyReport {
        date,
        granularity,
        records,
    })
}

/// Sum records sharing a key, keeping first-seen order.
///
/// A merged record keeps the first coordinates and loses its combined key.
fn merge_by_key(records: Vec<NormalizedLocationRecord>) -> Vec<NormalizedLocationRecord> {
    let mut index: HashMap<LocationKey, usize> = HashMap::with_capacity(records.len());
    let mut merged: Vec<NormalizedLocationRecord> = Vec::with_capacity(records.len());

    for record in records {
        match index.get(&record.key) {
            Some(&i) => {
                let into = &mut merged[i];
                into.confirmed += record.confirmed;
                into.deaths += record.deaths;
                into.recovered += record.recovered;
                into.active += record.active;
                into.coordinates = into.coordinates.or(record.coordinates);
                into.combined_key = None;
            }
            None => {
                index.insert(record.key.clone(), merged.len());
                merged.push(record);
            }
        }
    }

    merged
}

/// Column positions of a daily table. Counts are required, the rest optional.
struct RecordColumns {
    country: Option<usize>,
    province_state: Option<usize>,
    fips: Option<usize>,
    combined_key: Option<usize>,
    coordinates: Option<(usize, usize)>,
    confirmed: usize,
    deaths: usize,
    recovered: usize,
}

impl RecordColumns {
    fn locate(table: &RawTable) -> Result<Self, PipelineError> {
        Ok(Self {
            country: table.find_column(columns::COUNTRY),
            province_state: table.find_column(columns::PROVINCE_STATE),
            fips: table.find_column(columns::FIPS),
            combined_key: table.find_column(columns::COMBINED_KEY),
            coordinates: table
                .find_column(columns::LATITUDE)
                .zip(table.find_column(columns::LONGITUDE)),
            confirmed: table.column(columns::CONFIRMED)?,
            deaths: table.column(columns::DEATHS)?,
            recovered: table.column(columns::RECOVERED)?,
        })
    }

    fn read(&self, table: &RawTable, row: usize) -> Result<RawLocationRecord, PipelineError> {
        let text = |col: Option<usize>| {
            col.map(|c| table.cell(row, c))
                .filter(|v| !v.is_empty())
                .map(String::from)
        };

        let coordinates = match self.coordinates {
            Some((lat, lon)) => parse_coordinates(table, row, lat, lon)?,
            None => None,
        };

        Ok(RawLocationRecord {
            country: text(self.country),
            province_state: text(self.province_state),
            fips: text(self.fips),
            combined_key: text(self.combined_key),
            coordinates,
            confirmed: parse_count(table, row, self.confirmed)?,
            deaths: parse_count(table, row, self.deaths)?,
            recovered: parse_count(table, row, self.recovered)?,
        })
    }
}
