//! Wide time-series tables to tidy long form.
//!
//! Upstream publishes one wide table per case type:
//!
//! ```text
//! Province/State | Country/Region | Lat | Long | 3/10/20 | 3/11/20 | ...
//! New York       | US             | ... | ...  | 173     | 220     | ...
//! ```
//!
//! which becomes one [`TimeSeriesPoint`] per (state, date):
//!
//! ```text
//! (NY, 2020-03-10, Confirmed, 173)
//! (NY, 2020-03-11, Confirmed, 220)
//! ```
//!
//! Each case type is fetched and reshaped independently, so one failing
//! table does not hide the others.

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::api::logs::{log_error, log_info, log_success, log_success_indent};
use crate::config::DashboardConfig;
use crate::error::{DataFormatError, PipelineError, PipelineResult, SchemaError};
use crate::filter::LocationFilter;
use crate::models::{CaseType, CountryRecord, DateWindow, TimeSeriesPoint};
use crate::parser::{columns, RawTable};
use crate::source::{Resource, TableSource};

use super::values::{parse_count, parse_date_label};

/// Per-case-type result of [`TimeSeriesReshaper::build_state_time_series`].
///
/// A case type appears in exactly one of `series` or `failures`.
#[derive(Debug, Default)]
pub struct StateTimeSeries {
    pub series: BTreeMap<CaseType, Vec<TimeSeriesPoint>>,
    pub failures: BTreeMap<CaseType, PipelineError>,
}

impl StateTimeSeries {
    pub fn get(&self, case_type: CaseType) -> Option<&[TimeSeriesPoint]> {
        self.series.get(&case_type).map(Vec::as_slice)
    }

    /// True when every reported case type loaded.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Active = confirmed - deaths - recovered per (state, date).
    ///
    /// Requires all three reported series; pairs missing from any of them are skipped.
    pub fn active(&self) -> Option<Vec<TimeSeriesPoint>> {
        let deaths = self.index(CaseType::Deaths)?;
        let recovered = self.index(CaseType::Recovered)?;

        let points = self
            .series
            .get(&CaseType::Confirmed)?
            .iter()
            .filter_map(|p| {
                let key = (p.location.as_str(), p.date);
                Some(TimeSeriesPoint {
                    location: p.location.clone(),
                    date: p.date,
                    case_type: CaseType::Active,
                    count: p.count - deaths.get(&key)? - recovered.get(&key)?,
                })
            })
            .collect();
        Some(points)
    }

    fn index(&self, case_type: CaseType) -> Option<HashMap<(&str, NaiveDate), i64>> {
        Some(
            self.series
                .get(&case_type)?
                .iter()
                .map(|p| ((p.location.as_str(), p.date), p.count))
                .collect(),
        )
    }
}

/// Builds state and country time series from upstream tables.
#[derive(Debug, Clone)]
pub struct TimeSeriesReshaper<S> {
    source: S,
    filter: LocationFilter,
    window: Option<DateWindow>,
    countries: Vec<String>,
}

impl<S: TableSource> TimeSeriesReshaper<S> {
    /// Reshaper with the default historical window and country allow-list.
    pub fn new(source: S) -> Self {
        Self::from_config(source, &DashboardConfig::default())
    }

    pub fn from_config(source: S, config: &DashboardConfig) -> Self {
        Self {
            source,
            filter: LocationFilter::default(),
            window: Some(config.history_window),
            countries: config.countries.clone(),
        }
    }

    /// Restrict state series to `window`; `None` keeps every date.
    pub fn with_window(mut self, window: Option<DateWindow>) -> Self {
        self.window = window;
        self
    }

    pub fn with_filter(mut self, filter: LocationFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_countries(mut self, countries: Vec<String>) -> Self {
        self.countries = countries;
        self
    }

    pub fn window(&self) -> Option<DateWindow> {
        self.window
    }

    /// Tidy series for every reported case type. Failures are kept per case type.
    pub async fn build_state_time_series(&self) -> StateTimeSeries {
        log_info("📈 Building state time series...");
        let mut result = StateTimeSeries::default();

        for case_type in CaseType::REPORTED {
            match self.build_one(case_type).await {
                Ok(points) => {
                    log_success_indent(format!("{}: {} points", case_type, points.len()), 1);
                    result.series.insert(case_type, points);
                }
                Err(e) => {
                    log_error(format!("{}: {}", case_type, e));
                    result.failures.insert(case_type, e);
                }
            }
        }

        result
    }

    async fn build_one(&self, case_type: CaseType) -> PipelineResult<Vec<TimeSeriesPoint>> {
        let table = self.source.fetch(&Resource::TimeSeries(case_type)).await?;
        let states = self.filter.restrict_to_us_states(&table)?;
        reshape_state_table(&states, case_type, self.window)
    }

    /// Countries-aggregated table restricted to the allow-list.
    pub async fn build_country_time_series(&self) -> PipelineResult<Vec<CountryRecord>> {
        log_info("🌍 Building country time series...");
        let result = match self.source.fetch(&Resource::CountriesAggregated).await {
            Ok(table) => select_countries(&table, &self.countries),
            Err(e) => Err(e.into()),
        };

        match &result {
            Ok(records) => log_success(format!("{} country rows", records.len())),
            Err(e) => log_error(format!("Country time series failed: {}", e)),
        }
        result
    }
}

/// Melt a state-keyed wide table into tidy points.
///
/// Date columns are the headers that parse as dates; every other column is
/// metadata. Points are ordered by location (table order) then date. A
/// location or date seen twice keeps its first occurrence.
pub fn reshape_state_table(
    table: &RawTable,
    case_type: CaseType,
    window: Option<DateWindow>,
) -> PipelineResult<Vec<TimeSeriesPoint>> {
    let location_col = table.column(columns::PROVINCE_STATE)?;

    let mut date_cols: Vec<(NaiveDate, usize)> = table
        .headers
        .iter()
        .enumerate()
        .filter_map(|(i, h)| parse_date_label(h).map(|d| (d, i)))
        .collect();
    if date_cols.is_empty() {
        return Err(SchemaError::NoDateColumns {
            table: table.name.clone(),
        }
        .into());
    }
    date_cols.sort_by_key(|(d, _)| *d);
    date_cols.dedup_by_key(|(d, _)| *d);
    if let Some(window) = window {
        date_cols.retain(|(d, _)| window.contains(*d));
    }

    let mut seen = HashSet::new();
    let mut points = Vec::new();
    for row in 0..table.len() {
        let location = table.cell(row, location_col);
        if location.is_empty() || !seen.insert(location) {
            continue;
        }
        for &(date, col) in &date_cols {
            points.push(TimeSeriesPoint {
                location: location.to_string(),
                date,
                case_type,
                count: parse_count(table, row, col)?,
            });
        }
    }

    Ok(points)
}

/// Rows of the countries-aggregated table whose country is in `allowed`.
pub fn select_countries(table: &RawTable, allowed: &[String]) -> PipelineResult<Vec<CountryRecord>> {
    let date_col = table.column(columns::DATE)?;
    let country_col = table.column(columns::COUNTRY)?;
    let confirmed_col = table.column(columns::CONFIRMED)?;
    let recovered_col = table.column(columns::RECOVERED)?;
    let deaths_col = table.column(columns::DEATHS)?;

    let mut records = Vec::new();
    for row in 0..table.len() {
        let country = table.cell(row, country_col);
        if !allowed.iter().any(|c| c == country) {
            continue;
        }
        let raw_date = table.cell(row, date_col);
        let date = parse_date_label(raw_date).ok_or_else(|| DataFormatError::InvalidDate {
            column: table.headers[date_col].clone(),
            row: row + 1,
            value: raw_date.to_string(),
        })?;
        records.push(CountryRecord {
            date,
            country: country.to_string(),
            confirmed: parse_count(table, row, confirmed_col)?,
            recovered: parse_count(table, row, recovered_col)?,
            deaths: parse_count(table, row, deaths_col)?,
        });
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::source::MemorySource;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn wide_table(name: &str) -> RawTable {
        RawTable::from_strs(
            name,
            &["Province/State", "Country/Region", "Lat", "Long", "3/9/20", "3/10/20", "3/11/20", "3/23/20"],
            &[
                &["New York", "US", "42.1657", "-74.9481", "142", "173", "220", "20875"],
                &["Washington", "US", "47.4009", "-121.4905", "136", "162", "267", "2221"],
                &["Diamond Princess", "US", "35.4437", "139.638", "46", "46", "46", "49"],
                &["Hubei", "China", "30.9756", "112.2707", "67743", "67760", "67773", "67800"],
            ],
        )
    }

    #[test]
    fn test_reshape_scenario() {
        let table = RawTable::from_strs(
            "confirmed",
            &["state", "03-10-2020", "03-11-2020"],
            &[&["NY", "1", "3"]],
        );
        let points = reshape_state_table(&table, CaseType::Confirmed, None).unwrap();

        assert_eq!(
            points,
            vec![
                TimeSeriesPoint { location: "NY".into(), date: date(2020, 3, 10), case_type: CaseType::Confirmed, count: 1 },
                TimeSeriesPoint { location: "NY".into(), date: date(2020, 3, 11), case_type: CaseType::Confirmed, count: 3 },
            ]
        );
    }

    #[test]
    fn test_reshape_row_count_and_uniqueness() {
        let states = LocationFilter::default()
            .restrict_to_us_states(&wide_table("confirmed time series"))
            .unwrap();
        let window = DateWindow::new(date(2020, 3, 10), date(2020, 3, 22));
        let points = reshape_state_table(&states, CaseType::Confirmed, Some(window)).unwrap();

        // 2 states x 2 in-window dates
        assert_eq!(points.len(), 2 * 2);
        let pairs: HashSet<_> = points.iter().map(|p| (p.location.clone(), p.date)).collect();
        assert_eq!(pairs.len(), points.len());
        assert!(points.iter().all(|p| window.contains(p.date)));
    }

    #[test]
    fn test_reshape_without_window_keeps_all_dates() {
        let states = LocationFilter::default()
            .restrict_to_us_states(&wide_table("t"))
            .unwrap();
        let points = reshape_state_table(&states, CaseType::Deaths, None).unwrap();
        assert_eq!(points.len(), 2 * 4);
    }

    #[test]
    fn test_reshape_requires_date_columns() {
        let table = RawTable::from_strs("t", &["state", "Lat"], &[&["NY", "42"]]);
        let err = reshape_state_table(&table, CaseType::Confirmed, None).unwrap_err();
        assert!(matches!(err, PipelineError::Schema(SchemaError::NoDateColumns { .. })));
    }

    #[test]
    fn test_reshape_duplicate_location_kept_once() {
        let table = RawTable::from_strs("t", &["state", "3/10/20"], &[&["NY", "1"], &["NY", "9"]]);
        let points = reshape_state_table(&table, CaseType::Confirmed, None).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].count, 1);
    }

    #[tokio::test]
    async fn test_partial_result_is_representable() {
        let source = MemorySource::new()
            .with(Resource::TimeSeries(CaseType::Confirmed), wide_table("confirmed"))
            .with(Resource::TimeSeries(CaseType::Deaths), wide_table("deaths"));
        let result = TimeSeriesReshaper::new(source).build_state_time_series().await;

        assert!(result.get(CaseType::Confirmed).is_some());
        assert!(result.get(CaseType::Deaths).is_some());
        assert!(result.get(CaseType::Recovered).is_none());
        assert!(!result.is_complete());
        assert_eq!(result.failures[&CaseType::Recovered].kind(), ErrorKind::SourceUnavailable);
        assert!(result.active().is_none());
    }

    #[tokio::test]
    async fn test_active_series_derived() {
        let source = MemorySource::new()
            .with(Resource::TimeSeries(CaseType::Confirmed), RawTable::from_strs("c", &["Province/State", "Country/Region", "3/10/20"], &[&["Ohio", "US", "10"]]))
            .with(Resource::TimeSeries(CaseType::Deaths), RawTable::from_strs("d", &["Province/State", "Country/Region", "3/10/20"], &[&["Ohio", "US", "1"]]))
            .with(Resource::TimeSeries(CaseType::Recovered), RawTable::from_strs("r", &["Province/State", "Country/Region", "3/10/20"], &[&["Ohio", "US", "4"]]));
        let result = TimeSeriesReshaper::new(source).build_state_time_series().await;

        assert!(result.is_complete());
        let active = result.active().unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].location, "OH");
        assert_eq!(active[0].count, 5);
        assert_eq!(active[0].case_type, CaseType::Active);
    }

    #[tokio::test]
    async fn test_country_time_series() {
        let table = RawTable::from_strs(
            "countries-aggregated table",
            &["Date", "Country", "Confirmed", "Recovered", "Deaths"],
            &[
                &["2020-03-10", "Italy", "10149", "1004", "631"],
                &["2020-03-10", "Canada", "79", "8", "1"],
                &["2020-03-10", "US", "959", "8", "28"],
            ],
        );
        let source = MemorySource::new().with(Resource::CountriesAggregated, table);
        let records = TimeSeriesReshaper::new(source).build_country_time_series().await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].country, "Italy");
        assert_eq!(records[0].date, date(2020, 3, 10));
        assert_eq!(records[1].deaths, 28);
    }

    #[test]
    fn test_country_bad_date() {
        let table = RawTable::from_strs(
            "t",
            &["Date", "Country", "Confirmed", "Recovered", "Deaths"],
            &[&["someday", "Iran", "1", "0", "0"]],
        );
        let err = select_countries(&table, &["Iran".to_string()]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataFormat);
    }
}
