//! Raw table retrieval.
//!
//! The pipeline never talks to the network directly; it asks a
//! [`TableSource`] for a [`Resource`]. Three sources exist:
//!
//! | Source           | Backing store                          |
//! |------------------|----------------------------------------|
//! | [`HttpSource`]   | upstream GitHub raw files (`reqwest`)  |
//! | [`FileSource`]   | local mirror using upstream file names |
//! | [`MemorySource`] | in-memory tables (tests, demos)        |
//!
//! Each fetch is a single best-effort attempt: no retries, no caching.

use chrono::NaiveDate;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::api::logs::{log_info_indent, log_success_indent};
use crate::config::DashboardConfig;
use crate::error::SourceError;
use crate::models::CaseType;
use crate::parser::{parse_bytes_auto, RawTable};

/// A table upstream publishes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Resource {
    /// Snapshot of cumulative counts for one date.
    DailyReport(NaiveDate),
    /// Wide table, one column per date. Only reported case types exist.
    TimeSeries(CaseType),
    /// Per-country daily totals in long form.
    CountriesAggregated,
}

impl Resource {
    /// Upstream file name, also used by the local mirror.
    pub fn file_name(&self) -> Result<String, SourceError> {
        match self {
            Resource::DailyReport(date) => Ok(format!("{}.csv", date.format("%m-%d-%Y"))),
            Resource::TimeSeries(CaseType::Active) => Err(SourceError::NotFound {
                resource: self.to_string(),
            }),
            Resource::TimeSeries(case_type) => {
                Ok(format!("time_series_19-covid-{}.csv", case_type.as_str()))
            }
            Resource::CountriesAggregated => Ok("countries-aggregated.csv".to_string()),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::DailyReport(date) => write!(f, "daily report {}", date.format("%m-%d-%Y")),
            Resource::TimeSeries(case_type) => {
                write!(f, "{} time series", case_type.as_str().to_lowercase())
            }
            Resource::CountriesAggregated => f.write_str("countries-aggregated table"),
        }
    }
}

/// Anything that can produce a raw table for a resource.
#[allow(async_fn_in_trait)]
pub trait TableSource {
    async fn fetch(&self, resource: &Resource) -> Result<RawTable, SourceError>;
}

// =============================================================================
// HTTP
// =============================================================================

/// Fetches tables from upstream URLs.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    daily_report_url: String,
    time_series_url: String,
    countries_url: String,
}

impl HttpSource {
    pub fn new(config: &DashboardConfig) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| SourceError::Unavailable {
                resource: "http client".to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            daily_report_url: config.daily_report_url.clone(),
            time_series_url: config.time_series_url.clone(),
            countries_url: config.countries_url.clone(),
        })
    }

    /// Full URL of a resource.
    pub fn url_for(&self, resource: &Resource) -> Result<String, SourceError> {
        let file = resource.file_name()?;
        Ok(match resource {
            Resource::DailyReport(_) => format!("{}/{}", self.daily_report_url, file),
            Resource::TimeSeries(_) => format!("{}/{}", self.time_series_url, file),
            Resource::CountriesAggregated => self.countries_url.clone(),
        })
    }
}

impl TableSource for HttpSource {
    async fn fetch(&self, resource: &Resource) -> Result<RawTable, SourceError> {
        let url = self.url_for(resource)?;
        log_info_indent(format!("📡 GET {}", url), 1);

        let unavailable = |reason: String| SourceError::Unavailable {
            resource: resource.to_string(),
            reason,
        };

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(SourceError::NotFound {
                resource: resource.to_string(),
            });
        }
        if !status.is_success() {
            return Err(unavailable(format!("HTTP {}", status)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| unavailable(e.to_string()))?;
        log_success_indent(format!("Received {} bytes", bytes.len()), 1);

        parse_bytes_auto(&resource.to_string(), &bytes).map_err(|e| SourceError::Malformed {
            resource: resource.to_string(),
            reason: e.to_string(),
        })
    }
}

// =============================================================================
// Local mirror
// =============================================================================

/// Reads tables from a directory laid out with upstream file names.
#[derive(Debug, Clone)]
pub struct FileSource {
    dir: PathBuf,
}

impl FileSource {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, resource: &Resource) -> Result<PathBuf, SourceError> {
        Ok(self.dir.join(resource.file_name()?))
    }
}

impl TableSource for FileSource {
    async fn fetch(&self, resource: &Resource) -> Result<RawTable, SourceError> {
        let path = self.path_for(resource)?;
        log_info_indent(format!("📂 Reading {}", path.display()), 1);

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SourceError::NotFound {
                    resource: resource.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };

        parse_bytes_auto(&resource.to_string(), &bytes).map_err(|e| SourceError::Malformed {
            resource: resource.to_string(),
            reason: e.to_string(),
        })
    }
}

// =============================================================================
// In-memory
// =============================================================================

/// Serves pre-built tables. Unknown resources are [`SourceError::NotFound`].
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    tables: HashMap<Resource, RawTable>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, resource: Resource, table: RawTable) -> Self {
        self.tables.insert(resource, table);
        self
    }
}

impl TableSource for MemorySource {
    async fn fetch(&self, resource: &Resource) -> Result<RawTable, SourceError> {
        self.tables
            .get(resource)
            .cloned()
            .ok_or_else(|| SourceError::NotFound {
                resource: resource.to_string(),
            })
    }
}

// =============================================================================
// Runtime selection
// =============================================================================

/// Source chosen at runtime from configuration.
#[derive(Debug, Clone)]
pub enum AnySource {
    Http(HttpSource),
    File(FileSource),
    Memory(MemorySource),
}

impl TableSource for AnySource {
    async fn fetch(&self, resource: &Resource) -> Result<RawTable, SourceError> {
        match self {
            AnySource::Http(source) => source.fetch(resource).await,
            AnySource::File(source) => source.fetch(resource).await,
            AnySource::Memory(source) => source.fetch(resource).await,
        }
    }
}

/// Local mirror when `data_dir` is set, upstream HTTP otherwise.
pub fn source_from_config(config: &DashboardConfig) -> Result<AnySource, SourceError> {
    match &config.data_dir {
        Some(dir) => Ok(AnySource::File(FileSource::new(dir))),
        None => Ok(AnySource::Http(HttpSource::new(config)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_daily_report_file_name_uses_four_digit_year() {
        let resource = Resource::DailyReport(date(2020, 3, 9));
        assert_eq!(resource.file_name().unwrap(), "03-09-2020.csv");
        assert_eq!(resource.to_string(), "daily report 03-09-2020");
    }

    #[test]
    fn test_time_series_file_names() {
        assert_eq!(
            Resource::TimeSeries(CaseType::Deaths).file_name().unwrap(),
            "time_series_19-covid-Deaths.csv"
        );
        assert!(matches!(
            Resource::TimeSeries(CaseType::Active).file_name(),
            Err(SourceError::NotFound { .. })
        ));
    }

    #[test]
    fn test_http_urls() {
        let source = HttpSource::new(&DashboardConfig::default()).unwrap();
        let url = source.url_for(&Resource::DailyReport(date(2020, 3, 23))).unwrap();
        assert!(url.ends_with("/csse_covid_19_daily_reports/03-23-2020.csv"));
        assert_eq!(
            source.url_for(&Resource::CountriesAggregated).unwrap(),
            crate::config::COUNTRIES_URL
        );
    }

    #[tokio::test]
    async fn test_memory_source_missing_is_not_found() {
        let source = MemorySource::new();
        let err = source.fetch(&Resource::CountriesAggregated).await.unwrap_err();
        assert!(matches!(err, SourceError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_file_source_reads_mirror() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("03-15-2020.csv"),
            "Province/State,Country/Region,Confirmed,Deaths,Recovered\nWashington,US,643,40,1\n",
        )
        .unwrap();

        let source = FileSource::new(dir.path());
        let table = source.fetch(&Resource::DailyReport(date(2020, 3, 15))).await.unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.name, "daily report 03-15-2020");

        let err = source.fetch(&Resource::DailyReport(date(2020, 3, 16))).await.unwrap_err();
        assert!(matches!(err, SourceError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_file_source_malformed_table() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("countries-aggregated.csv"), "").unwrap();

        let source = FileSource::new(dir.path());
        let err = source.fetch(&Resource::CountriesAggregated).await.unwrap_err();
        assert!(matches!(err, SourceError::Malformed { .. }));
    }

    #[test]
    fn test_source_selection() {
        let mut config = DashboardConfig::default();
        assert!(matches!(source_from_config(&config).unwrap(), AnySource::Http(_)));
        config.data_dir = Some(PathBuf::from("/tmp/mirror"));
        assert!(matches!(source_from_config(&config).unwrap(), AnySource::File(_)));
    }
}
