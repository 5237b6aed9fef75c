//! REST API types for the dashboard frontend.

use axum::http::StatusCode;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::error::{ErrorKind, PipelineError, ServerError};
use crate::models::{CaseType, CountryRecord, DateWindow, TimeSeriesPoint};
use crate::transform::StateTimeSeries;

/// Query of `/api/report`.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportQuery {
    pub date: String,
}

/// Query of `/api/map`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapQuery {
    pub date: String,
    #[serde(default)]
    pub case_type: Option<String>,
}

/// Query of `/api/timeseries/states`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimeSeriesQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    /// Ignore the window and return every date.
    #[serde(default)]
    pub all: bool,
}

/// State time series response. Failed case types are listed, not fatal.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesResponse {
    pub request_id: String,
    /// "ready" when every case type loaded, "partial" otherwise
    pub status: String,
    pub window: Option<DateWindow>,
    pub series: BTreeMap<CaseType, Vec<TimeSeriesPoint>>,
    pub failures: BTreeMap<CaseType, String>,
}

impl TimeSeriesResponse {
    pub fn new(result: StateTimeSeries, window: Option<DateWindow>) -> Self {
        let active = result.active();
        let StateTimeSeries { mut series, failures } = result;
        if let Some(active) = active {
            series.insert(CaseType::Active, active);
        }

        Self {
            request_id: Uuid::new_v4().to_string(),
            status: if failures.is_empty() { "ready" } else { "partial" }.to_string(),
            window,
            series,
            failures: failures
                .into_iter()
                .map(|(case_type, e)| (case_type, e.to_string()))
                .collect(),
        }
    }
}

/// Country time series response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountriesResponse {
    pub request_id: String,
    pub countries: Vec<String>,
    pub records: Vec<CountryRecord>,
}

/// HTTP status for a server error.
pub fn status_for(error: &ServerError) -> StatusCode {
    match error {
        ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
        ServerError::Pipeline(e) => status_for_pipeline(e),
    }
}

fn status_for_pipeline(error: &PipelineError) -> StatusCode {
    match error.kind() {
        ErrorKind::SourceUnavailable => StatusCode::BAD_GATEWAY,
        ErrorKind::Schema | ErrorKind::DataFormat => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
    }
}

fn kind_label(error: &ServerError) -> &'static str {
    match error {
        ServerError::BadRequest(_) => "badRequest",
        ServerError::Pipeline(e) => match e.kind() {
            ErrorKind::SourceUnavailable => "sourceUnavailable",
            ErrorKind::Schema => "schema",
            ErrorKind::DataFormat => "dataFormat",
            ErrorKind::InvalidInput => "badRequest",
        },
    }
}

/// Create an error response body
pub fn error_response(error: &ServerError) -> Value {
    json!({
        "requestId": Uuid::new_v4().to_string(),
        "status": "error",
        "kind": kind_label(error),
        "error": error.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{SchemaError, SourceError};

    #[test]
    fn test_status_mapping() {
        let source: ServerError = PipelineError::from(SourceError::NotFound { resource: "x".into() }).into();
        assert_eq!(status_for(&source), StatusCode::BAD_GATEWAY);

        let schema: ServerError = PipelineError::from(SchemaError::MissingColumn {
            column: "FIPS".into(),
            table: "t".into(),
        })
        .into();
        assert_eq!(status_for(&schema), StatusCode::UNPROCESSABLE_ENTITY);

        assert_eq!(status_for(&ServerError::BadRequest("no".into())), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_error_body() {
        let err: ServerError = PipelineError::InvalidReportDate("soon".into()).into();
        let body = error_response(&err);
        assert_eq!(body["status"], "error");
        assert_eq!(body["kind"], "badRequest");
        assert!(body["error"].as_str().unwrap().contains("soon"));
    }

    #[test]
    fn test_partial_time_series_response() {
        let mut result = StateTimeSeries::default();
        result.series.insert(CaseType::Confirmed, vec![]);
        result
            .failures
            .insert(CaseType::Deaths, SourceError::NotFound { resource: "deaths".into() }.into());

        let response = TimeSeriesResponse::new(result, None);
        assert_eq!(response.status, "partial");
        assert!(response.series.contains_key(&CaseType::Confirmed));
        assert!(!response.series.contains_key(&CaseType::Active));
        assert!(response.failures[&CaseType::Deaths].contains("deaths"));
    }
}
