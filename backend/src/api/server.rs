//! HTTP Server for the coviddash API.
//!
//! Serves normalized reports, map views and time series to the dashboard.
//! Every request performs its own fetch; nothing is cached between requests.
//!
//! # API Endpoints
//!
//! | Method | Path                        | Description                              |
//! |--------|-----------------------------|------------------------------------------|
//! | GET    | `/health`                   | Health check                             |
//! | GET    | `/api/report?date=`         | Normalized daily report                  |
//! | GET    | `/api/map?date=&caseType=`  | Choropleth or county scatter data        |
//! | GET    | `/api/timeseries/states`    | Tidy state series (`start`, `end`, `all`) |
//! | GET    | `/api/timeseries/countries` | Allow-listed country series              |
//! | GET    | `/api/logs`                 | SSE stream for real-time logs            |

use axum::{
    extract::{Query, State},
    http::{header, Method},
    response::{sse::Event, IntoResponse, Json, Response, Sse},
    routing::get,
    Router,
};
use chrono::{NaiveDate, Utc};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::LOG_BROADCASTER;
use super::types::{
    error_response, status_for, CountriesResponse, MapQuery, ReportQuery, TimeSeriesQuery,
    TimeSeriesResponse,
};
use crate::config::DashboardConfig;
use crate::dashboard::{map_view, MapView};
use crate::error::{ServerError, ServerResult};
use crate::models::{CaseType, DailyReport, DateWindow};
use crate::source::{source_from_config, AnySource};
use crate::transform::{parse_report_date, DailyReportNormalizer, TimeSeriesReshaper};

/// Shared, read-only request context.
pub struct AppState {
    pub config: DashboardConfig,
    pub source: AnySource,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        (status_for(&self), Json(error_response(&self))).into_response()
    }
}

/// Build the router over an explicit source (used by tests and `start_server`).
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/report", get(daily_report))
        .route("/api/map", get(map))
        .route("/api/timeseries/states", get(state_time_series))
        .route("/api/timeseries/countries", get(country_time_series))
        .route("/api/logs", get(sse_logs))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(config: DashboardConfig) -> Result<(), Box<dyn std::error::Error>> {
    let source = source_from_config(&config)?;
    let port = config.port;
    let state = Arc::new(AppState { config, source });

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🚀 Coviddash server running on http://localhost:{}", port);
    println!("   GET  /api/report               - Normalized daily report");
    println!("   GET  /api/map                  - Map data for date + case type");
    println!("   GET  /api/timeseries/states    - State time series");
    println!("   GET  /api/timeseries/countries - Country time series");
    println!("   GET  /api/logs                 - SSE log stream");
    println!("   GET  /health                   - Health check");
    match &state.config.data_dir {
        Some(dir) => println!("📂 Data: local mirror {}", dir.display()),
        None => println!("📡 Data: {}", state.config.daily_report_url),
    }
    println!();

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "coviddash",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "report": "GET /api/report?date=YYYY-MM-DD",
            "map": "GET /api/map?date=YYYY-MM-DD&caseType=Confirmed",
            "states": "GET /api/timeseries/states",
            "countries": "GET /api/timeseries/countries",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// Parse a requested date and check it against the selectable range.
fn selectable_date(config: &DashboardConfig, raw: &str) -> ServerResult<NaiveDate> {
    let date = parse_report_date(raw)?;
    let today = Utc::now().date_naive();
    if date < config.min_report_date || date > today {
        return Err(ServerError::BadRequest(format!(
            "date {} outside {}..={}",
            date, config.min_report_date, today
        )));
    }
    Ok(date)
}

async fn load_report(state: &AppState, raw_date: &str) -> ServerResult<DailyReport> {
    let date = selectable_date(&state.config, raw_date)?;
    let normalizer = DailyReportNormalizer::from_config(state.source.clone(), &state.config);
    Ok(normalizer.normalize(date).await?)
}

async fn daily_report(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReportQuery>,
) -> ServerResult<Json<DailyReport>> {
    Ok(Json(load_report(&state, &query.date).await?))
}

async fn map(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MapQuery>,
) -> ServerResult<Json<MapView>> {
    let case_type = match query.case_type.as_deref() {
        Some(raw) => raw.parse::<CaseType>().map_err(ServerError::BadRequest)?,
        None => CaseType::Confirmed,
    };
    let report = load_report(&state, &query.date).await?;
    Ok(Json(map_view(&report, case_type)))
}

async fn state_time_series(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TimeSeriesQuery>,
) -> ServerResult<Json<TimeSeriesResponse>> {
    let window = if query.all {
        None
    } else {
        let default = state.config.history_window;
        let window = DateWindow::new(
            query.start.unwrap_or(default.start),
            query.end.unwrap_or(default.end),
        );
        if window.start > window.end {
            return Err(ServerError::BadRequest(format!(
                "start {} is after end {}",
                window.start, window.end
            )));
        }
        Some(window)
    };

    let reshaper = TimeSeriesReshaper::from_config(state.source.clone(), &state.config).with_window(window);
    let result = reshaper.build_state_time_series().await;
    Ok(Json(TimeSeriesResponse::new(result, window)))
}

async fn country_time_series(State(state): State<Arc<AppState>>) -> ServerResult<Json<CountriesResponse>> {
    let reshaper = TimeSeriesReshaper::from_config(state.source.clone(), &state.config);
    let records = reshaper.build_country_time_series().await?;
    Ok(Json(CountriesResponse {
        request_id: uuid::Uuid::new_v4().to_string(),
        countries: state.config.countries.clone(),
        records,
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::RawTable;
    use crate::source::{MemorySource, Resource};

    fn state_with(source: MemorySource) -> AppState {
        AppState {
            config: DashboardConfig::default(),
            source: AnySource::Memory(source),
        }
    }

    #[test]
    fn test_selectable_date_bounds() {
        let config = DashboardConfig::default();
        assert!(selectable_date(&config, "2020-03-10").is_ok());
        assert!(matches!(selectable_date(&config, "2020-03-09"), Err(ServerError::BadRequest(_))));
        assert!(matches!(selectable_date(&config, "2999-01-01"), Err(ServerError::BadRequest(_))));
        assert!(matches!(selectable_date(&config, "tomorrow"), Err(ServerError::Pipeline(_))));
    }

    #[tokio::test]
    async fn test_load_report_through_state() {
        let day = NaiveDate::from_ymd_opt(2020, 3, 15).unwrap();
        let table = RawTable::from_strs(
            "daily report 03-15-2020",
            &["Province/State", "Country/Region", "Confirmed", "Deaths", "Recovered"],
            &[&["Washington", "US", "643", "40", "1"]],
        );
        let state = state_with(MemorySource::new().with(Resource::DailyReport(day), table));

        let report = load_report(&state, "2020-03-15").await.unwrap();
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].active, 602);
    }

    #[tokio::test]
    async fn test_load_report_missing_is_pipeline_error() {
        let state = state_with(MemorySource::new());
        let err = load_report(&state, "2020-03-15").await.unwrap_err();
        assert!(matches!(err, ServerError::Pipeline(_)));
    }

    fn confirmed_series() -> RawTable {
        RawTable::from_strs(
            "confirmed time series",
            &["Province/State", "Country/Region", "3/1/20", "3/10/20", "3/30/20"],
            &[&["Ohio", "US", "0", "3", "1653"]],
        )
    }

    #[tokio::test]
    async fn test_map_rejects_unknown_case_type() {
        let state = Arc::new(state_with(MemorySource::new()));
        let query = MapQuery {
            date: "2020-03-15".into(),
            case_type: Some("hospitalized".into()),
        };

        let err = map(State(state), Query(query)).await.unwrap_err();
        assert!(matches!(err, ServerError::BadRequest(_)));
        assert_eq!(status_for(&err), axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_map_defaults_to_confirmed() {
        let day = NaiveDate::from_ymd_opt(2020, 3, 15).unwrap();
        let table = RawTable::from_strs(
            "daily report 03-15-2020",
            &["Province/State", "Country/Region", "Confirmed", "Deaths", "Recovered"],
            &[&["Washington", "US", "643", "40", "1"]],
        );
        let state = Arc::new(state_with(MemorySource::new().with(Resource::DailyReport(day), table)));
        let query = MapQuery {
            date: "03-15-2020".into(),
            case_type: None,
        };

        let Json(view) = map(State(state), Query(query)).await.unwrap();
        match view {
            MapView::StateChoropleth { case_type, states, .. } => {
                assert_eq!(case_type, CaseType::Confirmed);
                assert_eq!(states[0].value, 643);
            }
            other => panic!("expected choropleth, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_time_series_rejects_inverted_window() {
        let state = Arc::new(state_with(MemorySource::new()));
        let query = TimeSeriesQuery {
            start: NaiveDate::from_ymd_opt(2020, 3, 20),
            end: NaiveDate::from_ymd_opt(2020, 3, 10),
            all: false,
        };

        let err = state_time_series(State(state), Query(query)).await.unwrap_err();
        assert!(matches!(err, ServerError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_time_series_all_keeps_every_date() {
        let source = MemorySource::new().with(Resource::TimeSeries(CaseType::Confirmed), confirmed_series());
        let state = Arc::new(state_with(source));
        let query = TimeSeriesQuery {
            all: true,
            ..Default::default()
        };

        let Json(response) = state_time_series(State(state), Query(query)).await.unwrap();
        assert_eq!(response.window, None);
        assert_eq!(response.status, "partial");
        assert_eq!(response.series[&CaseType::Confirmed].len(), 3);
    }

    #[tokio::test]
    async fn test_time_series_default_window() {
        let source = MemorySource::new().with(Resource::TimeSeries(CaseType::Confirmed), confirmed_series());
        let state = Arc::new(state_with(source));

        let Json(response) = state_time_series(State(state), Query(TimeSeriesQuery::default()))
            .await
            .unwrap();
        let points = &response.series[&CaseType::Confirmed];
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].count, 3);
    }
}
