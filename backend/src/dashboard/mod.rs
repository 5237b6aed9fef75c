//! Chart-ready map data for a daily report.
//!
//! The report's granularity decides the view: state-level reports become a
//! choropleth keyed by state abbreviation, county-level reports a scatter of
//! county centroids. Color values are on a log10 scale so a handful of
//! large outbreaks do not wash out the rest of the map. Styling and
//! projection are left to the browser.

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{CaseType, DailyReport, LocationKey, NormalizedLocationRecord, ReportGranularity};

/// Counts shown on hover.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HoverData {
    pub confirmed: i64,
    pub deaths: i64,
    pub recovered: i64,
    pub active: i64,
}

impl From<&NormalizedLocationRecord> for HoverData {
    fn from(r: &NormalizedLocationRecord) -> Self {
        Self {
            confirmed: r.confirmed,
            deaths: r.deaths,
            recovered: r.recovered,
            active: r.active,
        }
    }
}

/// One state of a choropleth.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateShade {
    pub state: String,
    pub value: i64,
    /// `log10(value)`, `None` when value <= 0.
    pub color: Option<f64>,
    pub hover: HoverData,
}

/// One county marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountyMarker {
    pub fips: String,
    pub label: Option<String>,
    pub lat: f64,
    pub lon: f64,
    pub value: i64,
    /// `log10(value + 1)`, `None` when value + 1 <= 0.
    pub color: Option<f64>,
    pub hover: HoverData,
}

/// Map payload for one (date, case type).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum MapView {
    #[serde(rename_all = "camelCase")]
    StateChoropleth {
        date: NaiveDate,
        case_type: CaseType,
        states: Vec<StateShade>,
    },
    #[serde(rename_all = "camelCase")]
    CountyScatter {
        date: NaiveDate,
        case_type: CaseType,
        /// Ascending by value, so the largest markers draw last.
        markers: Vec<CountyMarker>,
    },
}

impl MapView {
    pub fn len(&self) -> usize {
        match self {
            MapView::StateChoropleth { states, .. } => states.len(),
            MapView::CountyScatter { markers, .. } => markers.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn log10_positive(value: f64) -> Option<f64> {
    (value > 0.0).then(|| value.log10())
}

/// Build the map view for `case_type` from a normalized report.
pub fn map_view(report: &DailyReport, case_type: CaseType) -> MapView {
    match report.granularity {
        ReportGranularity::StateLevel => MapView::StateChoropleth {
            date: report.date,
            case_type,
            states: report
                .records
                .iter()
                .map(|r| {
                    let value = case_type.value(r);
                    StateShade {
                        state: r.key.as_str().to_string(),
                        value,
                        color: log10_positive(value as f64),
                        hover: r.into(),
                    }
                })
                .collect(),
        },
        ReportGranularity::CountyLevel => {
            let mut markers: Vec<CountyMarker> = report
                .records
                .iter()
                .filter_map(|r| {
                    let coords = r.coordinates?;
                    let fips = match &r.key {
                        LocationKey::County(code) => code.clone(),
                        LocationKey::State(_) => return None,
                    };
                    let value = case_type.value(r);
                    Some(CountyMarker {
                        fips,
                        label: r.combined_key.clone(),
                        lat: coords.lat,
                        lon: coords.lon,
                        value,
                        color: log10_positive(value as f64 + 1.0),
                        hover: r.into(),
                    })
                })
                .collect();
            markers.sort_by_key(|m| m.value);
            MapView::CountyScatter {
                date: report.date,
                case_type,
                markers,
            }
        }
    }
}
