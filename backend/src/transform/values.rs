//! Cell coercion: dates, case counts and coordinates.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{DataFormatError, PipelineError};
use crate::models::Coordinates;
use crate::parser::RawTable;

/// `M/D/YY`, `MM-DD-YYYY`, `MM/DD/YYYY`, `MM-DD-YY`
static US_DATE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})[/-](\d{1,2})[/-](\d{4}|\d{2})$").ok());

/// `YYYY-MM-DD`
static ISO_DATE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})$").ok());

/// Parse a date label in any form upstream or callers use.
///
/// Two-digit years are 20xx.
pub fn parse_date_label(label: &str) -> Option<NaiveDate> {
    let label = label.trim();

    if let Some(caps) = US_DATE.as_ref().and_then(|re| re.captures(label)) {
        let month = caps[1].parse().ok()?;
        let day = caps[2].parse().ok()?;
        let year: i32 = caps[3].parse().ok()?;
        let year = if caps[3].len() == 2 { 2000 + year } else { year };
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    if let Some(caps) = ISO_DATE.as_ref().and_then(|re| re.captures(label)) {
        let year = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        let day = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    None
}

/// Parse a caller-supplied report date (`MM-DD-YYYY`, `MM-DD-YY` or `YYYY-MM-DD`).
pub fn parse_report_date(input: &str) -> Result<NaiveDate, PipelineError> {
    parse_date_label(input).ok_or_else(|| PipelineError::InvalidReportDate(input.to_string()))
}

/// Non-negative case count. Empty reads as 0; integral floats (`12.0`) are accepted.
pub fn parse_count(table: &RawTable, row: usize, column: usize) -> Result<i64, DataFormatError> {
    let raw = table.cell(row, column);
    if raw.is_empty() {
        return Ok(0);
    }

    let count = raw.parse::<i64>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite() && f.fract() == 0.0)
            .map(|f| f as i64)
    });

    match count {
        Some(n) if n >= 0 => Ok(n),
        _ => Err(DataFormatError::InvalidCount {
            column: table.headers[column].clone(),
            row: row + 1,
            value: raw.to_string(),
        }),
    }
}

/// Latitude/longitude of a row, `None` when either cell is empty.
pub fn parse_coordinates(
    table: &RawTable,
    row: usize,
    lat_col: usize,
    lon_col: usize,
) -> Result<Option<Coordinates>, DataFormatError> {
    let lat = parse_coordinate(table, row, lat_col)?;
    let lon = parse_coordinate(table, row, lon_col)?;
    Ok(lat.zip(lon).map(|(lat, lon)| Coordinates { lat, lon }))
}

fn parse_coordinate(table: &RawTable, row: usize, column: usize) -> Result<Option<f64>, DataFormatError> {
    let raw = table.cell(row, column);
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(Some)
        .ok_or_else(|| DataFormatError::InvalidCoordinate {
            column: table.headers[column].clone(),
            row: row + 1,
            value: raw.to_string(),
        })
}
