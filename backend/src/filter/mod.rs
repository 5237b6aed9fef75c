//! Restrict raw tables to US locations and canonicalize their keys.
//!
//! Both filters are pure: they read a [`RawTable`] and return a new one.
//!
//! # Intentional data loss
//!
//! [`LocationFilter::restrict_to_us_states`] drops every US row whose
//! state name has no abbreviation, which excludes cruise ships
//! (`Diamond Princess`, `Grand Princess`), early county-style labels
//! (`King County, WA`) and any unrecognized text.

pub mod states;

use crate::error::{DataFormatError, PipelineError, SchemaError};
use crate::parser::{columns, RawTable};

pub use states::{StateAbbreviations, US_STATE_ABBREVIATIONS};

/// Width of a county FIPS code.
pub const FIPS_WIDTH: usize = 5;

/// Country label upstream uses for the United States.
pub const US_COUNTRY: &str = "US";

/// Location filter over an injected state lookup.
#[derive(Debug, Clone, Default)]
pub struct LocationFilter {
    states: StateAbbreviations,
}

impl LocationFilter {
    pub fn new(states: StateAbbreviations) -> Self {
        Self { states }
    }

    pub fn states(&self) -> &StateAbbreviations {
        &self.states
    }

    /// Keep US rows and replace the state name with its abbreviation.
    ///
    /// Rows whose name does not resolve are dropped (see module docs).
    pub fn restrict_to_us_states(&self, table: &RawTable) -> Result<RawTable, SchemaError> {
        let country_col = table.column(columns::COUNTRY)?;
        let state_col = table.column(columns::PROVINCE_STATE)?;

        let rows = table
            .rows
            .iter()
            .enumerate()
            .filter(|(i, _)| table.cell(*i, country_col) == US_COUNTRY)
            .filter_map(|(i, row)| {
                let code = self.states.resolve(table.cell(i, state_col))?;
                let mut row = row.clone();
                row[state_col] = code.to_string();
                Some(row)
            })
            .collect();

        Ok(table.with_rows(rows))
    }

    /// Keep rows with a county identifier and left-pad it to [`FIPS_WIDTH`] digits.
    ///
    /// Rows with an empty identifier are dropped, as are identifiers wider than
    /// five digits (upstream uses those for state-wide "unassigned" buckets).
    /// A non-numeric identifier is a [`DataFormatError`].
    pub fn restrict_to_us_counties(&self, table: &RawTable) -> Result<RawTable, PipelineError> {
        let fips_col = table.column(columns::FIPS)?;

        let mut rows = Vec::with_capacity(table.len());
        for (i, row) in table.rows.iter().enumerate() {
            let raw = table.cell(i, fips_col);
            if raw.is_empty() {
                continue;
            }
            let digits = fips_digits(raw).ok_or_else(|| DataFormatError::InvalidIdentifier {
                column: table.headers[fips_col].clone(),
                row: i + 1,
                value: raw.to_string(),
            })?;
            if digits.len() > FIPS_WIDTH {
                continue;
            }
            let mut row = row.clone();
            row[fips_col] = format!("{:0>width$}", digits, width = FIPS_WIDTH);
            rows.push(row);
        }

        Ok(table.with_rows(rows))
    }
}

/// Digits of a county identifier, accepting integral floats such as `6037.0`.
fn fips_digits(raw: &str) -> Option<&str> {
    let digits = match raw.split_once('.') {
        Some((int, frac)) if frac.chars().all(|c| c == '0') => int,
        Some(_) => return None,
        None => raw,
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(digits)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_table() -> RawTable {
        RawTable::from_strs(
            "daily report 03-15-2020",
            &["Province/State", "Country/Region", "Confirmed"],
            &[
                &["California", "US", "100"],
                &["Ontario", "Canada", "5"],
                &["Diamond Princess", "US", "46"],
                &["New York", "US", "729"],
                &["Georgia", "Georgia", "30"],
            ],
        )
    }

    #[test]
    fn test_states_keeps_us_and_abbreviates() {
        let filter = LocationFilter::default();
        let result = filter.restrict_to_us_states(&state_table()).unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result.rows[0], vec!["CA", "US", "100"]);
        assert_eq!(result.rows[1], vec!["NY", "US", "729"]);
    }

    #[test]
    fn test_states_rows_satisfy_invariant() {
        let filter = LocationFilter::default();
        let result = filter.restrict_to_us_states(&state_table()).unwrap();

        for i in 0..result.len() {
            assert_eq!(result.cell(i, 1), "US");
            assert!(filter.states().is_abbreviation(result.cell(i, 0)));
        }
    }

    #[test]
    fn test_states_is_idempotent() {
        let filter = LocationFilter::default();
        let once = filter.restrict_to_us_states(&state_table()).unwrap();
        let twice = filter.restrict_to_us_states(&once).unwrap();

        assert_eq!(once, twice);
    }

    #[test]
    fn test_states_source_untouched() {
        let filter = LocationFilter::default();
        let table = state_table();
        let _ = filter.restrict_to_us_states(&table).unwrap();

        assert_eq!(table.cell(0, 0), "California");
        assert_eq!(table.len(), 5);
    }

    #[test]
    fn test_states_accepts_underscore_headers() {
        let table = RawTable::from_strs(
            "t",
            &["Province_State", "Country_Region"],
            &[&["Texas", "US"]],
        );
        let result = LocationFilter::default().restrict_to_us_states(&table).unwrap();
        assert_eq!(result.rows[0][0], "TX");
    }

    #[test]
    fn test_states_missing_country_column() {
        let table = RawTable::from_strs("t", &["Province/State"], &[&["Texas"]]);
        let err = LocationFilter::default().restrict_to_us_states(&table).unwrap_err();
        assert!(matches!(err, SchemaError::MissingColumn { ref column, .. } if column == "Country/Region"));
    }

    #[test]
    fn test_custom_lookup_is_injected() {
        let filter = LocationFilter::new(StateAbbreviations::new([("Texas", "TX")]));
        let result = filter.restrict_to_us_states(&state_table()).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_counties_pads_and_drops_missing() {
        let table = RawTable::from_strs(
            "daily report 03-23-2020",
            &["FIPS", "Admin2", "Confirmed"],
            &[
                &["3401", "Somewhere", "7"],
                &["", "Unassigned", "2"],
                &["36061", "New York", "10"],
                &["6037.0", "Los Angeles", "3"],
            ],
        );
        let result = LocationFilter::default().restrict_to_us_counties(&table).unwrap();

        let fips: Vec<&str> = (0..result.len()).map(|i| result.cell(i, 0)).collect();
        assert_eq!(fips, vec!["03401", "36061", "06037"]);
        for code in fips {
            assert_eq!(code.len(), FIPS_WIDTH);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_counties_drops_wide_identifiers() {
        let table = RawTable::from_strs("t", &["FIPS"], &[&["84000001"], &["1001"]]);
        let result = LocationFilter::default().restrict_to_us_counties(&table).unwrap();
        assert_eq!(result.rows, vec![vec!["01001".to_string()]]);
    }

    #[test]
    fn test_counties_rejects_non_numeric() {
        let table = RawTable::from_strs("t", &["FIPS"], &[&["1001"], &["abc"]]);
        let err = LocationFilter::default().restrict_to_us_counties(&table).unwrap_err();
        match err {
            PipelineError::DataFormat(DataFormatError::InvalidIdentifier { row, value, .. }) => {
                assert_eq!(row, 2);
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_counties_missing_column() {
        let table = RawTable::from_strs("t", &["Admin2"], &[&["Kings"]]);
        let err = LocationFilter::default().restrict_to_us_counties(&table).unwrap_err();
        assert!(matches!(err, PipelineError::Schema(_)));
    }
}
