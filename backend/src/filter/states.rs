//! US state name to postal abbreviation lookup.

use std::collections::{HashMap, HashSet};

/// Full name to abbreviation, for the 50 states, DC and inhabited territories.
pub const US_STATE_ABBREVIATIONS: &[(&str, &str)] = &[
    ("Alabama", "AL"),
    ("Alaska", "AK"),
    ("American Samoa", "AS"),
    ("Arizona", "AZ"),
    ("Arkansas", "AR"),
    ("California", "CA"),
    ("Colorado", "CO"),
    ("Connecticut", "CT"),
    ("Delaware", "DE"),
    ("District of Columbia", "DC"),
    ("Florida", "FL"),
    ("Georgia", "GA"),
    ("Guam", "GU"),
    ("Hawaii", "HI"),
    ("Idaho", "ID"),
    ("Illinois", "IL"),
    ("Indiana", "IN"),
    ("Iowa", "IA"),
    ("Kansas", "KS"),
    ("Kentucky", "KY"),
    ("Louisiana", "LA"),
    ("Maine", "ME"),
    ("Maryland", "MD"),
    ("Massachusetts", "MA"),
    ("Michigan", "MI"),
    ("Minnesota", "MN"),
    ("Mississippi", "MS"),
    ("Missouri", "MO"),
    ("Montana", "MT"),
    ("Nebraska", "NE"),
    ("Nevada", "NV"),
    ("New Hampshire", "NH"),
    ("New Jersey", "NJ"),
    ("New Mexico", "NM"),
    ("New York", "NY"),
    ("North Carolina", "NC"),
    ("North Dakota", "ND"),
    ("Northern Mariana Islands", "MP"),
    ("Ohio", "OH"),
    ("Oklahoma", "OK"),
    ("Oregon", "OR"),
    ("Pennsylvania", "PA"),
    ("Puerto Rico", "PR"),
    ("Rhode Island", "RI"),
    ("South Carolina", "SC"),
    ("South Dakota", "SD"),
    ("Tennessee", "TN"),
    ("Texas", "TX"),
    ("Utah", "UT"),
    ("Vermont", "VT"),
    ("Virgin Islands", "VI"),
    ("Virginia", "VA"),
    ("Washington", "WA"),
    ("West Virginia", "WV"),
    ("Wisconsin", "WI"),
    ("Wyoming", "WY"),
];

/// Immutable name to abbreviation mapping.
///
/// Matching is case- and text-exact. An abbreviation already in the value set
/// resolves to itself, so re-filtering an abbreviated table is a no-op.
#[derive(Debug, Clone)]
pub struct StateAbbreviations {
    by_name: HashMap<String, String>,
    codes: HashSet<String>,
}

impl StateAbbreviations {
    pub fn new<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let by_name: HashMap<String, String> = pairs
            .into_iter()
            .map(|(name, code)| (name.to_string(), code.to_string()))
            .collect();
        let codes = by_name.values().cloned().collect();
        Self { by_name, codes }
    }

    /// The standard US table.
    pub fn us() -> Self {
        Self::new(US_STATE_ABBREVIATIONS.iter().copied())
    }

    /// Canonical abbreviation for a free-text state name, if any.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.by_name
            .get(name)
            .map(String::as_str)
            .or_else(|| self.codes.get(name).map(String::as_str))
    }

    pub fn is_abbreviation(&self, code: &str) -> bool {
        self.codes.contains(code)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

impl Default for StateAbbreviations {
    fn default() -> Self {
        Self::us()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_full_names() {
        let states = StateAbbreviations::us();
        assert_eq!(states.resolve("California"), Some("CA"));
        assert_eq!(states.resolve("District of Columbia"), Some("DC"));
        assert_eq!(states.resolve("Puerto Rico"), Some("PR"));
    }

    #[test]
    fn test_resolve_is_exact() {
        let states = StateAbbreviations::us();
        assert_eq!(states.resolve("california"), None);
        assert_eq!(states.resolve("Diamond Princess"), None);
        assert_eq!(states.resolve("King County, WA"), None);
    }

    #[test]
    fn test_abbreviation_resolves_to_itself() {
        let states = StateAbbreviations::us();
        assert_eq!(states.resolve("NY"), Some("NY"));
        assert!(states.is_abbreviation("WY"));
        assert!(!states.is_abbreviation("XX"));
    }

    #[test]
    fn test_table_is_consistent() {
        let states = StateAbbreviations::us();
        assert_eq!(states.len(), US_STATE_ABBREVIATIONS.len());
        assert!(US_STATE_ABBREVIATIONS.iter().all(|(_, code)| code.len() == 2));
    }
}
