//! Accepted upstream column names.
//!
//! Upstream renamed most columns when it switched to county rows on
//! 2020-03-22 (`Province/State` became `Province_State`, `Long` became
//! `Long_`, ...). Each constant lists every spelling seen, preferred first.

pub const COUNTRY: &[&str] = &["Country/Region", "Country_Region", "Country"];
pub const PROVINCE_STATE: &[&str] = &["Province/State", "Province_State", "state", "State"];
pub const FIPS: &[&str] = &["FIPS"];
pub const COMBINED_KEY: &[&str] = &["Combined_Key"];

pub const LATITUDE: &[&str] = &["Lat", "Latitude"];
pub const LONGITUDE: &[&str] = &["Long_", "Long", "Longitude"];

pub const CONFIRMED: &[&str] = &["Confirmed"];
pub const DEATHS: &[&str] = &["Deaths"];
pub const RECOVERED: &[&str] = &["Recovered"];

pub const DATE: &[&str] = &["Date"];
