//! Record types for NS API data.
//!
//! Every record is a plain snapshot built once from a decoded XML element
//! and owns all of its children. Records serialize to JSON through
//! [`JsonRecord`]; nested records are embedded as JSON objects and
//! timestamps as RFC 3339 strings, so `from_json(to_json(r)) == r`.

mod departure;
mod station;
mod time;
mod trip;

use serde::Serialize;
use serde::de::DeserializeOwned;

pub use departure::Departure;
pub use station::{Station, StationDirectory, StationNames};
pub use time::{
    API_DATETIME_FORMAT, TimeError, Timestamp, format_timestamp, parse_api_datetime, parse_delay,
    parse_timestamp,
};
pub use trip::{
    CANCELLED_STATUS, NOT_POSSIBLE_STATUS, Trip, TripRemark, TripStop, TripSubpart,
    is_cancelled_status,
};

/// JSON projection of a record.
pub trait JsonRecord: Serialize + DeserializeOwned {
    /// Serialize this record to a JSON string.
    fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Rebuild a record from the output of [`JsonRecord::to_json`].
    fn from_json(source: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(source)
    }
}

impl JsonRecord for Station {}
impl JsonRecord for Departure {}
impl JsonRecord for TripRemark {}
impl JsonRecord for TripStop {}
impl JsonRecord for TripSubpart {}
impl JsonRecord for Trip {}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn station_coordinates_roundtrip_exactly(lat in -90.0f64..90.0, lon in -180.0f64..180.0) {
            let station = super::tests::make_station(lat, lon);
            let restored = Station::from_json(&station.to_json().unwrap()).unwrap();
            prop_assert_eq!(restored.lat.to_bits(), lat.to_bits());
            prop_assert_eq!(restored.lon.to_bits(), lon.to_bits());
        }
    }
}
