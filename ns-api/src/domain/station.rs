//! Station records and lookup.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The three lengths of a station name the API provides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationNames {
    /// e.g. "Den Bosch"
    pub short: String,
    /// e.g. "'s-Hertogenbosch"
    pub middle: String,
    /// e.g. "'s-Hertogenbosch"
    pub long: String,
}

/// Information on a railway station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    /// Station code (e.g., "HT"), unique across the network
    pub code: String,

    /// International UIC code (e.g., "8400319")
    pub uic_code: String,

    /// Station category (e.g., "knooppuntIntercitystation")
    pub station_type: String,

    /// Short, middle and long names
    pub names: StationNames,

    /// Country code (e.g., "NL", "D")
    pub country: String,

    /// Latitude in decimal degrees
    pub lat: f64,

    /// Longitude in decimal degrees
    pub lon: f64,

    /// Alternative names; empty when the station has none
    pub synonyms: Vec<String>,
}

impl Station {
    /// Whether `name` is one of this station's names or synonyms.
    ///
    /// Comparison ignores ASCII case.
    pub fn is_known_as(&self, name: &str) -> bool {
        let StationNames {
            short,
            middle,
            long,
        } = &self.names;
        [short, middle, long]
            .into_iter()
            .chain(self.synonyms.iter())
            .any(|candidate| candidate.eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Station> {} {}", self.code, self.names.long)
    }
}

/// Station lookup by code or by name.
///
/// Built from the station list endpoint. Codes are matched ignoring case,
/// since the departures endpoint accepts and returns them lowercase.
#[derive(Debug, Clone, Default)]
pub struct StationDirectory {
    by_code: HashMap<String, Station>,
}

impl StationDirectory {
    /// Build a directory from a station list.
    ///
    /// Later entries with the same code replace earlier ones.
    pub fn new(stations: impl IntoIterator<Item = Station>) -> Self {
        let by_code = stations
            .into_iter()
            .map(|s| (s.code.to_uppercase(), s))
            .collect();
        Self { by_code }
    }

    /// Look up a station by its code.
    pub fn get(&self, code: &str) -> Option<&Station> {
        self.by_code.get(&code.to_uppercase())
    }

    /// Long name of the station with this code.
    pub fn long_name(&self, code: &str) -> Option<&str> {
        self.get(code).map(|s| s.names.long.as_str())
    }

    /// Find a station by any of its names or synonyms.
    pub fn find_by_name(&self, name: &str) -> Option<&Station> {
        self.by_code.values().find(|s| s.is_known_as(name))
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}
