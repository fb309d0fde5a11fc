//! NS (Dutch railways) web services client.
//!
//! This module provides a client for the NS XML API, which serves the
//! station list, live departure boards and the trip planner.
//!
//! Key characteristics of the API:
//! - Responses are XML with Dutch element names (`VertrekTijd`,
//!   `ReisDeel`), read here as opaque keys
//! - An element that can repeat is sent bare when there is only one of it,
//!   so every repeatable field goes through [`normalize_to_sequence`]
//! - Timestamps carry a colon-less offset (`2012-02-27T15:43:00+0100`)
//! - Authentication is HTTP Basic with a username and API key

mod client;
mod convert;
mod error;
mod mock;
mod transport;
mod xml;

pub use client::{
    API_KEY_VAR, BASE_URL_VAR, DEPARTURES_PATH, NsApi, NsApiConfig, STATIONS_PATH, TRIPS_PATH,
    TripQuery, USERNAME_VAR,
};
pub use convert::{
    ConversionError, map_departure, map_station, map_trip, map_trip_remark, map_trip_stop,
    map_trip_subpart, parse_departures, parse_stations, parse_trips,
};
pub use error::NsApiError;
pub use mock::{MockTransport, RecordedRequest};
pub use transport::{HttpTransport, Transport};
pub use xml::{DecodeError, Node, decode, normalize_to_sequence};

pub use reqwest::Method;
