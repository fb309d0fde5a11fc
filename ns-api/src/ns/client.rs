//! NS API client.
//!
//! One method per logical endpoint. Each call performs exactly one
//! request through the configured [`Transport`] and parses the body; there
//! is no caching and no retrying.

use std::time::Duration;

use chrono::NaiveDateTime;
use reqwest::Method;
use tracing::debug;

use crate::domain::{Departure, Station, Timestamp, Trip, format_timestamp};

use super::convert::{parse_departures, parse_stations, parse_trips};
use super::error::NsApiError;
use super::transport::{HttpTransport, Transport};

/// Default base URL for the NS web services.
const DEFAULT_BASE_URL: &str = "https://webservices.ns.nl";

/// Default User-Agent header.
const DEFAULT_USER_AGENT: &str = "ns_api";

/// Endpoint paths, relative to the base URL.
pub const STATIONS_PATH: &str = "ns-api-stations-v2";
pub const DEPARTURES_PATH: &str = "ns-api-avt";
pub const TRIPS_PATH: &str = "ns-api-treinplanner";

/// Format of the `dateTime` trip planner parameter.
const TRIP_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Environment variable names read by [`NsApiConfig::from_env`].
pub const USERNAME_VAR: &str = "NS_API_USERNAME";
pub const API_KEY_VAR: &str = "NS_API_KEY";
pub const BASE_URL_VAR: &str = "NS_API_BASE_URL";

/// Configuration for the NS API client.
#[derive(Debug, Clone)]
pub struct NsApiConfig {
    /// Account name (usually an e-mail address)
    pub username: String,
    /// API key issued for the account
    pub api_key: String,
    /// Base URL for the API (defaults to production)
    pub base_url: String,
    /// User-Agent header value
    pub user_agent: String,
    /// Request timeout; `None` keeps the HTTP client default
    pub timeout: Option<Duration>,
}

impl NsApiConfig {
    /// Create a new config with the given credentials.
    pub fn new(username: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: None,
        }
    }

    /// Read credentials (and optionally the base URL) from the environment.
    pub fn from_env() -> Result<Self, NsApiError> {
        let var = |name: &str| {
            std::env::var(name)
                .ok()
                .filter(|value| !value.is_empty())
        };
        let missing = |name: &str| NsApiError::NotConfigured(format!("{name} is not set"));

        let username = var(USERNAME_VAR).ok_or_else(|| missing(USERNAME_VAR))?;
        let api_key = var(API_KEY_VAR).ok_or_else(|| missing(API_KEY_VAR))?;

        let config = Self::new(username, api_key);
        Ok(match var(BASE_URL_VAR) {
            Some(url) => config.with_base_url(url),
            None => config,
        })
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the User-Agent header.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set a request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Parameters for a trip planner query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripQuery {
    pub from: String,
    pub to: String,
    pub via: Option<String>,
    /// Requested time; `None` means now
    pub date_time: Option<NaiveDateTime>,
    /// Whether `date_time` is the departure (true) or arrival (false) time
    pub departure: bool,
}

impl TripQuery {
    /// Travel from `from` to `to`, departing now.
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            via: None,
            date_time: None,
            departure: true,
        }
    }

    /// Travel via an intermediate station.
    pub fn via(mut self, station: impl Into<String>) -> Self {
        self.via = Some(station.into());
        self
    }

    /// Depart at the given local time.
    pub fn departing_at(mut self, date_time: NaiveDateTime) -> Self {
        self.date_time = Some(date_time);
        self.departure = true;
        self
    }

    /// Arrive by the given local time.
    pub fn arriving_by(mut self, date_time: NaiveDateTime) -> Self {
        self.date_time = Some(date_time);
        self.departure = false;
        self
    }

    /// Query string parameters for the trip planner endpoint.
    pub fn params(&self) -> Result<Vec<(&'static str, String)>, NsApiError> {
        let mut params = vec![
            ("fromStation", self.from.clone()),
            ("toStation", self.to.clone()),
        ];
        if let Some(via) = &self.via {
            params.push(("viaStation", via.clone()));
        }
        if let Some(date_time) = self.date_time {
            let formatted = format_timestamp(&Timestamp::Naive(date_time), TRIP_DATETIME_FORMAT)
                .map_err(|e| NsApiError::Conversion(e.into()))?;
            params.push(("dateTime", formatted));
            params.push(("departure", self.departure.to_string()));
        }
        Ok(params)
    }
}

/// NS API client.
///
/// Generic over its [`Transport`] so tests can substitute
/// [`MockTransport`](super::MockTransport).
#[derive(Debug, Clone)]
pub struct NsApi<T = HttpTransport> {
    transport: T,
    base_url: String,
}

impl NsApi<HttpTransport> {
    /// Create a client that talks to the real API.
    pub fn new(config: NsApiConfig) -> Result<Self, NsApiError> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(transport, config.base_url))
    }
}

impl<T: Transport> NsApi<T> {
    /// Create a client over any transport.
    pub fn with_transport(transport: T, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
        }
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    fn get(&self, path: &str, params: &[(&str, &str)]) -> Result<String, NsApiError> {
        self.transport
            .request(Method::GET, &self.url(path), None, params)
    }

    /// Fetch the list of all stations.
    pub fn get_stations(&self) -> Result<Vec<Station>, NsApiError> {
        let body = self.get(STATIONS_PATH, &[])?;
        let stations = parse_stations(&body)?;
        debug!(count = stations.len(), "parsed stations");
        Ok(stations)
    }

    /// Fetch the live departures from a station (code or name).
    pub fn get_departures(&self, station: &str) -> Result<Vec<Departure>, NsApiError> {
        let body = self.get(DEPARTURES_PATH, &[("station", station)])?;
        let departures = parse_departures(&body)?;
        debug!(station, count = departures.len(), "parsed departures");
        Ok(departures)
    }

    /// Fetch travel possibilities from `start` to `destination`.
    ///
    /// `start_time` is the local departure time; `None` means now.
    pub fn get_trips(
        &self,
        start_time: Option<NaiveDateTime>,
        start: &str,
        via: Option<&str>,
        destination: &str,
    ) -> Result<Vec<Trip>, NsApiError> {
        let mut query = TripQuery::new(start, destination);
        if let Some(via) = via {
            query = query.via(via);
        }
        if let Some(start_time) = start_time {
            query = query.departing_at(start_time);
        }
        self.plan_trips(&query)
    }

    /// Fetch travel possibilities for a full query.
    pub fn plan_trips(&self, query: &TripQuery) -> Result<Vec<Trip>, NsApiError> {
        let params = query.params()?;
        let params: Vec<(&str, &str)> = params.iter().map(|(k, v)| (*k, v.as_str())).collect();

        let body = self.get(TRIPS_PATH, &params)?;
        let trips = parse_trips(&body)?;
        debug!(
            from = %query.from,
            to = %query.to,
            count = trips.len(),
            "parsed trips"
        );
        Ok(trips)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ns::convert::ConversionError;
    use crate::ns::mock::MockTransport;
    use chrono::NaiveDate;

    const MOCK_DIR: &str = "data/mock_responses";

    fn mock_client() -> NsApi<MockTransport> {
        NsApi::with_transport(MockTransport::from_dir(MOCK_DIR).unwrap(), DEFAULT_BASE_URL)
    }

    fn datetime(hour: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2012, 2, 27)
            .unwrap()
            .and_hms_opt(hour, min, 0)
            .unwrap()
    }

    #[test]
    fn config_builder() {
        let config = NsApiConfig::new("user@example.com", "secret")
            .with_base_url("http://localhost:8080")
            .with_user_agent("test-agent")
            .with_timeout(Duration::from_secs(10));

        assert_eq!(config.username, "user@example.com");
        assert_eq!(config.api_key, "secret");
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.user_agent, "test-agent");
        assert_eq!(config.timeout, Some(Duration::from_secs(10)));
    }

    #[test]
    fn config_defaults() {
        let config = NsApiConfig::new("user@example.com", "secret");

        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(config.timeout, None);
    }

    #[test]
    fn client_creation() {
        let config = NsApiConfig::new("user@example.com", "secret");
        assert!(NsApi::new(config).is_ok());
    }

    #[test]
    fn trip_query_params() {
        let query = TripQuery::new("Utrecht Centraal", "Wierden")
            .via("Amersfoort")
            .arriving_by(datetime(15, 50));

        let params = query.params().unwrap();
        assert_eq!(
            params,
            vec![
                ("fromStation", "Utrecht Centraal".to_string()),
                ("toStation", "Wierden".to_string()),
                ("viaStation", "Amersfoort".to_string()),
                ("dateTime", "2012-02-27T15:50".to_string()),
                ("departure", "false".to_string()),
            ]
        );
    }

    #[test]
    fn trip_query_defaults_to_now() {
        let params = TripQuery::new("ut", "wd").params().unwrap();
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn get_stations_from_mock() {
        let client = mock_client();
        let stations = client.get_stations().unwrap();

        assert_eq!(stations.len(), 3);
        assert_eq!(stations[0].code, "HT");
        assert_eq!(stations[0].synonyms.len(), 2);
        assert_eq!(stations[1].code, "UT");
        assert!(stations[1].synonyms.is_empty());
        assert_eq!(stations[2].country, "D");

        let requests = client.transport().requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, "https://webservices.ns.nl/ns-api-stations-v2");
        assert!(requests[0].params.is_empty());
    }

    #[test]
    fn get_departures_from_mock() {
        let client = mock_client();
        let departures = client.get_departures("ut").unwrap();

        assert_eq!(departures.len(), 2);
        assert!(departures[0].has_delay);
        assert!(!departures[1].has_delay);

        let requests = client.transport().requests();
        assert_eq!(
            requests[0].params,
            vec![("station".to_string(), "ut".to_string())]
        );
    }

    #[test]
    fn get_trips_from_mock() {
        let client = mock_client();
        let trips = client
            .get_trips(Some(datetime(15, 45)), "Utrecht Centraal", None, "Zwolle")
            .unwrap();

        assert_eq!(trips.len(), 2);
        assert!(trips[0].going);
        assert!(!trips[1].going);
        assert_eq!(trips[1].travel_time_planned, None);

        let requests = client.transport().requests();
        let params = &requests[0].params;
        assert!(params.contains(&("fromStation".to_string(), "Utrecht Centraal".to_string())));
        assert!(params.contains(&("toStation".to_string(), "Zwolle".to_string())));
        assert!(params.contains(&("dateTime".to_string(), "2012-02-27T15:45".to_string())));
        assert!(params.contains(&("departure".to_string(), "true".to_string())));
        assert!(!params.iter().any(|(k, _)| k == "viaStation"));
    }

    #[test]
    fn error_payload_is_unexpected_schema() {
        let transport = MockTransport::new().with_response(
            TRIPS_PATH,
            "<error><message>Ongeldige stationsnaam</message></error>",
        );
        let client = NsApi::with_transport(transport, DEFAULT_BASE_URL);

        let err = client.get_trips(None, "nowhere", None, "ut").unwrap_err();
        assert!(matches!(
            err,
            NsApiError::Conversion(ConversionError::UnexpectedSchema { .. })
        ));
    }

    #[test]
    fn missing_endpoint_is_api_error() {
        let client = NsApi::with_transport(MockTransport::new(), DEFAULT_BASE_URL);
        let err = client.get_stations().unwrap_err();
        assert_eq!(err.status(), Some(404));
    }
}
