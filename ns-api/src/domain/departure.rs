//! Live departure records.

use std::fmt;

use chrono::{DateTime, Duration, FixedOffset};
use serde::{Deserialize, Serialize};

use super::time::{TimeError, parse_api_datetime, parse_delay};

/// A train departing from a station, as shown on the live departure board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Departure {
    /// Train number (e.g., "2187")
    pub trip_number: String,

    /// Scheduled departure, verbatim (e.g., "2012-02-27T15:43:00+0100")
    pub departure_time: String,

    /// Whether the board reports a delay for this train
    pub has_delay: bool,

    /// Reported delay as an ISO-8601 duration (e.g., "PT2M")
    pub departure_delay: Option<String>,

    /// Human-readable delay (e.g., "+2 min")
    pub departure_delay_text: Option<String>,

    /// Departure platform; buses and some replacement services have none
    pub departure_platform: Option<String>,

    /// Whether the platform differs from the planned one
    pub departure_platform_changed: bool,

    /// Final destination name
    pub destination: String,

    /// Main stations on the way (e.g., "Duivendrecht, Schiphol")
    pub route_text: Option<String>,

    /// Train type (e.g., "Intercity", "Sprinter")
    pub train_type: String,

    /// Operating company (e.g., "NS", "Arriva")
    pub carrier: String,

    /// Travel advice (e.g., "Stopt niet in Sloterdijk")
    pub journey_tip: Option<String>,

    /// Remarks shown with the departure (e.g., "Rijdt vandaag niet")
    pub remarks: Vec<String>,
}

impl Departure {
    /// The reported delay, or `None` when no delay is reported.
    pub fn delay(&self) -> Option<&str> {
        if self.has_delay {
            self.departure_delay.as_deref()
        } else {
            None
        }
    }

    /// The reported delay as a duration.
    ///
    /// `Ok(None)` when no delay is reported; an error when the delay is
    /// present but not an ISO-8601 time duration.
    pub fn delay_duration(&self) -> Result<Option<Duration>, TimeError> {
        self.delay().map(parse_delay).transpose()
    }

    /// The scheduled departure as a timezone-aware instant.
    pub fn scheduled_departure(&self) -> Result<DateTime<FixedOffset>, TimeError> {
        parse_api_datetime(&self.departure_time)
    }

    /// The scheduled departure plus any reported delay.
    pub fn expected_departure(&self) -> Result<DateTime<FixedOffset>, TimeError> {
        let scheduled = self.scheduled_departure()?;
        Ok(match self.delay_duration()? {
            Some(delay) => scheduled + delay,
            None => scheduled,
        })
    }
}

impl fmt::Display for Departure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Departure> trip_number: {} {} {}",
            self.trip_number, self.destination, self.departure_time
        )
    }
}
