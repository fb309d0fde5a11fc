//! Trip planner records.
//!
//! A [`Trip`] is one travel possibility between two stations. It is made
//! of [`TripSubpart`]s (one per vehicle or walk), each of which lists the
//! [`TripStop`]s it calls at.

use std::fmt;

use chrono::{DateTime, Duration, FixedOffset};
use serde::{Deserialize, Serialize};

/// Subpart status for a cancelled train.
pub const CANCELLED_STATUS: &str = "GEANNULEERD";

/// Trip status for a possibility that can no longer be travelled.
pub const NOT_POSSIBLE_STATUS: &str = "NIET-MOGELIJK";

/// A message attached to a trip, such as a disruption notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripRemark {
    /// Remark identifier; often empty
    pub id: String,

    /// Whether the remark affects the trip itself
    pub is_grave: bool,

    /// Message text
    pub text: String,
}

impl fmt::Display for TripRemark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<TripRemark> {} {}", self.is_grave, self.text)
    }
}

/// A station a subpart calls at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripStop {
    /// Station name
    pub name: String,

    /// Time at this stop; absent for stops the planner has no time for
    pub time: Option<DateTime<FixedOffset>>,

    /// Platform, when known
    pub platform: Option<String>,

    /// Whether the platform differs from the planned one
    pub platform_changed: bool,
}

impl fmt::Display for TripStop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<TripStop> {}", self.name)
    }
}

/// One leg of a trip: a single train, bus or walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripSubpart {
    /// Travel mode tag (e.g., "TRAIN", "WALK")
    pub trip_type: String,

    /// Operating company (e.g., "NS")
    pub transporter: String,

    /// Transport type (e.g., "Sprinter")
    pub transport_type: String,

    /// Train number
    pub journey_id: String,

    /// Status code (e.g., "VOLGENS-PLAN", "GEANNULEERD")
    pub status: String,

    /// False exactly when the status is [`CANCELLED_STATUS`]
    pub going: bool,

    /// Calling points, in travel order
    pub stops: Vec<TripStop>,
}

impl TripSubpart {
    /// First stop of this leg.
    pub fn departure_stop(&self) -> Option<&TripStop> {
        self.stops.first()
    }

    /// Last stop of this leg.
    pub fn arrival_stop(&self) -> Option<&TripStop> {
        self.stops.last()
    }
}

impl fmt::Display for TripSubpart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<TripSubpart> [{}] {} {} {}",
            self.going, self.journey_id, self.trip_type, self.status
        )
    }
}

/// A travel possibility returned by the trip planner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trip {
    /// Overall status (e.g., "VOLGENS-PLAN", "NIET-MOGELIJK")
    pub status: String,

    /// Number of changes
    pub nr_transfers: u32,

    /// Planned travel time (e.g., "0:35"); absent for cancelled trips
    pub travel_time_planned: Option<String>,

    /// Actual travel time (e.g., "0:36")
    pub travel_time_actual: Option<String>,

    /// Whether the planner marks this as the best possibility
    pub is_optimal: bool,

    /// False when the trip is cancelled or cannot be made
    pub going: bool,

    pub departure_time_planned: Option<DateTime<FixedOffset>>,
    pub departure_time_actual: Option<DateTime<FixedOffset>>,
    pub arrival_time_planned: Option<DateTime<FixedOffset>>,
    pub arrival_time_actual: Option<DateTime<FixedOffset>>,

    /// Legs, in travel order
    pub trip_parts: Vec<TripSubpart>,

    /// Remarks; empty when there are none
    pub trip_remarks: Vec<TripRemark>,
}

impl Trip {
    /// How much later than planned the trip departs.
    ///
    /// `None` means on time or unknown (either departure time missing),
    /// never "zero delay".
    pub fn delay(&self) -> Option<Duration> {
        let planned = self.departure_time_planned?;
        let actual = self.departure_time_actual?;
        (actual > planned).then(|| actual - planned)
    }

    /// Short summary of the delay, e.g. "+5 min".
    ///
    /// Partial minutes round up, so any delay reads as at least "+1 min".
    pub fn delay_text(&self) -> Option<String> {
        self.delay().map(|d| {
            let seconds = d.num_seconds() + i64::from(d.subsec_nanos() > 0);
            format!("+{} min", (seconds + 59) / 60)
        })
    }

    /// Whether any remark affects the trip.
    pub fn has_grave_remarks(&self) -> bool {
        self.trip_remarks.iter().any(|r| r.is_grave)
    }
}

impl fmt::Display for Trip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |t: Option<DateTime<FixedOffset>>| {
            t.map(|t| t.to_rfc3339()).unwrap_or_else(|| "-".to_string())
        };
        write!(
            f,
            "<Trip> plan: {} actual: {} transfers: {}",
            show(self.departure_time_planned),
            show(self.departure_time_actual),
            self.nr_transfers
        )
    }
}

/// Whether a trip status means the possibility will not run.
pub fn is_cancelled_status(status: &str) -> bool {
    status == CANCELLED_STATUS || status == NOT_POSSIBLE_STATUS
}
