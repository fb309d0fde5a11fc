//! Client library for the NS (Dutch railways) web services.
//!
//! Fetches the station list, live departures and trip planner results,
//! and decodes the XML responses into plain records with JSON
//! projections.

pub mod domain;
pub mod ns;
