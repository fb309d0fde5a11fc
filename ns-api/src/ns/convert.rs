//! Mapping from decoded XML trees to records.
//!
//! Each `map_*` function reads a fixed set of fields from one element.
//! Required fields fail with [`ConversionError::MissingField`]; optional
//! fields that are absent or empty become `None` (or an empty `Vec` for
//! repeated fields). A single bad record fails the whole parse.

use chrono::{DateTime, FixedOffset};

use crate::domain::{
    CANCELLED_STATUS, Departure, Station, StationNames, TimeError, Trip, TripRemark, TripStop,
    TripSubpart, is_cancelled_status, parse_api_datetime,
};

use super::xml::{DecodeError, Node, decode, normalize_to_sequence};

/// Error during XML to record conversion.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConversionError {
    /// Response body is not well-formed XML
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Document lacks the expected root element
    #[error("unexpected schema: expected <{expected}>, found {}", .found.as_deref().unwrap_or("nothing"))]
    UnexpectedSchema {
        expected: &'static str,
        found: Option<String>,
    },

    /// Missing required field
    #[error("missing required field: {0}")]
    MissingField(String),

    /// Field present but not a valid number
    #[error("invalid number in {field}: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    /// Timestamp field does not match the API format
    #[error(transparent)]
    Time(#[from] TimeError),
}

/// Text of a required child element.
fn required_text<'a>(node: &'a Node, key: &str) -> Result<&'a str, ConversionError> {
    node.get(key)
        .and_then(Node::text)
        .ok_or_else(|| ConversionError::MissingField(key.to_string()))
}

/// Text of an optional child element; empty text counts as absent.
fn optional_text<'a>(node: &'a Node, key: &str) -> Option<&'a str> {
    node.get(key)
        .and_then(Node::text)
        .filter(|text| !text.is_empty())
}

/// A required child element.
fn required_child<'a>(node: &'a Node, key: &str) -> Result<&'a Node, ConversionError> {
    node.get(key)
        .ok_or_else(|| ConversionError::MissingField(key.to_string()))
}

/// Text values of a possibly-repeated field nested in a container
/// element, e.g. `<Synoniemen><Synoniem>..</Synoniem></Synoniemen>`.
fn text_list(node: &Node, container: &str, item: &str) -> Vec<String> {
    let items = node.get(container).and_then(|c| c.get(item));
    normalize_to_sequence(items)
        .into_iter()
        .filter_map(Node::text)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
        .collect()
}

fn required_number<T: std::str::FromStr>(
    node: &Node,
    key: &'static str,
) -> Result<T, ConversionError> {
    let text = required_text(node, key)?;
    text.trim()
        .parse()
        .map_err(|_| ConversionError::InvalidNumber {
            field: key,
            value: text.to_string(),
        })
}

/// `true` exactly when the text is "true".
fn flag(text: Option<&str>) -> bool {
    text == Some("true")
}

fn optional_datetime(
    node: &Node,
    key: &str,
) -> Result<Option<DateTime<FixedOffset>>, ConversionError> {
    optional_text(node, key)
        .map(parse_api_datetime)
        .transpose()
        .map_err(ConversionError::from)
}

/// Map a `<Station>` element.
pub fn map_station(node: &Node) -> Result<Station, ConversionError> {
    let names = required_child(node, "Namen")?;

    Ok(Station {
        code: required_text(node, "Code")?.to_string(),
        uic_code: required_text(node, "UICCode")?.to_string(),
        station_type: required_text(node, "Type")?.to_string(),
        names: StationNames {
            short: required_text(names, "Kort")?.to_string(),
            middle: required_text(names, "Middel")?.to_string(),
            long: required_text(names, "Lang")?.to_string(),
        },
        country: required_text(node, "Land")?.to_string(),
        lat: required_number(node, "Lat")?,
        lon: required_number(node, "Lon")?,
        synonyms: text_list(node, "Synoniemen", "Synoniem"),
    })
}

/// Map a `<VertrekkendeTrein>` element.
pub fn map_departure(node: &Node) -> Result<Departure, ConversionError> {
    let departure_delay = optional_text(node, "VertrekVertraging").map(str::to_string);
    let platform = node.get("VertrekSpoor");

    Ok(Departure {
        trip_number: required_text(node, "RitNummer")?.to_string(),
        departure_time: required_text(node, "VertrekTijd")?.to_string(),
        has_delay: departure_delay.is_some(),
        departure_delay,
        departure_delay_text: optional_text(node, "VertrekVertragingTekst").map(str::to_string),
        departure_platform: platform
            .and_then(Node::text)
            .filter(|text| !text.is_empty())
            .map(str::to_string),
        departure_platform_changed: flag(platform.and_then(|p| p.attribute("wijziging"))),
        destination: required_text(node, "EindBestemming")?.to_string(),
        route_text: optional_text(node, "RouteTekst").map(str::to_string),
        train_type: required_text(node, "TreinSoort")?.to_string(),
        carrier: required_text(node, "Vervoerder")?.to_string(),
        journey_tip: optional_text(node, "ReisTip").map(str::to_string),
        remarks: text_list(node, "Opmerkingen", "Opmerking"),
    })
}

/// Map a `<Melding>` element.
pub fn map_trip_remark(node: &Node) -> Result<TripRemark, ConversionError> {
    Ok(TripRemark {
        id: required_text(node, "Id")?.to_string(),
        is_grave: required_text(node, "Ernstig")? != "false",
        text: required_text(node, "Text")?.to_string(),
    })
}

/// Map a `<ReisStop>` element.
pub fn map_trip_stop(node: &Node) -> Result<TripStop, ConversionError> {
    let platform = node.get("Spoor");

    Ok(TripStop {
        name: required_text(node, "Naam")?.to_string(),
        time: optional_datetime(node, "Tijd")?,
        platform: platform
            .and_then(Node::text)
            .filter(|text| !text.is_empty())
            .map(str::to_string),
        platform_changed: flag(platform.and_then(|p| p.attribute("wijziging"))),
    })
}

/// Map a `<ReisDeel>` element.
pub fn map_trip_subpart(node: &Node) -> Result<TripSubpart, ConversionError> {
    let status = required_text(node, "Status")?;
    let trip_type = node
        .attribute("reisSoort")
        .ok_or_else(|| ConversionError::MissingField("@reisSoort".to_string()))?;

    Ok(TripSubpart {
        trip_type: trip_type.to_string(),
        transporter: required_text(node, "Vervoerder")?.to_string(),
        transport_type: required_text(node, "VervoerType")?.to_string(),
        journey_id: required_text(node, "RitNummer")?.to_string(),
        status: status.to_string(),
        going: status != CANCELLED_STATUS,
        stops: normalize_to_sequence(node.get("ReisStop"))
            .into_iter()
            .map(map_trip_stop)
            .collect::<Result<_, _>>()?,
    })
}

/// Map a `<ReisMogelijkheid>` element.
pub fn map_trip(node: &Node) -> Result<Trip, ConversionError> {
    let status = required_text(node, "Status")?;
    // Cancelled trips have no planned travel time
    let travel_time_planned = optional_text(node, "GeplandeReisTijd").map(str::to_string);
    let going = travel_time_planned.is_some() && !is_cancelled_status(status);

    Ok(Trip {
        status: status.to_string(),
        nr_transfers: required_number(node, "AantalOverstappen")?,
        travel_time_planned,
        travel_time_actual: optional_text(node, "ActueleReisTijd").map(str::to_string),
        is_optimal: required_text(node, "Optimaal")? == "true",
        going,
        departure_time_planned: optional_datetime(node, "GeplandeVertrekTijd")?,
        departure_time_actual: optional_datetime(node, "ActueleVertrekTijd")?,
        arrival_time_planned: optional_datetime(node, "GeplandeAankomstTijd")?,
        arrival_time_actual: optional_datetime(node, "ActueleAankomstTijd")?,
        trip_parts: normalize_to_sequence(node.get("ReisDeel"))
            .into_iter()
            .map(map_trip_subpart)
            .collect::<Result<_, _>>()?,
        trip_remarks: normalize_to_sequence(node.get("Melding"))
            .into_iter()
            .map(map_trip_remark)
            .collect::<Result<_, _>>()?,
    })
}

/// Decode a document and map every `<root><item>` element.
fn parse_records<T>(
    xml: &str,
    root: &'static str,
    item: &str,
    map: fn(&Node) -> Result<T, ConversionError>,
) -> Result<Vec<T>, ConversionError> {
    let tree = decode(xml)?;
    let records = tree
        .get(root)
        .ok_or_else(|| ConversionError::UnexpectedSchema {
            expected: root,
            found: tree.root_name().map(str::to_string),
        })?;

    normalize_to_sequence(records.get(item))
        .into_iter()
        .map(map)
        .collect()
}

/// Parse a station list (`<Stations>`) response.
pub fn parse_stations(xml: &str) -> Result<Vec<Station>, ConversionError> {
    parse_records(xml, "Stations", "Station", map_station)
}

/// Parse a live departures (`<ActueleVertrekTijden>`) response.
pub fn parse_departures(xml: &str) -> Result<Vec<Departure>, ConversionError> {
    parse_records(xml, "ActueleVertrekTijden", "VertrekkendeTrein", map_departure)
}

/// Parse a trip planner (`<ReisMogelijkheden>`) response.
pub fn parse_trips(xml: &str) -> Result<Vec<Trip>, ConversionError> {
    parse_records(xml, "ReisMogelijkheden", "ReisMogelijkheid", map_trip)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn map_station_reads_any_fragment(
            code in "[A-Z]{2,6}",
            uic in "[0-9]{7}",
            kind in "[a-zA-Z]{1,24}",
            short in "[A-Za-z0-9][A-Za-z0-9 .'-]{0,14}[A-Za-z0-9.]",
            long in "[A-Za-z0-9][A-Za-z0-9 .'-]{0,30}[A-Za-z0-9]",
            country in "[A-Z]{1,2}",
            lat in -90.0f64..90.0,
            lon in -180.0f64..180.0,
            synonyms in prop::collection::vec("[A-Za-z][A-Za-z ]{0,10}[a-z]", 0..4),
        ) {
            let synonym_xml: String = synonyms
                .iter()
                .map(|s| format!("<Synoniem>{s}</Synoniem>"))
                .collect();
            let xml = format!(
                "<Station><Code>{code}</Code><Type>{kind}</Type>\
                 <Namen><Kort>{short}</Kort><Middel>{long}</Middel><Lang>{long}</Lang></Namen>\
                 <Land>{country}</Land><UICCode>{uic}</UICCode>\
                 <Lat>{lat}</Lat><Lon>{lon}</Lon>\
                 <Synoniemen>{synonym_xml}</Synoniemen></Station>"
            );

            let node = decode(&xml).unwrap().get("Station").unwrap().clone();
            let station = map_station(&node).unwrap();

            prop_assert_eq!(&station.code, &code);
            prop_assert_eq!(&station.uic_code, &uic);
            prop_assert_eq!(&station.station_type, &kind);
            prop_assert_eq!(&station.names.short, &short);
            prop_assert_eq!(&station.names.long, &long);
            prop_assert_eq!(&station.country, &country);
            prop_assert_eq!(station.lat.to_bits(), lat.to_bits());
            prop_assert_eq!(station.lon.to_bits(), lon.to_bits());
            prop_assert_eq!(station.synonyms, synonyms);
        }
    }
}
