use std::process::ExitCode;

use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use ns_api::domain::JsonRecord;
use ns_api::ns::{NsApi, NsApiConfig, NsApiError};

const USAGE: &str = "\
Usage:
  ns-api stations
  ns-api departures <station>
  ns-api trips <from> <to> [via]

Credentials are read from NS_API_USERNAME and NS_API_KEY.";

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    match run(&args) {
        Ok(code) => code,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[&str]) -> Result<ExitCode, NsApiError> {
    if !matches!(args.first(), Some(&("stations" | "departures" | "trips"))) {
        eprintln!("{USAGE}");
        return Ok(ExitCode::from(2));
    }

    let api = NsApi::new(NsApiConfig::from_env()?)?;

    match args {
        ["stations"] => print_records(&api.get_stations()?)?,
        ["departures", station] => print_records(&api.get_departures(station)?)?,
        ["trips", from, to] => print_records(&api.get_trips(None, from, None, to)?)?,
        ["trips", from, to, via] => print_records(&api.get_trips(None, from, Some(*via), to)?)?,
        _ => {
            eprintln!("{USAGE}");
            return Ok(ExitCode::from(2));
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Print one JSON record per line.
fn print_records<R: JsonRecord + std::fmt::Display>(records: &[R]) -> Result<(), NsApiError> {
    for record in records {
        debug!("{record}");
        println!("{}", record.to_json()?);
    }
    Ok(())
}
