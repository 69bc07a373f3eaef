//! CLI entry point for the Bus Tracker client.
//!
//! Fetches routes, vehicles or stops and prints them as JSON or writes a CSV.

use anyhow::{Result, anyhow};
use bustracker::output::{print_json, print_pretty, write_csv};
use bustracker::{BusTracker, BusTrackerConfig};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::ffi::OsStr;
use std::fmt::Debug;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "bustracker")]
#[command(about = "Query the CTA Bus Tracker API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all routes
    Routes {
        /// Request XML with an explicit key instead of JSON with CTA_BUS_KEY
        #[arg(long)]
        xml: bool,

        /// API key to use with --xml (defaults to CTA_BUS_KEY)
        #[arg(long, requires = "xml")]
        api_key: Option<String>,

        /// CSV file to write results to
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Show current positions for one or more vehicles
    Vehicles {
        /// Vehicle IDs
        #[arg(value_name = "VID", required = true)]
        vehicle_ids: Vec<String>,

        /// CSV file to write results to
        #[arg(short, long)]
        output: Option<String>,
    },
    /// List stops for a route and direction
    Stops {
        /// Route designator (e.g. 151, X9)
        #[arg(short, long)]
        route: String,

        /// Direction of travel (e.g. Northbound)
        #[arg(short, long)]
        direction: String,

        /// API key (defaults to CTA_BUS_KEY)
        #[arg(long)]
        api_key: Option<String>,

        /// CSV file to write results to
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/bustracker.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("bustracker.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let config = BusTrackerConfig::from_env()?;
    info!(base_url = %config.base_url, "Configuration loaded");
    let tracker = BusTracker::new(config);

    match cli.command {
        Commands::Routes {
            xml,
            api_key,
            output,
        } => {
            let routes = if xml {
                let key = resolve_key(&tracker, api_key)?;
                tracker.get_routes_with_key(&key).await
            } else {
                tracker.get_routes().await
            };
            let routes = routes.ok_or_else(|| anyhow!("no routes returned"))?;
            emit(&routes, output.as_deref())?;
        }
        Commands::Vehicles {
            vehicle_ids,
            output,
        } => {
            let vehicles = tracker
                .get_vehicles(vehicle_ids.as_slice())
                .await
                .ok_or_else(|| anyhow!("no vehicle data returned"))?;
            emit(&vehicles, output.as_deref())?;
        }
        Commands::Stops {
            route,
            direction,
            api_key,
            output,
        } => {
            let key = resolve_key(&tracker, api_key)?;
            let stops = tracker
                .get_stops_with_key(&key, &route, &direction)
                .await
                .ok_or_else(|| anyhow!("no stops returned"))?;
            emit(&stops, output.as_deref())?;
        }
    }

    Ok(())
}

/// Prefers an explicit `--api-key` over the configured one.
fn resolve_key(tracker: &BusTracker, explicit: Option<String>) -> Result<String> {
    match explicit {
        Some(key) => Ok(key),
        None => Ok(tracker.config().api_key()?.to_string()),
    }
}

fn emit<T: Serialize + Debug>(records: &[T], output: Option<&str>) -> Result<()> {
    info!(rows = records.len(), "Records fetched");
    print_pretty(records);

    match output {
        Some(path) => {
            write_csv(path, records)?;
            info!(path, "CSV written");
        }
        None => print_json(records)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routes_api_key_requires_xml() {
        let err = Cli::try_parse_from(["bustracker", "routes", "--api-key", "K"])
            .err()
            .unwrap();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_routes_api_key_with_xml() {
        let cli = Cli::try_parse_from(["bustracker", "routes", "--xml", "--api-key", "K"]).unwrap();
        match cli.command {
            Commands::Routes { xml, api_key, .. } => {
                assert!(xml);
                assert_eq!(api_key.as_deref(), Some("K"));
            }
            _ => panic!("expected routes"),
        }
    }

    #[test]
    fn test_stops_api_key_is_optional() {
        let cli = Cli::try_parse_from([
            "bustracker",
            "stops",
            "--route",
            "151",
            "--direction",
            "Northbound",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Stops { api_key: None, .. }));
    }
}
