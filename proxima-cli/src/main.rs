//! Proxima CLI - Command-line interface
//!
//! A thin shell over the `proxima` library: measure distances, search and
//! rate nearby businesses, register a business behind the geofence, and run
//! a live session fed from stdin.

mod commands;
mod error;
mod runner;

use clap::{ArgGroup, Parser, Subcommand};

use commands::config::ConfigCommands;
use commands::nearby::NearbyArgs;
use commands::rate::RateArgs;
use commands::register::RegisterArgs;
use commands::track::TrackArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "proxima")]
#[command(version, about = "Find, register and rate small businesses near where you stand", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Great-circle distance between two points, in meters
    Distance {
        #[arg(allow_negative_numbers = true)]
        lat1: f64,
        #[arg(allow_negative_numbers = true)]
        lng1: f64,
        #[arg(allow_negative_numbers = true)]
        lat2: f64,
        #[arg(allow_negative_numbers = true)]
        lng2: f64,
    },

    /// List businesses around a point
    Nearby {
        /// Center latitude (default: map.default_lat)
        #[arg(long, allow_negative_numbers = true)]
        lat: Option<f64>,

        /// Center longitude (default: map.default_lng)
        #[arg(long, allow_negative_numbers = true)]
        lng: Option<f64>,

        /// Search radius in meters (default: nearby.radius_m)
        #[arg(long)]
        radius: Option<f64>,
    },

    /// Register a business at a picked point near where you stand
    Register {
        /// Your current latitude
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        /// Your current longitude
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,

        /// Latitude of the picked business location
        #[arg(long, allow_negative_numbers = true)]
        pick_lat: f64,

        /// Longitude of the picked business location
        #[arg(long, allow_negative_numbers = true)]
        pick_lng: f64,

        /// Business name (at least 3 characters)
        #[arg(long)]
        name: String,

        /// Category (Informal, Food, Service, Transport, Entertainment, ...)
        #[arg(long, default_value = "Informal")]
        category: String,

        /// Short description
        #[arg(long)]
        description: Option<String>,

        /// Mark as a formal (established) business
        #[arg(long)]
        formal: bool,
    },

    /// Rate a business as honest or dishonest
    #[command(group(ArgGroup::new("verdict").required(true).args(["honest", "dishonest"])))]
    Rate {
        /// Business id
        business_id: String,

        /// The business treated you fairly
        #[arg(long)]
        honest: bool,

        /// The business overcharged or misled you
        #[arg(long)]
        dishonest: bool,

        /// Optional comment
        #[arg(long)]
        comment: Option<String>,

        /// Link to a photo or receipt
        #[arg(long)]
        evidence_url: Option<String>,

        /// Rate as this user instead of rating.user_id
        #[arg(long)]
        user: Option<String>,
    },

    /// Run a live session fed by 'lat,lng[,accuracy]' lines on stdin
    Track {
        /// Use an empty in-process store instead of the configured one
        #[arg(long)]
        offline: bool,
    },

    /// View and modify configuration settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let verbose = cli.verbose;
    match cli.command {
        Commands::Distance {
            lat1,
            lng1,
            lat2,
            lng2,
        } => commands::distance::run(lat1, lng1, lat2, lng2),

        Commands::Nearby { lat, lng, radius } => commands::nearby::run(NearbyArgs {
            lat,
            lng,
            radius,
            verbose,
        }),

        Commands::Register {
            lat,
            lng,
            pick_lat,
            pick_lng,
            name,
            category,
            description,
            formal,
        } => commands::register::run(RegisterArgs {
            lat,
            lng,
            pick_lat,
            pick_lng,
            name,
            category,
            description,
            formal,
            verbose,
        }),

        Commands::Rate {
            business_id,
            honest,
            dishonest: _,
            comment,
            evidence_url,
            user,
        } => commands::rate::run(RateArgs {
            business_id,
            honest,
            comment,
            evidence_url,
            user,
            verbose,
        }),

        Commands::Track { offline } => commands::track::run(TrackArgs { offline, verbose }),

        Commands::Config { command } => commands::config::run(command),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_distance_accepts_negative_coordinates() {
        let cli = Cli::try_parse_from(["proxima", "distance", "19.4", "-99.1", "19.5", "-99.2"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Distance { lng1, .. } if lng1 == -99.1
        ));
    }

    #[test]
    fn test_rate_requires_verdict() {
        assert!(Cli::try_parse_from(["proxima", "rate", "b1"]).is_err());
        assert!(Cli::try_parse_from(["proxima", "rate", "b1", "--honest", "--dishonest"]).is_err());

        let cli = Cli::try_parse_from(["proxima", "rate", "b1", "--dishonest"]).unwrap();
        assert!(matches!(cli.command, Commands::Rate { honest: false, .. }));
    }

    #[test]
    fn test_verbose_is_global() {
        let cli = Cli::try_parse_from(["proxima", "track", "--offline", "-v"]).unwrap();
        assert!(cli.verbose);
    }
}
