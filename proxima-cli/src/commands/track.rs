//! Track command - drive a full proximity session from stdin.
//!
//! Each input line is one platform callback:
//!
//! ```text
//! 19.4326,-99.1332          fix
//! 19.4330,-99.1330,12.5     fix with accuracy (meters)
//! error:1                   platform error code (1 denied, 2 unavailable, 3 timeout)
//! # comment
//! ```
//!
//! Marker operations are printed to stdout as they are produced.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use proxima::app::{AppConfig, ProximityApp};
use proxima::coord::Coordinate;
use proxima::location::{ChannelLocationSource, LocationError};
use proxima::markers::{MarkerKey, MarkerOp};
use proxima::store::{InMemoryStore, RemoteStore};

use super::common::build_store;
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the track command.
pub struct TrackArgs {
    /// Use an empty in-process store instead of the configured one.
    pub offline: bool,
    pub verbose: bool,
}

/// One parsed stdin line.
#[derive(Debug, Clone, Copy, PartialEq)]
enum FeedLine {
    Fix(Coordinate),
    Error(LocationError),
}

/// Run the track command.
pub fn run(args: TrackArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(args.verbose)?;
    runner.log_startup("track");

    let config = AppConfig::from_config_file(runner.config())?;
    let store: Arc<dyn RemoteStore> = if args.offline {
        Arc::new(InMemoryStore::new())
    } else {
        build_store(runner.config())?
    };

    runner.block_on(track(config, store))
}

async fn track(config: AppConfig, store: Arc<dyn RemoteStore>) -> Result<(), CliError> {
    let (source, feed) = ChannelLocationSource::new();
    let app = ProximityApp::start(config, Arc::new(source), store).await?;

    let printer = match app.take_marker_ops() {
        Some(ops) => tokio::spawn(print_ops(ops)),
        None => return Err(CliError::Config("marker stream already taken".to_string())),
    };

    let mut states = app.tracker().subscribe_state();
    let status = tokio::spawn(async move {
        while states.changed().await.is_ok() {
            let state = *states.borrow_and_update();
            eprintln!("tracking: {}", state);
            if let Some(error) = state.error() {
                eprintln!("  {}", error.user_message());
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut line_no = 0usize;
    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        match parse_line(&line) {
            Ok(Some(FeedLine::Fix(fix))) => feed.push_fix(fix),
            Ok(Some(FeedLine::Error(error))) => feed.push_error(error),
            Ok(None) => {}
            Err(e) => eprintln!("line {}: {}", line_no, e),
        }
    }

    if let Some(failure) = app.coordinator().last_failure() {
        eprintln!("last nearby search failed: {}", failure);
    }

    let markers = app.shutdown().await;
    status.abort();
    let _ = printer.await;

    println!("{} markers on the map", markers.len());
    Ok(())
}

async fn print_ops(mut ops: mpsc::UnboundedReceiver<MarkerOp>) {
    while let Some(op) = ops.recv().await {
        println!("{}", describe(&op));
    }
}

fn describe(op: &MarkerOp) -> String {
    match op {
        MarkerOp::Upsert {
            key: MarkerKey::SelfPosition,
            descriptor,
        } => format!(
            "+ self ({:.6}, {:.6})",
            descriptor.latitude, descriptor.longitude
        ),
        MarkerOp::Upsert { key, descriptor } => format!(
            "+ {} {} [{}] ({:.6}, {:.6})",
            key,
            descriptor.title.as_deref().unwrap_or(""),
            descriptor.subtitle.as_deref().unwrap_or(""),
            descriptor.latitude,
            descriptor.longitude
        ),
        MarkerOp::Remove { key } => format!("- {}", key),
    }
}

fn parse_line(line: &str) -> Result<Option<FeedLine>, CliError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    if let Some(code) = line.strip_prefix("error:") {
        let code: u16 = code
            .trim()
            .parse()
            .map_err(|_| CliError::Input(format!("bad error code '{}'", code.trim())))?;
        return Ok(Some(FeedLine::Error(LocationError::from_platform_code(code))));
    }

    let fields = line
        .split(',')
        .map(|f| {
            f.trim()
                .parse::<f64>()
                .map_err(|_| CliError::Input(format!("bad number '{}'", f.trim())))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let (lat, lng, accuracy) = match fields.as_slice() {
        [lat, lng] => (*lat, *lng, 0.0),
        [lat, lng, accuracy] => (*lat, *lng, *accuracy),
        _ => {
            return Err(CliError::Input(
                "expected 'lat,lng[,accuracy]' or 'error:<code>'".to_string(),
            ))
        }
    };

    let fix = Coordinate::fix(lat, lng, accuracy, 0)
        .map_err(|e| CliError::Input(e.to_string()))?
        .stamped_now();
    Ok(Some(FeedLine::Fix(fix)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proxima::markers::MarkerDescriptor;

    #[test]
    fn test_parse_fix() {
        let Some(FeedLine::Fix(fix)) = parse_line(" 19.4326, -99.1332 ").unwrap() else {
            panic!("expected a fix");
        };
        assert_eq!(fix.latitude, 19.4326);
        assert_eq!(fix.longitude, -99.1332);
        assert_eq!(fix.accuracy_meters, 0.0);
        assert!(fix.timestamp_ms > 0);
    }

    #[test]
    fn test_parse_fix_with_accuracy() {
        let Some(FeedLine::Fix(fix)) = parse_line("19.4,-99.1,12.5").unwrap() else {
            panic!("expected a fix");
        };
        assert_eq!(fix.accuracy_meters, 12.5);
    }

    #[test]
    fn test_parse_error_codes() {
        assert_eq!(
            parse_line("error:1").unwrap(),
            Some(FeedLine::Error(LocationError::PermissionDenied))
        );
        assert_eq!(
            parse_line("error: 3").unwrap(),
            Some(FeedLine::Error(LocationError::Timeout))
        );
        assert_eq!(
            parse_line("error:42").unwrap(),
            Some(FeedLine::Error(LocationError::Unknown))
        );
    }

    #[test]
    fn test_parse_skips_blank_and_comments() {
        assert_eq!(parse_line("").unwrap(), None);
        assert_eq!(parse_line("  # walking north").unwrap(), None);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_line("19.4").is_err());
        assert!(parse_line("north,west").is_err());
        assert!(parse_line("95.0,0.0").is_err());
        assert!(parse_line("19.4,-99.1,-3").is_err());
        assert!(parse_line("error:x").is_err());
    }

    #[test]
    fn test_describe_ops() {
        let here = Coordinate::new(19.4, -99.1);
        let op = MarkerOp::Upsert {
            key: MarkerKey::SelfPosition,
            descriptor: MarkerDescriptor::for_self(&here),
        };
        assert_eq!(describe(&op), "+ self (19.400000, -99.100000)");

        let op = MarkerOp::Remove {
            key: MarkerKey::business("b9"),
        };
        assert_eq!(describe(&op), "- b9");
    }
}
