//! Register command - geofence a map pick and create the business.

use proxima::geofence::{GeofenceOutcome, GeofenceSession};
use proxima::submission::{register_business, BusinessDraft};

use super::common::{build_store, coordinate};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the register command.
pub struct RegisterArgs {
    /// Where the user is standing.
    pub lat: f64,
    pub lng: f64,
    /// Where the business was picked on the map.
    pub pick_lat: f64,
    pub pick_lng: f64,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub formal: bool,
    pub verbose: bool,
}

/// Run the register command.
pub fn run(args: RegisterArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(args.verbose)?;
    runner.log_startup("register");
    let config = runner.config();

    let here = coordinate(args.lat, args.lng)?;
    let pick = coordinate(args.pick_lat, args.pick_lng)?;

    let mut draft = BusinessDraft::new(args.name, args.category).with_informal(!args.formal);
    if let Some(description) = args.description {
        draft = draft.with_description(description);
    }
    draft.validate()?;

    let mut session = GeofenceSession::new();
    session
        .arm(here, config.geofence.radius_m)
        .map_err(|e| CliError::Config(e.to_string()))?;
    let outcome = session
        .evaluate(pick)
        .map_err(|e| CliError::Input(e.to_string()))?;

    match outcome {
        GeofenceOutcome::Accepted(point) => {
            let store = build_store(config)?;
            let id = runner.block_on(register_business(store.as_ref(), draft, &session))?;
            println!("Registered business {} at {}", id, point);
            Ok(())
        }
        GeofenceOutcome::Rejected(rejected) => Err(CliError::PickRejected(rejected.to_string())),
    }
}
