//! Rate command - mark a business as honest or dishonest.

use proxima::submission::{submit_rating, RatingDraft};

use super::common::build_store;
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the rate command.
pub struct RateArgs {
    pub business_id: String,
    pub honest: bool,
    pub comment: Option<String>,
    pub evidence_url: Option<String>,
    /// Overrides `rating.user_id`.
    pub user: Option<String>,
    pub verbose: bool,
}

/// Run the rate command.
pub fn run(args: RateArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(args.verbose)?;
    runner.log_startup("rate");
    let config = runner.config();

    let user_id = args.user.unwrap_or_else(|| config.rating.user_id.clone());
    let mut draft = RatingDraft::new(args.business_id, user_id, args.honest);
    if let Some(comment) = args.comment {
        draft = draft.with_comment(comment);
    }
    if let Some(url) = args.evidence_url {
        draft = draft.with_evidence_url(url);
    }

    let store = build_store(config)?;
    let id = runner.block_on(submit_rating(store.as_ref(), draft))?;

    let verdict = if args.honest { "honest" } else { "dishonest" };
    println!("Recorded {} rating {}", verdict, id);
    Ok(())
}
