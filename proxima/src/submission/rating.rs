//! Rating submission.

use tracing::info;

use crate::store::{NewRating, RemoteStore};

use super::SubmissionError;

/// A user's verdict on a business.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingDraft {
    pub business_id: String,
    /// Resolved by the caller; this library has no notion of sessions.
    pub user_id: String,
    pub is_honest: bool,
    pub comment: Option<String>,
    pub evidence_url: Option<String>,
}

impl RatingDraft {
    pub fn new(business_id: impl Into<String>, user_id: impl Into<String>, is_honest: bool) -> Self {
        Self {
            business_id: business_id.into(),
            user_id: user_id.into(),
            is_honest,
            comment: None,
            evidence_url: None,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_evidence_url(mut self, url: impl Into<String>) -> Self {
        self.evidence_url = Some(url.into());
        self
    }

    fn into_new_rating(self) -> Result<NewRating, SubmissionError> {
        let business_id = self.business_id.trim().to_string();
        if business_id.is_empty() {
            return Err(SubmissionError::Invalid {
                field: "business_id",
                reason: "must not be empty".to_string(),
            });
        }
        let user_id = self.user_id.trim().to_string();
        if user_id.is_empty() {
            return Err(SubmissionError::Invalid {
                field: "user_id",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(NewRating {
            business_id,
            user_id,
            is_honest: self.is_honest,
            comment: non_blank(self.comment),
            evidence_url: non_blank(self.evidence_url),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Submit a rating and return the id assigned by the store.
pub async fn submit_rating(
    store: &dyn RemoteStore,
    draft: RatingDraft,
) -> Result<String, SubmissionError> {
    let rating = draft.into_new_rating()?;
    let business_id = rating.business_id.clone();
    let honest = rating.is_honest;

    let id = store.add_rating(rating).await?;
    info!(rating_id = %id, business_id = %business_id, honest, "Rating submitted");
    Ok(id)
}
