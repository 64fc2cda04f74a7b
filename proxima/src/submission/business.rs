//! Business registration.

use tracing::{info, warn};

use crate::geofence::GeofenceSession;
use crate::store::{NewBusiness, RemoteStore};

use super::SubmissionError;

/// Minimum length of a business name, after trimming.
pub const MIN_NAME_CHARS: usize = 3;

/// Form fields of a business being registered.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BusinessDraft {
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub is_informal: bool,
}

impl BusinessDraft {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            description: None,
            is_informal: true,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_informal(mut self, is_informal: bool) -> Self {
        self.is_informal = is_informal;
        self
    }

    /// Check the draft locally.
    pub fn validate(&self) -> Result<(), SubmissionError> {
        if self.name.trim().chars().count() < MIN_NAME_CHARS {
            return Err(SubmissionError::Invalid {
                field: "name",
                reason: format!("must be at least {} characters", MIN_NAME_CHARS),
            });
        }
        if self.category.trim().is_empty() {
            return Err(SubmissionError::Invalid {
                field: "category",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Register a business at the point the geofence session accepted.
///
/// Returns the id assigned by the store.
pub async fn register_business(
    store: &dyn RemoteStore,
    draft: BusinessDraft,
    session: &GeofenceSession,
) -> Result<String, SubmissionError> {
    draft.validate()?;
    let Some(point) = session.accepted_point() else {
        warn!(state = ?session.state(), "Registration without an accepted location");
        return Err(SubmissionError::LocationNotAccepted);
    };

    let description = draft
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());
    let business = NewBusiness {
        name: draft.name.trim().to_string(),
        category: draft.category.trim().to_string(),
        is_informal: draft.is_informal,
        description,
        coordinate: point,
    };

    let id = store.create_business(business).await?;
    info!(business_id = %id, %point, "Business registered");
    Ok(id)
}
