//! Marker model: keys, render descriptors, and diff operations.

use std::collections::BTreeMap;
use std::fmt;

use crate::coord::Coordinate;
use crate::store::Business;

/// Stable key of a rendered marker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MarkerKey {
    /// The "you are here" marker.
    SelfPosition,
    /// A business marker, keyed by business id.
    Business(String),
}

impl MarkerKey {
    /// Sentinel name of the user marker.
    pub const SELF: &'static str = "self";

    pub fn business(id: impl Into<String>) -> Self {
        MarkerKey::Business(id.into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            MarkerKey::SelfPosition => Self::SELF,
            MarkerKey::Business(id) => id,
        }
    }
}

impl fmt::Display for MarkerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visual variant the renderer picks an icon for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerVariant {
    SelfPosition,
    Food,
    Service,
    Transport,
    Entertainment,
    Informal,
    Store,
}

impl MarkerVariant {
    /// Variant for a business: known categories first, then informal vs store.
    pub fn for_business(category: &str, is_informal: bool) -> Self {
        match category {
            "Food" => MarkerVariant::Food,
            "Service" => MarkerVariant::Service,
            "Transport" => MarkerVariant::Transport,
            "Entertainment" => MarkerVariant::Entertainment,
            _ if is_informal => MarkerVariant::Informal,
            _ => MarkerVariant::Store,
        }
    }
}

/// Action the renderer dispatches when a marker's popup is activated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerAction {
    /// Open the rating flow for a business.
    Rate { business_id: String },
}

/// Everything the renderer needs to draw one marker.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerDescriptor {
    pub latitude: f64,
    pub longitude: f64,
    pub variant: MarkerVariant,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub detail: Option<String>,
    pub action: Option<MarkerAction>,
}

impl MarkerDescriptor {
    /// Descriptor for the user's own position.
    pub fn for_self(coordinate: &Coordinate) -> Self {
        Self {
            latitude: coordinate.latitude,
            longitude: coordinate.longitude,
            variant: MarkerVariant::SelfPosition,
            title: None,
            subtitle: None,
            detail: None,
            action: None,
        }
    }

    /// Descriptor for a business, with its rating action attached.
    pub fn for_business(business: &Business) -> Self {
        Self {
            latitude: business.coordinate.latitude,
            longitude: business.coordinate.longitude,
            variant: MarkerVariant::for_business(&business.category, business.is_informal),
            title: Some(business.name.clone()),
            subtitle: Some(business.category.clone()),
            detail: business.description.clone(),
            action: Some(MarkerAction::Rate {
                business_id: business.id.clone(),
            }),
        }
    }
}

/// One change to what is drawn.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkerOp {
    Upsert {
        key: MarkerKey,
        descriptor: MarkerDescriptor,
    },
    Remove {
        key: MarkerKey,
    },
}

impl MarkerOp {
    pub fn key(&self) -> &MarkerKey {
        match self {
            MarkerOp::Upsert { key, .. } | MarkerOp::Remove { key } => key,
        }
    }
}

/// What is currently drawn, keyed by marker key.
pub type MarkerSet = BTreeMap<MarkerKey, MarkerDescriptor>;
