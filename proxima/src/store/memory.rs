//! Process-local store for tests and offline demos.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::coord::distance_meters;
use crate::coord::Coordinate;
use crate::BoxFuture;

use super::traits::{RemoteStore, StoreError};
use super::types::{Business, NewBusiness, NewRating};

/// In-memory [`RemoteStore`].
///
/// Filters by haversine distance and returns results nearest first, like the
/// backend's spatial query.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    businesses: Mutex<Vec<Business>>,
    ratings: Mutex<Vec<(String, NewRating)>>,
    next_id: AtomicU64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with businesses.
    pub fn with_businesses(businesses: impl IntoIterator<Item = Business>) -> Self {
        let store = Self::new();
        store.businesses.lock().extend(businesses);
        store
    }

    /// Insert or replace a business by id.
    pub fn upsert(&self, business: Business) {
        let mut businesses = self.businesses.lock();
        match businesses.iter_mut().find(|b| b.id == business.id) {
            Some(existing) => *existing = business,
            None => businesses.push(business),
        }
    }

    /// Remove a business by id.
    pub fn remove(&self, id: &str) -> bool {
        let mut businesses = self.businesses.lock();
        let before = businesses.len();
        businesses.retain(|b| b.id != id);
        businesses.len() != before
    }

    pub fn business_count(&self) -> usize {
        self.businesses.lock().len()
    }

    /// Ratings recorded so far, with their assigned ids.
    pub fn ratings(&self) -> Vec<(String, NewRating)> {
        self.ratings.lock().clone()
    }

    fn next_id(&self, prefix: &str) -> String {
        format!("{}-{}", prefix, self.next_id.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Next generated business id not already taken by a stored business.
    fn next_business_id(&self, businesses: &[Business]) -> String {
        loop {
            let id = self.next_id("biz");
            if !businesses.iter().any(|b| b.id == id) {
                return id;
            }
        }
    }

    fn nearby(&self, center: Coordinate, radius_meters: f64) -> Vec<Business> {
        let mut hits: Vec<(f64, Business)> = self
            .businesses
            .lock()
            .iter()
            .filter_map(|b| {
                let d = distance_meters(&center, &b.coordinate);
                (d <= radius_meters).then(|| (d, b.clone()))
            })
            .collect();
        hits.sort_by(|a, b| a.0.total_cmp(&b.0));
        hits.into_iter().map(|(_, b)| b).collect()
    }
}

impl RemoteStore for InMemoryStore {
    fn nearby_businesses(
        &self,
        latitude: f64,
        longitude: f64,
        radius_meters: f64,
    ) -> BoxFuture<'_, Result<Vec<Business>, StoreError>> {
        Box::pin(async move {
            let center = Coordinate::try_new(latitude, longitude)
                .map_err(|e| StoreError::Rejected(e.to_string()))?;
            Ok(self.nearby(center, radius_meters))
        })
    }

    fn create_business(&self, business: NewBusiness) -> BoxFuture<'_, Result<String, StoreError>> {
        Box::pin(async move {
            let mut businesses = self.businesses.lock();
            let id = self.next_business_id(&businesses);
            businesses.push(Business {
                id: id.clone(),
                name: business.name,
                category: business.category,
                is_informal: business.is_informal,
                coordinate: business.coordinate,
                description: business.description,
            });
            Ok(id)
        })
    }

    fn add_rating(&self, rating: NewRating) -> BoxFuture<'_, Result<String, StoreError>> {
        Box::pin(async move {
            let known = self
                .businesses
                .lock()
                .iter()
                .any(|b| b.id == rating.business_id);
            if !known {
                return Err(StoreError::Rejected(format!(
                    "unknown business '{}'",
                    rating.business_id
                )));
            }

            let id = self.next_id("rating");
            self.ratings.lock().push((id.clone(), rating));
            Ok(id)
        })
    }
}
