//! PostgREST-backed remote store.
//!
//! Talks to a Supabase-style REST endpoint: the spatial query is the
//! `nearby_businesses` RPC, writes are plain table inserts.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::BoxFuture;

use super::traits::{RemoteStore, StoreError};
use super::types::{row_id, Business, NearbyRow, NewBusiness, NewRating};

/// Default request timeout for store calls.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for [`PostgrestStore`].
#[derive(Debug, Clone)]
pub struct PostgrestConfig {
    /// Project base URL, e.g. `https://xyz.supabase.co`.
    pub url: String,
    /// Anonymous or service API key.
    pub api_key: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl PostgrestConfig {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Remote store implementation using reqwest.
pub struct PostgrestStore {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct CreatedRow {
    id: serde_json::Value,
}

impl PostgrestStore {
    /// Creates a store client with the configured credentials and timeout.
    pub fn new(config: PostgrestConfig) -> Result<Self, StoreError> {
        let base_url = config.url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(StoreError::NotConfigured("store.url is empty".to_string()));
        }

        let mut headers = HeaderMap::new();
        let api_key = HeaderValue::from_str(&config.api_key)
            .map_err(|e| StoreError::NotConfigured(format!("invalid api key: {}", e)))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .map_err(|e| StoreError::NotConfigured(format!("invalid api key: {}", e)))?;
        headers.insert("apikey", api_key);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| StoreError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    fn rpc_url(&self, function: &str) -> String {
        format!("{}/rest/v1/rpc/{}", self.base_url, function)
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    async fn post(&self, url: String, body: serde_json::Value) -> Result<String, StoreError> {
        let response = self
            .client
            .post(&url)
            .header("Prefer", "return=representation")
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::Http(format!("Request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| StoreError::Http(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(StoreError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(text)
    }

    async fn insert_returning_id(
        &self,
        table: &str,
        body: serde_json::Value,
    ) -> Result<String, StoreError> {
        let text = self.post(self.table_url(table), body).await?;
        parse_created_id(&text)
    }
}

impl RemoteStore for PostgrestStore {
    fn nearby_businesses(
        &self,
        latitude: f64,
        longitude: f64,
        radius_meters: f64,
    ) -> BoxFuture<'_, Result<Vec<Business>, StoreError>> {
        Box::pin(async move {
            let body = json!({
                "lat": latitude,
                "long": longitude,
                "radius_meters": radius_meters,
            });
            let text = self.post(self.rpc_url("nearby_businesses"), body).await?;
            parse_nearby(&text)
        })
    }

    fn create_business(&self, business: NewBusiness) -> BoxFuture<'_, Result<String, StoreError>> {
        Box::pin(async move {
            let body = json!({
                "name": business.name,
                "category": business.category,
                "is_informal": business.is_informal,
                "description": business.description,
                "location": business.location_wkt(),
            });
            self.insert_returning_id("businesses", body).await
        })
    }

    fn add_rating(&self, rating: NewRating) -> BoxFuture<'_, Result<String, StoreError>> {
        Box::pin(async move {
            let body =
                serde_json::to_value(&rating).map_err(|e| StoreError::Decode(e.to_string()))?;
            self.insert_returning_id("ratings", body).await
        })
    }
}

/// Decode the RPC rows one at a time, dropping rows that are malformed or
/// lack a usable position. Only a non-array body fails the query.
fn parse_nearby(text: &str) -> Result<Vec<Business>, StoreError> {
    let rows: Vec<serde_json::Value> =
        serde_json::from_str(text).map_err(|e| StoreError::Decode(e.to_string()))?;
    let total = rows.len();
    let businesses: Vec<Business> = rows
        .into_iter()
        .filter_map(|row| serde_json::from_value::<NearbyRow>(row).ok())
        .filter_map(NearbyRow::into_business)
        .collect();
    if businesses.len() != total {
        debug!(
            dropped = total - businesses.len(),
            "Skipped unusable nearby rows"
        );
    }
    Ok(businesses)
}

/// Extract the id of the single row returned by an insert.
fn parse_created_id(text: &str) -> Result<String, StoreError> {
    let rows: Vec<CreatedRow> =
        serde_json::from_str(text).map_err(|e| StoreError::Decode(e.to_string()))?;
    let row = rows
        .into_iter()
        .next()
        .ok_or_else(|| StoreError::Decode("insert returned no rows".to_string()))?;
    row_id(&row.id).ok_or_else(|| StoreError::Decode(format!("unexpected id: {}", row.id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::Coordinate;

    fn store() -> PostgrestStore {
        PostgrestStore::new(PostgrestConfig::new("https://example.supabase.co/", "anon-key")).unwrap()
    }

    #[test]
    fn test_urls_strip_trailing_slash() {
        let store = store();
        assert_eq!(
            store.rpc_url("nearby_businesses"),
            "https://example.supabase.co/rest/v1/rpc/nearby_businesses"
        );
        assert_eq!(
            store.table_url("ratings"),
            "https://example.supabase.co/rest/v1/ratings"
        );
    }

    #[test]
    fn test_empty_url_is_not_configured() {
        let result = PostgrestStore::new(PostgrestConfig::new("", "key"));
        assert!(matches!(result, Err(StoreError::NotConfigured(_))));
    }

    #[test]
    fn test_invalid_api_key_is_not_configured() {
        let result = PostgrestStore::new(PostgrestConfig::new("https://x.co", "bad\nkey"));
        assert!(matches!(result, Err(StoreError::NotConfigured(_))));
    }

    #[test]
    fn test_parse_nearby_keeps_order_and_skips_missing_positions() {
        let text = r#"[
            {"id":"a","name":"Tacos","category":"Food","is_informal":true,"lat":19.4001,"lng":-99.1},
            {"id":"b","name":"Ghost","category":"Store","is_informal":false,"lat":null,"lng":null},
            {"id":"c","name":"Taller","category":"Service","is_informal":false,"lat":19.401,"lng":-99.1}
        ]"#;

        let businesses = parse_nearby(text).unwrap();
        let ids: Vec<_> = businesses.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(businesses[0].coordinate, Coordinate::new(19.4001, -99.1));
    }

    #[test]
    fn test_parse_nearby_skips_malformed_rows() {
        let text = r#"[
            {"id":"a","name":"Tacos","category":"Food","is_informal":true,"lat":19.4001,"lng":-99.1},
            {"id":"b","name":null,"category":"Store","lat":19.4002,"lng":-99.1},
            {"id":42,"name":"Puesto","category":"Food","lat":19.4003,"lng":-99.1},
            {"id":"d","name":"Raro","is_informal":"yes","lat":19.4004,"lng":-99.1},
            "not a row"
        ]"#;

        let businesses = parse_nearby(text).unwrap();
        let ids: Vec<_> = businesses.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "42"]);
    }

    #[test]
    fn test_parse_nearby_rejects_non_array() {
        assert!(matches!(
            parse_nearby(r#"{"message":"oops"}"#),
            Err(StoreError::Decode(_))
        ));
    }

    #[test]
    fn test_parse_created_id() {
        assert_eq!(
            parse_created_id(r#"[{"id":"5f0c","name":"x"}]"#).unwrap(),
            "5f0c"
        );
        assert_eq!(parse_created_id(r#"[{"id":42}]"#).unwrap(), "42");
        assert!(parse_created_id("[]").is_err());
        assert!(parse_created_id(r#"[{"id":null}]"#).is_err());
    }
}
