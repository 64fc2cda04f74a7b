//! Remote store entities and wire rows.

use serde::{Deserialize, Serialize};

use crate::coord::Coordinate;

/// A business as returned by the remote store. Read-only to this library.
#[derive(Debug, Clone, PartialEq)]
pub struct Business {
    pub id: String,
    pub name: String,
    pub category: String,
    pub is_informal: bool,
    pub coordinate: Coordinate,
    pub description: Option<String>,
}

/// Fields needed to create a business.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBusiness {
    pub name: String,
    pub category: String,
    pub is_informal: bool,
    pub description: Option<String>,
    pub coordinate: Coordinate,
}

impl NewBusiness {
    /// Location as WKT, longitude first.
    pub fn location_wkt(&self) -> String {
        format!(
            "POINT({} {})",
            self.coordinate.longitude, self.coordinate.latitude
        )
    }
}

/// Fields needed to record a rating.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewRating {
    pub business_id: String,
    /// Already-resolved user identity.
    pub user_id: String,
    /// True = honest, false = dishonest.
    pub is_honest: bool,
    pub comment: Option<String>,
    pub evidence_url: Option<String>,
}

/// Row shape of the `nearby_businesses` RPC.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct NearbyRow {
    pub id: serde_json::Value,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub is_informal: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
}

impl NearbyRow {
    /// Convert to a [`Business`], or `None` when the row has no usable
    /// id, name, or position.
    pub fn into_business(self) -> Option<Business> {
        let coordinate = Coordinate::try_new(self.lat?, self.lng?).ok()?;
        Some(Business {
            id: row_id(&self.id)?,
            name: self.name?,
            category: self.category.unwrap_or_default(),
            is_informal: self.is_informal,
            coordinate,
            description: self.description.filter(|d| !d.is_empty()),
        })
    }
}

/// Normalize a row id; PostgREST returns uuid strings or bigint numbers.
pub(crate) fn row_id(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(id) if !id.is_empty() => Some(id.clone()),
        serde_json::Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_wkt_is_lng_lat() {
        let business = NewBusiness {
            name: "Tacos El Güero".to_string(),
            category: "Food".to_string(),
            is_informal: true,
            description: None,
            coordinate: Coordinate::new(19.4326, -99.1332),
        };
        assert_eq!(business.location_wkt(), "POINT(-99.1332 19.4326)");
    }

    #[test]
    fn test_row_into_business() {
        let row: NearbyRow = serde_json::from_str(
            r#"{"id":"b1","name":"Tienda","category":"Store","is_informal":false,
                "description":"","lat":19.43,"lng":-99.13,"dist_meters":12.5}"#,
        )
        .unwrap();

        let business = row.into_business().unwrap();
        assert_eq!(business.id, "b1");
        assert_eq!(business.coordinate, Coordinate::new(19.43, -99.13));
        assert_eq!(business.description, None);
    }

    #[test]
    fn test_row_without_position_is_dropped() {
        let row: NearbyRow =
            serde_json::from_str(r#"{"id":"b2","name":"Sin mapa","lat":null,"lng":-99.1}"#)
                .unwrap();
        assert!(row.into_business().is_none());
    }

    #[test]
    fn test_row_with_out_of_range_position_is_dropped() {
        let row: NearbyRow =
            serde_json::from_str(r#"{"id":"b3","name":"Broken","lat":123.0,"lng":0.0}"#).unwrap();
        assert!(row.into_business().is_none());
    }

    #[test]
    fn test_row_with_numeric_id() {
        let row: NearbyRow =
            serde_json::from_str(r#"{"id":42,"name":"Puesto","lat":19.4,"lng":-99.1}"#).unwrap();
        assert_eq!(row.into_business().unwrap().id, "42");
    }

    #[test]
    fn test_row_without_name_is_dropped() {
        let row: NearbyRow =
            serde_json::from_str(r#"{"id":"b4","name":null,"lat":19.4,"lng":-99.1}"#).unwrap();
        assert!(row.into_business().is_none());
    }
}
