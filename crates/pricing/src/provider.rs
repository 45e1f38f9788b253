//! HTTP geocode provider.

use async_trait::async_trait;

use buildmart_core::{GeoPoint, Pincode};

use crate::geocode::{GeocodeError, GeocodeProvider, GeocodeResult};

/// Provider backed by a Google-style geocoding HTTP API.
///
/// Expected response shape:
/// `{ "status": "OK", "results": [{ "formatted_address": "...",
///    "geometry": { "location": { "lat": .., "lng": .. } } }] }`
pub struct HttpGeocodeProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HttpGeocodeProvider {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl GeocodeProvider for HttpGeocodeProvider {
    async fn lookup(&self, pincode: &Pincode) -> Result<GeocodeResult, GeocodeError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("address", format!("{pincode}, India")),
                ("key", self.api_key.clone()),
            ])
            .send()
            .await
            .map_err(|e| GeocodeError::Provider(e.to_string()))?;

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| GeocodeError::Provider(e.to_string()))?;

        match body.get("status").and_then(|s| s.as_str()) {
            Some("OK") => {}
            Some("ZERO_RESULTS") => return Err(GeocodeError::ZeroResults),
            Some("OVER_QUERY_LIMIT") => return Err(GeocodeError::QuotaExceeded),
            Some(other) => return Err(GeocodeError::Provider(other.to_string())),
            None => return Err(GeocodeError::Provider("missing status field".to_string())),
        }

        let result = body
            .get("results")
            .and_then(|r| r.as_array())
            .and_then(|r| r.first())
            .ok_or(GeocodeError::ZeroResults)?;

        let location = result
            .pointer("/geometry/location")
            .ok_or_else(|| GeocodeError::Provider("missing geometry.location".to_string()))?;
        let lat = location
            .get("lat")
            .and_then(|v| v.as_f64())
            .ok_or_else(|| GeocodeError::Provider("missing lat".to_string()))?;
        let lng = location
            .get("lng")
            .and_then(|v| v.as_f64())
            .ok_or_else(|| GeocodeError::Provider("missing lng".to_string()))?;

        let formatted_address = result
            .get("formatted_address")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        Ok(GeocodeResult {
            location: GeoPoint::new(lat, lng),
            formatted_address,
        })
    }
}
