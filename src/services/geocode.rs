use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::config::GeocodingConfig;

/// Normalized result from the geocoding collaborator
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedAddress {
    pub lat: f64,
    pub lng: f64,
    pub city: Option<String>,
    pub postal_code: Option<String>,
}

/// Seam for the external geocoding API. Injected through app state so the
/// noop implementation can stand in for tests and tokenless deployments.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Forward-geocode a free-text query. `Ok(None)` means no match.
    async fn forward(&self, query: &str) -> Result<Option<GeocodedAddress>, GeocodeError>;
}

#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    #[error("geocoding request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected geocoding response shape")]
    BadResponse,

    #[error("invalid geocoding endpoint")]
    BadEndpoint,
}

pub fn from_config(cfg: &GeocodingConfig) -> Arc<dyn Geocoder> {
    match &cfg.mapbox_token {
        Some(token) => Arc::new(MapboxGeocoder::new(token.clone(), cfg.mapbox_endpoint.clone())),
        None => Arc::new(NoopGeocoder),
    }
}

/// Mapbox forward-geocoding client
pub struct MapboxGeocoder {
    client: reqwest::Client,
    token: String,
    endpoint: String,
}

impl MapboxGeocoder {
    pub fn new(token: String, endpoint: String) -> Self {
        Self { client: reqwest::Client::new(), token, endpoint }
    }

    /// Build the forward-geocoding URL. The query lands in a path segment,
    /// so it is pushed through `Url` for proper percent-encoding.
    fn request_url(&self, query: &str) -> Result<url::Url, GeocodeError> {
        let mut url = url::Url::parse(&self.endpoint).map_err(|_| GeocodeError::BadEndpoint)?;
        url.path_segments_mut()
            .map_err(|_| GeocodeError::BadEndpoint)?
            .push(&format!("{}.json", query));
        Ok(url)
    }

    fn parse_feature(feature: &Value) -> Option<GeocodedAddress> {
        let center = feature.get("center")?.as_array()?;
        let lng = center.first()?.as_f64()?;
        let lat = center.get(1)?.as_f64()?;

        let mut city = None;
        let mut postal_code = None;
        if let Some(context) = feature.get("context").and_then(|c| c.as_array()) {
            for entry in context {
                let id = entry.get("id").and_then(|v| v.as_str()).unwrap_or_default();
                let text = entry.get("text").and_then(|v| v.as_str());
                if id.starts_with("place.") {
                    city = text.map(|s| s.to_string());
                } else if id.starts_with("postcode.") {
                    postal_code = text.map(|s| s.to_string());
                }
            }
        }

        Some(GeocodedAddress { lat, lng, city, postal_code })
    }
}

#[async_trait]
impl Geocoder for MapboxGeocoder {
    async fn forward(&self, query: &str) -> Result<Option<GeocodedAddress>, GeocodeError> {
        let url = self.request_url(query)?;

        let body: Value = self
            .client
            .get(url)
            .query(&[("access_token", self.token.as_str()), ("limit", "1")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let features = body
            .get("features")
            .and_then(|f| f.as_array())
            .ok_or(GeocodeError::BadResponse)?;

        Ok(features.first().and_then(Self::parse_feature))
    }
}

/// Used when no provider token is configured: every lookup misses
pub struct NoopGeocoder;

#[async_trait]
impl Geocoder for NoopGeocoder {
    async fn forward(&self, _query: &str) -> Result<Option<GeocodedAddress>, GeocodeError> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_mapbox_feature() {
        let feature = json!({
            "center": [100.523186, 13.736717],
            "context": [
                { "id": "postcode.123", "text": "10110" },
                { "id": "place.456", "text": "Bangkok" },
                { "id": "country.789", "text": "Thailand" }
            ]
        });
        let parsed = MapboxGeocoder::parse_feature(&feature).unwrap();
        assert_eq!(parsed.lat, 13.736717);
        assert_eq!(parsed.lng, 100.523186);
        assert_eq!(parsed.city.as_deref(), Some("Bangkok"));
        assert_eq!(parsed.postal_code.as_deref(), Some("10110"));
    }

    #[test]
    fn feature_without_center_is_skipped() {
        assert!(MapboxGeocoder::parse_feature(&json!({ "context": [] })).is_none());
    }

    #[tokio::test]
    async fn noop_geocoder_always_misses() {
        let g = NoopGeocoder;
        assert_eq!(g.forward("anywhere").await.unwrap(), None);
    }

    #[test]
    fn request_url_encodes_query_in_path_segment() {
        let g = MapboxGeocoder::new(
            "token".into(),
            "https://api.mapbox.com/geocoding/v5/mapbox.places".into(),
        );

        let url = g.request_url("12 Main St, Bangkok").unwrap();
        assert!(url.path().contains("12%20Main%20St"));
        assert!(url.path().ends_with(".json"));

        // A slash in the query must not introduce an extra path segment
        let url = g.request_url("A/B").unwrap();
        assert!(url.path().ends_with("/A%2FB.json"));
    }

    #[test]
    fn request_url_rejects_unparseable_endpoint() {
        let g = MapboxGeocoder::new("token".into(), "not a url".into());
        assert!(g.request_url("Bangkok").is_err());
    }
}
