use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument};

use crate::app::ports::{HttpClientPort, IsochronePort};
use crate::config::IsochroneConfig;
use crate::constants::ORS_SOURCE;
use crate::error::{CoverageError, Result};
use crate::observability::metrics;
use crate::types::{Coordinate, FeatureCollection};

/// OpenRouteService isochrone endpoint, distance-based ranges in kilometers
pub struct OrsIsochrones {
    http: Arc<dyn HttpClientPort>,
    url: String,
    api_key: String,
    attributes: Vec<String>,
}

impl OrsIsochrones {
    pub fn new(http: Arc<dyn HttpClientPort>, url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
            api_key: api_key.into(),
            attributes: IsochroneConfig::default().attributes,
        }
    }

    /// Build from configuration; the API key is mandatory.
    pub fn from_config(http: Arc<dyn HttpClientPort>, config: &IsochroneConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| CoverageError::Config("isochrone API key is not set (ORS_API_KEY)".into()))?;
        Ok(Self {
            http,
            url: config.url.clone(),
            api_key,
            attributes: config.attributes.clone(),
        })
    }

    pub fn request_body(&self, locations: &[Coordinate], max_distance_km: f64) -> serde_json::Value {
        let locations: Vec<[f64; 2]> = locations.iter().map(Coordinate::lon_lat).collect();
        json!({
            "locations": locations,
            "attributes": self.attributes,
            "range": [max_distance_km],
            "range_type": "distance",
            "units": "km",
        })
    }
}

#[async_trait]
impl IsochronePort for OrsIsochrones {
    fn source_name(&self) -> &str {
        ORS_SOURCE
    }

    #[instrument(skip(self, locations), fields(locations = locations.len()))]
    async fn isochrones(&self, locations: &[Coordinate], max_distance_km: f64) -> Result<FeatureCollection> {
        let body = self.request_body(locations, max_distance_km);
        let started = Instant::now();

        let response = self
            .http
            .post_json(&self.url, &[("Authorization", self.api_key.as_str())], &body)
            .await
            .map_err(|e| CoverageError::fetch_failure(ORS_SOURCE, e))?;
        metrics::isochrone::request_duration(started.elapsed().as_secs_f64());

        if !response.is_success() {
            return Err(CoverageError::fetch_failure(
                ORS_SOURCE,
                format!("status {}: {}", response.status, response.body_excerpt(200)),
            ));
        }

        let collection: FeatureCollection = serde_json::from_slice(&response.bytes)
            .map_err(|e| CoverageError::fetch_failure(ORS_SOURCE, format!("malformed payload: {}", e)))?;
        debug!("Received {} isochrone features", collection.len());
        Ok(collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ports::HttpResponse;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CapturingHttp {
        body: Mutex<Option<serde_json::Value>>,
        auth: Mutex<Option<String>>,
        reply: String,
        status: u16,
    }

    #[async_trait]
    impl HttpClientPort for CapturingHttp {
        async fn get(&self, _url: &str, _query: &[(&str, &str)]) -> std::result::Result<HttpResponse, String> {
            Err("not used".into())
        }

        async fn post_json(
            &self,
            _url: &str,
            headers: &[(&str, &str)],
            body: &serde_json::Value,
        ) -> std::result::Result<HttpResponse, String> {
            *self.body.lock().unwrap() = Some(body.clone());
            *self.auth.lock().unwrap() = headers
                .iter()
                .find(|(k, _)| *k == "Authorization")
                .map(|(_, v)| v.to_string());
            Ok(HttpResponse {
                status: self.status,
                bytes: self.reply.clone().into_bytes(),
                content_type: "application/geo+json".into(),
            })
        }
    }

    #[tokio::test]
    async fn test_request_body_and_auth_header() {
        let http = Arc::new(CapturingHttp {
            reply: r#"{"type":"FeatureCollection","features":[{"type":"Feature","geometry":null,"properties":{"area":3.1}}]}"#.into(),
            status: 200,
            ..Default::default()
        });
        let ors = OrsIsochrones::new(http.clone(), "http://ors.test/v2/isochrones/driving-car", "key-123");

        let fc = ors
            .isochrones(&[Coordinate::new(-6.2088, 106.8456)], 5.0)
            .await
            .unwrap();
        assert_eq!(fc.len(), 1);
        assert_eq!(fc.features[0].area(), Some(3.1));

        let body = http.body.lock().unwrap().clone().unwrap();
        assert_eq!(body["locations"], json!([[106.8456, -6.2088]]));
        assert_eq!(body["range"], json!([5.0]));
        assert_eq!(body["range_type"], "distance");
        assert_eq!(body["units"], "km");
        assert_eq!(body["attributes"], json!(["area", "reachfactor", "total_pop"]));
        assert_eq!(http.auth.lock().unwrap().as_deref(), Some("key-123"));
    }

    #[tokio::test]
    async fn test_error_status_is_fetch_failure() {
        let http = Arc::new(CapturingHttp {
            reply: r#"{"error":{"code":2004,"message":"limit"}}"#.into(),
            status: 400,
            ..Default::default()
        });
        let ors = OrsIsochrones::new(http, "http://ors.test", "k");
        let err = ors.isochrones(&[Coordinate::new(0.0, 0.0)], 1.0).await.unwrap_err();
        assert!(err.is_fetch_failure());
        assert!(err.to_string().contains("400"));
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let http = Arc::new(CapturingHttp::default());
        let config = IsochroneConfig::default();
        assert!(matches!(
            OrsIsochrones::from_config(http, &config),
            Err(CoverageError::Config(_))
        ));
    }
}
