use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};

use crate::app::ports::{HttpClientPort, PoiSourcePort};
use crate::constants::OVERPASS_SOURCE;
use crate::error::{CoverageError, Result};
use crate::observability::metrics;
use crate::types::{Coordinate, RawNode, TagFilters, Tags};

/// Overpass interpreter as a source of tagged nodes
pub struct OverpassSource {
    http: Arc<dyn HttpClientPort>,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    #[serde(rename = "type")]
    kind: String,
    id: u64,
    lat: Option<f64>,
    lon: Option<f64>,
    tags: Option<Tags>,
}

impl OverpassSource {
    pub fn new(http: Arc<dyn HttpClientPort>, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }

    /// Overpass QL asking for every node carrying one of the filter keys within
    /// `radius_m` meters of `center`
    pub fn build_query(center: Coordinate, radius_m: f64, filters: &TagFilters) -> String {
        let clauses: String = filters
            .keys()
            .iter()
            .map(|key| {
                format!(
                    "node[\"{}\"](around:{},{},{});",
                    key, radius_m, center.lat, center.lon
                )
            })
            .collect();
        format!("[out:json];({});out;", clauses)
    }

    /// Turn an interpreter response body into nodes. Ways, relations and
    /// untagged or unplaced nodes are skipped.
    pub fn parse_nodes(body: &[u8]) -> Result<Vec<RawNode>> {
        let response: OverpassResponse = serde_json::from_slice(body)?;
        let nodes = response
            .elements
            .into_iter()
            .filter(|el| el.kind == "node")
            .filter_map(|el| match (el.lat, el.lon, el.tags) {
                (Some(lat), Some(lon), Some(tags)) => Some(RawNode {
                    id: el.id,
                    coordinate: Coordinate::new(lat, lon),
                    tags,
                }),
                _ => None,
            })
            .collect();
        Ok(nodes)
    }
}

#[async_trait]
impl PoiSourcePort for OverpassSource {
    fn source_name(&self) -> &str {
        OVERPASS_SOURCE
    }

    #[instrument(skip(self, filters), fields(endpoint = %self.endpoint))]
    async fn fetch_nodes(&self, center: Coordinate, radius_m: f64, filters: &TagFilters) -> Result<Vec<RawNode>> {
        let query = Self::build_query(center, radius_m, filters);
        let started = Instant::now();

        let response = self.http.get(&self.endpoint, &[("data", query.as_str())]).await.map_err(|e| {
            metrics::overpass::request_error("transport");
            CoverageError::fetch_failure(OVERPASS_SOURCE, e)
        })?;
        metrics::overpass::request_duration(started.elapsed().as_secs_f64());

        if !response.is_success() {
            metrics::overpass::request_error("status");
            warn!("Overpass returned status {}", response.status);
            return Err(CoverageError::fetch_failure(
                OVERPASS_SOURCE,
                format!("status {}: {}", response.status, response.body_excerpt(200)),
            ));
        }

        let nodes = Self::parse_nodes(&response.bytes).map_err(|e| {
            metrics::overpass::request_error("payload");
            CoverageError::fetch_failure(OVERPASS_SOURCE, format!("malformed payload: {}", e))
        })?;

        metrics::overpass::request_success();
        metrics::overpass::nodes_received(nodes.len());
        info!("Fetched {} nodes from OpenStreetMap", nodes.len());
        Ok(nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ports::HttpResponse;
    use std::sync::Mutex;

    struct MockHttp {
        status: u16,
        body: String,
        seen_query: Mutex<Option<String>>,
    }

    #[async_trait]
    impl HttpClientPort for MockHttp {
        async fn get(&self, _url: &str, query: &[(&str, &str)]) -> std::result::Result<HttpResponse, String> {
            *self.seen_query.lock().unwrap() = query.iter().find(|(k, _)| *k == "data").map(|(_, v)| v.to_string());
            Ok(HttpResponse {
                status: self.status,
                bytes: self.body.clone().into_bytes(),
                content_type: "application/json".into(),
            })
        }

        async fn post_json(
            &self,
            _url: &str,
            _headers: &[(&str, &str)],
            _body: &serde_json::Value,
        ) -> std::result::Result<HttpResponse, String> {
            Err("not used".into())
        }
    }

    fn source(status: u16, body: &str) -> (OverpassSource, Arc<MockHttp>) {
        let http = Arc::new(MockHttp {
            status,
            body: body.to_string(),
            seen_query: Mutex::new(None),
        });
        (OverpassSource::new(http.clone(), "http://overpass.test/api/interpreter"), http)
    }

    #[test]
    fn test_build_query_has_one_clause_per_filter() {
        let q = OverpassSource::build_query(
            Coordinate::new(-6.2, 106.8),
            1000.0,
            &TagFilters::new(["shop", "amenity"]),
        );
        assert_eq!(
            q,
            "[out:json];(node[\"shop\"](around:1000,-6.2,106.8);node[\"amenity\"](around:1000,-6.2,106.8););out;"
        );
    }

    #[test]
    fn test_parse_skips_non_nodes_and_untagged() {
        let body = r#"{"elements": [
            {"type": "node", "id": 1, "lat": -6.2, "lon": 106.8, "tags": {"shop": "bakery"}},
            {"type": "node", "id": 2, "lat": -6.2, "lon": 106.8},
            {"type": "way", "id": 3, "tags": {"building": "yes"}}
        ]}"#;
        let nodes = OverpassSource::parse_nodes(body.as_bytes()).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].id, 1);
        assert_eq!(nodes[0].tags.get("shop").map(String::as_str), Some("bakery"));
    }

    #[tokio::test]
    async fn test_fetch_sends_query_as_data_param() {
        let (src, http) = source(200, r#"{"elements": []}"#);
        let nodes = src
            .fetch_nodes(Coordinate::new(1.0, 2.0), 500.0, &TagFilters::new(["shop"]))
            .await
            .unwrap();
        assert!(nodes.is_empty());
        let q = http.seen_query.lock().unwrap().clone().unwrap();
        assert!(q.contains("node[\"shop\"](around:500,1,2);"));
    }

    #[tokio::test]
    async fn test_error_status_is_fetch_failure() {
        let (src, _) = source(429, "rate limited");
        let err = src
            .fetch_nodes(Coordinate::new(1.0, 2.0), 500.0, &TagFilters::default())
            .await
            .unwrap_err();
        assert!(err.is_fetch_failure());
        assert!(err.to_string().contains("429"));
    }

    #[tokio::test]
    async fn test_malformed_payload_is_fetch_failure() {
        let (src, _) = source(200, "<html>busy</html>");
        let err = src
            .fetch_nodes(Coordinate::new(1.0, 2.0), 500.0, &TagFilters::default())
            .await
            .unwrap_err();
        assert!(err.is_fetch_failure());
    }
}
