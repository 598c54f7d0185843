use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Coordinate, FeatureCollection, RawNode, TagFilters};

// Transport-side ports
#[async_trait]
pub trait HttpClientPort: Send + Sync {
    async fn get(&self, url: &str, query: &[(&str, &str)]) -> std::result::Result<HttpResponse, String>;

    async fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &serde_json::Value,
    ) -> std::result::Result<HttpResponse, String>;
}

#[derive(Clone, Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First `max` characters of the body, for error messages
    pub fn body_excerpt(&self, max: usize) -> String {
        String::from_utf8_lossy(&self.bytes).chars().take(max).collect()
    }
}

// Domain-side ports

/// Map-data query service: tagged nodes around a point
#[async_trait]
pub trait PoiSourcePort: Send + Sync {
    fn source_name(&self) -> &str;

    async fn fetch_nodes(&self, center: Coordinate, radius_m: f64, filters: &TagFilters) -> Result<Vec<RawNode>>;
}

/// Routing service: one reachability polygon per location
#[async_trait]
pub trait IsochronePort: Send + Sync {
    fn source_name(&self) -> &str;

    async fn isochrones(&self, locations: &[Coordinate], max_distance_km: f64) -> Result<FeatureCollection>;
}
