use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::constants::DEFAULT_TAG_FILTERS;

/// Key/value attributes attached to a map node (e.g. `shop=bakery`)
pub type Tags = BTreeMap<String, String>;

/// A WGS84 position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Arithmetic mean of the given positions, `None` when there are none.
    pub fn centroid(points: &[Coordinate]) -> Option<Coordinate> {
        if points.is_empty() {
            return None;
        }
        let n = points.len() as f64;
        let lat = points.iter().map(|p| p.lat).sum::<f64>() / n;
        let lon = points.iter().map(|p| p.lon).sum::<f64>() / n;
        Some(Coordinate { lat, lon })
    }

    /// GeoJSON / OpenRouteService ordering
    pub fn lon_lat(&self) -> [f64; 2] {
        [self.lon, self.lat]
    }

    /// Stable textual form used in cache keys
    pub fn key(&self) -> String {
        format!("{:.6},{:.6}", self.lat, self.lon)
    }
}

/// A tagged point of interest as returned by the map-data service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawNode {
    pub id: u64,
    pub coordinate: Coordinate,
    pub tags: Tags,
}

/// Tag keys a map-data query should match, in query order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagFilters(Vec<String>);

impl TagFilters {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(keys.into_iter().map(Into::into).collect())
    }

    pub fn keys(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for TagFilters {
    fn default() -> Self {
        Self::new(DEFAULT_TAG_FILTERS)
    }
}

/// A GeoJSON feature. Geometry is carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type", default = "feature_type")]
    pub kind: String,
    #[serde(default)]
    pub geometry: Value,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

fn feature_type() -> String {
    "Feature".to_string()
}

impl Feature {
    /// Reachable area reported by the routing service
    pub fn area(&self) -> Option<f64> {
        self.properties.get("area").and_then(Value::as_f64)
    }

    pub fn reach_factor(&self) -> Option<f64> {
        self.properties.get("reachfactor").and_then(Value::as_f64)
    }

    pub fn total_pop(&self) -> Option<f64> {
        self.properties.get("total_pop").and_then(Value::as_f64)
    }

    pub fn set_property(&mut self, key: &str, value: impl Into<Value>) {
        self.properties.insert(key.to_string(), value.into());
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type", default = "collection_type")]
    pub kind: String,
    #[serde(default)]
    pub features: Vec<Feature>,
}

fn collection_type() -> String {
    "FeatureCollection".to_string()
}

impl Default for FeatureCollection {
    fn default() -> Self {
        Self {
            kind: collection_type(),
            features: Vec::new(),
        }
    }
}

impl FeatureCollection {
    pub fn extend(&mut self, other: FeatureCollection) {
        self.features.extend(other.features);
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}
