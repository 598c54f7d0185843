use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::app::ports::{IsochronePort, PoiSourcePort};
use crate::error::Result;
use crate::observability::metrics;
use crate::pipeline::ingestion::idempotency::{isochrone_key, poi_query_key};
use crate::types::{Coordinate, FeatureCollection, RawNode, TagFilters};

/// In-memory store of successful responses keyed by a digest of the call's inputs
#[derive(Debug)]
pub struct ResponseCache<T> {
    name: &'static str,
    entries: Mutex<HashMap<String, T>>,
}

impl<T: Clone> ResponseCache<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get(&self, key: &str) -> Option<T> {
        let hit = self.entries.lock().await.get(key).cloned();
        match hit {
            Some(_) => metrics::cache::hit(self.name),
            None => metrics::cache::miss(self.name),
        }
        hit
    }

    pub async fn put(&self, key: String, value: T) {
        self.entries.lock().await.insert(key, value);
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

/// Memoizes a map-data source. Errors are passed through and not stored.
pub struct CachedPoiSource {
    inner: Arc<dyn PoiSourcePort>,
    endpoint: String,
    cache: ResponseCache<Vec<RawNode>>,
}

impl CachedPoiSource {
    pub fn new(inner: Arc<dyn PoiSourcePort>, endpoint: impl Into<String>) -> Self {
        Self {
            inner,
            endpoint: endpoint.into(),
            cache: ResponseCache::new("poi"),
        }
    }

    pub fn cache(&self) -> &ResponseCache<Vec<RawNode>> {
        &self.cache
    }
}

#[async_trait]
impl PoiSourcePort for CachedPoiSource {
    fn source_name(&self) -> &str {
        self.inner.source_name()
    }

    async fn fetch_nodes(&self, center: Coordinate, radius_m: f64, filters: &TagFilters) -> Result<Vec<RawNode>> {
        let key = poi_query_key(&self.endpoint, center, radius_m, filters);
        if let Some(nodes) = self.cache.get(&key).await {
            debug!("Serving {} nodes from cache", nodes.len());
            return Ok(nodes);
        }
        let nodes = self.inner.fetch_nodes(center, radius_m, filters).await?;
        self.cache.put(key, nodes.clone()).await;
        Ok(nodes)
    }
}

/// Memoizes isochrone requests per batch of locations
pub struct CachedIsochrones {
    inner: Arc<dyn IsochronePort>,
    endpoint: String,
    cache: ResponseCache<FeatureCollection>,
}

impl CachedIsochrones {
    pub fn new(inner: Arc<dyn IsochronePort>, endpoint: impl Into<String>) -> Self {
        Self {
            inner,
            endpoint: endpoint.into(),
            cache: ResponseCache::new("isochrone"),
        }
    }

    pub fn cache(&self) -> &ResponseCache<FeatureCollection> {
        &self.cache
    }
}

#[async_trait]
impl IsochronePort for CachedIsochrones {
    fn source_name(&self) -> &str {
        self.inner.source_name()
    }

    async fn isochrones(&self, locations: &[Coordinate], max_distance_km: f64) -> Result<FeatureCollection> {
        let key = isochrone_key(&self.endpoint, locations, max_distance_km);
        if let Some(collection) = self.cache.get(&key).await {
            debug!("Serving {} isochrone features from cache", collection.len());
            return Ok(collection);
        }
        let collection = self.inner.isochrones(locations, max_distance_km).await?;
        self.cache.put(key, collection.clone()).await;
        Ok(collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoverageError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl PoiSourcePort for CountingSource {
        fn source_name(&self) -> &str {
            "counting"
        }

        async fn fetch_nodes(&self, center: Coordinate, _radius_m: f64, _filters: &TagFilters) -> Result<Vec<RawNode>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(CoverageError::fetch_failure("counting", "down"));
            }
            Ok(vec![RawNode {
                id: 7,
                coordinate: center,
                tags: [("shop".to_string(), "bakery".to_string())].into_iter().collect(),
            }])
        }
    }

    #[tokio::test]
    async fn test_second_identical_call_is_served_from_cache() {
        let inner = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
            fail: false,
        });
        let cached = CachedPoiSource::new(inner.clone(), "http://overpass.test");
        let center = Coordinate::new(-6.2, 106.8);
        let filters = TagFilters::default();

        let first = cached.fetch_nodes(center, 1000.0, &filters).await.unwrap();
        let second = cached.fetch_nodes(center, 1000.0, &filters).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);

        cached.fetch_nodes(center, 2000.0, &filters).await.unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cached.cache().len().await, 2);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let inner = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
            fail: true,
        });
        let cached = CachedPoiSource::new(inner.clone(), "http://overpass.test");
        let center = Coordinate::new(0.0, 0.0);
        assert!(cached.fetch_nodes(center, 1.0, &TagFilters::default()).await.is_err());
        assert!(cached.fetch_nodes(center, 1.0, &TagFilters::default()).await.is_err());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cached.cache().len().await, 0);
    }
}
