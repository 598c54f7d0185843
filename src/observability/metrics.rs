//! Metrics for the coverage tools
//!
//! Recording goes through the `metrics` facade, so every function here is a
//! no-op until `init` installs the Prometheus recorder.

use std::fmt;
use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;

/// All metric names used in the crate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Map-data queries
    OverpassRequestsSuccess,
    OverpassRequestsError,
    OverpassRequestDuration,
    OverpassNodesReceived,

    // Classification / aggregation
    NodesClassified,
    NodesDropped,
    AggregationsCompleted,

    // Isochrone batches
    IsochroneBatchesSuccess,
    IsochroneBatchesError,
    IsochroneRetries,
    IsochroneFeaturesMerged,
    IsochroneRequestDuration,

    // Memoized responses
    CacheHits,
    CacheMisses,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::OverpassRequestsSuccess => "coverage_overpass_requests_success_total",
            MetricName::OverpassRequestsError => "coverage_overpass_requests_error_total",
            MetricName::OverpassRequestDuration => "coverage_overpass_request_duration_seconds",
            MetricName::OverpassNodesReceived => "coverage_overpass_nodes_received_total",
            MetricName::NodesClassified => "coverage_nodes_classified_total",
            MetricName::NodesDropped => "coverage_nodes_dropped_total",
            MetricName::AggregationsCompleted => "coverage_aggregations_completed_total",
            MetricName::IsochroneBatchesSuccess => "coverage_isochrone_batches_success_total",
            MetricName::IsochroneBatchesError => "coverage_isochrone_batches_error_total",
            MetricName::IsochroneRetries => "coverage_isochrone_retries_total",
            MetricName::IsochroneFeaturesMerged => "coverage_isochrone_features_merged_total",
            MetricName::IsochroneRequestDuration => "coverage_isochrone_request_duration_seconds",
            MetricName::CacheHits => "coverage_cache_hits_total",
            MetricName::CacheMisses => "coverage_cache_misses_total",
        }
    }

    pub fn all_metrics() -> impl Iterator<Item = MetricName> {
        use MetricName::*;
        [
            OverpassRequestsSuccess,
            OverpassRequestsError,
            OverpassRequestDuration,
            OverpassNodesReceived,
            NodesClassified,
            NodesDropped,
            AggregationsCompleted,
            IsochroneBatchesSuccess,
            IsochroneBatchesError,
            IsochroneRetries,
            IsochroneFeaturesMerged,
            IsochroneRequestDuration,
            CacheHits,
            CacheMisses,
        ]
        .into_iter()
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder. Calling it twice is harmless.
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    if METRICS_HANDLE.get().is_some() {
        return Ok(());
    }
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {}", e))?;
    METRICS_HANDLE.set(handle).ok();
    info!("Metrics system initialized");
    Ok(())
}

/// Current metrics in Prometheus text format, if the recorder is installed
pub fn render() -> Option<String> {
    METRICS_HANDLE.get().map(|handle| handle.render())
}

pub mod overpass {
    use super::MetricName;

    pub fn request_success() {
        ::metrics::counter!(MetricName::OverpassRequestsSuccess.as_str()).increment(1);
    }

    pub fn request_error(reason: &'static str) {
        ::metrics::counter!(MetricName::OverpassRequestsError.as_str(), "reason" => reason).increment(1);
    }

    pub fn request_duration(secs: f64) {
        ::metrics::histogram!(MetricName::OverpassRequestDuration.as_str()).record(secs);
    }

    pub fn nodes_received(count: usize) {
        ::metrics::counter!(MetricName::OverpassNodesReceived.as_str()).increment(count as u64);
    }
}

pub mod aggregate {
    use super::MetricName;
    use crate::pipeline::processing::classify::Category;
    use std::collections::BTreeMap;

    /// Record one completed aggregation. Called only after the fetch succeeded.
    pub fn completed(counts: &BTreeMap<Category, usize>, dropped: usize) {
        for (category, count) in counts {
            ::metrics::counter!(MetricName::NodesClassified.as_str(), "category" => category.label())
                .increment(*count as u64);
        }
        ::metrics::counter!(MetricName::NodesDropped.as_str()).increment(dropped as u64);
        ::metrics::counter!(MetricName::AggregationsCompleted.as_str()).increment(1);
    }
}

pub mod isochrone {
    use super::MetricName;

    pub fn batch_success(features: usize) {
        ::metrics::counter!(MetricName::IsochroneBatchesSuccess.as_str()).increment(1);
        ::metrics::counter!(MetricName::IsochroneFeaturesMerged.as_str()).increment(features as u64);
    }

    pub fn batch_error() {
        ::metrics::counter!(MetricName::IsochroneBatchesError.as_str()).increment(1);
    }

    pub fn retry() {
        ::metrics::counter!(MetricName::IsochroneRetries.as_str()).increment(1);
    }

    pub fn request_duration(secs: f64) {
        ::metrics::histogram!(MetricName::IsochroneRequestDuration.as_str()).record(secs);
    }
}

pub mod cache {
    use super::MetricName;

    pub fn hit(cache: &'static str) {
        ::metrics::counter!(MetricName::CacheHits.as_str(), "cache" => cache).increment(1);
    }

    pub fn miss(cache: &'static str) {
        ::metrics::counter!(MetricName::CacheMisses.as_str(), "cache" => cache).increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_metric_names_are_unique_and_prefixed() {
        let names: Vec<&str> = MetricName::all_metrics().map(|m| m.as_str()).collect();
        let unique: HashSet<&str> = names.iter().copied().collect();
        assert_eq!(names.len(), unique.len());
        assert!(names.iter().all(|n| n.starts_with("coverage_")));
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        overpass::request_success();
        isochrone::retry();
        cache::miss("poi");
    }
}
