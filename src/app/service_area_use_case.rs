use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{info, instrument, warn};

use crate::app::ports::IsochronePort;
use crate::config::IsochroneConfig;
use crate::constants::DEFAULT_ISOCHRONE_BATCH_SIZE;
use crate::error::{CoverageError, Result};
use crate::observability::metrics;
use crate::outlets::Outlet;
use crate::pipeline::ingestion::batching::{plan_batches, Batch};
use crate::pipeline::ingestion::rate_limiter::{Limits, RateLimiter};
use crate::types::{Coordinate, FeatureCollection};

/// Feature property holding the position of the feature's location in the input
pub const LOCATION_INDEX_PROPERTY: &str = "location_index";

/// Position of a feature's location within its request, as reported by the routing service
const GROUP_INDEX_PROPERTY: &str = "group_index";

/// How coordinate lists are split and retried
#[derive(Debug, Clone)]
pub struct BatchPolicy {
    pub batch_size: usize,
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each further retry
    pub backoff: Duration,
    pub concurrency: u32,
    pub requests_per_min: Option<u64>,
}

impl Default for BatchPolicy {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_ISOCHRONE_BATCH_SIZE,
            max_retries: 0,
            backoff: Duration::ZERO,
            concurrency: 1,
            requests_per_min: None,
        }
    }
}

impl BatchPolicy {
    pub fn from_config(config: &IsochroneConfig) -> Self {
        Self {
            batch_size: config.batch_size,
            max_retries: config.max_retries,
            backoff: config.backoff(),
            concurrency: config.concurrency.max(1),
            requests_per_min: config.requests_per_min,
        }
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(1u32 << attempt.min(16))
    }
}

/// A batch whose request never succeeded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchFailure {
    pub index: usize,
    pub start: usize,
    pub end: usize,
    pub attempts: u32,
    pub reason: String,
}

/// Merged service areas plus the batches that could not be computed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceAreaReport {
    pub max_distance_km: f64,
    pub collection: FeatureCollection,
    pub batch_count: usize,
    pub failed_batches: Vec<BatchFailure>,
}

impl ServiceAreaReport {
    fn empty(max_distance_km: f64) -> Self {
        Self {
            max_distance_km,
            collection: FeatureCollection::default(),
            batch_count: 0,
            failed_batches: Vec::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failed_batches.is_empty()
    }

    /// Input positions whose service area is missing
    pub fn failed_locations(&self) -> Vec<usize> {
        self.failed_batches.iter().flat_map(|f| f.start..f.end).collect()
    }
}

/// Use case for road-network service areas around many locations
pub struct ServiceAreaUseCase {
    port: Arc<dyn IsochronePort>,
    policy: BatchPolicy,
    limiter: RateLimiter,
}

impl ServiceAreaUseCase {
    pub fn new(port: Arc<dyn IsochronePort>, policy: BatchPolicy) -> Self {
        let limiter = RateLimiter::new(Limits {
            requests_per_min: policy.requests_per_min,
            concurrency: Some(policy.concurrency.max(1)),
        });
        Self { port, policy, limiter }
    }

    /// Request service areas batch by batch and merge them in input order.
    ///
    /// A failing batch does not abort the others; it is listed in the report.
    #[instrument(skip(self, locations), fields(locations = locations.len()))]
    pub async fn compute_service_areas(&self, locations: &[Coordinate], max_distance_km: f64) -> Result<ServiceAreaReport> {
        if !(max_distance_km > 0.0) {
            return Err(CoverageError::InvalidInput(format!(
                "max distance must be positive, got {}",
                max_distance_km
            )));
        }
        if locations.is_empty() {
            info!("No locations selected, skipping service area computation");
            return Ok(ServiceAreaReport::empty(max_distance_km));
        }

        let batches = plan_batches(locations, self.policy.batch_size);
        let batch_count = batches.len();
        let mut outcomes: Vec<Option<BatchOutcome>> = vec![None; batch_count];

        let mut tasks = JoinSet::new();
        for batch in batches.iter().cloned() {
            let port = self.port.clone();
            let limiter = self.limiter.clone();
            let policy = self.policy.clone();
            tasks.spawn(async move { run_batch(port, limiter, policy, batch, max_distance_km).await });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => outcomes[index] = Some(outcome),
                Err(e) => warn!("Isochrone batch task ended abnormally: {}", e),
            }
        }

        let mut report = ServiceAreaReport::empty(max_distance_km);
        report.batch_count = batch_count;
        for (batch, outcome) in batches.iter().zip(outcomes) {
            match outcome {
                Some(BatchOutcome::Done(collection)) => {
                    metrics::isochrone::batch_success(collection.len());
                    report.collection.extend(collection);
                }
                Some(BatchOutcome::Failed { attempts, reason }) => {
                    metrics::isochrone::batch_error();
                    report.failed_batches.push(BatchFailure {
                        index: batch.index,
                        start: batch.start,
                        end: batch.end,
                        attempts,
                        reason,
                    });
                }
                None => {
                    metrics::isochrone::batch_error();
                    report.failed_batches.push(BatchFailure {
                        index: batch.index,
                        start: batch.start,
                        end: batch.end,
                        attempts: 0,
                        reason: "batch task aborted".to_string(),
                    });
                }
            }
        }

        if report.is_complete() {
            info!("Computed {} service areas in {} batches", report.collection.len(), batch_count);
        } else {
            warn!(
                "{} of {} isochrone batches failed",
                report.failed_batches.len(),
                batch_count
            );
        }
        Ok(report)
    }

    /// Service areas for outlets; each feature is labelled with its outlet
    pub async fn compute_for_outlets(&self, outlets: &[&Outlet], max_distance_km: f64) -> Result<ServiceAreaReport> {
        let locations: Vec<Coordinate> = outlets.iter().map(|o| o.coordinate()).collect();
        let mut report = self.compute_service_areas(&locations, max_distance_km).await?;

        for feature in &mut report.collection.features {
            let outlet = feature
                .properties
                .get(LOCATION_INDEX_PROPERTY)
                .and_then(|v| v.as_u64())
                .and_then(|i| outlets.get(i as usize));
            if let Some(outlet) = outlet {
                feature.set_property("outlet_id", outlet.id.clone());
                feature.set_property("outlet_name", outlet.name.clone());
            }
        }
        Ok(report)
    }
}

#[derive(Debug, Clone)]
enum BatchOutcome {
    Done(FeatureCollection),
    Failed { attempts: u32, reason: String },
}

async fn run_batch(
    port: Arc<dyn IsochronePort>,
    limiter: RateLimiter,
    policy: BatchPolicy,
    batch: Batch,
    max_distance_km: f64,
) -> (usize, BatchOutcome) {
    let mut attempt = 0u32;
    loop {
        let result = {
            let _permit = limiter.acquire().await;
            port.isochrones(&batch.locations, max_distance_km).await
        };

        match result {
            Ok(mut collection) => {
                index_features(&mut collection, &batch);
                return (batch.index, BatchOutcome::Done(collection));
            }
            Err(e) if e.is_fetch_failure() && attempt < policy.max_retries => {
                let delay = policy.delay_for(attempt);
                warn!(
                    "Isochrone batch {} failed (attempt {}): {}; retrying in {:?}",
                    batch.index + 1,
                    attempt + 1,
                    e,
                    delay
                );
                metrics::isochrone::retry();
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                warn!("Isochrone batch {} failed: {}", batch.index + 1, e);
                return (
                    batch.index,
                    BatchOutcome::Failed {
                        attempts: attempt + 1,
                        reason: e.to_string(),
                    },
                );
            }
        }
    }
}

/// Tag each feature with the input position of its location. The routing
/// service's `group_index` wins; otherwise a response with one feature per
/// location is matched by position.
fn index_features(collection: &mut FeatureCollection, batch: &Batch) {
    let positional = collection.len() == batch.locations.len();
    for (offset, feature) in collection.features.iter_mut().enumerate() {
        let local = feature
            .properties
            .get(GROUP_INDEX_PROPERTY)
            .and_then(Value::as_u64)
            .map(|g| g as usize)
            .filter(|g| *g < batch.locations.len())
            .or(positional.then_some(offset));
        if let Some(local) = local {
            feature.set_property(LOCATION_INDEX_PROPERTY, (batch.start + local) as u64);
        }
    }
}
