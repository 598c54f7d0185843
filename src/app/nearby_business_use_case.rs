use std::sync::Arc;
use tracing::info;

use crate::app::ports::PoiSourcePort;
use crate::error::Result;
use crate::outlets::Outlet;
use crate::pipeline::processing::aggregate::{aggregate, AggregateResult};
use crate::pipeline::processing::classify::Classifier;
use crate::types::{Coordinate, TagFilters};

/// Use case for surveying businesses around a selection of locations
pub struct NearbyBusinessUseCase {
    source: Arc<dyn PoiSourcePort>,
    filters: TagFilters,
    classifier: Classifier,
}

impl NearbyBusinessUseCase {
    pub fn new(source: Arc<dyn PoiSourcePort>, filters: TagFilters) -> Self {
        Self {
            source,
            filters,
            classifier: Classifier::standard().clone(),
        }
    }

    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Aggregate businesses within `radius_m` of the centroid of `selection`.
    ///
    /// An empty selection yields an empty result without querying the source.
    pub async fn run(&self, selection: &[Coordinate], radius_m: f64) -> Result<AggregateResult> {
        let Some(center) = Coordinate::centroid(selection) else {
            info!("No locations selected, skipping business lookup");
            return Ok(AggregateResult::empty(radius_m));
        };

        info!(
            "Looking up businesses within {} km of ({:.5}, {:.5})",
            radius_m / 1000.0,
            center.lat,
            center.lon
        );
        aggregate(center, radius_m, &self.filters, self.source.as_ref(), &self.classifier).await
    }

    pub async fn run_for_outlets(&self, outlets: &[&Outlet], radius_m: f64) -> Result<AggregateResult> {
        let selection: Vec<Coordinate> = outlets.iter().map(|o| o.coordinate()).collect();
        self.run(&selection, radius_m).await
    }
}
