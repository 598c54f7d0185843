use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

use super::classify::{Category, Classifier};
use super::naming::{display_name, is_synthesized};
use crate::app::ports::PoiSourcePort;
use crate::error::{CoverageError, Result};
use crate::observability::metrics;
use crate::types::{Coordinate, RawNode, TagFilters, Tags};

/// A map node with its assigned category and display name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedNode {
    pub id: u64,
    pub display_name: Option<String>,
    pub category: Category,
    pub coordinate: Coordinate,
    pub tags: Tags,
}

impl ClassifiedNode {
    pub fn from_raw(node: &RawNode, classifier: &Classifier) -> Self {
        Self {
            id: node.id,
            display_name: display_name(&node.tags),
            category: classifier.classify(&node.tags),
            coordinate: node.coordinate,
            tags: node.tags.clone(),
        }
    }

    /// Kept in listings: a genuine name and a specific category
    fn is_listable(&self) -> bool {
        self.category != Category::Other
            && self.display_name.as_deref().is_some_and(|name| !is_synthesized(name))
    }
}

/// Businesses around a point: the cleaned listing plus per-category counts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub center: Option<Coordinate>,
    pub radius_m: f64,
    /// Listing in source order, without synthesized names or `Other`
    pub nodes: Vec<ClassifiedNode>,
    /// Counts over every named node, before the listing filters
    pub category_counts: BTreeMap<Category, usize>,
    /// Number of named nodes found, before the listing filters
    pub total_found: usize,
}

impl AggregateResult {
    /// Result for an empty selection
    pub fn empty(radius_m: f64) -> Self {
        Self {
            center: None,
            radius_m,
            nodes: Vec::new(),
            category_counts: BTreeMap::new(),
            total_found: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_found == 0
    }

    pub fn by_category(&self, category: Category) -> Vec<&ClassifiedNode> {
        self.nodes.iter().filter(|n| n.category == category).collect()
    }

    /// Distinct categories present in the listing, alphabetical by label
    pub fn categories(&self) -> Vec<Category> {
        let mut categories: Vec<Category> = self.nodes.iter().map(|n| n.category).collect();
        categories.sort_by_key(|c| c.label());
        categories.dedup();
        categories
    }

    pub fn count(&self, category: Category) -> usize {
        self.category_counts.get(&category).copied().unwrap_or(0)
    }
}

/// Classify, name, count and filter already-fetched nodes.
///
/// Nodes without tags, and nodes for which no display name can be derived,
/// are dropped before counting.
pub fn aggregate_nodes(center: Coordinate, radius_m: f64, nodes: &[RawNode], classifier: &Classifier) -> AggregateResult {
    let mut category_counts: BTreeMap<Category, usize> = BTreeMap::new();
    let mut listing = Vec::new();
    let mut total_found = 0;

    for node in nodes.iter().filter(|n| !n.tags.is_empty()) {
        let classified = ClassifiedNode::from_raw(node, classifier);
        if classified.display_name.is_none() {
            continue;
        }

        total_found += 1;
        *category_counts.entry(classified.category).or_insert(0) += 1;

        if classified.is_listable() {
            listing.push(classified);
        }
    }

    debug!(
        "Aggregated {} of {} nodes, {} listed",
        total_found,
        nodes.len(),
        listing.len()
    );

    AggregateResult {
        center: Some(center),
        radius_m,
        nodes: listing,
        category_counts,
        total_found,
    }
}

/// Fetch nodes around `center` once and aggregate them.
///
/// Any failure of the source surfaces as `FetchFailure`; nothing is retried here.
#[instrument(skip(filters, source, classifier), fields(source = source.source_name()))]
pub async fn aggregate(
    center: Coordinate,
    radius_m: f64,
    filters: &TagFilters,
    source: &dyn PoiSourcePort,
    classifier: &Classifier,
) -> Result<AggregateResult> {
    if !(radius_m > 0.0) {
        return Err(CoverageError::InvalidInput(format!("radius must be positive, got {}", radius_m)));
    }

    let nodes = source.fetch_nodes(center, radius_m, filters).await.map_err(|e| match e {
        e @ CoverageError::FetchFailure { .. } => e,
        other => CoverageError::fetch_failure(source.source_name(), other.to_string()),
    })?;

    let result = aggregate_nodes(center, radius_m, &nodes, classifier);
    metrics::aggregate::completed(&result.category_counts, nodes.len() - result.total_found);

    info!(
        "Found {} businesses/points of interest, {} listed across {} categories",
        result.total_found,
        result.nodes.len(),
        result.category_counts.len()
    );
    Ok(result)
}
