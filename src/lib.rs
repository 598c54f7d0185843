pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod observability;
pub mod outlets;
pub mod pipeline;
pub mod report;
pub mod types;

// Layered boundaries for application and infrastructure
pub mod app;
pub mod infra;

pub use error::{CoverageError, Result};
pub use pipeline::processing::{aggregate, aggregate_nodes, classify, AggregateResult, Category, ClassifiedNode, Classifier};
pub use types::{Coordinate, RawNode, TagFilters, Tags};
