// Pipeline processing: classification, naming, and aggregation of map nodes

pub mod aggregate;
pub mod classify;
pub mod naming;

pub use aggregate::{aggregate, aggregate_nodes, AggregateResult, ClassifiedNode};
pub use classify::{classify, Category, CategoryRule, Classifier, TagMatch};
