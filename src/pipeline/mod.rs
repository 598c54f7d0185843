// Data pipeline: outbound request pacing and batching, then node processing

pub mod ingestion;
pub mod processing;
