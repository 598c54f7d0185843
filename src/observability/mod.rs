// Observability: metrics recording and export

pub mod metrics;

pub use metrics::{init, render};
