// Pipeline ingestion: request pacing, batching, and memoization keys for outbound calls

pub mod batching;
pub mod idempotency;
pub mod rate_limiter;

pub use batching::{plan_batches, Batch};
pub use rate_limiter::{Limits, RateLimiter};
