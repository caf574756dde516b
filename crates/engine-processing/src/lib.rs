pub mod backoff;
pub mod error;
pub mod merge;
pub mod metrics;
