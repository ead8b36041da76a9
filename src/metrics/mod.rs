//! Metric series keyed by attribute fingerprint.
//!
//! Only scalar points (gauge, sum, summary sum) become series points;
//! histogram kinds are accepted but not charted.

pub mod fingerprint;
pub mod storage;
pub mod types;

pub use fingerprint::fingerprint;
pub use storage::MetricStore;
pub use types::{MetricPoint, MetricSeries};
