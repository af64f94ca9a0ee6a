/// Health-check engine
///
/// - `prober` issues a single HTTP probe and classifies it
/// - `executor` fans batches out to the prober and persists the results
/// - `metrics` aggregates stored observations over a trailing window
pub mod executor;
pub mod metrics;
pub mod prober;
pub mod types;

pub use executor::Dispatcher;
pub use metrics::{MetricsAggregator, UrlMetrics};
pub use prober::{HttpProber, Prober};
pub use types::{CheckRecord, ProbeFailure, ProbeResult, ProbeStatus, StoredCheck};
