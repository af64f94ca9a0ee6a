//! Uptime and latency over a trailing window.

use std::sync::Arc;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::Serialize;

use crate::database::{Observation, RecordStore};
use crate::error::StoreError;

/// Window used when the caller does not pick one
pub const DEFAULT_WINDOW_DAYS: u32 = 7;

/// Aggregated metrics for one target
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UrlMetrics {
    pub url: String,
    pub total_checks: u64,
    /// Share of UP observations, 0-100
    pub uptime_percentage: f64,
    /// Mean latency of UP observations only, in milliseconds
    pub average_response_time: f64,
    pub time_period_days: u32,
}

/// Counts and latency sum over a set of observations.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct WindowStats {
    total: u64,
    up: u64,
    up_latency_sum: f64,
}

impl WindowStats {
    fn collect<'a>(observations: impl IntoIterator<Item = &'a Observation>) -> Self {
        observations.into_iter().fold(Self::default(), |mut stats, observation| {
            stats.total += 1;
            if observation.reachable {
                stats.up += 1;
                stats.up_latency_sum += observation.latency_ms;
            }
            stats
        })
    }

    fn uptime_percentage(&self) -> f64 {
        if self.total == 0 { 0.0 } else { self.up as f64 * 100.0 / self.total as f64 }
    }

    // DOWN observations carry no latency and would drag the mean towards zero
    fn average_response_time(&self) -> f64 {
        if self.up == 0 { 0.0 } else { self.up_latency_sum / self.up as f64 }
    }
}

/// Start of a window ending at `now`, clamped for windows reaching before the representable range.
///
/// Rounded up to a whole microsecond so the stored bound never reaches before the window.
fn window_start(now: DateTime<Utc>, window_days: u32) -> DateTime<Utc> {
    let start = Duration::try_days(i64::from(window_days))
        .and_then(|span| now.checked_sub_signed(span))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);

    let truncated = start.trunc_subsecs(6);
    if truncated < start {
        truncated.checked_add_signed(Duration::microseconds(1)).unwrap_or(truncated)
    } else {
        start
    }
}

/// Computes metrics from stored observations. Nothing is cached.
pub struct MetricsAggregator {
    store: Arc<dyn RecordStore>,
}

impl MetricsAggregator {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Metrics over `[now - window_days, now]`
    pub async fn compute_metrics(&self, target_id: i64, window_days: u32) -> Result<UrlMetrics, StoreError> {
        self.compute_metrics_at(target_id, window_days, Utc::now()).await
    }

    /// Metrics over `[now - window_days, now]` for an explicit `now`.
    ///
    /// An empty window yields zeroed metrics rather than an error; only an
    /// unknown target fails.
    pub async fn compute_metrics_at(
        &self,
        target_id: i64,
        window_days: u32,
        now: DateTime<Utc>,
    ) -> Result<UrlMetrics, StoreError> {
        let target = self.store.get_target(target_id).await?;
        let start = window_start(now, window_days);

        let observations = self.store.list_observations_in_range(target_id, start, now).await?;
        let stats = WindowStats::collect(&observations);

        Ok(UrlMetrics {
            url: target.url,
            total_checks: stats.total,
            uptime_percentage: stats.uptime_percentage(),
            average_response_time: stats.average_response_time(),
            time_period_days: window_days,
        })
    }
}
