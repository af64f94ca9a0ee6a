use std::sync::Arc;

use futures::{StreamExt, future::join_all, stream};
use tracing::{debug, error, info};

use super::prober::Prober;
use super::types::{CheckRecord, ProbeResult, StoredCheck};
use crate::database::RecordStore;
use crate::error::StoreError;

/// Dispatcher - probes batches of URLs concurrently and records the results
pub struct Dispatcher {
    prober: Arc<dyn Prober>,
    store: Arc<dyn RecordStore>,
    max_concurrency: Option<usize>,
}

impl Dispatcher {
    /// Create a dispatcher with unbounded fan-out
    pub fn new(prober: Arc<dyn Prober>, store: Arc<dyn RecordStore>) -> Self {
        Self { prober, store, max_concurrency: None }
    }

    /// Cap the number of probes in flight per batch. `None` removes the cap.
    pub fn with_max_concurrency(mut self, limit: Option<usize>) -> Self {
        self.max_concurrency = limit.map(|limit| limit.max(1));
        self
    }

    /// Probe every URL, then persist each result in input order.
    ///
    /// Returns one record per input URL, duplicates included. A failed write
    /// is reported on its record and does not stop the remaining writes.
    pub async fn check_urls(&self, urls: &[String]) -> Vec<CheckRecord> {
        if urls.is_empty() {
            debug!("empty batch, nothing to probe");
            return Vec::new();
        }

        let results = self.probe_all(urls).await;

        let mut records = Vec::with_capacity(results.len());
        for result in results {
            let persistence = self.persist(&result).await;
            if let Err(e) = &persistence {
                error!(url = %result.url, "failed to store check result: {e}");
            }
            records.push(CheckRecord { result, persistence });
        }

        let stored = records.iter().filter(|record| record.is_persisted()).count();
        info!(checked = records.len(), stored, "batch check finished");

        records
    }

    /// Probe every URL concurrently; results come back in input order
    pub async fn probe_all(&self, urls: &[String]) -> Vec<ProbeResult> {
        let probes = urls.iter().map(|url| self.prober.probe(url));

        match self.max_concurrency {
            None => join_all(probes).await,
            Some(limit) => stream::iter(probes).buffered(limit).collect().await,
        }
    }

    async fn persist(&self, result: &ProbeResult) -> Result<StoredCheck, StoreError> {
        let target = self.store.get_or_create_target(&result.url).await?;
        let observation = self.store.append_observation(&result.to_observation(target.id)).await?;
        Ok(StoredCheck { target_id: target.id, observation })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_support::create_test_store;
    use crate::database::{NewObservation, Observation, Target};
    use crate::monitoring::types::{ProbeFailure, ProbeStatus};
    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Answers from the URL itself: `.../up`, `.../down` or `.../fail`.
    /// Tracks how many probes run at once.
    #[derive(Default)]
    struct ScriptedProber {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Prober for ScriptedProber {
        async fn probe(&self, url: &str) -> ProbeResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            // Later URLs finish first, so completion order differs from input order
            let delay = 40u64.saturating_sub(url.len() as u64 % 40);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let checked_at = Utc::now();
            if url.ends_with("/up") {
                ProbeResult::responded(url.to_string(), 12.5, 200, checked_at)
            } else if url.ends_with("/down") {
                ProbeResult::responded(url.to_string(), 30.0, 500, checked_at)
            } else {
                ProbeResult::failed(url.to_string(), ProbeFailure::Connect, checked_at)
            }
        }
    }

    /// Delegates to a real store but refuses targets whose URL contains `reject`
    struct RejectingStore<S> {
        inner: S,
    }

    #[async_trait]
    impl<S: RecordStore> RecordStore for RejectingStore<S> {
        async fn get_or_create_target(&self, url: &str) -> Result<Target, StoreError> {
            if url.contains("reject") {
                return Err(StoreError::InvalidRow(format!("refusing {url}")));
            }
            self.inner.get_or_create_target(url).await
        }

        async fn get_target(&self, id: i64) -> Result<Target, StoreError> {
            self.inner.get_target(id).await
        }

        async fn append_observation(&self, observation: &NewObservation) -> Result<Observation, StoreError> {
            self.inner.append_observation(observation).await
        }

        async fn list_targets(&self) -> Result<Vec<Target>, StoreError> {
            self.inner.list_targets().await
        }

        async fn list_observations(&self, target_id: i64) -> Result<Vec<Observation>, StoreError> {
            self.inner.list_observations(target_id).await
        }

        async fn list_observations_in_range(
            &self,
            target_id: i64,
            start: DateTime<Utc>,
            end: DateTime<Utc>,
        ) -> Result<Vec<Observation>, StoreError> {
            self.inner.list_observations_in_range(target_id, start, end).await
        }
    }

    fn urls(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_empty_batch_probes_nothing() -> Result<()> {
        let (store, _dir) = create_test_store().await?;
        let prober = Arc::new(ScriptedProber::default());
        let dispatcher = Dispatcher::new(prober.clone(), Arc::new(store));

        assert!(dispatcher.check_urls(&[]).await.is_empty());
        assert_eq!(prober.calls.load(Ordering::SeqCst), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_results_follow_input_order_with_duplicates() -> Result<()> {
        let (store, _dir) = create_test_store().await?;
        let store = Arc::new(store);
        let prober = Arc::new(ScriptedProber::default());
        let dispatcher = Dispatcher::new(prober.clone(), store.clone());
        let batch = urls(&["https://a.test/up", "https://bb.test/fail", "https://a.test/up", "https://ccc.test/down"]);

        let records = dispatcher.check_urls(&batch).await;

        let returned: Vec<_> = records.iter().map(|r| r.result.url.clone()).collect();
        assert_eq!(returned, batch);
        let statuses: Vec<_> = records.iter().map(|r| r.result.status).collect();
        assert_eq!(statuses, [ProbeStatus::Up, ProbeStatus::Down, ProbeStatus::Up, ProbeStatus::Down]);
        assert!(records.iter().all(CheckRecord::is_persisted));
        assert_eq!(prober.calls.load(Ordering::SeqCst), 4);
        assert!(prober.peak.load(Ordering::SeqCst) > 1);

        // The duplicate shares one target and adds a second observation
        let targets = store.list_targets().await?;
        assert_eq!(targets.len(), 3);
        let first = targets.iter().find(|t| t.url == "https://a.test/up").unwrap();
        assert_eq!(store.list_observations(first.id).await?.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_probe_is_stored_as_down() -> Result<()> {
        let (store, _dir) = create_test_store().await?;
        let store = Arc::new(store);
        let dispatcher = Dispatcher::new(Arc::new(ScriptedProber::default()), store.clone());

        let records = dispatcher.check_urls(&urls(&["https://gone.test/fail"])).await;

        let stored = records[0].persistence.as_ref().unwrap();
        assert!(!stored.observation.reachable);
        assert_eq!(stored.observation.latency_ms, 0.0);
        assert_eq!(stored.observation.status_code, None);
        assert_eq!(records[0].result.response_time, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrency_cap_is_respected() -> Result<()> {
        let (store, _dir) = create_test_store().await?;
        let prober = Arc::new(ScriptedProber::default());
        let dispatcher =
            Dispatcher::new(prober.clone(), Arc::new(store)).with_max_concurrency(Some(2));
        let batch: Vec<String> = (0..8).map(|i| format!("https://{}.test/up", "x".repeat(i + 1))).collect();

        let results = dispatcher.probe_all(&batch).await;

        let returned: Vec<_> = results.into_iter().map(|r| r.url).collect();
        assert_eq!(returned, batch);
        assert!(prober.peak.load(Ordering::SeqCst) <= 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_store_failure_keeps_result_and_later_writes() -> Result<()> {
        let (store, _dir) = create_test_store().await?;
        let store = Arc::new(RejectingStore { inner: store });
        let dispatcher = Dispatcher::new(Arc::new(ScriptedProber::default()), store.clone());
        let batch = urls(&["https://reject.test/up", "https://ok.test/up"]);

        let records = dispatcher.check_urls(&batch).await;

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].result.status, ProbeStatus::Up);
        assert!(matches!(records[0].persistence, Err(StoreError::InvalidRow(_))));
        assert!(records[1].is_persisted());

        let targets = store.list_targets().await?;
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].url, "https://ok.test/up");
        Ok(())
    }

    #[tokio::test]
    async fn test_overlapping_batches_share_new_target() -> Result<()> {
        let (store, _dir) = create_test_store().await?;
        let store = Arc::new(store);
        let dispatcher = Arc::new(Dispatcher::new(Arc::new(ScriptedProber::default()), store.clone()));
        let batch = urls(&["https://fresh.test/up"]);

        let (left, right) = tokio::join!(dispatcher.check_urls(&batch), dispatcher.check_urls(&batch));

        assert!(left[0].is_persisted() && right[0].is_persisted());
        let targets = store.list_targets().await?;
        assert_eq!(targets.len(), 1);
        assert_eq!(store.list_observations(targets[0].id).await?.len(), 2);
        Ok(())
    }
}
