use std::sync::Arc;

use urlwatch_service::database::RecordStore;
use urlwatch_service::monitoring::{Dispatcher, MetricsAggregator, Prober};

/// Shared handles for the request handlers
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub dispatcher: Dispatcher,
    pub metrics: MetricsAggregator,
}

impl AppState {
    pub fn new(
        store: Arc<dyn RecordStore>,
        prober: Arc<dyn Prober>,
        max_concurrency: Option<usize>,
    ) -> Self {
        Self {
            dispatcher: Dispatcher::new(prober, Arc::clone(&store)).with_max_concurrency(max_concurrency),
            metrics: MetricsAggregator::new(Arc::clone(&store)),
            store,
        }
    }
}
