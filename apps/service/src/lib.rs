//! urlwatch service - on-demand URL health checks with stored history
//!
//! The [`monitoring::Dispatcher`] probes batches of URLs and records every
//! outcome in a [`database::RecordStore`]; the [`monitoring::MetricsAggregator`]
//! turns the stored history into uptime and latency figures.

pub mod config;
pub mod database;
pub mod error;
pub mod monitoring;
pub mod pool;

pub use config::Config;
pub use error::StoreError;
