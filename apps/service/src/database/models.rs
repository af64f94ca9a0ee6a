use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// A monitored URL. Created on first probe, never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub id: i64,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

/// One stored probe outcome.
///
/// Field names follow the public history payload: `status` is the
/// reachability flag and `url_id` the owning target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub id: i64,
    #[serde(rename = "url_id")]
    pub target_id: i64,
    #[serde(rename = "status")]
    pub reachable: bool,
    /// Milliseconds; 0 when the probe got no response.
    #[serde(rename = "response_time")]
    pub latency_ms: f64,
    pub status_code: Option<u16>,
    pub checked_at: DateTime<Utc>,
}

/// Observation about to be appended.
#[derive(Debug, Clone, PartialEq)]
pub struct NewObservation {
    pub target_id: i64,
    pub reachable: bool,
    pub latency_ms: f64,
    pub status_code: Option<u16>,
    pub checked_at: DateTime<Utc>,
}

/// Convert a timestamp into the stored representation (microseconds since epoch)
pub fn timestamp_to_i64(time: DateTime<Utc>) -> i64 {
    time.timestamp_micros()
}

/// Convert a stored timestamp back into a `DateTime`
pub fn i64_to_timestamp(micros: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::from_timestamp_micros(micros)
        .ok_or_else(|| StoreError::InvalidRow(format!("timestamp out of range: {micros}")))
}
