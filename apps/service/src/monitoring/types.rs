use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::database::{NewObservation, Observation};
use crate::error::StoreError;

/// Reachability of a probed URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProbeStatus {
    Up,
    Down,
}

impl ProbeStatus {
    /// UP iff a response arrived with a status code below 400
    pub fn classify(status_code: Option<u16>) -> Self {
        match status_code {
            Some(code) if code < 400 => ProbeStatus::Up,
            _ => ProbeStatus::Down,
        }
    }

    pub fn is_up(self) -> bool {
        self == ProbeStatus::Up
    }
}

impl std::fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeStatus::Up => write!(f, "UP"),
            ProbeStatus::Down => write!(f, "DOWN"),
        }
    }
}

/// Why a probe got no response at all
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeFailure {
    /// DNS failure, refused connection, TLS handshake and the like
    Connect,
    Timeout,
    Other,
}

impl std::fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeFailure::Connect => write!(f, "connection error"),
            ProbeFailure::Timeout => write!(f, "timeout"),
            ProbeFailure::Other => write!(f, "request error"),
        }
    }
}

/// Result of a single probe
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeResult {
    /// URL exactly as requested
    pub url: String,

    pub status: ProbeStatus,

    /// Milliseconds until response headers arrived; `None` without a response
    pub response_time: Option<f64>,

    /// HTTP status code; `None` without a response
    pub status_code: Option<u16>,

    /// When the attempt finished
    pub checked_at: DateTime<Utc>,

    /// Transport failure class, kept off the wire
    #[serde(skip)]
    pub failure: Option<ProbeFailure>,
}

impl ProbeResult {
    /// A response was received
    pub fn responded(url: String, response_time: f64, status_code: u16, checked_at: DateTime<Utc>) -> Self {
        Self {
            url,
            status: ProbeStatus::classify(Some(status_code)),
            response_time: Some(response_time),
            status_code: Some(status_code),
            checked_at,
            failure: None,
        }
    }

    /// The request never produced a response
    pub fn failed(url: String, failure: ProbeFailure, checked_at: DateTime<Utc>) -> Self {
        Self {
            url,
            status: ProbeStatus::Down,
            response_time: None,
            status_code: None,
            checked_at,
            failure: Some(failure),
        }
    }

    /// Observation row for this result. Missing latency is stored as 0.
    pub fn to_observation(&self, target_id: i64) -> NewObservation {
        NewObservation {
            target_id,
            reachable: self.status.is_up(),
            latency_ms: self.response_time.unwrap_or(0.0),
            status_code: self.status_code,
            checked_at: self.checked_at,
        }
    }
}

/// Where a probe result ended up in the store
#[derive(Debug, Clone, PartialEq)]
pub struct StoredCheck {
    pub target_id: i64,
    pub observation: Observation,
}

/// A probe result paired with the outcome of persisting it
#[derive(Debug)]
pub struct CheckRecord {
    pub result: ProbeResult,
    pub persistence: Result<StoredCheck, StoreError>,
}

impl CheckRecord {
    pub fn is_persisted(&self) -> bool {
        self.persistence.is_ok()
    }
}
