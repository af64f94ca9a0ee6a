use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::{SubsecRound, Utc};
use tracing::{debug, warn};

use super::types::{ProbeFailure, ProbeResult};
use crate::config::ProbeConfig;

/// Issues one probe against a URL.
#[async_trait::async_trait]
pub trait Prober: Send + Sync {
    /// Probe `url`. Never fails: transport errors come back as DOWN results.
    async fn probe(&self, url: &str) -> ProbeResult;
}

/// HTTP GET prober
pub struct HttpProber {
    client: reqwest::Client,
}

impl HttpProber {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        Ok(Self { client })
    }

    pub fn from_config(config: &ProbeConfig) -> Result<Self> {
        Self::new(config.timeout(), &config.user_agent)
    }
}

fn classify_error(error: &reqwest::Error) -> ProbeFailure {
    // Connect timeouts report both flags; count them as timeouts.
    if error.is_timeout() {
        ProbeFailure::Timeout
    } else if error.is_connect() {
        ProbeFailure::Connect
    } else {
        ProbeFailure::Other
    }
}

#[async_trait::async_trait]
impl Prober for HttpProber {
    async fn probe(&self, url: &str) -> ProbeResult {
        let start = Instant::now();
        let outcome = self.client.get(url).send().await;
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        // Stored timestamps have microsecond precision
        let checked_at = Utc::now().trunc_subsecs(6);

        match outcome {
            Ok(response) => {
                let status_code = response.status().as_u16();
                let result = ProbeResult::responded(url.to_string(), elapsed_ms, status_code, checked_at);
                debug!(url, status_code, latency_ms = elapsed_ms, status = %result.status, "probe finished");
                result
            }
            Err(error) => {
                let failure = classify_error(&error);
                warn!(url, %failure, "probe failed: {error}");
                ProbeResult::failed(url.to_string(), failure, checked_at)
            }
        }
    }
}
