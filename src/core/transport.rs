//! HTTP transport for the OSM API
//!
//! Wraps a tuned `reqwest` client with a connection limit, a per-attempt
//! timeout, retry with exponential backoff, and an in-memory response cache
//! that lives as long as the transport (one run).

use std::collections::HashMap;
use std::time::Duration;

use bytes::Bytes;
use log::{debug, warn};
use parking_lot::Mutex;
use reqwest::{Client, ClientBuilder, StatusCode};
use tokio::sync::Semaphore;

use crate::core::error::{Error, FetchError, Result};
use crate::core::source::SourceConfig;

/// Execute an operation with retry logic for network errors and timeouts
async fn retry_on_network_error<F, Fut, T>(
    retries: u32,
    base_delay: Duration,
    operation: F,
) -> std::result::Result<T, FetchError>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = std::result::Result<T, FetchError>>,
{
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if e.is_retryable() && attempt < retries => {
                attempt += 1;
                let delay = backoff_delay(base_delay, attempt);
                warn!("{e} (attempt {attempt}), retrying in {delay:?}");
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Exponential backoff before retry `attempt` (1-based), saturating on overflow
fn backoff_delay(base_delay: Duration, attempt: u32) -> Duration {
    let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
    base_delay.saturating_mul(factor)
}

/// Caching, retrying HTTP transport
pub struct HttpTransport {
    client: Client,
    config: SourceConfig,
    connections: Semaphore,
    cache: Mutex<HashMap<String, Bytes>>,
}

impl HttpTransport {
    /// Create a transport for the given API configuration
    pub fn new(config: SourceConfig) -> Result<Self> {
        config.validate()?;

        let client = ClientBuilder::new()
            .tcp_keepalive(Duration::from_secs(60))
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(config.max_connections)
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::InvalidInput(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            connections: Semaphore::new(config.max_connections),
            config,
            cache: Mutex::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    /// Fetch a URL, answering from the cache when possible
    pub async fn get(&self, url: &str) -> std::result::Result<Bytes, FetchError> {
        self.get_with_timeout(url, self.config.request_timeout).await
    }

    /// Like [`get`](Self::get), bounding each attempt by `attempt_timeout`
    ///
    /// The bound starts once a connection permit is held, so queueing behind
    /// other requests never counts against it. Timed out attempts are retried.
    pub async fn get_with_timeout(
        &self,
        url: &str,
        attempt_timeout: Duration,
    ) -> std::result::Result<Bytes, FetchError> {
        if let Some(body) = self.cache.lock().get(url) {
            debug!("cache hit for {url}");
            return Ok(body.clone());
        }

        let body = retry_on_network_error(self.config.retries, self.config.retry_base_delay, || {
            self.get_once(url, attempt_timeout)
        })
        .await?;

        if self.config.cache_responses {
            self.cache.lock().insert(url.to_string(), body.clone());
        }
        Ok(body)
    }

    /// Number of responses currently held in the cache
    pub fn cached_responses(&self) -> usize {
        self.cache.lock().len()
    }

    async fn get_once(
        &self,
        url: &str,
        attempt_timeout: Duration,
    ) -> std::result::Result<Bytes, FetchError> {
        let _permit = self
            .connections
            .acquire()
            .await
            .map_err(|_| FetchError::Transport("connection pool closed".to_string()))?;

        let attempt = async {
            let response = self.client.get(url).send().await?;
            let status = response.status();

            if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
                return Err(FetchError::NotFound(url.to_string()));
            }
            if !status.is_success() {
                return Err(FetchError::Transport(format!("HTTP {status} for {url}")));
            }

            Ok::<Bytes, FetchError>(response.bytes().await?)
        };

        tokio::time::timeout(attempt_timeout, attempt)
            .await
            .map_err(|_| FetchError::Timeout(url.to_string()))?
    }
}
