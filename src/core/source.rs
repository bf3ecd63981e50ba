//! Upstream API configuration for osm2routes
//!
//! Maps entity references onto OSM API 0.6 URLs and holds the transport
//! settings used to reach them.

use std::time::Duration;

use crate::core::entity::EntityKind;
use crate::core::error::{Error, Result};

/// Upper limit for `SourceConfig::retries`
pub const MAX_RETRIES: u32 = 10;

/// Configuration for the upstream OSM API
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Base URL of the API, without trailing slash
    pub api_base_url: String,

    /// User agent sent with every request
    pub user_agent: String,

    /// Timeout for a single HTTP attempt
    pub request_timeout: Duration,

    /// Timeout for establishing a connection
    pub connect_timeout: Duration,

    /// Maximum number of concurrent requests to the API
    pub max_connections: usize,

    /// Retry attempts for network errors and timeouts
    pub retries: u32,

    /// Base delay for exponential backoff between retries
    pub retry_base_delay: Duration,

    /// Keep successful responses in memory for the rest of the run
    pub cache_responses: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://www.openstreetmap.org/api/0.6".to_string(),
            user_agent: format!("osm2routes/{}", env!("OSM2ROUTES_VERSION")),
            request_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(10),
            max_connections: 5,
            retries: 3,
            retry_base_delay: Duration::from_millis(1000),
            cache_responses: true,
        }
    }
}

impl SourceConfig {
    /// Configuration pointing at another API endpoint (mirror or mock server)
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            api_base_url: base_url.trim_end_matches('/').to_string(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_connections == 0 {
            return Err(Error::InvalidInput("max_connections must be at least 1".to_string()));
        }
        if self.retries > MAX_RETRIES {
            return Err(Error::InvalidInput(format!(
                "retries must be at most {MAX_RETRIES}, got {}",
                self.retries
            )));
        }
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://") {
            return Err(Error::InvalidInput(format!(
                "API URL must be http(s): {}",
                self.api_base_url
            )));
        }
        Ok(())
    }
}

/// Resolves an entity reference to its API URL
pub fn entity_url(config: &SourceConfig, kind: EntityKind, id: u64) -> String {
    format!("{}/{}/{}", config.api_base_url, kind, id)
}
