//! Run options for osm2routes
//!
//! Fan-out ceilings for each stage of the pipeline plus an optional progress
//! callback.

use std::sync::Arc;
use std::time::Duration;

use crate::core::error::{Error, Result};

/// Progress callback function type, receives (materialized_routes, total_routes)
pub type ProgressCallback = Arc<dyn Fn(u64, u64) + Send + Sync>;

/// Options for a resolution run
#[derive(Clone)]
pub struct ResolveOptions {
    /// Relations resolved at once, also routes materialized at once
    pub relation_concurrency: usize,

    /// Ways (and stops) fetched at once within one route
    pub way_concurrency: usize,

    /// Nodes fetched at once within one way
    pub node_concurrency: usize,

    /// Upper bound for one network attempt of an entity fetch
    pub fetch_timeout: Duration,

    /// Memoize node and way entities across ways and routes
    pub share_member_cache: bool,

    /// Optional progress callback
    pub progress: Option<ProgressCallback>,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            relation_concurrency: 10,
            way_concurrency: 1,
            node_concurrency: 3,
            fetch_timeout: Duration::from_secs(10),
            share_member_cache: false,
            progress: None,
        }
    }
}

impl std::fmt::Debug for ResolveOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolveOptions")
            .field("relation_concurrency", &self.relation_concurrency)
            .field("way_concurrency", &self.way_concurrency)
            .field("node_concurrency", &self.node_concurrency)
            .field("fetch_timeout", &self.fetch_timeout)
            .field("share_member_cache", &self.share_member_cache)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl ResolveOptions {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("relation_concurrency", self.relation_concurrency),
            ("way_concurrency", self.way_concurrency),
            ("node_concurrency", self.node_concurrency),
        ] {
            if value == 0 {
                return Err(Error::InvalidInput(format!("{name} must be at least 1")));
            }
        }
        if self.fetch_timeout.is_zero() {
            return Err(Error::InvalidInput("fetch_timeout must be positive".to_string()));
        }
        Ok(())
    }

    pub(crate) fn report_progress(&self, done: u64, total: u64) {
        if let Some(ref progress) = self.progress {
            progress(done, total);
        }
    }
}
