//! Entity fetching: transport + normalization for one node, way or relation
//!
//! `fetch_timeout` bounds every network attempt of a fetch, not the time spent
//! waiting for a connection.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use log::debug;
use parking_lot::Mutex;

use crate::core::entity::{Entity, EntityKind, Node, Relation, Way};
use crate::core::error::FetchError;
use crate::core::normalize::normalize_str;
use crate::core::source::entity_url;
use crate::core::transport::HttpTransport;

/// Fetches single entities by kind and id
pub struct EntityFetcher {
    transport: HttpTransport,
    fetch_timeout: Duration,
    member_cache: Option<Mutex<HashMap<(EntityKind, u64), Entity>>>,
    fetches: AtomicU64,
}

impl EntityFetcher {
    /// Create a fetcher; `share_member_cache` memoizes nodes and ways for the run
    pub fn new(transport: HttpTransport, fetch_timeout: Duration, share_member_cache: bool) -> Self {
        Self {
            transport,
            fetch_timeout,
            member_cache: share_member_cache.then(|| Mutex::new(HashMap::new())),
            fetches: AtomicU64::new(0),
        }
    }

    /// Number of entity fetches that went to the transport
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::Relaxed)
    }

    pub async fn fetch(&self, kind: EntityKind, id: u64) -> Result<Entity, FetchError> {
        let memoize = kind != EntityKind::Relation;
        if memoize {
            if let Some(cache) = &self.member_cache {
                if let Some(entity) = cache.lock().get(&(kind, id)) {
                    return Ok(entity.clone());
                }
            }
        }

        let url = entity_url(self.transport.config(), kind, id);
        self.fetches.fetch_add(1, Ordering::Relaxed);

        let body = self.transport.get_with_timeout(&url, self.fetch_timeout).await?;

        let text = std::str::from_utf8(&body)
            .map_err(|e| FetchError::Malformed(format!("{url} is not UTF-8: {e}")))?;
        let entity = normalize_str(text)?;

        if entity.kind() != kind || entity.id() != id {
            return Err(FetchError::Malformed(format!(
                "requested {kind} {id}, got {} {}",
                entity.kind(),
                entity.id()
            )));
        }
        debug!("got {kind} {id}");

        if memoize {
            if let Some(cache) = &self.member_cache {
                cache.lock().insert((kind, id), entity.clone());
            }
        }
        Ok(entity)
    }

    pub async fn fetch_node(&self, id: u64) -> Result<Node, FetchError> {
        match self.fetch(EntityKind::Node, id).await? {
            Entity::Node(node) => Ok(node),
            other => Err(unexpected(EntityKind::Node, &other)),
        }
    }

    pub async fn fetch_way(&self, id: u64) -> Result<Way, FetchError> {
        match self.fetch(EntityKind::Way, id).await? {
            Entity::Way(way) => Ok(way),
            other => Err(unexpected(EntityKind::Way, &other)),
        }
    }

    pub async fn fetch_relation(&self, id: u64) -> Result<Relation, FetchError> {
        match self.fetch(EntityKind::Relation, id).await? {
            Entity::Relation(relation) => Ok(relation),
            other => Err(unexpected(EntityKind::Relation, &other)),
        }
    }
}

fn unexpected(expected: EntityKind, got: &Entity) -> FetchError {
    FetchError::Malformed(format!("expected {expected}, got {} {}", got.kind(), got.id()))
}
