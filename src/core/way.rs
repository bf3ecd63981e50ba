//! Way resolution: turn a way's node references into coordinates

use futures::StreamExt;
use log::debug;

use crate::core::entity::{Coord, Way};
use crate::core::error::FetchError;
use crate::core::fetcher::EntityFetcher;

/// A way with its coordinates, annotated with the role it holds in a route
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedWay {
    pub way: Way,
    pub role: String,
    /// Same length and order as `way.node_ids`
    pub coordinates: Vec<Coord>,
}

/// A node that could not be fetched for a way
#[derive(Debug, Clone, PartialEq)]
pub struct WayFailure {
    pub node_id: u64,
    pub error: FetchError,
}

/// Fetch every node of `way`, at most `concurrency` at a time
///
/// Any missing node fails the whole way. All node fetches are still driven to
/// completion, the first failure in node order is reported.
pub async fn resolve_way(
    fetcher: &EntityFetcher,
    way: Way,
    role: String,
    concurrency: usize,
) -> Result<ResolvedWay, WayFailure> {
    let mut slots: Vec<Option<Result<Coord, FetchError>>> = vec![None; way.node_ids.len()];

    {
        let stream = futures::stream::iter(way.node_ids.iter().copied().enumerate())
            .map(|(idx, node_id)| async move {
                let coords = fetcher.fetch_node(node_id).await.map(|node| node.coords);
                (idx, coords)
            })
            .buffer_unordered(concurrency.max(1));

        tokio::pin!(stream);

        // Write back by position, completion order is arbitrary
        while let Some((idx, coords)) = stream.next().await {
            slots[idx] = Some(coords);
        }
    }

    let mut coordinates = Vec::with_capacity(slots.len());
    for (slot, &node_id) in slots.into_iter().zip(&way.node_ids) {
        match slot {
            Some(Ok(coords)) => coordinates.push(coords),
            Some(Err(error)) => return Err(WayFailure { node_id, error }),
            None => {
                return Err(WayFailure {
                    node_id,
                    error: FetchError::Transport("node fetch never completed".to_string()),
                })
            }
        }
    }

    debug!("resolved way {} with {} nodes", way.id, coordinates.len());
    Ok(ResolvedWay { way, role, coordinates })
}
