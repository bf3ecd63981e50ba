//! Route materialization: fetch the ways and stops a route references

use std::collections::BTreeMap;
use std::future::Future;

use futures::StreamExt;
use log::{debug, warn};

use crate::core::entity::{EntityKind, Member, Node, Relation};
use crate::core::error::{Context, Error, Result};
use crate::core::fetcher::EntityFetcher;
use crate::core::options::ResolveOptions;
use crate::core::relation::{Route, RunContext};
use crate::core::way::{resolve_way, ResolvedWay};

/// A member node of a route (stop, platform, ...) with its role
#[derive(Debug, Clone, PartialEq)]
pub struct Stop {
    pub node: Node,
    pub role: String,
}

/// A route with its member ways and stops resolved, in member order
#[derive(Debug, Clone, PartialEq)]
pub struct MaterializedRoute {
    pub relation: Relation,
    pub parent: u64,
    /// Never empty
    pub ways: Vec<ResolvedWay>,
    pub stops: Vec<Stop>,
}

impl MaterializedRoute {
    pub fn id(&self) -> u64 {
        self.relation.id
    }

    /// Stops grouped by role, each group in member order
    pub fn stops_by_role(&self) -> BTreeMap<&str, Vec<&Stop>> {
        let mut groups: BTreeMap<&str, Vec<&Stop>> = BTreeMap::new();
        for stop in &self.stops {
            groups.entry(stop.role.as_str()).or_default().push(stop);
        }
        groups
    }
}

/// Run `fetch` for every member, `concurrency` at a time, keeping member order
/// and dropping members that produced nothing.
async fn fetch_members<'a, T, F, Fut>(members: &'a [Member], concurrency: usize, fetch: F) -> Vec<T>
where
    F: Fn(&'a Member) -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let mut slots: Vec<Option<T>> = (0..members.len()).map(|_| None).collect();

    let stream = futures::stream::iter(members.iter().enumerate())
        .map(|(idx, member)| {
            let fut = fetch(member);
            async move { (idx, fut.await) }
        })
        .buffer_unordered(concurrency.max(1));

    tokio::pin!(stream);

    while let Some((idx, value)) = stream.next().await {
        slots[idx] = value;
    }

    slots.into_iter().flatten().collect()
}

/// Fetch and resolve the member ways and stops of `route`
///
/// Members that fail are recorded in `ctx` and left out. The route itself
/// fails only when none of its ways could be resolved.
pub async fn materialize_route(
    fetcher: &EntityFetcher,
    route: Route,
    options: &ResolveOptions,
    ctx: &RunContext,
) -> Result<MaterializedRoute> {
    let route_id = route.relation.id;
    let way_members: Vec<Member> = route.relation.members_of(EntityKind::Way).cloned().collect();
    let node_members: Vec<Member> = route.relation.members_of(EntityKind::Node).cloned().collect();

    let ways = fetch_members(&way_members, options.way_concurrency, |member| async move {
        let context = Context::Member { kind: EntityKind::Way, id: member.id, route: route_id };
        let way = match fetcher.fetch_way(member.id).await {
            Ok(way) => way,
            Err(e) => {
                debug!("could not fetch way {} for route {route_id}: {e}", member.id);
                ctx.record(context, e);
                return None;
            }
        };
        match resolve_way(fetcher, way, member.role.clone(), options.node_concurrency).await {
            Ok(resolved) => Some(resolved),
            Err(failure) => {
                debug!(
                    "could not fetch node {} for way {}: {}",
                    failure.node_id, member.id, failure.error
                );
                ctx.record(
                    context,
                    Error::PartialFailure(format!("node {}: {}", failure.node_id, failure.error)),
                );
                None
            }
        }
    });

    let stops = fetch_members(&node_members, options.way_concurrency, |member| async move {
        match fetcher.fetch_node(member.id).await {
            Ok(node) => Some(Stop { node, role: member.role.clone() }),
            Err(e) => {
                debug!("could not fetch node {} for route {route_id}: {e}", member.id);
                ctx.record(
                    Context::Member { kind: EntityKind::Node, id: member.id, route: route_id },
                    e,
                );
                None
            }
        }
    });

    let (ways, stops) = futures::join!(ways, stops);

    if ways.is_empty() {
        warn!("none of the {} ways of route {route_id} could be resolved", way_members.len());
        return Err(Error::PartialFailure(format!(
            "none of the {} ways of route {route_id} could be resolved",
            way_members.len()
        )));
    }
    if ways.len() < way_members.len() {
        warn!(
            "route {route_id}: resolved {} of {} ways",
            ways.len(),
            way_members.len()
        );
    }

    Ok(MaterializedRoute {
        relation: route.relation,
        parent: route.parent,
        ways,
        stops,
    })
}
