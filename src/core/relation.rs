//! Relation resolution: walk the relation forest down to terminal routes
//!
//! Relations are resolved from an explicit work queue with a bounded number of
//! fetches in flight. A run-scoped visited set guarantees that every relation
//! is fetched at most once, which also makes cyclic data terminate.

use std::collections::{HashSet, VecDeque};

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use log::{debug, info, warn};
use parking_lot::Mutex;

use crate::core::entity::{EntityKind, Relation};
use crate::core::error::{Context, Diagnostic, Error, FetchError, Result};
use crate::core::fetcher::EntityFetcher;

/// Relation types worth descending into
const ROUTE_TYPES: [&str; 3] = ["route", "network", "route_master"];

/// A terminal relation: it references ways directly
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub relation: Relation,
    /// Relation that referenced this one, 0 for roots
    pub parent: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IgnoreReason {
    MissingType,
    UnsupportedType(String),
}

/// What to do with a fetched relation
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// Has way members: a route, stop descending here
    Terminal,
    /// Aggregate of sub-relations, resolve these ids next
    Recursing(Vec<u64>),
    Ignored(IgnoreReason),
    /// Neither way nor relation members
    Failed,
}

/// Classify a relation by its `type` tag and member kinds
///
/// Way members win over relation members: there is no consistent way to tell
/// route from route_master in the data, so ways are the leaf signal.
pub fn classify(relation: &Relation) -> Classification {
    let relation_type = match relation.tags.get("type") {
        Some(t) => t,
        None => return Classification::Ignored(IgnoreReason::MissingType),
    };
    if !ROUTE_TYPES.contains(&relation_type.as_str()) {
        return Classification::Ignored(IgnoreReason::UnsupportedType(relation_type.clone()));
    }

    if relation.has_members_of(EntityKind::Way) {
        return Classification::Terminal;
    }

    let children: Vec<u64> = relation.members_of(EntityKind::Relation).map(|m| m.id).collect();
    if !children.is_empty() {
        return Classification::Recursing(children);
    }

    Classification::Failed
}

/// State shared by every task of one run
#[derive(Default)]
pub struct RunContext {
    visited: Mutex<HashSet<u64>>,
    routes: Mutex<Vec<Route>>,
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test-and-insert; true when the relation had not been seen yet
    pub fn mark_visited(&self, id: u64) -> bool {
        self.visited.lock().insert(id)
    }

    pub fn visited_count(&self) -> usize {
        self.visited.lock().len()
    }

    pub fn push_route(&self, route: Route) {
        self.routes.lock().push(route);
    }

    pub fn take_routes(&self) -> Vec<Route> {
        std::mem::take(&mut *self.routes.lock())
    }

    /// Record a non-fatal failure
    pub fn record(&self, context: Context, error: impl Into<Error>) {
        self.diagnostics.lock().push(Diagnostic {
            context,
            error: error.into(),
        });
    }

    pub fn diagnostic_count(&self) -> usize {
        self.diagnostics.lock().len()
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics.into_inner()
    }
}

/// Result of one relation task
struct Step {
    id: u64,
    parent: u64,
    /// True only for the step that fetched the relation
    fetched: bool,
    children: Vec<u64>,
}

async fn resolve_relation(fetcher: &EntityFetcher, ctx: &RunContext, id: u64, parent: u64) -> Step {
    let mut step = Step {
        id,
        parent,
        fetched: false,
        children: Vec::new(),
    };

    if !ctx.mark_visited(id) {
        debug!("already fetched relation {id}");
        return step;
    }

    let relation = match fetcher.fetch_relation(id).await {
        Ok(relation) => relation,
        Err(e) => {
            warn!("error fetching relation {id}: {e}");
            ctx.record(Context::Relation { id, parent }, e);
            return step;
        }
    };
    step.fetched = true;

    match classify(&relation) {
        Classification::Terminal => {
            info!(
                "found single line {id}: {} ({})",
                relation.tags.get("name").map(String::as_str).unwrap_or("?"),
                relation.tags.get("ref").map(String::as_str).unwrap_or("?"),
            );
            ctx.push_route(Route { relation, parent });
        }
        Classification::Recursing(children) => {
            debug!("relation {id} has {} subrelations", children.len());
            step.children = children;
        }
        Classification::Ignored(IgnoreReason::MissingType) => {
            debug!("relation {id} has no type");
        }
        Classification::Ignored(IgnoreReason::UnsupportedType(t)) => {
            debug!("relation {id} has ignored type {t}");
        }
        Classification::Failed => {
            warn!("relation {id} has neither way nor relation members");
            ctx.record(
                Context::Relation { id, parent },
                FetchError::Malformed(format!("relation {id} has neither way nor relation members")),
            );
        }
    }

    step
}

/// Resolve all relations reachable from `root_ids`, collecting terminal routes in `ctx`
///
/// Fails only when no root relation could be fetched at all.
pub async fn resolve_relations(
    fetcher: &EntityFetcher,
    root_ids: &[u64],
    concurrency: usize,
    ctx: &RunContext,
) -> Result<()> {
    let mut queue: VecDeque<(u64, u64)> = root_ids.iter().map(|&id| (id, 0)).collect();
    let mut in_flight = FuturesUnordered::new();
    let mut reached_roots = 0usize;

    loop {
        while in_flight.len() < concurrency.max(1) {
            match queue.pop_front() {
                Some((id, parent)) => in_flight.push(resolve_relation(fetcher, ctx, id, parent)),
                None => break,
            }
        }

        let Some(step) = in_flight.next().await else {
            break;
        };

        // A deduplicated root step fetched nothing and does not count
        if step.parent == 0 && step.fetched {
            reached_roots += 1;
        }
        let parent = step.id;
        queue.extend(step.children.into_iter().map(|child| (child, parent)));
    }

    if reached_roots == 0 {
        return Err(Error::Fatal(format!(
            "none of the {} root relations could be fetched",
            root_ids.len()
        )));
    }

    info!("visited {} relations", ctx.visited_count());
    Ok(())
}
