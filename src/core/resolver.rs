//! The resolution pipeline: relations, then route materialization, then geometry

use std::sync::atomic::{AtomicU64, Ordering};

use futures::StreamExt;
use log::info;

use crate::core::error::{Context, Diagnostic, Result};
use crate::core::fetcher::EntityFetcher;
use crate::core::geometry::{assemble, RouteGeometry};
use crate::core::materialize::materialize_route;
use crate::core::options::ResolveOptions;
use crate::core::relation::{resolve_relations, RunContext};
use crate::core::source::SourceConfig;
use crate::core::transport::HttpTransport;

/// Everything a run produced
#[derive(Debug)]
pub struct Resolution {
    /// One entry per materialized route, in completion order
    pub routes: Vec<RouteGeometry>,
    /// Non-fatal failures, for diagnostics
    pub diagnostics: Vec<Diagnostic>,
}

/// Resolves root relations into route geometries
pub struct Resolver {
    config: SourceConfig,
    options: ResolveOptions,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver {
    /// Create a resolver against the public OSM API with default options
    pub fn new() -> Self {
        Self {
            config: SourceConfig::default(),
            options: ResolveOptions::default(),
        }
    }

    /// Create a resolver with custom API configuration and options
    pub fn with_config(config: SourceConfig, options: ResolveOptions) -> Result<Self> {
        config.validate()?;
        options.validate()?;
        Ok(Self { config, options })
    }

    /// Resolve `root_ids` into route geometries
    ///
    /// Every run gets its own transport cache and visited set.
    pub async fn resolve_all(&self, root_ids: &[u64]) -> Result<Resolution> {
        let transport = HttpTransport::new(self.config.clone())?;
        let fetcher = EntityFetcher::new(
            transport,
            self.options.fetch_timeout,
            self.options.share_member_cache,
        );
        let ctx = RunContext::new();

        resolve_relations(&fetcher, root_ids, self.options.relation_concurrency, &ctx).await?;

        let routes = ctx.take_routes();
        let total = routes.len() as u64;
        info!("found {total} routes, fetching ways and stops");
        self.options.report_progress(0, total);

        let done = AtomicU64::new(0);
        let materialized: Vec<_> = futures::stream::iter(routes)
            .map(|route| {
                let (ctx, fetcher, done) = (&ctx, &fetcher, &done);
                async move {
                    let id = route.relation.id;
                    let result = materialize_route(fetcher, route, &self.options, ctx).await;
                    let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
                    self.options.report_progress(finished, total);
                    match result {
                        Ok(route) => Some(route),
                        Err(e) => {
                            ctx.record(Context::Route { id }, e);
                            None
                        }
                    }
                }
            })
            .buffer_unordered(self.options.relation_concurrency)
            .filter_map(futures::future::ready)
            .collect()
            .await;

        let routes: Vec<RouteGeometry> = materialized.iter().map(assemble).collect();
        info!(
            "materialized {} of {total} routes with {} entity fetches",
            routes.len(),
            fetcher.fetch_count()
        );

        Ok(Resolution {
            routes,
            diagnostics: ctx.into_diagnostics(),
        })
    }
}
