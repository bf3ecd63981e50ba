//! # osm2routes Library
//!
//! Resolves OpenStreetMap public transport relations into one styled
//! `MultiLineString` per route.
//!
//! Starting from a set of root relations (networks, route masters or routes),
//! the library walks the relation forest down to the relations that reference
//! ways directly, fetches every way and node those routes use from the OSM API,
//! and assembles GeoJSON-ready geometries.
//!
//! ## Features
//!
//! - **Bounded fan-out**: separate concurrency ceilings for relations, ways and nodes
//! - **Deduplication**: shared sub-relations are fetched once per run
//! - **Resilient**: retries, per-fetch timeouts, and skip-and-continue on bad data
//! - **Diagnostics**: every skipped member is reported with its context
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let resolution = osm2routes::resolve_all(&[53181]).await?;
//!
//!     for diagnostic in &resolution.diagnostics {
//!         eprintln!("skipped {}", diagnostic);
//!     }
//!
//!     let collection = osm2routes::feature_collection(&resolution.routes);
//!     println!("{}", serde_json::to_string_pretty(&collection)?);
//!     Ok(())
//! }
//! ```

// Re-export core types that users might need
pub use crate::core::entity::{Coord, Entity, EntityKind, Member, Node, Relation, Tags, Way};
pub use crate::core::error::{Context, Diagnostic, Error, FetchError, ParseError, Result};
pub use crate::core::geometry::{assemble, feature_collection, RouteGeometry};
pub use crate::core::materialize::{MaterializedRoute, Stop};
pub use crate::core::options::{ProgressCallback, ResolveOptions};
pub use crate::core::relation::{classify, Classification, IgnoreReason, Route};
pub use crate::core::way::ResolvedWay;

// Internal modules
mod core;

/// Resolve root relations against the public OSM API with default options
///
/// # Examples
/// ```rust,no_run
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let resolution = osm2routes::resolve_all(&[53181, 18813]).await?;
/// println!("{} routes", resolution.routes.len());
/// # Ok(())
/// # }
/// ```
pub async fn resolve_all(root_ids: &[u64]) -> Result<Resolution> {
    Resolver::new().resolve_all(root_ids).await
}

/// Resolve root relations with custom API configuration and options
///
/// # Examples
/// ```rust,no_run
/// use osm2routes::{ResolveOptions, SourceConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = SourceConfig::with_base_url("https://osm-mirror.example.org/api/0.6");
/// let options = ResolveOptions {
///     relation_concurrency: 4,
///     share_member_cache: true,
///     ..Default::default()
/// };
///
/// let resolution = osm2routes::resolve_all_with_options(&[53181], config, options).await?;
/// # Ok(())
/// # }
/// ```
pub async fn resolve_all_with_options(
    root_ids: &[u64],
    config: SourceConfig,
    options: ResolveOptions,
) -> Result<Resolution> {
    Resolver::with_config(config, options)?
        .resolve_all(root_ids)
        .await
}

/// Advanced API: a reusable resolver with custom configuration
pub use crate::core::{Resolution, Resolver, SourceConfig};
