//! # osm2routes CLI
//!
//! Command-line interface for the osm2routes library.
//! Resolves transit relations from the OSM API and writes one GeoJSON
//! feature per route.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{error, warn};
use osm2routes::{feature_collection, Resolution, ResolveOptions, Resolver, SourceConfig};

mod cli;

/// Relations covering the Berlin BVG network
const DEFAULT_ROOTS: [u64; 9] = [53181, 18813, 174108, 58584, 18812, 174283, 18812, 174255, 175260];

/// Command-line interface for osm2routes
#[derive(Parser)]
#[command(name = "osm2routes")]
#[command(about = "Resolve OpenStreetMap transit relations into GeoJSON route geometries")]
#[command(long_about = "Walks transit relations down to their routes and writes one MultiLineString per route:
  osm2routes                       # Berlin BVG network to stdout
  osm2routes 53181 -o u-bahn.json  # One network to a file
  osm2routes 175260 --verbose      # Log every relation, way and node

Platform ways are left out of the track geometry. Routes get simplestyle
stroke and stroke-width properties derived from their colour and route tags.")]
#[command(version = env!("OSM2ROUTES_VERSION"))]
struct Cli {
    /// Root relation ids: networks, route masters or routes
    #[arg(default_values_t = DEFAULT_ROOTS)]
    roots: Vec<u64>,

    /// Output file path, or "-" for stdout
    #[arg(short, long, default_value = "-")]
    output: String,

    /// Base URL of the OSM API
    #[arg(long, default_value = "https://www.openstreetmap.org/api/0.6")]
    api_url: String,

    /// Relations resolved (and routes materialized) at once
    #[arg(long, default_value_t = 10)]
    relation_concurrency: usize,

    /// Ways and stops fetched at once per route
    #[arg(long, default_value_t = 1)]
    way_concurrency: usize,

    /// Nodes fetched at once per way
    #[arg(long, default_value_t = 3)]
    node_concurrency: usize,

    /// Maximum concurrent requests to the API
    #[arg(long, default_value_t = 5)]
    max_connections: usize,

    /// Retry attempts for network errors and timeouts
    #[arg(long, default_value_t = 3)]
    retries: u32,

    /// Per-fetch timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout: u64,

    /// Do not keep API responses in memory during the run
    #[arg(long)]
    no_cache: bool,

    /// Fetch each node and way at most once, even when shared between routes
    #[arg(long)]
    share_member_cache: bool,

    /// Show what would be resolved without touching the network
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Overwrite an existing output file
    #[arg(short, long)]
    force: bool,
}

/// Output destination types
#[derive(Debug, PartialEq)]
enum OutputDestination {
    File(String),
    Stdout,
}

fn resolve_output(output: &str) -> OutputDestination {
    if output == "-" || output.is_empty() {
        OutputDestination::Stdout
    } else {
        OutputDestination::File(output.to_string())
    }
}

/// Build API configuration and run options from CLI arguments
fn build_config(cli: &Cli) -> (SourceConfig, ResolveOptions) {
    let timeout = Duration::from_secs(cli.timeout);
    let config = SourceConfig {
        request_timeout: timeout,
        max_connections: cli.max_connections,
        retries: cli.retries,
        cache_responses: !cli.no_cache,
        ..SourceConfig::with_base_url(&cli.api_url)
    };
    let options = ResolveOptions {
        relation_concurrency: cli.relation_concurrency,
        way_concurrency: cli.way_concurrency,
        node_concurrency: cli.node_concurrency,
        fetch_timeout: timeout,
        share_member_cache: cli.share_member_cache,
        progress: None,
    };
    (config, options)
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("❌ Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging to stderr, RUST_LOG wins over --verbose
    env_logger::Builder::new()
        .filter_level(if cli.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        })
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .init();

    if cli.verbose {
        eprintln!("🚋 osm2routes v{} starting...", env!("OSM2ROUTES_VERSION"));
    }

    let output = resolve_output(&cli.output);
    let (config, mut options) = build_config(&cli);

    if cli.dry_run {
        let roots: Vec<String> = cli.roots.iter().map(u64::to_string).collect();
        eprintln!("🔍 [DRY RUN] Would resolve relations {} from {}", roots.join(", "), config.api_base_url);
        eprintln!(
            "🔍 [DRY RUN] Concurrency: {} relations, {} ways per route, {} nodes per way, {} connections",
            options.relation_concurrency, options.way_concurrency, options.node_concurrency, config.max_connections
        );
        eprintln!("🔍 [DRY RUN] Output: {output:?}");
        return Ok(());
    }

    if let OutputDestination::File(ref path) = output {
        if std::path::Path::new(path).exists() && !cli.force {
            bail!("File already exists: {path} (use --force to overwrite)");
        }
    }

    let progress = match output {
        OutputDestination::File(ref path) => {
            let manager = Arc::new(cli::ProgressManager::new(0, &format!("🌐 Resolving routes into {path}")));
            let reporter = Arc::clone(&manager);
            options.progress = Some(Arc::new(move |done, total| reporter.update(done, total)));
            Some(manager)
        }
        OutputDestination::Stdout => None,
    };

    let resolver = Resolver::with_config(config, options)?;
    let resolution = resolver.resolve_all(&cli.roots).await?;

    if let Some(manager) = progress {
        manager.pb.finish_and_clear();
    }

    report(&resolution, cli.verbose);
    write_output(&resolution, &output)?;

    Ok(())
}

/// Log every diagnostic and print a summary
fn report(resolution: &Resolution, verbose: bool) {
    for diagnostic in &resolution.diagnostics {
        warn!("skipped {diagnostic}");
    }
    if verbose || !resolution.diagnostics.is_empty() {
        eprintln!(
            "✅ {} routes resolved, {} members or relations skipped",
            resolution.routes.len(),
            resolution.diagnostics.len()
        );
    }
}

fn write_output(resolution: &Resolution, output: &OutputDestination) -> Result<()> {
    let collection = feature_collection(&resolution.routes);

    match output {
        OutputDestination::File(path) => {
            let file = File::create(path).with_context(|| format!("Failed to create {path}"))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, &collection)?;
            writer.flush()?;
            eprintln!("📁 Saved to: {path}");
        }
        OutputDestination::Stdout => {
            let stdout = std::io::stdout();
            let mut writer = BufWriter::new(stdout.lock());
            serde_json::to_writer_pretty(&mut writer, &collection)?;
            writeln!(writer)?;
            writer.flush()?;
        }
    }
    Ok(())
}
