//! Terminal UI for the osm2routes binary
//!
//! The library reports progress through a callback; this module turns it into
//! a route counter on stderr.

pub mod progress;

pub use progress::ProgressManager;
