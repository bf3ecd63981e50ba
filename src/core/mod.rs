//! Core library modules for osm2routes
//!
//! This module contains the internal implementation of the resolution pipeline.

pub mod entity;
pub mod error;
pub mod fetcher;
pub mod geometry;
pub mod materialize;
pub mod normalize;
pub mod options;
pub mod relation;
pub mod resolver;
pub mod source;
pub mod transport;
pub mod way;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export main types for internal use
pub use resolver::{Resolution, Resolver};
pub use source::SourceConfig;
