//! Error types for osm2routes
//!
//! Fetch failures are skippable and end up as diagnostics; only [`Error::Fatal`]
//! aborts a run.

use std::fmt;

use crate::core::entity::EntityKind;

/// Failure to obtain a single entity from the upstream API
#[derive(Debug, Clone, PartialEq)]
pub enum FetchError {
    /// The API answered 404 or 410 (deleted entity)
    NotFound(String),

    /// The request did not complete within its timeout
    Timeout(String),

    /// Network failure or unexpected HTTP status
    Transport(String),

    /// The payload was not a usable node, way or relation
    Malformed(String),
}

impl FetchError {
    /// Whether the transport should try this request again
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::Transport(_) | FetchError::Timeout(_))
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::NotFound(url) => write!(f, "Not found: {}", url),
            FetchError::Timeout(url) => write!(f, "Timed out: {}", url),
            FetchError::Transport(msg) => write!(f, "Transport error: {}", msg),
            FetchError::Malformed(msg) => write!(f, "Malformed entity: {}", msg),
        }
    }
}

impl std::error::Error for FetchError {}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(err.to_string())
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

/// The raw payload was not well-formed XML
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError(pub String);

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "XML parse error: {}", self.0)
    }
}

impl std::error::Error for ParseError {}

impl From<roxmltree::Error> for ParseError {
    fn from(err: roxmltree::Error) -> Self {
        ParseError(err.to_string())
    }
}

impl From<ParseError> for FetchError {
    fn from(err: ParseError) -> Self {
        FetchError::Malformed(err.to_string())
    }
}

/// Main error type for osm2routes operations
#[derive(Debug)]
pub enum Error {
    /// A single entity could not be fetched or normalized
    Fetch(FetchError),

    /// A composite (way or route) lost members it cannot do without
    PartialFailure(String),

    /// The run as a whole produced nothing meaningful
    Fatal(String),

    /// Invalid configuration or parameters
    InvalidInput(String),

    /// File I/O error
    IoError(std::io::Error),

    /// Output serialization error
    Serialization(serde_json::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Fetch(err) => write!(f, "{}", err),
            Error::PartialFailure(msg) => write!(f, "Partial failure: {}", msg),
            Error::Fatal(msg) => write!(f, "Fatal: {}", msg),
            Error::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            Error::IoError(err) => write!(f, "I/O error: {}", err),
            Error::Serialization(err) => write!(f, "Serialization error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Fetch(err) => Some(err),
            Error::IoError(err) => Some(err),
            Error::Serialization(err) => Some(err),
            _ => None,
        }
    }
}

impl From<FetchError> for Error {
    fn from(err: FetchError) -> Self {
        Error::Fetch(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err)
    }
}

/// Where in the relation forest a non-fatal failure happened
#[derive(Debug, Clone, PartialEq)]
pub enum Context {
    /// Resolving a relation reached with the given parent (0 for roots)
    Relation { id: u64, parent: u64 },

    /// A member of a route relation
    Member { kind: EntityKind, id: u64, route: u64 },

    /// A route as a whole
    Route { id: u64 },
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Context::Relation { id, parent: 0 } => write!(f, "root relation {}", id),
            Context::Relation { id, parent } => write!(f, "relation {} (parent {})", id, parent),
            Context::Member { kind, id, route } => write!(f, "{} {} of route {}", kind, id, route),
            Context::Route { id } => write!(f, "route {}", id),
        }
    }
}

/// A non-fatal failure collected during a run
#[derive(Debug)]
pub struct Diagnostic {
    pub context: Context,
    pub error: Error,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.context, self.error)
    }
}

/// Convenience result type for osm2routes operations
pub type Result<T> = std::result::Result<T, Error>;
