//! Error types for the Sylva document cache.

use crate::kind::Shape;
use alloc::string::String;
use thiserror::Error;

/// Result type alias for cache operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Error types for cache operations.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// The descriptor cannot be canonicalized (missing or empty group).
    #[error("Invalid query: {message}")]
    InvalidQuery { message: String },

    /// A write would change a node from branch to leaf or back.
    #[error("Shape conflict at {path}: node is a {existing}, write is a {incoming}")]
    ShapeConflict {
        path: String,
        existing: Shape,
        incoming: Shape,
    },

    /// A callable selector failed while being evaluated.
    #[error("Selector failed at {path}: {message}")]
    SelectorFailed { path: String, message: String },

    /// The cache was re-entered while one of its trees was being read or
    /// written, e.g. a merge issued from inside a selector.
    #[error("Cache is busy: {message}")]
    Busy { message: String },
}

impl Error {
    /// Creates an invalid query error.
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Error::InvalidQuery {
            message: message.into(),
        }
    }

    /// Creates a shape conflict error.
    pub fn shape_conflict(path: impl Into<String>, existing: Shape, incoming: Shape) -> Self {
        Error::ShapeConflict {
            path: path.into(),
            existing,
            incoming,
        }
    }

    /// Creates a selector failure. The path is filled in by the engine when
    /// the failure surfaces.
    pub fn selector_failed(message: impl Into<String>) -> Self {
        Error::SelectorFailed {
            path: String::new(),
            message: message.into(),
        }
    }

    /// Creates a busy error.
    pub fn busy(message: impl Into<String>) -> Self {
        Error::Busy {
            message: message.into(),
        }
    }

    /// Attaches a path to a selector failure that does not carry one yet.
    pub fn at_path(self, at: impl Into<String>) -> Self {
        match self {
            Error::SelectorFailed { path, message } if path.is_empty() => Error::SelectorFailed {
                path: at.into(),
                message,
            },
            other => other,
        }
    }

    /// Check if this error is a malformed descriptor
    pub fn is_invalid_query(&self) -> bool {
        matches!(self, Error::InvalidQuery { .. })
    }

    /// Check if this error is a shape conflict
    pub fn is_shape_conflict(&self) -> bool {
        matches!(self, Error::ShapeConflict { .. })
    }

    /// Check if this error came from a selector
    pub fn is_selector_failure(&self) -> bool {
        matches!(self, Error::SelectorFailed { .. })
    }
}
