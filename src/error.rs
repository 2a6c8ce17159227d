//! Error types for ivfscan.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading an index or answering a query.
#[derive(Debug, Error)]
pub enum IvfError {
    /// A required data file could not be opened or read.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File contents do not match the expected shape (row size, counts, JSON layout).
    #[error("format error: {0}")]
    Format(String),

    /// Invalid argument to a search or scan call.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Query or vector length differs from the index dimension.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Search requested against an index with zero clusters.
    #[error("index has no clusters")]
    EmptyIndex,

    /// A similarity backend failed while scoring a batch.
    #[error("backend `{backend}` failed: {message}")]
    Backend {
        backend: &'static str,
        message: String,
    },

    /// Invalid configuration value or unreadable configuration document.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl IvfError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True for errors that abort index construction (I/O, format, configuration).
    ///
    /// Everything else is scoped to a single search call and leaves the index usable.
    #[must_use]
    pub fn is_construction_error(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::Format(_) | Self::Config(_))
    }
}

/// Result type for ivfscan operations.
pub type Result<T> = std::result::Result<T, IvfError>;
