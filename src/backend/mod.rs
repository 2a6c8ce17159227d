//! Similarity backends.
//!
//! A backend turns `(query, candidate rows)` into one raw similarity score per row.
//! The score is an unnormalized dot product; ranking quality therefore depends on
//! the caller supplying comparably scaled (ideally unit-norm) vectors.
//!
//! Two implementations ship with the crate:
//!
//! - [`ScalarBackend`]: plain per-row dot product. The scan drives it one
//!   candidate at a time, in index order.
//! - [`BatchedBackend`]: scores a whole chunk per call, spreading rows across the
//!   rayon pool. This is the built-in "accelerated" path.
//!
//! Anything else (a GPU kernel, a remote scorer) plugs in by implementing
//! [`SimilarityBackend`]. The scan treats every backend as an opaque, blocking,
//! batch-in/batch-out function.

mod batched;
mod scalar;

pub use batched::BatchedBackend;
pub use scalar::ScalarBackend;

use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Capability interface for scoring candidate rows against a query.
pub trait SimilarityBackend: Send + Sync + fmt::Debug {
    /// Short identifier used in logs and errors.
    fn name(&self) -> &'static str;

    /// Score `scores.len()` row-major candidate rows of `query.len()` floats each.
    ///
    /// `candidates.len()` is always `scores.len() * query.len()`. Scores are written
    /// in input order. Implementations must not assume anything about the chunk
    /// size they are handed.
    fn score_batch(&self, query: &[f32], candidates: &[f32], scores: &mut [f32]) -> Result<()>;

    /// Whether the scan should hand this backend whole chunks (`true`) or call it
    /// once per candidate (`false`).
    fn prefers_batches(&self) -> bool {
        true
    }
}

/// Which backend a search call uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Sequential per-candidate dot products.
    #[default]
    Scalar,
    /// Chunked batch scoring through the engine's accelerated backend.
    Accelerated,
}

impl BackendKind {
    /// Map the boolean `use_accelerated` flag of the query interface.
    #[inline]
    pub fn from_flag(use_accelerated: bool) -> Self {
        if use_accelerated {
            Self::Accelerated
        } else {
            Self::Scalar
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Scalar => write!(f, "scalar"),
            BackendKind::Accelerated => write!(f, "accelerated"),
        }
    }
}
