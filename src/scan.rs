//! Bounded top-k scan over a flat candidate pool.
//!
//! [`find_similar`] scores every row of a row-major matrix against a query and
//! keeps the `top_k` best as `(score, row index)` pairs. It is the one primitive
//! behind both stages of IVF search: ranking centroids and ranking cluster members.
//!
//! How rows reach the backend depends on [`SimilarityBackend::prefers_batches`]:
//!
//! ```text
//! per-candidate:  row 0 -> score -> offer, row 1 -> score -> offer, ...
//! batched:        [rows 0..B) -> B scores -> offer x B, [rows B..2B) -> ...
//! ```
//!
//! Either way every score goes through the same [`TopKSelector`], so both paths
//! retain the same set for identical scores.

use crate::backend::SimilarityBackend;
use crate::topk::{ScoredCandidate, TopKSelector};
use crate::{IvfError, Result};

/// A borrowed row-major matrix of `len() x dimension()` floats.
#[derive(Debug, Clone, Copy)]
pub struct CandidatePool<'a> {
    vectors: &'a [f32],
    dimension: usize,
}

impl<'a> CandidatePool<'a> {
    /// Wrap a flat buffer. Fails if `dimension` is zero or does not divide the buffer.
    pub fn new(vectors: &'a [f32], dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(IvfError::InvalidArgument(
                "dimension must be positive".to_string(),
            ));
        }
        if vectors.len() % dimension != 0 {
            return Err(IvfError::InvalidArgument(format!(
                "pool of {} floats is not a whole number of rows of dimension {dimension}",
                vectors.len()
            )));
        }
        Ok(Self { vectors, dimension })
    }

    /// Internal constructor for buffers already validated by the index.
    #[inline]
    pub(crate) fn new_unchecked(vectors: &'a [f32], dimension: usize) -> Self {
        debug_assert!(dimension > 0 && vectors.len() % dimension == 0);
        Self { vectors, dimension }
    }

    /// Number of rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.vectors.len() / self.dimension
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn as_slice(&self) -> &'a [f32] {
        self.vectors
    }

    /// Row `idx`, if in range.
    #[inline]
    pub fn row(&self, idx: usize) -> Option<&'a [f32]> {
        let start = idx.checked_mul(self.dimension)?;
        self.vectors.get(start..start + self.dimension)
    }
}

/// Return the `top_k` rows of `pool` most similar to `query`, strongest first.
///
/// `batch_size` is the chunk size used for backends that prefer batches; 0 means
/// one chunk covering the whole pool. It is ignored for per-candidate backends.
///
/// A `top_k` of 0 or an empty pool yields an empty result. A `top_k` larger than
/// the pool returns every row.
pub fn find_similar(
    pool: CandidatePool<'_>,
    query: &[f32],
    top_k: usize,
    backend: &dyn SimilarityBackend,
    batch_size: usize,
) -> Result<Vec<ScoredCandidate<usize>>> {
    if query.len() != pool.dimension() {
        return Err(IvfError::DimensionMismatch {
            expected: pool.dimension(),
            actual: query.len(),
        });
    }

    let count = pool.len();
    if top_k == 0 || count == 0 {
        return Ok(Vec::new());
    }

    let mut selector = TopKSelector::new(top_k);
    if backend.prefers_batches() {
        scan_batched(pool, query, backend, batch_size, &mut selector)?;
    } else {
        scan_per_candidate(pool, query, backend, &mut selector)?;
    }
    Ok(selector.into_sorted_vec())
}

fn scan_per_candidate(
    pool: CandidatePool<'_>,
    query: &[f32],
    backend: &dyn SimilarityBackend,
    selector: &mut TopKSelector<usize>,
) -> Result<()> {
    let mut score = [0.0_f32; 1];
    for (idx, row) in pool.as_slice().chunks_exact(pool.dimension()).enumerate() {
        backend.score_batch(query, row, &mut score)?;
        selector.offer(score[0], idx);
    }
    Ok(())
}

fn scan_batched(
    pool: CandidatePool<'_>,
    query: &[f32],
    backend: &dyn SimilarityBackend,
    batch_size: usize,
    selector: &mut TopKSelector<usize>,
) -> Result<()> {
    let count = pool.len();
    let rows_per_chunk = if batch_size == 0 {
        count
    } else {
        batch_size.min(count)
    };

    let mut scores = vec![0.0_f32; rows_per_chunk];
    let chunk_floats = rows_per_chunk * pool.dimension();
    for (chunk_idx, chunk) in pool.as_slice().chunks(chunk_floats).enumerate() {
        let rows = chunk.len() / pool.dimension();
        let scores = &mut scores[..rows];
        backend.score_batch(query, chunk, scores)?;

        let base = chunk_idx * rows_per_chunk;
        for (offset, &score) in scores.iter().enumerate() {
            selector.offer(score, base + offset);
        }
    }
    Ok(())
}
