//! Chunked batch backend on the rayon pool.

use super::SimilarityBackend;
use crate::{simd, IvfError, Result};
use rayon::prelude::*;

/// Rows per rayon task. Small chunks are scored inline.
const DEFAULT_MIN_ROWS_PER_TASK: usize = 256;

/// Scores a whole batch per call, splitting rows across rayon workers.
///
/// The call blocks until every score is written.
#[derive(Debug, Clone, Copy)]
pub struct BatchedBackend {
    min_rows_per_task: usize,
}

impl BatchedBackend {
    /// `min_rows_per_task` bounds how finely a batch is split; 0 is treated as 1.
    pub fn new(min_rows_per_task: usize) -> Self {
        Self {
            min_rows_per_task: min_rows_per_task.max(1),
        }
    }
}

impl Default for BatchedBackend {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_ROWS_PER_TASK)
    }
}

impl SimilarityBackend for BatchedBackend {
    fn name(&self) -> &'static str {
        "batched"
    }

    fn score_batch(&self, query: &[f32], candidates: &[f32], scores: &mut [f32]) -> Result<()> {
        let dim = query.len();
        if candidates.len() != scores.len() * dim {
            return Err(IvfError::Backend {
                backend: self.name(),
                message: format!(
                    "{} floats do not form {} rows of dimension {dim}",
                    candidates.len(),
                    scores.len()
                ),
            });
        }
        if dim == 0 {
            scores.fill(0.0);
            return Ok(());
        }

        if scores.len() <= self.min_rows_per_task {
            for (score, row) in scores.iter_mut().zip(candidates.chunks_exact(dim)) {
                *score = simd::dot(query, row);
            }
            return Ok(());
        }

        scores
            .par_iter_mut()
            .zip(candidates.par_chunks_exact(dim))
            .with_min_len(self.min_rows_per_task)
            .for_each(|(score, row)| *score = simd::dot(query, row));
        Ok(())
    }
}
