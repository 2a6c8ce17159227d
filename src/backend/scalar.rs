//! Sequential dot-product backend.

use super::SimilarityBackend;
use crate::{simd, IvfError, Result};

/// Computes one dot product per row on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScalarBackend;

impl SimilarityBackend for ScalarBackend {
    fn name(&self) -> &'static str {
        "scalar"
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

        for (score, row) in scores.iter_mut().zip(candidates.chunks_exact(dim)) {
            *score = simd::dot(query, row);
        }
        Ok(())
    }

    fn prefers_batches(&self) -> bool {
        false
    }
}
