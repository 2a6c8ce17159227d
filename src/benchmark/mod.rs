//! Recall evaluation for IVF search.
//!
//! IVF trades recall for speed through `n_probe`. These helpers measure that
//! trade-off by comparing engine results against an exact scan of every cluster.

pub mod metrics;

pub use metrics::recall_at_k;

use crate::backend::ScalarBackend;
use crate::ivf::{IvfIndex, IvfSearchEngine, SearchParams};
use crate::scan::find_similar;
use crate::topk::{ScoredCandidate, TopKSelector};
use crate::{IvfError, Result};

/// Exact top-`k` over every member of every cluster, ignoring centroids.
///
/// Uses the same selector and tie-break as the engine, so with `n_probe` at least
/// the number of clusters the engine returns exactly this.
pub fn exhaustive_search(
    index: &IvfIndex,
    query: &[f32],
    k: usize,
) -> Result<Vec<ScoredCandidate<u32>>> {
    if query.len() != index.dimension() {
        return Err(IvfError::DimensionMismatch {
            expected: index.dimension(),
            actual: query.len(),
        });
    }

    let mut selector = TopKSelector::new(k);
    for (idx, cluster) in index.clusters().iter().enumerate() {
        let Some(pool) = index.cluster_pool(idx) else {
            continue;
        };
        let hits = find_similar(pool, query, k, &ScalarBackend, 0)?;
        selector.extend(hits.into_iter().map(|h| h.map_id(|row| cluster.ids()[row])));
    }
    Ok(selector.into_sorted_vec())
}

/// Mean recall@k of `engine` over `queries`, against [`exhaustive_search`].
pub fn evaluate_recall(
    engine: &IvfSearchEngine,
    queries: &[Vec<f32>],
    params: &SearchParams,
) -> Result<f32> {
    if queries.is_empty() {
        return Ok(0.0);
    }
    let mut total = 0.0;
    for query in queries {
        let exact: Vec<u32> = exhaustive_search(engine.index(), query, params.k)?
            .iter()
            .map(|c| c.id)
            .collect();
        let approx: Vec<u32> = engine
            .search_with(query, params)?
            .iter()
            .map(|c| c.id)
            .collect();
        total += recall_at_k(&exact, &approx, params.k);
    }
    Ok(total / queries.len() as f32)
}
