//! Two-stage IVF search: probe centroids, then scan and merge the probed clusters.

use super::index::IvfIndex;
use super::probe::ClusterProbe;
use crate::backend::{BackendKind, BatchedBackend, ScalarBackend, SimilarityBackend};
use crate::config::{ExecutionStrategy, IvfConfig};
use crate::scan::find_similar;
use crate::topk::{ScoredCandidate, TopKSelector};
use crate::{IvfError, Result};
use rayon::prelude::*;
use std::sync::Arc;

/// Per-call search options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchParams {
    /// Number of results to return (must be >= 1).
    pub k: usize,
    /// Backend to score with.
    pub backend: BackendKind,
    /// Override of the configured `n_probe`.
    pub n_probe: Option<usize>,
    /// Override of the configured execution strategy.
    pub execution: Option<ExecutionStrategy>,
}

impl SearchParams {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            backend: BackendKind::Scalar,
            n_probe: None,
            execution: None,
        }
    }

    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_n_probe(mut self, n_probe: usize) -> Self {
        self.n_probe = Some(n_probe);
        self
    }

    pub fn with_execution(mut self, execution: ExecutionStrategy) -> Self {
        self.execution = Some(execution);
        self
    }
}

/// IVF search engine over an owned, immutable [`IvfIndex`].
///
/// Searches take `&self`, so one engine can serve concurrent queries from
/// behind an `Arc`. Each call owns its own selectors; nothing is mutated.
#[derive(Debug)]
pub struct IvfSearchEngine {
    index: IvfIndex,
    config: IvfConfig,
    scalar: Arc<dyn SimilarityBackend>,
    accelerated: Arc<dyn SimilarityBackend>,
}

impl IvfSearchEngine {
    /// Create an engine. The configured `embedding_dim` must match the index.
    pub fn new(index: IvfIndex, config: IvfConfig) -> Result<Self> {
        config.validate()?;
        if config.embedding_dim != index.dimension() {
            return Err(IvfError::Config(format!(
                "embedding_dim is {} but the index has dimension {}",
                config.embedding_dim,
                index.dimension()
            )));
        }
        Ok(Self {
            index,
            config,
            scalar: Arc::new(ScalarBackend),
            accelerated: Arc::new(BatchedBackend::default()),
        })
    }

    /// Replace the backend used for [`BackendKind::Accelerated`].
    pub fn with_accelerated_backend(mut self, backend: Arc<dyn SimilarityBackend>) -> Self {
        self.accelerated = backend;
        self
    }

    #[inline]
    pub fn index(&self) -> &IvfIndex {
        &self.index
    }

    #[inline]
    pub fn config(&self) -> &IvfConfig {
        &self.config
    }

    /// Give the index back.
    pub fn into_index(self) -> IvfIndex {
        self.index
    }

    fn backend(&self, kind: BackendKind) -> &dyn SimilarityBackend {
        match kind {
            BackendKind::Scalar => self.scalar.as_ref(),
            BackendKind::Accelerated => self.accelerated.as_ref(),
        }
    }

    /// Top-`k` results for `query`, strongest first, as `(score, global id)` pairs.
    pub fn search(
        &self,
        query: &[f32],
        k: usize,
        use_accelerated: bool,
    ) -> Result<Vec<ScoredCandidate<u32>>> {
        self.search_with(
            query,
            &SearchParams::new(k).with_backend(BackendKind::from_flag(use_accelerated)),
        )
    }

    /// Like [`IvfSearchEngine::search`] with the configured default backend.
    pub fn search_default(&self, query: &[f32], k: usize) -> Result<Vec<ScoredCandidate<u32>>> {
        self.search_with(
            query,
            &SearchParams::new(k).with_backend(self.config.default_backend),
        )
    }

    /// Clusters `query` would visit, as `(centroid score, cluster index)` strongest first.
    pub fn probe(
        &self,
        query: &[f32],
        n_probe: usize,
        backend: BackendKind,
    ) -> Result<Vec<ScoredCandidate<usize>>> {
        if n_probe == 0 {
            return Err(n_probe_error());
        }
        if self.index.num_clusters() == 0 {
            return Err(IvfError::EmptyIndex);
        }
        self.check_query(query)?;
        ClusterProbe::new(&self.index).select(
            query,
            n_probe,
            self.backend(backend),
            self.config.batch_size,
        )
    }

    /// Search with explicit per-call parameters.
    ///
    /// Results hold at most `k` entries, all drawn from the probed clusters. They
    /// are not guaranteed to be the true global top-k; recall depends on `n_probe`.
    pub fn search_with(
        &self,
        query: &[f32],
        params: &SearchParams,
    ) -> Result<Vec<ScoredCandidate<u32>>> {
        if params.k == 0 {
            return Err(IvfError::InvalidArgument("k must be at least 1".to_string()));
        }
        if self.index.num_clusters() == 0 {
            return Err(IvfError::EmptyIndex);
        }
        self.check_query(query)?;

        let n_probe = params.n_probe.unwrap_or(self.config.n_probe);
        if n_probe == 0 {
            return Err(n_probe_error());
        }
        let execution = params.execution.unwrap_or(self.config.execution);
        let backend = self.backend(params.backend);

        let probed = ClusterProbe::new(&self.index).select(
            query,
            n_probe,
            backend,
            self.config.batch_size,
        )?;

        let mut merged = TopKSelector::new(params.k);
        match execution {
            ExecutionStrategy::Sequential => {
                for cluster in &probed {
                    merged.extend(self.scan_cluster(cluster, query, params.k, backend)?);
                }
            }
            ExecutionStrategy::Parallel => {
                let per_cluster = probed
                    .par_iter()
                    .map(|cluster| self.scan_cluster(cluster, query, params.k, backend))
                    .collect::<Result<Vec<_>>>()?;
                for hits in per_cluster {
                    merged.extend(hits);
                }
            }
        }

        let results = merged.into_sorted_vec();
        tracing::debug!(
            k = params.k,
            n_probe,
            probed = probed.len(),
            backend = backend.name(),
            ?execution,
            results = results.len(),
            "ivf search finished"
        );
        Ok(results)
    }

    /// Run several queries in parallel against the shared index.
    ///
    /// One result per query, in input order; a failing query does not affect the others.
    pub fn search_batch(
        &self,
        queries: &[&[f32]],
        params: &SearchParams,
    ) -> Vec<Result<Vec<ScoredCandidate<u32>>>> {
        queries
            .par_iter()
            .map(|query| self.search_with(query, params))
            .collect()
    }

    fn check_query(&self, query: &[f32]) -> Result<()> {
        if query.len() != self.index.dimension() {
            return Err(IvfError::DimensionMismatch {
                expected: self.index.dimension(),
                actual: query.len(),
            });
        }
        Ok(())
    }

    /// Top-`k` members of one probed cluster, with local rows mapped to global ids.
    fn scan_cluster(
        &self,
        probed: &ScoredCandidate<usize>,
        query: &[f32],
        k: usize,
        backend: &dyn SimilarityBackend,
    ) -> Result<Vec<ScoredCandidate<u32>>> {
        let (cluster, pool) = self
            .index
            .cluster(probed.id)
            .zip(self.index.cluster_pool(probed.id))
            .ok_or_else(|| IvfError::Format(format!("cluster {} is missing", probed.id)))?;

        tracing::trace!(
            cluster = probed.id,
            centroid_score = probed.score,
            members = cluster.len(),
            "scanning cluster"
        );

        let hits = find_similar(pool, query, k, backend, self.config.batch_size)?;
        let ids = cluster.ids();
        Ok(hits
            .into_iter()
            .map(|hit| hit.map_id(|row| ids[row]))
            .collect())
    }
}

fn n_probe_error() -> IvfError {
    IvfError::InvalidArgument("n_probe must be at least 1".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_cluster_index() -> IvfIndex {
        IvfIndex::from_rows(
            &[vec![1.0, 0.0], vec![0.0, 1.0]],
            vec![
                (vec![vec![1.0, 0.0], vec![0.0, 1.0]], vec![10, 11]),
                (vec![vec![0.6, 0.8]], vec![20]),
            ],
        )
        .unwrap()
    }

    fn engine(n_probe: usize) -> IvfSearchEngine {
        let config = IvfConfig::default()
            .with_embedding_dim(2)
            .with_n_probe(n_probe);
        IvfSearchEngine::new(two_cluster_index(), config).unwrap()
    }

    fn pairs(v: &[ScoredCandidate<u32>]) -> Vec<(f32, u32)> {
        v.iter().map(|c| (c.score, c.id)).collect()
    }

    #[test]
    fn probes_one_cluster_and_maps_to_global_id() {
        let engine = engine(1);
        let out = engine.search(&[1.0, 0.0], 1, false).unwrap();
        assert_eq!(pairs(&out), vec![(1.0, 10)]);

        let out = engine.search(&[1.0, 0.0], 1, true).unwrap();
        assert_eq!(pairs(&out), vec![(1.0, 10)]);
    }

    #[test]
    fn unprobed_clusters_never_contribute() {
        let engine = engine(1);
        let out = engine.search(&[1.0, 0.0], 5, false).unwrap();
        let ids: Vec<u32> = out.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![10, 11]);
    }

    #[test]
    fn probing_everything_merges_across_clusters() {
        let engine = engine(8);
        let out = engine.search(&[1.0, 0.0], 3, false).unwrap();
        let ids: Vec<u32> = out.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![10, 20, 11]);
    }

    #[test]
    fn parallel_matches_sequential() {
        let engine = engine(2);
        let params = SearchParams::new(3);
        let seq = engine
            .search_with(&[0.3, 0.7], &params.with_execution(ExecutionStrategy::Sequential))
            .unwrap();
        let par = engine
            .search_with(&[0.3, 0.7], &params.with_execution(ExecutionStrategy::Parallel))
            .unwrap();
        assert_eq!(pairs(&seq), pairs(&par));
    }

    #[test]
    fn rejects_zero_k() {
        let err = engine(1).search(&[1.0, 0.0], 0, false).unwrap_err();
        assert!(matches!(err, IvfError::InvalidArgument(_)));
    }

    #[test]
    fn rejects_zero_n_probe_override() {
        let err = engine(1)
            .search_with(&[1.0, 0.0], &SearchParams::new(1).with_n_probe(0))
            .unwrap_err();
        assert!(matches!(err, IvfError::InvalidArgument(_)));
    }

    #[test]
    fn rejects_wrong_query_dimension() {
        let err = engine(1).search(&[1.0, 0.0, 0.0], 1, false).unwrap_err();
        assert!(matches!(
            err,
            IvfError::DimensionMismatch {
                expected: 2,
                actual: 3
            }
        ));
    }

    #[test]
    fn empty_index_fails_fast() {
        let index = IvfIndex::new(2, Vec::new(), Vec::new()).unwrap();
        let engine =
            IvfSearchEngine::new(index, IvfConfig::default().with_embedding_dim(2)).unwrap();
        assert!(matches!(
            engine.search(&[1.0, 0.0], 1, false),
            Err(IvfError::EmptyIndex)
        ));
        assert!(matches!(
            engine.probe(&[1.0, 0.0], 1, BackendKind::Scalar),
            Err(IvfError::EmptyIndex)
        ));
    }

    #[test]
    fn config_dimension_must_match_index() {
        let err = IvfSearchEngine::new(two_cluster_index(), IvfConfig::default()).unwrap_err();
        assert!(matches!(err, IvfError::Config(_)));
    }

    #[test]
    fn probe_reports_cluster_scores() {
        let probed = engine(1)
            .probe(&[0.0, 1.0], 2, BackendKind::Accelerated)
            .unwrap();
        let clusters: Vec<usize> = probed.iter().map(|c| c.id).collect();
        assert_eq!(clusters, vec![1, 0]);
    }

    #[test]
    fn probe_rejects_zero_n_probe() {
        let engine = engine(1);
        for backend in [BackendKind::Scalar, BackendKind::Accelerated] {
            let err = engine.probe(&[1.0, 0.0], 0, backend).unwrap_err();
            assert!(matches!(err, IvfError::InvalidArgument(_)), "{err}");
        }
        let err = engine
            .search_with(&[1.0, 0.0], &SearchParams::new(1).with_n_probe(0))
            .unwrap_err();
        assert!(matches!(err, IvfError::InvalidArgument(_)), "{err}");
    }

    #[test]
    fn batch_search_keeps_input_order() {
        let engine = engine(1);
        let q0: &[f32] = &[1.0, 0.0];
        let q1: &[f32] = &[0.0, 1.0];
        let bad: &[f32] = &[1.0];
        let out = engine.search_batch(&[q0, q1, bad], &SearchParams::new(1));
        assert_eq!(out[0].as_ref().unwrap()[0].id, 10);
        assert_eq!(out[1].as_ref().unwrap()[0].id, 20);
        assert!(out[2].is_err());
    }

    #[test]
    fn failed_search_leaves_engine_usable() {
        let engine = engine(1);
        assert!(engine.search(&[1.0], 1, false).is_err());
        assert_eq!(engine.search(&[1.0, 0.0], 1, false).unwrap()[0].id, 10);
    }
}
