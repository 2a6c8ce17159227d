//! ivfscan: inverted-file (IVF) approximate nearest neighbor search.
//!
//! Vectors are pre-partitioned into clusters around centroids. A query ranks the
//! centroids, probes the best `n_probe` clusters, and merges the top-k members of
//! each probed cluster into one global top-k:
//!
//! - `topk/`: bounded top-k selection with a single `(score, id)` ordering
//! - `backend/`: similarity scoring (scalar, batched, or caller-supplied)
//! - `scan`: the bounded top-k scan over a flat candidate pool
//! - `ivf/`: index data model, cluster probing, and the search engine
//! - `persistence/`: loading the pre-clustered on-disk layout
//! - `benchmark/`: recall against exhaustive search
//!
//! # Critical Nuances
//!
//! ## Scores are raw dot products
//!
//! Neither backend normalizes. For cosine ranking, store and query with
//! unit-norm vectors ([`simd::normalize`]). Unnormalized inputs still search,
//! but long vectors dominate every ranking, centroids included.
//!
//! ## Ties
//!
//! Equal scores are broken by id: the larger id ranks higher. This holds for
//! centroids (cluster index), cluster rows (local row) and final results (global
//! id), and it makes results independent of backend and execution strategy.
//!
//! ## Recall
//!
//! IVF is approximate. A neighbor in an unprobed cluster is never returned;
//! `n_probe >= num_clusters` degrades to exhaustive search.

pub mod backend;
pub mod benchmark;
pub mod config;
pub mod error;
pub mod ivf;
pub mod persistence;
pub mod scan;
pub mod simd;
pub mod topk;

// Re-exports
pub use backend::{BackendKind, BatchedBackend, ScalarBackend, SimilarityBackend};
pub use config::{ExecutionStrategy, IvfConfig};
pub use error::{IvfError, Result};
pub use ivf::{Cluster, ClusterProbe, IvfIndex, IvfSearchEngine, SearchParams};
pub use persistence::{load_index, save_index};
pub use scan::{find_similar, CandidatePool};
pub use topk::{ScoredCandidate, TopKSelector};
