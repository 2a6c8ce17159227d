//! IVF: Inverted File search over pre-clustered embeddings.
//!
//! Vectors are partitioned into clusters around centroids ahead of time. A query
//! is answered in two stages:
//!
//! ```text
//!             query
//!               |
//!     rank centroids (top n_probe)
//!               |
//!       +-------+-------+
//!       |               |
//!   cluster A       cluster B        (probe n_probe = 2 clusters)
//!   top-k rows      top-k rows
//!       |               |
//!   rows -> ids     rows -> ids      (local row -> global dataset id)
//!       +-------+-------+
//!               |
//!       merged top-k results
//! ```
//!
//! Every stage ranks through the same [`TopKSelector`](crate::topk::TopKSelector),
//! so ordering and tie-breaks are identical for centroids, rows and final results.
//!
//! ## Trade-offs
//!
//! | Parameter | ↑ Effect |
//! |-----------|----------|
//! | n_probe | Better recall, slower search; `n_probe >= num_clusters` is exhaustive |
//! | batch_size | Fewer, larger backend calls on the accelerated path |
//!
//! Results are approximate: a true neighbor stored in an unprobed cluster is
//! never returned.
//!
//! ## Usage
//!
//! ```rust
//! use ivfscan::config::IvfConfig;
//! use ivfscan::ivf::{IvfIndex, IvfSearchEngine};
//!
//! let index = IvfIndex::from_rows(
//!     &[vec![1.0, 0.0], vec![0.0, 1.0]],
//!     vec![
//!         (vec![vec![1.0, 0.0], vec![0.0, 1.0]], vec![10, 11]),
//!         (vec![vec![0.6, 0.8]], vec![20]),
//!     ],
//! )?;
//! let engine = IvfSearchEngine::new(index, IvfConfig::default().with_embedding_dim(2).with_n_probe(1))?;
//!
//! let results = engine.search(&[1.0, 0.0], 1, false)?;
//! assert_eq!(results[0].id, 10);
//! # Ok::<(), ivfscan::IvfError>(())
//! ```

pub mod index;
pub mod probe;
pub mod search;

pub use index::{Cluster, IvfIndex};
pub use probe::ClusterProbe;
pub use search::{IvfSearchEngine, SearchParams};
