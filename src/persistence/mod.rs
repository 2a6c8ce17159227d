//! On-disk index storage.
//!
//! The engine never touches files. This module turns a data directory into a
//! fully validated [`IvfIndex`](crate::ivf::IvfIndex) (or an error), so the engine
//! can be tested against in-memory indices and the loader against files.
//!
//! # Layout
//!
//! ```text
//! data_dir/
//! ├── cluster_mappings_{tag}.json        # [[global id, ...], ...] one array per cluster
//! ├── cluster_embeddings_0_{tag}.bin     # raw LE f32, member_count x dim
//! ├── cluster_embeddings_1_{tag}.bin
//! ├── ...
//! └── cluster_centroids_{tag}.bin        # raw LE f32, num_clusters x dim
//! ```
//!
//! The number of clusters is the number of arrays in the mapping file.

pub mod loader;
pub mod raw;

pub use loader::{load_index, load_with_layout, save_index, DataLayout};
pub use raw::{read_f32_file, read_query, write_f32_file};
