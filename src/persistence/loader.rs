//! Load and save an [`IvfIndex`] in the pre-clustered directory layout.

use super::raw::{read_f32_file, write_f32_file};
use crate::config::IvfConfig;
use crate::ivf::{Cluster, IvfIndex};
use crate::{IvfError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// File names of one index inside a data directory.
///
/// ```text
/// <dir>/cluster_mappings_{tag}.json        [[id, ...], [id, ...], ...]
/// <dir>/cluster_embeddings_{i}_{tag}.bin   raw f32 rows, one file per cluster
/// <dir>/cluster_centroids_{tag}.bin        raw f32 rows, one per cluster
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    dir: PathBuf,
    tag: String,
}

impl DataLayout {
    pub fn new(dir: impl Into<PathBuf>, tag: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            tag: tag.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn mappings_path(&self) -> PathBuf {
        self.dir.join(format!("cluster_mappings_{}.json", self.tag))
    }

    pub fn embeddings_path(&self, cluster: usize) -> PathBuf {
        self.dir
            .join(format!("cluster_embeddings_{cluster}_{}.bin", self.tag))
    }

    pub fn centroids_path(&self) -> PathBuf {
        self.dir.join(format!("cluster_centroids_{}.bin", self.tag))
    }
}

/// Load an index from `dir` using `config.embedding_dim` and `config.dataset_tag`.
///
/// Any missing file, misaligned matrix or count mismatch aborts the whole load;
/// no partial index is returned.
pub fn load_index(dir: impl AsRef<Path>, config: &IvfConfig) -> Result<IvfIndex> {
    config.validate()?;
    let layout = DataLayout::new(dir.as_ref(), config.dataset_tag.as_str());
    load_with_layout(&layout, config.embedding_dim)
}

/// Load an index described by an explicit layout.
pub fn load_with_layout(layout: &DataLayout, dim: usize) -> Result<IvfIndex> {
    let mappings = read_mappings(&layout.mappings_path())?;

    let mut clusters = Vec::with_capacity(mappings.len());
    for (idx, ids) in mappings.into_iter().enumerate() {
        let path = layout.embeddings_path(idx);
        let embeddings = read_f32_file(&path, dim)?;
        let rows = embeddings.len() / dim;
        if rows != ids.len() {
            return Err(IvfError::Format(format!(
                "{}: {rows} embedding rows but cluster {idx} maps {} ids",
                path.display(),
                ids.len()
            )));
        }
        if ids.is_empty() {
            tracing::warn!(cluster = idx, "cluster has no members");
        }
        clusters.push(Cluster::new(embeddings, ids, dim)?);
    }

    let centroids_path = layout.centroids_path();
    let centroids = read_f32_file(&centroids_path, dim)?;
    let num_centroids = centroids.len() / dim;
    if num_centroids != clusters.len() {
        return Err(IvfError::Format(format!(
            "{}: {num_centroids} centroids but {} clusters in the mapping file",
            centroids_path.display(),
            clusters.len()
        )));
    }

    let index = IvfIndex::new(dim, centroids, clusters)?;
    tracing::info!(
        dir = %layout.dir().display(),
        clusters = index.num_clusters(),
        vectors = index.num_vectors(),
        dim,
        "loaded ivf index"
    );
    Ok(index)
}

/// Write `index` to `dir` in the layout [`load_index`] reads, creating `dir` if needed.
pub fn save_index(dir: impl AsRef<Path>, index: &IvfIndex, tag: &str) -> Result<()> {
    let layout = DataLayout::new(dir.as_ref(), tag);
    fs::create_dir_all(layout.dir()).map_err(|e| IvfError::io(layout.dir(), e))?;

    let mappings: Vec<&[u32]> = index.clusters().iter().map(Cluster::ids).collect();
    let json = serde_json::to_vec(&mappings)
        .map_err(|e| IvfError::Format(format!("cannot encode cluster mappings: {e}")))?;
    let mappings_path = layout.mappings_path();
    fs::write(&mappings_path, json).map_err(|e| IvfError::io(&mappings_path, e))?;

    for (idx, cluster) in index.clusters().iter().enumerate() {
        write_f32_file(&layout.embeddings_path(idx), cluster.embeddings())?;
    }
    write_f32_file(&layout.centroids_path(), index.centroids())?;
    Ok(())
}

fn read_mappings(path: &Path) -> Result<Vec<Vec<u32>>> {
    let text = fs::read_to_string(path).map_err(|e| IvfError::io(path, e))?;
    serde_json::from_str(&text)
        .map_err(|e| IvfError::Format(format!("{}: invalid cluster mappings: {e}", path.display())))
}
