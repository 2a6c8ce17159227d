//! Immutable IVF index data: centroids plus per-cluster members.

use crate::scan::CandidatePool;
use crate::{IvfError, Result};
use std::collections::HashMap;

/// One inverted list: member embeddings and their global dataset ids.
///
/// Row `i` of the embedding matrix belongs to `ids()[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    embeddings: Vec<f32>,
    ids: Vec<u32>,
}

impl Cluster {
    /// Build a cluster, checking that the matrix has exactly one row per id.
    pub fn new(embeddings: Vec<f32>, ids: Vec<u32>, dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(IvfError::InvalidArgument(
                "dimension must be positive".to_string(),
            ));
        }
        if embeddings.len() % dimension != 0 {
            return Err(IvfError::Format(format!(
                "cluster matrix of {} floats is not a multiple of dimension {dimension}",
                embeddings.len()
            )));
        }
        let rows = embeddings.len() / dimension;
        if rows != ids.len() {
            return Err(IvfError::Format(format!(
                "cluster has {rows} embedding rows but {} mapped ids",
                ids.len()
            )));
        }
        Ok(Self { embeddings, ids })
    }

    /// A cluster with no members.
    pub fn empty() -> Self {
        Self {
            embeddings: Vec::new(),
            ids: Vec::new(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Flat row-major member matrix.
    #[inline]
    pub fn embeddings(&self) -> &[f32] {
        &self.embeddings
    }

    /// Global ids, aligned with embedding rows.
    #[inline]
    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    /// Global id of local row `row`.
    #[inline]
    pub fn global_id(&self, row: usize) -> Option<u32> {
        self.ids.get(row).copied()
    }
}

/// Centroid table plus clusters, index-aligned and read-only once built.
#[derive(Debug, Clone, PartialEq)]
pub struct IvfIndex {
    dimension: usize,
    centroids: Vec<f32>,
    clusters: Vec<Cluster>,
}

impl IvfIndex {
    /// Assemble an index from a flat centroid table and one cluster per centroid.
    ///
    /// Cluster matrices are validated against `dimension` by [`Cluster::new`]; this
    /// checks the centroid table shape, that cluster count matches centroid count,
    /// and that every global id belongs to exactly one cluster row.
    pub fn new(dimension: usize, centroids: Vec<f32>, clusters: Vec<Cluster>) -> Result<Self> {
        if dimension == 0 {
            return Err(IvfError::InvalidArgument(
                "dimension must be positive".to_string(),
            ));
        }
        if centroids.len() % dimension != 0 {
            return Err(IvfError::Format(format!(
                "centroid table of {} floats is not a multiple of dimension {dimension}",
                centroids.len()
            )));
        }
        let num_centroids = centroids.len() / dimension;
        if num_centroids != clusters.len() {
            return Err(IvfError::Format(format!(
                "{num_centroids} centroids for {} clusters",
                clusters.len()
            )));
        }
        for (idx, cluster) in clusters.iter().enumerate() {
            if cluster.embeddings.len() != cluster.len() * dimension {
                return Err(IvfError::Format(format!(
                    "cluster {idx} rows do not have dimension {dimension}"
                )));
            }
        }

        let mut owner: HashMap<u32, usize> = HashMap::with_capacity(
            clusters.iter().map(Cluster::len).sum(),
        );
        for (idx, cluster) in clusters.iter().enumerate() {
            for &id in &cluster.ids {
                match owner.insert(id, idx) {
                    Some(first) if first == idx => {
                        return Err(IvfError::Format(format!(
                            "global id {id} appears twice in cluster {idx}"
                        )));
                    }
                    Some(first) => {
                        return Err(IvfError::Format(format!(
                            "global id {id} is mapped by cluster {first} and cluster {idx}"
                        )));
                    }
                    None => {}
                }
            }
        }

        Ok(Self {
            dimension,
            centroids,
            clusters,
        })
    }

    /// Convenience constructor from nested per-cluster rows, mostly for tests and demos.
    pub fn from_rows(
        centroids: &[Vec<f32>],
        clusters: Vec<(Vec<Vec<f32>>, Vec<u32>)>,
    ) -> Result<Self> {
        let dimension = centroids.first().map(Vec::len).ok_or_else(|| {
            IvfError::InvalidArgument(
                "cannot infer the dimension without centroids; use IvfIndex::new".to_string(),
            )
        })?;
        let flat_centroids = flatten(centroids, dimension)?;
        let clusters = clusters
            .into_iter()
            .map(|(rows, ids)| Cluster::new(flatten(&rows, dimension)?, ids, dimension))
            .collect::<Result<Vec<_>>>()?;
        Self::new(dimension, flat_centroids, clusters)
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn num_clusters(&self) -> usize {
        self.clusters.len()
    }

    /// Total member count across clusters.
    pub fn num_vectors(&self) -> usize {
        self.clusters.iter().map(Cluster::len).sum()
    }

    #[inline]
    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    #[inline]
    pub fn cluster(&self, idx: usize) -> Option<&Cluster> {
        self.clusters.get(idx)
    }

    /// Flat centroid table.
    #[inline]
    pub fn centroids(&self) -> &[f32] {
        &self.centroids
    }

    /// Centroid of cluster `idx`.
    pub fn centroid(&self, idx: usize) -> Option<&[f32]> {
        self.centroid_pool().row(idx)
    }

    pub(crate) fn centroid_pool(&self) -> CandidatePool<'_> {
        CandidatePool::new_unchecked(&self.centroids, self.dimension)
    }

    pub(crate) fn cluster_pool(&self, idx: usize) -> Option<CandidatePool<'_>> {
        self.clusters
            .get(idx)
            .map(|c| CandidatePool::new_unchecked(&c.embeddings, self.dimension))
    }

    /// Approximate heap footprint in bytes.
    pub fn size_bytes(&self) -> usize {
        self.centroids.len() * std::mem::size_of::<f32>()
            + self
                .clusters
                .iter()
                .map(|c| {
                    c.embeddings.len() * std::mem::size_of::<f32>()
                        + c.ids.len() * std::mem::size_of::<u32>()
                })
                .sum::<usize>()
    }
}

fn flatten(rows: &[Vec<f32>], dimension: usize) -> Result<Vec<f32>> {
    let mut flat = Vec::with_capacity(rows.len() * dimension);
    for row in rows {
        if row.len() != dimension {
            return Err(IvfError::DimensionMismatch {
                expected: dimension,
                actual: row.len(),
            });
        }
        flat.extend_from_slice(row);
    }
    Ok(flat)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cluster_requires_one_id_per_row() {
        assert!(Cluster::new(vec![1.0, 0.0, 0.0, 1.0], vec![10, 11], 2).is_ok());
        let err = Cluster::new(vec![1.0, 0.0, 0.0, 1.0], vec![10], 2).unwrap_err();
        assert!(matches!(err, IvfError::Format(_)));
        let err = Cluster::new(vec![1.0, 0.0, 0.0], vec![10], 2).unwrap_err();
        assert!(matches!(err, IvfError::Format(_)));
    }

    #[test]
    fn empty_cluster_is_valid() {
        let index = IvfIndex::new(2, vec![1.0, 0.0], vec![Cluster::empty()]).unwrap();
        assert_eq!(index.num_vectors(), 0);
        assert!(index.cluster(0).unwrap().is_empty());
    }

    #[test]
    fn centroid_count_must_match_clusters() {
        let err = IvfIndex::new(2, vec![1.0, 0.0, 0.0, 1.0], vec![Cluster::empty()]).unwrap_err();
        assert!(matches!(err, IvfError::Format(_)));
    }

    #[test]
    fn id_shared_by_two_clusters_is_rejected() {
        let err = IvfIndex::from_rows(
            &[vec![1.0, 0.0], vec![0.0, 1.0]],
            vec![
                (vec![vec![1.0, 0.0]], vec![5]),
                (vec![vec![0.0, 1.0]], vec![5]),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, IvfError::Format(_)), "{err}");
        assert!(err.is_construction_error());
    }

    #[test]
    fn id_repeated_within_a_cluster_is_rejected() {
        let err = IvfIndex::new(
            2,
            vec![1.0, 0.0],
            vec![Cluster::new(vec![1.0, 0.0, 0.5, 0.5], vec![9, 9], 2).unwrap()],
        )
        .unwrap_err();
        assert!(matches!(err, IvfError::Format(_)), "{err}");
    }

    #[test]
    fn from_rows_without_centroids_is_invalid_argument() {
        let err = IvfIndex::from_rows(&[], Vec::new()).unwrap_err();
        assert!(matches!(err, IvfError::InvalidArgument(_)), "{err}");
    }

    #[test]
    fn zero_clusters_is_constructible() {
        let index = IvfIndex::new(4, Vec::new(), Vec::new()).unwrap();
        assert_eq!(index.num_clusters(), 0);
    }

    #[test]
    fn from_rows_flattens_and_checks_dimension() {
        let index = IvfIndex::from_rows(
            &[vec![1.0, 0.0], vec![0.0, 1.0]],
            vec![
                (vec![vec![1.0, 0.0], vec![0.0, 1.0]], vec![10, 11]),
                (vec![vec![0.6, 0.8]], vec![20]),
            ],
        )
        .unwrap();
        assert_eq!(index.dimension(), 2);
        assert_eq!(index.num_clusters(), 2);
        assert_eq!(index.num_vectors(), 3);
        assert_eq!(index.centroid(1), Some(&[0.0_f32, 1.0][..]));
        assert_eq!(index.cluster(0).unwrap().global_id(1), Some(11));

        let err = IvfIndex::from_rows(
            &[vec![1.0, 0.0]],
            vec![(vec![vec![1.0, 0.0, 0.0]], vec![1])],
        )
        .unwrap_err();
        assert!(matches!(err, IvfError::DimensionMismatch { .. }));
    }
}
