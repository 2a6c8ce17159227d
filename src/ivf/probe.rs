//! Cluster selection: rank centroids against the query and keep the best `n_probe`.

use super::index::IvfIndex;
use crate::backend::SimilarityBackend;
use crate::scan::find_similar;
use crate::topk::ScoredCandidate;
use crate::Result;

/// Picks which clusters a query visits.
#[derive(Debug, Clone, Copy)]
pub struct ClusterProbe<'a> {
    index: &'a IvfIndex,
}

impl<'a> ClusterProbe<'a> {
    pub fn new(index: &'a IvfIndex) -> Self {
        Self { index }
    }

    /// The `n_probe` clusters whose centroids score highest, as `(score, cluster)`
    /// pairs strongest first. With `n_probe >= num_clusters` every cluster is returned.
    pub fn select(
        &self,
        query: &[f32],
        n_probe: usize,
        backend: &dyn SimilarityBackend,
        batch_size: usize,
    ) -> Result<Vec<ScoredCandidate<usize>>> {
        let probed = find_similar(
            self.index.centroid_pool(),
            query,
            n_probe,
            backend,
            batch_size,
        )?;

        if n_probe >= self.index.num_clusters() {
            tracing::debug!(
                n_probe,
                num_clusters = self.index.num_clusters(),
                "n_probe covers every cluster, search is exhaustive"
            );
        }
        Ok(probed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BatchedBackend, ScalarBackend};

    fn four_axis_index() -> IvfIndex {
        IvfIndex::from_rows(
            &[
                vec![1.0, 0.0],
                vec![0.0, 1.0],
                vec![-1.0, 0.0],
                vec![0.0, -1.0],
            ],
            vec![
                (vec![], vec![]),
                (vec![], vec![]),
                (vec![], vec![]),
                (vec![], vec![]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn selects_nearest_centroids_in_order() {
        let index = four_axis_index();
        let probe = ClusterProbe::new(&index);
        let picked = probe.select(&[0.9, 0.3], 2, &ScalarBackend, 0).unwrap();
        let clusters: Vec<usize> = picked.iter().map(|c| c.id).collect();
        assert_eq!(clusters, vec![0, 1]);
    }

    #[test]
    fn n_probe_beyond_cluster_count_probes_all() {
        let index = four_axis_index();
        let probe = ClusterProbe::new(&index);
        let picked = probe
            .select(&[0.9, 0.3], 100, &BatchedBackend::default(), 3)
            .unwrap();
        assert_eq!(picked.len(), 4);
        assert_eq!(picked[0].id, 0);
        assert_eq!(picked[3].id, 2);
    }
}
