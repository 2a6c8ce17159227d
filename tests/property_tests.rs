//! Property-based tests for ivfscan.
//!
//! These tests verify invariants that should hold regardless of input:
//! - The bounded scan returns exactly min(top_k, pool) results, sorted
//! - Selection does not depend on offer order
//! - Scalar and batched backends agree
//! - Search results are unique, bounded by k, and drawn from probed clusters

use ivfscan::backend::{BatchedBackend, ScalarBackend};
use ivfscan::benchmark::exhaustive_search;
use ivfscan::config::{ExecutionStrategy, IvfConfig};
use ivfscan::ivf::{Cluster, IvfIndex, IvfSearchEngine, SearchParams};
use ivfscan::scan::{find_similar, CandidatePool};
use ivfscan::topk::{ScoredCandidate, TopKSelector};
use ivfscan::BackendKind;
use proptest::prelude::*;
use std::collections::HashSet;

fn is_sorted_desc<I: Ord>(v: &[ScoredCandidate<I>]) -> bool {
    v.windows(2).all(|w| w[0] > w[1])
}

prop_compose! {
    fn arb_pool(max_rows: usize, dim: usize)
        (rows in 0..=max_rows)
        (data in prop::collection::vec(-1.0f32..1.0, rows * dim)) -> Vec<f32> {
        data
    }
}

prop_compose! {
    fn arb_vector(dim: usize)(v in prop::collection::vec(-1.0f32..1.0, dim)) -> Vec<f32> {
        v
    }
}

prop_compose! {
    /// Index with `clusters` clusters of 0..8 members each; ids are globally unique.
    fn arb_index(clusters: usize, dim: usize)
        (centroids in prop::collection::vec(-1.0f32..1.0, clusters * dim),
         members in prop::collection::vec(
             prop::collection::vec(-1.0f32..1.0, 0..8 * dim), clusters))
        -> IvfIndex {
        let mut next_id = 0u32;
        let clusters = members
            .into_iter()
            .map(|mut data| {
                data.truncate(data.len() / dim * dim);
                let rows = data.len() / dim;
                let ids: Vec<u32> = (next_id..next_id + rows as u32).collect();
                next_id += rows as u32;
                Cluster::new(data, ids, dim).unwrap()
            })
            .collect();
        IvfIndex::new(dim, centroids, clusters).unwrap()
    }
}

prop_compose! {
    /// `(score, id)` pairs with small integer scores, which forces many ties.
    fn arb_tied_stream(max_len: usize)
        (scores in prop::collection::vec(-5i32..5, 0..max_len)) -> Vec<(f32, u32)> {
        scores
            .iter()
            .enumerate()
            .map(|(i, &s)| (s as f32, i as u32))
            .collect()
    }
}

mod selection_props {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn scan_returns_min_k_rows_sorted(
            data in arb_pool(64, 4),
            query in arb_vector(4),
            top_k in 0usize..80,
        ) {
            let pool = CandidatePool::new(&data, 4).unwrap();
            let out = find_similar(pool, &query, top_k, &ScalarBackend, 0).unwrap();

            prop_assert_eq!(out.len(), top_k.min(pool.len()));
            prop_assert!(is_sorted_desc(&out));
            let ids: HashSet<usize> = out.iter().map(|c| c.id).collect();
            prop_assert_eq!(ids.len(), out.len());
            prop_assert!(out.iter().all(|c| c.id < pool.len()));
        }

        #[test]
        fn scan_keeps_true_top_k(
            data in arb_pool(48, 3),
            query in arb_vector(3),
            top_k in 1usize..10,
        ) {
            let pool = CandidatePool::new(&data, 3).unwrap();
            let out = find_similar(pool, &query, top_k, &ScalarBackend, 0).unwrap();

            // Reference: score everything, sort by the same order, truncate.
            let mut all: Vec<ScoredCandidate<usize>> = data
                .chunks_exact(3)
                .enumerate()
                .map(|(i, row)| ScoredCandidate::new(ivfscan::simd::dot(&query, row), i))
                .collect();
            all.sort_by(|a, b| b.cmp(a));
            all.truncate(top_k);

            let got: Vec<usize> = out.iter().map(|c| c.id).collect();
            let want: Vec<usize> = all.iter().map(|c| c.id).collect();
            prop_assert_eq!(got, want);
        }

        #[test]
        fn offer_order_is_irrelevant(
            (stream, shuffled) in arb_tied_stream(60)
                .prop_flat_map(|stream| (Just(stream.clone()), Just(stream).prop_shuffle())),
            k in 0usize..20,
        ) {
            let mut a = TopKSelector::new(k);
            for &(s, id) in &stream {
                a.offer(s, id);
            }
            let mut b = TopKSelector::new(k);
            for &(s, id) in &shuffled {
                b.offer(s, id);
            }

            let a: Vec<u32> = a.into_sorted_vec().iter().map(|c| c.id).collect();
            let b: Vec<u32> = b.into_sorted_vec().iter().map(|c| c.id).collect();
            prop_assert_eq!(a, b);
        }
    }
}

mod backend_props {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn scalar_and_batched_paths_agree(
            data in arb_pool(300, 8),
            query in arb_vector(8),
            top_k in 1usize..16,
            batch_size in 0usize..50,
            min_rows in 1usize..64,
        ) {
            let pool = CandidatePool::new(&data, 8).unwrap();
            let scalar = find_similar(pool, &query, top_k, &ScalarBackend, 0).unwrap();
            let batched =
                find_similar(pool, &query, top_k, &BatchedBackend::new(min_rows), batch_size)
                    .unwrap();

            prop_assert_eq!(scalar.len(), batched.len());
            for (a, b) in scalar.iter().zip(&batched) {
                prop_assert_eq!(a.id, b.id);
                prop_assert!((a.score - b.score).abs() < 1e-5);
            }
        }
    }
}

mod search_props {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn results_are_unique_bounded_and_probed(
            index in arb_index(6, 4),
            query in arb_vector(4),
            k in 1usize..12,
            n_probe in 1usize..8,
            accelerated in any::<bool>(),
        ) {
            let config = IvfConfig::default().with_embedding_dim(4).with_batch_size(3);
            let engine = IvfSearchEngine::new(index, config).unwrap();
            let params = SearchParams::new(k)
                .with_n_probe(n_probe)
                .with_backend(BackendKind::from_flag(accelerated));

            let out = engine.search_with(&query, &params).unwrap();
            prop_assert!(out.len() <= k);
            prop_assert!(is_sorted_desc(&out));

            let ids: HashSet<u32> = out.iter().map(|c| c.id).collect();
            prop_assert_eq!(ids.len(), out.len());

            let probed = engine.probe(&query, n_probe, params.backend).unwrap();
            let allowed: HashSet<u32> = probed
                .iter()
                .flat_map(|c| engine.index().clusters()[c.id].ids().iter().copied())
                .collect();
            prop_assert!(ids.is_subset(&allowed));
            prop_assert_eq!(out.len(), k.min(allowed.len()));
        }

        #[test]
        fn strategies_and_backends_agree(
            index in arb_index(5, 3),
            query in arb_vector(3),
            k in 1usize..10,
        ) {
            let engine =
                IvfSearchEngine::new(index, IvfConfig::default().with_embedding_dim(3).with_n_probe(3))
                    .unwrap();
            let base = SearchParams::new(k);
            let reference: Vec<u32> = engine
                .search_with(&query, &base)
                .unwrap()
                .iter()
                .map(|c| c.id)
                .collect();

            for backend in [BackendKind::Scalar, BackendKind::Accelerated] {
                for execution in [ExecutionStrategy::Sequential, ExecutionStrategy::Parallel] {
                    let params = base.with_backend(backend).with_execution(execution);
                    let ids: Vec<u32> = engine
                        .search_with(&query, &params)
                        .unwrap()
                        .iter()
                        .map(|c| c.id)
                        .collect();
                    prop_assert_eq!(&ids, &reference);
                }
            }
        }

        #[test]
        fn probing_all_clusters_is_exact(
            index in arb_index(4, 3),
            query in arb_vector(3),
            k in 1usize..10,
        ) {
            let exact = exhaustive_search(&index, &query, k).unwrap();
            let engine =
                IvfSearchEngine::new(index, IvfConfig::default().with_embedding_dim(3).with_n_probe(4))
                    .unwrap();
            let approx = engine.search(&query, k, false).unwrap();

            let a: Vec<u32> = exact.iter().map(|c| c.id).collect();
            let b: Vec<u32> = approx.iter().map(|c| c.id).collect();
            prop_assert_eq!(a, b);
        }
    }
}
