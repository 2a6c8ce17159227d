//! Recall of approximate results against exact ones.

use std::collections::HashSet;

/// Fraction of the exact top-`k` ids that appear among the first `k` retrieved ids.
///
/// When fewer than `k` exact neighbors exist (tiny indices), the denominator is
/// the number that do. Returns 0 for `k == 0` or an empty ground truth.
pub fn recall_at_k(ground_truth: &[u32], retrieved: &[u32], k: usize) -> f32 {
    let expected: HashSet<u32> = ground_truth.iter().take(k).copied().collect();
    if expected.is_empty() {
        return 0.0;
    }
    let found: HashSet<u32> = retrieved
        .iter()
        .take(k)
        .copied()
        .filter(|id| expected.contains(id))
        .collect();
    found.len() as f32 / expected.len() as f32
}
