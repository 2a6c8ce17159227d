//! Bounded top-k selection.
//!
//! [`TopKSelector`] keeps the `k` strongest `(score, id)` pairs from an unbounded
//! stream in O(k) space and O(log k) per offer. The same selector ranks centroids
//! during cluster probing, rows during a cluster scan, and global ids during the
//! final merge, so all three stages share one ordering rule.
//!
//! # Ordering
//!
//! Candidates compare lexicographically on `(score, id)`:
//!
//! - higher score is stronger (IEEE 754 total order via [`f32::total_cmp`]);
//! - among equal scores, the **larger id** is stronger.
//!
//! Because the order is total, the retained set after any sequence of offers is
//! the top-k of everything offered, independent of offer order.

use std::cmp::{Ordering, Reverse};
use std::collections::binary_heap::PeekMut;
use std::collections::BinaryHeap;

// Upper bound on up-front allocation; a huge `k` grows the heap lazily instead.
const MAX_PREALLOC: usize = 1024;

/// A `(score, id)` pair.
///
/// The id is a cluster index while probing, a local row while scanning a cluster,
/// and a global dataset id in search results.
#[derive(Debug, Clone, Copy)]
pub struct ScoredCandidate<I> {
    pub score: f32,
    pub id: I,
}

impl<I> ScoredCandidate<I> {
    #[inline]
    pub fn new(score: f32, id: I) -> Self {
        Self { score, id }
    }

    /// Replace the id, keeping the score.
    #[inline]
    pub fn map_id<J>(self, f: impl FnOnce(I) -> J) -> ScoredCandidate<J> {
        ScoredCandidate {
            score: self.score,
            id: f(self.id),
        }
    }
}

impl<I: Ord> PartialEq for ScoredCandidate<I> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<I: Ord> Eq for ScoredCandidate<I> {}

impl<I: Ord> Ord for ScoredCandidate<I> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl<I: Ord> PartialOrd for ScoredCandidate<I> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<I> From<ScoredCandidate<I>> for (f32, I) {
    fn from(c: ScoredCandidate<I>) -> Self {
        (c.score, c.id)
    }
}

/// Online top-k selector over `(score, id)` pairs.
///
/// Internally a min-heap whose root is the weakest retained candidate.
#[derive(Debug, Clone)]
pub struct TopKSelector<I> {
    k: usize,
    heap: BinaryHeap<Reverse<ScoredCandidate<I>>>,
}

impl<I: Ord> TopKSelector<I> {
    /// Create a selector retaining at most `k` candidates. `k == 0` never admits anything.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            heap: BinaryHeap::with_capacity(k.min(MAX_PREALLOC)),
        }
    }

    /// Configured capacity.
    #[inline]
    pub fn k(&self) -> usize {
        self.k
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// True once `k` candidates are retained.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.heap.len() >= self.k
    }

    /// The weakest retained candidate, i.e. the admission threshold once full.
    #[inline]
    pub fn weakest(&self) -> Option<&ScoredCandidate<I>> {
        self.heap.peek().map(|Reverse(c)| c)
    }

    /// Offer a candidate. Returns whether it was retained.
    ///
    /// Below capacity every candidate is admitted. At capacity a candidate is
    /// admitted only if it compares greater than the weakest retained one, which
    /// is evicted.
    pub fn offer(&mut self, score: f32, id: I) -> bool {
        self.offer_candidate(ScoredCandidate::new(score, id))
    }

    /// Offer an already-built candidate. See [`TopKSelector::offer`].
    pub fn offer_candidate(&mut self, candidate: ScoredCandidate<I>) -> bool {
        if self.k == 0 {
            return false;
        }
        if self.heap.len() < self.k {
            self.heap.push(Reverse(candidate));
            return true;
        }
        match self.heap.peek_mut() {
            Some(mut weakest) if candidate > weakest.0 => {
                *weakest = Reverse(candidate);
                true
            }
            _ => false,
        }
    }

    /// Offer every candidate from an iterator.
    pub fn extend<T>(&mut self, candidates: T)
    where
        T: IntoIterator<Item = ScoredCandidate<I>>,
    {
        for c in candidates {
            self.offer_candidate(c);
        }
    }

    /// Consume the selector, returning retained candidates strongest first.
    pub fn into_sorted_vec(self) -> Vec<ScoredCandidate<I>> {
        // Ascending over `Reverse` is descending over candidates.
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|Reverse(c)| c)
            .collect()
    }
}
