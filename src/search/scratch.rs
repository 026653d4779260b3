//! Per-query scratch space: the flat DP table and per-node payload.
//!
//! Sized once to `num_nodes * (|q| + 1)` and reused across queries,
//! growing only when a longer query arrives (§3, §4.4). During a parallel
//! search, distinct worker threads write and read disjoint node ranges of
//! the same buffers concurrently -- the DP dependency graph guarantees a
//! node's row is written exactly once (by the worker processing its
//! parent) before it is read (by the worker processing the node itself).
//! That invariant is what makes the `UnsafeCell`-backed shared access below
//! sound; see the safety comments at each unsafe use.

use std::cell::UnsafeCell;

use crate::penalty::PenaltyModel;
use crate::trie::NodeIndex;

/// Per-node, per-query metadata used for pruning: the minimum value in the
/// node's DP row (a lower bound on any descendant's distance) and the
/// node's own distance (meaningful only if the node is a leaf).
#[derive(Debug, Clone, Copy, Default)]
pub struct Payload {
    pub min_distance: f32,
    pub distance: f32,
}

pub struct Scratch {
    num_nodes: usize,
    query_len: usize,
    dp: UnsafeCell<Vec<f32>>,
    payload: UnsafeCell<Vec<Payload>>,
}

// SAFETY: concurrent access is always to disjoint node-index ranges, per
// the module-level invariant above; every public accessor that hands out a
// mutable view takes the index it covers so callers can't overlap by
// construction of the search algorithm (never enforced by the type system,
// only by the single-writer-before-single-reader schedule in
// `search::parallel`).
unsafe impl Sync for Scratch {}

impl Scratch {
    pub fn new() -> Self {
        Scratch {
            num_nodes: 0,
            query_len: 0,
            dp: UnsafeCell::new(Vec::new()),
            payload: UnsafeCell::new(Vec::new()),
        }
    }

    /// Grows the scratch table to fit `num_nodes` nodes and a query of
    /// length `query_len`, if it isn't already at least that big. Never
    /// shrinks, matching §3's "resized... by growing only" lifecycle.
    pub fn ensure_capacity(&mut self, num_nodes: usize, query_len: usize) {
        self.num_nodes = self.num_nodes.max(num_nodes);
        self.query_len = self.query_len.max(query_len);
        let row_stride = self.query_len + 1;
        let needed = self.num_nodes * row_stride;
        let dp = self.dp.get_mut();
        if dp.len() < needed {
            dp.resize(needed, 0.0);
        }
        let payload = self.payload.get_mut();
        if payload.len() < self.num_nodes {
            payload.resize(self.num_nodes, Payload::default());
        }
    }

    /// The row stride for the *current* query (set by the last
    /// `ensure_capacity` call); rows for this query are
    /// `row_stride` floats wide regardless of the table's total capacity.
    #[inline]
    pub fn row_stride(&self, current_query_len: usize) -> usize {
        debug_assert!(current_query_len <= self.query_len);
        current_query_len + 1
    }

    /// Mutable view of node `index`'s DP row, `row_stride` floats wide.
    ///
    /// # Safety
    /// The caller must ensure no other thread holds a view (mutable or
    /// shared) of the same `index` at the same time.
    #[inline]
    pub unsafe fn row_mut(&self, index: NodeIndex, row_stride: usize) -> &mut [f32] {
        let ptr = (*self.dp.get()).as_mut_ptr();
        let offset = index as usize * row_stride;
        std::slice::from_raw_parts_mut(ptr.add(offset), row_stride)
    }

    /// Shared view of node `index`'s DP row.
    ///
    /// # Safety
    /// The caller must ensure no other thread holds a mutable view of the
    /// same `index` at the same time.
    #[inline]
    pub unsafe fn row(&self, index: NodeIndex, row_stride: usize) -> &[f32] {
        let ptr = (*self.dp.get()).as_ptr();
        let offset = index as usize * row_stride;
        std::slice::from_raw_parts(ptr.add(offset), row_stride)
    }

    /// # Safety
    /// Same rules as [`Self::row_mut`], applied to the payload array.
    #[inline]
    pub unsafe fn set_payload(&self, index: NodeIndex, payload: Payload) {
        let ptr = (*self.payload.get()).as_mut_ptr();
        *ptr.add(index as usize) = payload;
    }

    /// # Safety
    /// Same rules as [`Self::row`], applied to the payload array.
    #[inline]
    pub unsafe fn payload(&self, index: NodeIndex) -> Payload {
        let ptr = (*self.payload.get()).as_ptr();
        *ptr.add(index as usize)
    }
}

impl Default for Scratch {
    fn default() -> Self {
        Self::new()
    }
}

/// Computes child `C[0..=m]` from parent row `parent` (`m = query.len()`),
/// per the recurrence in §4.4, returning `(min(C), C[m])` so the caller can
/// build a [`Payload`] without a second pass over `child_row`.
#[inline]
pub fn compute_child_row(
    parent_row: &[f32],
    child_row: &mut [f32],
    child_char: u8,
    query: &[u8],
    penalty: &PenaltyModel,
) -> (f32, f32) {
    let insert_cost = penalty.insert(child_char);
    child_row[0] = parent_row[0] + insert_cost;
    let mut min = child_row[0];

    for k in 1..=query.len() {
        let via_insert = parent_row[k] + insert_cost;
        let via_delete = child_row[k - 1] + penalty.delete(query[k - 1]);
        let via_substitute = parent_row[k - 1] + penalty.substitute(child_char, query[k - 1]);
        let value = via_insert.min(via_delete).min(via_substitute);
        child_row[k] = value;
        if value < min {
            min = value;
        }
    }

    (min, child_row[query.len()])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grows_but_never_shrinks() {
        let mut scratch = Scratch::new();
        scratch.ensure_capacity(10, 5);
        let stride_before = scratch.row_stride(5);
        scratch.ensure_capacity(4, 2);
        // Capacity-wise the table stays at least as big as before.
        assert_eq!(scratch.row_stride(5), stride_before);
    }

    #[test]
    fn child_row_matches_hand_computed_recurrence() {
        let penalty = PenaltyModel::identity();
        let query = b"ct";
        let parent_row = [0.0f32, 1.0, 2.0];
        let mut child_row = [0.0f32; 3];
        let (min, dist) =
            compute_child_row(&parent_row, &mut child_row, b'c', query, &penalty);
        // C[0] = P[0] + insert('c') = 0 + 1 = 1
        assert_eq!(child_row[0], 1.0);
        // C[1] = min(P[1]+ins, C[0]+del('c'), P[0]+sub('c','c')) = min(2,2,0) = 0
        assert_eq!(child_row[1], 0.0);
        // C[2] = min(P[2]+ins, C[1]+del('t'), P[1]+sub('c','t')) = min(3,1,2) = 1
        assert_eq!(child_row[2], 1.0);
        assert_eq!(dist, 1.0);
        assert_eq!(min, 0.0);
    }
}
