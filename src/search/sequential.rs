//! Single-threaded fallback (§4.6): identical DP recurrence and pruning
//! bound as the parallel search, just one FIFO and one heap, used when
//! `threads == 1` and as a cross-check oracle in tests and benchmarks.

use std::collections::VecDeque;

use crate::penalty::PenaltyModel;
use crate::search::scratch::{compute_child_row, Payload, Scratch};
use crate::search::topn::TopN;
use crate::trie::{NodeIndex, VectorizedTrie};
use crate::word::Word;

pub fn query(
    trie: &VectorizedTrie,
    penalty: &PenaltyModel,
    scratch: &mut Scratch,
    query: &str,
    n: usize,
    pruning: bool,
) -> Vec<(f32, String)> {
    if n == 0 || trie.num_nodes() <= 1 {
        return Vec::new();
    }

    let query_bytes = query.as_bytes();
    let row_stride = query_bytes.len() + 1;
    scratch.ensure_capacity(trie.num_nodes(), query_bytes.len());

    // SAFETY: single-threaded, no concurrent access is possible.
    let root_row = unsafe { scratch.row_mut(trie.root_index(), row_stride) };
    root_row[0] = 0.0;
    for k in 1..=query_bytes.len() {
        root_row[k] = root_row[k - 1] + penalty.delete(query_bytes[k - 1]);
    }

    let mut top = TopN::new(n);
    let mut queue: VecDeque<NodeIndex> = VecDeque::new();
    queue.push_back(trie.root_index());

    while let Some(current) = queue.pop_front() {
        let bound = if pruning && top.is_full() {
            top.max_distance()
        } else {
            None
        };

        // SAFETY: single-threaded; `current`'s row was written before it
        // was enqueued.
        let parent_row = unsafe { scratch.row(current, row_stride) };
        let node = *trie.node(current);

        for child in node.children() {
            let child_record = *trie.node(child);
            // SAFETY: single-threaded, disjoint from `parent_row`.
            let child_row = unsafe { scratch.row_mut(child, row_stride) };
            let (min_distance, distance) = compute_child_row(
                parent_row,
                child_row,
                child_record.character,
                query_bytes,
                penalty,
            );
            unsafe {
                scratch.set_payload(
                    child,
                    Payload {
                        min_distance,
                        distance,
                    },
                );
            }

            if child_record.is_leaf && (!top.is_full() || distance < top.max_distance().unwrap())
            {
                top.push(distance, child);
            }

            let pruned = matches!(bound, Some(b) if min_distance > b);
            if !pruned && child_record.has_children() {
                queue.push_back(child);
            }
        }
    }

    top.into_sorted()
        .into_iter()
        .map(|(distance, node)| (distance, trie.word_at(node)))
        .collect()
}

/// Classic word-against-query edit distance, `O(|w| * |q|)`, used only to
/// build the brute-force oracle below. Mirrors the plain DP table the
/// vectorized search runs one row at a time, but laid out densely for a
/// single word instead of amortized across a trie.
fn edit_distance(word: &[u8], query: &[u8], penalty: &PenaltyModel) -> f32 {
    let rows = word.len() + 1;
    let cols = query.len() + 1;
    let mut table = vec![0.0f32; rows * cols];

    for i in 1..rows {
        table[i * cols] = table[(i - 1) * cols] + penalty.insert(word[i - 1]);
    }
    for j in 1..cols {
        table[j] = table[j - 1] + penalty.delete(query[j - 1]);
    }
    for i in 1..rows {
        for j in 1..cols {
            let via_insert = table[(i - 1) * cols + j] + penalty.insert(word[i - 1]);
            let via_delete = table[i * cols + j - 1] + penalty.delete(query[j - 1]);
            let via_substitute =
                table[(i - 1) * cols + j - 1] + penalty.substitute(word[i - 1], query[j - 1]);
            table[i * cols + j] = via_insert.min(via_delete).min(via_substitute);
        }
    }
    table[rows * cols - 1]
}

/// Exhaustive, full-dictionary scan: every word's distance to `query`
/// computed independently and folded into a top-`n` list. Used as the
/// ground truth the accelerated search is checked against, never on the
/// engine's hot path.
pub fn naive_oracle(
    words: &[Word],
    penalty: &PenaltyModel,
    query: &str,
    n: usize,
) -> Vec<(f32, String)> {
    use rayon::prelude::*;

    if n == 0 {
        return Vec::new();
    }
    let query_bytes = query.as_bytes();

    let mut scored: Vec<(f32, String)> = words
        .par_iter()
        .map(|w| {
            (
                edit_distance(w.as_bytes(), query_bytes, penalty),
                w.to_string_lossy(),
            )
        })
        .collect();
    scored.sort_by(|a, b| a.0.total_cmp(&b.0));
    scored.truncate(n);
    scored
}
