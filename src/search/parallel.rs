//! The parallel best-first search (§4.5): a work-stealing pool of workers
//! draining a shared queue, each maintaining a thread-local top-`n` heap
//! and pruning against a monotonically shrinking global bound.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicIsize, AtomicU32, Ordering};
use std::sync::Mutex;

use crossbeam::utils::CachePadded;

use crate::penalty::PenaltyModel;
use crate::search::scratch::{compute_child_row, Scratch};
use crate::search::topn::TopN;
use crate::stats::StatsSink;
use crate::trie::{NodeIndex, VectorizedTrie};

/// A donation threshold chosen to match the original: a worker only
/// offloads to the global queue once its local backlog is large enough
/// that the lock round-trip is worth it.
const DONATE_THRESHOLD: usize = 1024;

/// Expands `node`: computes the DP row and payload of each of its
/// children, admits leaf children to `top`, and either enqueues,
/// discards-as-pruned, or discards-as-exhausted each child. Returns the
/// number of children that will *never* be dequeued (pruned subtrees
/// counted by their full size, childless non-enqueued children counted as
/// one each) -- the bookkeeping the shutdown protocol needs.
///
/// `bound` is `Some(b)` when pruning is active and armed (the local top-n
/// heap is full); `None` disables pruning for this call, either because
/// pruning is off globally or because the heap isn't full yet.
///
/// # Safety
/// `node`'s own row must already be written (by whichever call computed
/// it as a child), and no other thread may be concurrently reading or
/// writing any child of `node` in `scratch`.
unsafe fn expand_node(
    trie: &VectorizedTrie,
    penalty: &PenaltyModel,
    scratch: &Scratch,
    query: &[u8],
    row_stride: usize,
    node: NodeIndex,
    top: &mut TopN,
    queue: &mut VecDeque<NodeIndex>,
    bound: Option<f32>,
) -> isize {
    let parent_row = scratch.row(node, row_stride);
    let node_record = *trie.node(node);
    let mut retired = 0isize;

    for child in node_record.children() {
        let child_record = *trie.node(child);
        let child_row = scratch.row_mut(child, row_stride);
        let (min_distance, distance) =
            compute_child_row(parent_row, child_row, child_record.character, query, penalty);
        scratch.set_payload(
            child,
            crate::search::scratch::Payload {
                min_distance,
                distance,
            },
        );

        if child_record.is_leaf && (!top.is_full() || distance < top.max_distance().unwrap()) {
            top.push(distance, child);
        }

        match bound {
            Some(b) if min_distance > b => {
                retired += trie.subtree_size(child) as isize;
            }
            _ => {
                if child_record.has_children() {
                    queue.push_back(child);
                } else {
                    retired += 1;
                }
            }
        }
    }

    retired
}

/// Runs the parallel best-first search over `trie` for `query`, returning
/// up to `n` `(distance, word)` pairs ascending by distance.
#[allow(clippy::too_many_arguments)]
pub fn query(
    trie: &VectorizedTrie,
    penalty: &PenaltyModel,
    scratch: &mut Scratch,
    query: &str,
    n: usize,
    threads: usize,
    pruning: bool,
    stats: Option<&dyn StatsSink>,
) -> Vec<(f32, String)> {
    let span = tracing::info_span!("query", threads, pruning, n);
    let _guard = span.enter();

    if n == 0 || trie.num_nodes() <= 1 {
        return Vec::new();
    }

    let query_bytes = query.as_bytes();
    let row_stride = query_bytes.len() + 1;
    scratch.ensure_capacity(trie.num_nodes(), query_bytes.len());

    // Single-threaded prep (§4.5 steps 1-4): root row, root's children,
    // and the initial global queue.
    {
        // SAFETY: no other thread exists yet.
        let root_row = unsafe { scratch.row_mut(trie.root_index(), row_stride) };
        root_row[0] = 0.0;
        for k in 1..=query_bytes.len() {
            root_row[k] = root_row[k - 1] + penalty.delete(query_bytes[k - 1]);
        }
    }

    let mut seed_top = TopN::new(n);
    let mut seed_queue = VecDeque::new();
    // SAFETY: no other thread exists yet; root's row was just written above.
    let prep_retired = unsafe {
        expand_node(
            trie,
            penalty,
            scratch,
            query_bytes,
            row_stride,
            trie.root_index(),
            &mut seed_top,
            &mut seed_queue,
            None,
        )
    };

    let threads = threads.max(1);
    let global_queue: Mutex<VecDeque<NodeIndex>> = Mutex::new(seed_queue);
    let global_bound = AtomicU32::new(f32::INFINITY.to_bits());
    let nodes_remaining = AtomicIsize::new(trie.num_nodes() as isize - 1 - prep_retired);
    let needs_work: Vec<CachePadded<AtomicBool>> = (0..threads)
        .map(|_| CachePadded::new(AtomicBool::new(false)))
        .collect();
    let result = Mutex::new(seed_top);

    std::thread::scope(|scope| {
        for t in 0..threads {
            let global_queue = &global_queue;
            let global_bound = &global_bound;
            let nodes_remaining = &nodes_remaining;
            let needs_work = &needs_work;
            let result = &result;
            let trie = &*trie;
            let penalty = &*penalty;
            let scratch: &Scratch = &*scratch;

            scope.spawn(move || {
                let mut local_queue: VecDeque<NodeIndex> = VecDeque::new();
                let mut local_top = TopN::new(n);
                let mut local_done: isize = 0;

                loop {
                    if local_queue.is_empty() {
                        let mut guard = global_queue.lock().unwrap();
                        match guard.pop_front() {
                            Some(node) => {
                                local_queue.push_back(node);
                                drop(guard);
                            }
                            None => {
                                drop(guard);
                                if local_done != 0 {
                                    let missing = nodes_remaining
                                        .fetch_sub(local_done, Ordering::Relaxed)
                                        - local_done;
                                    local_done = 0;
                                    if missing <= 0 {
                                        break;
                                    }
                                } else if nodes_remaining.load(Ordering::Relaxed) <= 0 {
                                    break;
                                }
                                needs_work[(t + 1) % threads].store(true, Ordering::Relaxed);
                                continue;
                            }
                        }
                    }

                    while let Some(current) = local_queue.pop_front() {
                        let bound = if pruning && local_top.is_full() {
                            let local_max = local_top.max_distance().unwrap();
                            let global = f32::from_bits(global_bound.load(Ordering::Relaxed));
                            if local_max < global {
                                global_bound.store(local_max.to_bits(), Ordering::Relaxed);
                            }
                            Some(global.min(local_max))
                        } else {
                            None
                        };

                        // SAFETY: `current` was enqueued only after its own
                        // row was written by the worker that expanded its
                        // parent, and the work-queue discipline guarantees
                        // no other thread is touching `current`'s children
                        // concurrently (each node is enqueued at most once).
                        let retired = unsafe {
                            expand_node(
                                trie,
                                penalty,
                                scratch,
                                query_bytes,
                                row_stride,
                                current,
                                &mut local_top,
                                &mut local_queue,
                                bound,
                            )
                        };
                        local_done += 1 + retired;

                        if local_queue.len() > DONATE_THRESHOLD
                            && needs_work[t].load(Ordering::Relaxed)
                        {
                            let mut guard = global_queue.lock().unwrap();
                            let half = local_queue.len() / 2;
                            for _ in 0..half {
                                if let Some(node) = local_queue.pop_front() {
                                    guard.push_back(node);
                                }
                            }
                            drop(guard);
                            needs_work[t].store(false, Ordering::Relaxed);
                        }
                    }
                }

                result.lock().unwrap().merge(local_top);
            });
        }
    });

    if let Some(sink) = stats {
        sink.record_counter("num_nodes", &trie.num_nodes().to_string());
    }

    let top = result.into_inner().unwrap();
    let results: Vec<(f32, String)> = top
        .into_sorted()
        .into_iter()
        .map(|(distance, node)| (distance, trie.word_at(node)))
        .collect();
    tracing::debug!(results = results.len(), "parallel query finished");
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trie::BuilderTrie;
    use crate::word::Word;

    fn build(words: &[&str]) -> VectorizedTrie {
        let builder = BuilderTrie::new();
        let ws: Vec<Word> = words.iter().map(|s| Word::new(s).unwrap()).collect();
        builder.insert_all(&ws);
        VectorizedTrie::from_builder(&builder)
    }

    #[test]
    fn finds_exact_match() {
        let trie = build(&["cat", "car", "bat"]);
        let penalty = PenaltyModel::identity();
        let mut scratch = Scratch::new();
        let results = query(&trie, &penalty, &mut scratch, "cat", 1, 2, true, None);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].1, "cat");
        assert!(results[0].0 < 1e-6);
    }

    #[test]
    fn single_character_word_is_found() {
        let trie = build(&["a", "ab", "abc"]);
        let penalty = PenaltyModel::identity();
        let mut scratch = Scratch::new();
        let results = query(&trie, &penalty, &mut scratch, "a", 1, 2, true, None);
        assert_eq!(results[0], (0.0, "a".to_string()));
    }

    #[test]
    fn n_larger_than_dictionary_returns_everything() {
        let trie = build(&["cat", "car", "bat"]);
        let penalty = PenaltyModel::identity();
        let mut scratch = Scratch::new();
        let results = query(&trie, &penalty, &mut scratch, "x", 1_000_000, 4, true, None);
        assert_eq!(results.len(), 3);
    }

    #[test]
    fn zero_n_returns_empty() {
        let trie = build(&["cat"]);
        let penalty = PenaltyModel::identity();
        let mut scratch = Scratch::new();
        let results = query(&trie, &penalty, &mut scratch, "cat", 0, 2, true, None);
        assert!(results.is_empty());
    }

    #[test]
    fn pruning_on_and_off_agree() {
        let trie = build(&["cat", "car", "bat", "bad", "cart", "card", "cab"]);
        let penalty = PenaltyModel::identity();

        let mut scratch_a = Scratch::new();
        let with_pruning = query(&trie, &penalty, &mut scratch_a, "cat", 3, 4, true, None);

        let mut scratch_b = Scratch::new();
        let without_pruning = query(&trie, &penalty, &mut scratch_b, "cat", 3, 4, false, None);

        let distances_a: Vec<f32> = with_pruning.iter().map(|(d, _)| *d).collect();
        let distances_b: Vec<f32> = without_pruning.iter().map(|(d, _)| *d).collect();
        assert_eq!(distances_a, distances_b);
    }

    #[test]
    fn results_are_sorted_ascending() {
        let trie = build(&["cat", "car", "bat", "bad", "cart", "card", "cab", "cot"]);
        let penalty = PenaltyModel::identity();
        let mut scratch = Scratch::new();
        let results = query(&trie, &penalty, &mut scratch, "cat", 5, 4, true, None);
        for w in results.windows(2) {
            assert!(w[0].0 <= w[1].0);
        }
    }
}
