//! Concurrent construction of the prefix trie from a word list.
//!
//! Mirrors the structure of the original `ParallelTrie`: a fixed 128-slot
//! array of atomic child pointers per node, filled by a CAS race across
//! `rayon`-partitioned chunks of the input word list. The loser of a race
//! simply drops its speculative node and follows the winner.

use std::sync::atomic::{AtomicBool, AtomicPtr, Ordering};

use rayon::prelude::*;

use crate::word::Word;

const CHAR_SLOTS: usize = 128;

/// A node in the concurrently-built trie. Owned by the arena in
/// [`BuilderTrie`]; child slots are atomic pointers into other arena
/// entries, `null` until claimed.
pub struct BuilderNode {
    pub character: u8,
    pub leaf: AtomicBool,
    pub parent: *const BuilderNode,
    children: [AtomicPtr<BuilderNode>; CHAR_SLOTS],
}

// SAFETY: `BuilderNode` is only ever shared behind the arena's `Box`
// allocations, which are never moved or freed while workers hold raw
// pointers to them; the `parent` pointer is only read, and the atomics make
// concurrent reads/writes to `children`/`leaf` data-race free.
unsafe impl Sync for BuilderNode {}
unsafe impl Send for BuilderNode {}

impl BuilderNode {
    /// Read-only snapshot of child slot `i`, used by the BFS renumbering
    /// pass in [`crate::trie::vectorized`].
    pub(crate) fn child_ptr(&self, i: usize) -> *const BuilderNode {
        self.children[i].load(Ordering::Acquire) as *const BuilderNode
    }

    fn new(parent: *const BuilderNode, character: u8) -> Self {
        BuilderNode {
            character,
            leaf: AtomicBool::new(false),
            parent,
            children: std::array::from_fn(|_| AtomicPtr::new(std::ptr::null_mut())),
        }
    }
}

/// Owns every node ever allocated during construction, so arena pointers
/// stay valid for the whole build even as workers race to claim slots.
struct Arena {
    nodes: Vec<Box<BuilderNode>>,
}

impl Arena {
    fn new() -> Self {
        Arena { nodes: Vec::new() }
    }
}

/// The mutable, concurrently-populated trie. Discarded once a
/// [`crate::trie::vectorized::VectorizedTrie`] has been materialized from
/// it.
pub struct BuilderTrie {
    root: Box<BuilderNode>,
    // Nodes allocated by workers during insertion; owns them so raw
    // pointers handed out by `insert` remain valid.
    arena: std::sync::Mutex<Arena>,
    /// Count of CAS races lost (an allocated node discarded in favor of a
    /// concurrent winner). Observability only, never affects output.
    pub collisions: std::sync::atomic::AtomicUsize,
}

impl BuilderTrie {
    pub fn new() -> Self {
        BuilderTrie {
            root: Box::new(BuilderNode::new(std::ptr::null(), 0)),
            arena: std::sync::Mutex::new(Arena::new()),
            collisions: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    pub fn root(&self) -> &BuilderNode {
        &self.root
    }

    /// Inserts every word in `words` concurrently. Safe to call once per
    /// trie; the original's "collisions" stat is tracked but not required
    /// for correctness.
    pub fn insert_all(&self, words: &[Word]) {
        // Partition across a rayon work-stealing pool, one chunk per
        // spawned task rather than a hand-rolled thread partitioner --
        // the idiomatic replacement for the source's `#pragma omp for`.
        let chunk_size = (words.len() / rayon::current_num_threads().max(1)).max(1);
        words.par_chunks(chunk_size).for_each(|chunk| {
            for word in chunk {
                self.insert_one(word);
            }
        });
    }

    fn insert_one(&self, word: &Word) {
        let mut current: *const BuilderNode = &*self.root;
        for &byte in word.as_bytes() {
            current = self.descend(current, byte);
        }
        // SAFETY: `current` always points into a `Box` owned by `arena` or
        // `self.root`, both alive for `self`'s lifetime.
        unsafe {
            (*current).leaf.store(true, Ordering::Relaxed);
        }
    }

    /// Returns the child of `node` for `byte`, allocating and racing a CAS
    /// if it doesn't exist yet.
    fn descend(&self, node: *const BuilderNode, byte: u8) -> *const BuilderNode {
        debug_assert!((byte as usize) < CHAR_SLOTS);
        // SAFETY: see `insert_one`.
        let slot = unsafe { &(*node).children[byte as usize] };

        let existing = slot.load(Ordering::Acquire);
        if !existing.is_null() {
            return existing;
        }

        let mut new_node = Box::new(BuilderNode::new(node, byte));
        let new_ptr: *mut BuilderNode = &mut *new_node;

        match slot.compare_exchange(
            std::ptr::null_mut(),
            new_ptr,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => {
                // We won the race; the arena now owns the allocation and
                // keeps it alive for the rest of construction.
                self.arena.lock().unwrap().nodes.push(new_node);
                new_ptr
            }
            Err(winner) => {
                // We lost; `new_node` is dropped here, discarding our
                // speculative allocation.
                self.collisions.fetch_add(1, Ordering::Relaxed);
                winner
            }
        }
    }
}

impl Default for BuilderTrie {
    fn default() -> Self {
        Self::new()
    }
}
