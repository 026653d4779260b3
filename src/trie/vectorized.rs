//! The read-only, cache-friendly trie the search engine actually walks.
//!
//! Produced once, by a single BFS over the [`BuilderTrie`], renumbering
//! nodes so that every node's children occupy a contiguous index range.

use std::collections::VecDeque;

use crate::trie::builder::{BuilderNode, BuilderTrie};

pub type NodeIndex = u32;

/// A single node record in the flattened array. `children_begin..children_end`
/// is always a sub-range of `(index, nodes.len())`.
#[derive(Debug, Clone, Copy)]
pub struct Node {
    pub character: u8,
    pub is_leaf: bool,
    pub parent: NodeIndex,
    pub children_begin: NodeIndex,
    pub children_end: NodeIndex,
}

impl Node {
    #[inline]
    pub fn children(&self) -> std::ops::Range<NodeIndex> {
        self.children_begin..self.children_end
    }

    #[inline]
    pub fn has_children(&self) -> bool {
        self.children_begin < self.children_end
    }
}

/// Precomputed, per-node metadata that does not depend on any query:
/// how many nodes are in the subtree rooted here (including itself).
/// Used only for early-break bookkeeping when a subtree is pruned.
pub struct SubtreeSizes(Vec<u32>);

impl SubtreeSizes {
    #[inline]
    pub fn get(&self, index: NodeIndex) -> u32 {
        self.0[index as usize]
    }
}

pub struct VectorizedTrie {
    nodes: Vec<Node>,
    subtree_sizes: SubtreeSizes,
}

impl VectorizedTrie {
    /// Performs the single BFS renumbering pass over `builder`, root first.
    pub fn from_builder(builder: &BuilderTrie) -> Self {
        let mut nodes = Vec::new();
        // index assigned to each BuilderNode pointer, in visitation order.
        let mut index_of: std::collections::HashMap<*const BuilderNode, NodeIndex> =
            std::collections::HashMap::new();

        let root = builder.root();
        index_of.insert(root as *const BuilderNode, 0);
        nodes.push(Node {
            character: 0,
            is_leaf: root.leaf.load(std::sync::atomic::Ordering::Relaxed),
            parent: 0,
            children_begin: 0,
            children_end: 0,
        });

        let mut queue: VecDeque<*const BuilderNode> = VecDeque::new();
        queue.push_back(root);

        while let Some(node_ptr) = queue.pop_front() {
            // SAFETY: pointers in `queue` always originate from `builder`'s
            // arena, which outlives this function.
            let node = unsafe { &*node_ptr };
            let current_index = index_of[&node_ptr];

            let children: Vec<*const BuilderNode> = node
                .children_ptrs()
                .into_iter()
                .filter(|p| !p.is_null())
                .collect();

            if children.is_empty() {
                continue;
            }

            let begin = nodes.len() as NodeIndex;
            for &child_ptr in &children {
                let child_index = nodes.len() as NodeIndex;
                index_of.insert(child_ptr, child_index);
                // SAFETY: see above.
                let child = unsafe { &*child_ptr };
                nodes.push(Node {
                    character: child.character,
                    is_leaf: child.leaf.load(std::sync::atomic::Ordering::Relaxed),
                    parent: current_index,
                    children_begin: 0,
                    children_end: 0,
                });
                queue.push_back(child_ptr);
            }
            let end = nodes.len() as NodeIndex;
            nodes[current_index as usize].children_begin = begin;
            nodes[current_index as usize].children_end = end;
        }

        let subtree_sizes = compute_subtree_sizes(&nodes);
        tracing::debug!(num_nodes = nodes.len(), "vectorized trie built");
        VectorizedTrie {
            nodes,
            subtree_sizes,
        }
    }

    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn node(&self, index: NodeIndex) -> &Node {
        &self.nodes[index as usize]
    }

    #[inline]
    pub fn root_index(&self) -> NodeIndex {
        0
    }

    #[inline]
    pub fn subtree_size(&self, index: NodeIndex) -> u32 {
        self.subtree_sizes.get(index)
    }

    /// Recovers the word spelled by the root-to-`index` path, `O(depth)`.
    pub fn word_at(&self, mut index: NodeIndex) -> String {
        let mut bytes = Vec::new();
        while index != 0 {
            let node = self.node(index);
            bytes.push(node.character);
            index = node.parent;
        }
        bytes.reverse();
        String::from_utf8(bytes).expect("trie words are validated ASCII")
    }
}

/// `subtree_size[v] = 1 + sum(subtree_size[child])`, computed bottom-up in
/// one reverse linear pass: BFS order guarantees every child has a strictly
/// larger index than its parent, so processing indices from the end
/// backwards sees every child before its parent.
fn compute_subtree_sizes(nodes: &[Node]) -> SubtreeSizes {
    let mut sizes = vec![1u32; nodes.len()];
    for i in (0..nodes.len()).rev() {
        let size = sizes[i];
        if i != 0 {
            let parent = nodes[i].parent as usize;
            sizes[parent] += size;
        }
    }
    SubtreeSizes(sizes)
}

impl BuilderNode {
    /// Snapshot of the 128 child slots as raw pointers, for the sequential
    /// BFS pass that builds the vectorized trie.
    fn children_ptrs(&self) -> [*const BuilderNode; 128] {
        std::array::from_fn(|i| self.child_ptr(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::word::Word;

    fn vectorize(words: &[&str]) -> VectorizedTrie {
        let builder = BuilderTrie::new();
        let ws: Vec<Word> = words.iter().map(|s| Word::new(s).unwrap()).collect();
        builder.insert_all(&ws);
        VectorizedTrie::from_builder(&builder)
    }

    #[test]
    fn root_is_index_zero_and_not_leaf() {
        let trie = vectorize(&["cat"]);
        assert_eq!(trie.root_index(), 0);
        assert!(!trie.node(0).is_leaf);
    }

    #[test]
    fn children_occupy_contiguous_range() {
        let trie = vectorize(&["cat", "car", "bat"]);
        for i in 0..trie.num_nodes() as NodeIndex {
            let node = trie.node(i);
            if node.has_children() {
                assert!(node.children_begin > i);
                assert!(node.children_end > node.children_begin);
                assert!(node.children_end as usize <= trie.num_nodes());
            }
        }
    }

    #[test]
    fn word_recovery_matches_input() {
        let trie = vectorize(&["cat", "car", "bat"]);
        let mut recovered = Vec::new();
        for i in 0..trie.num_nodes() as NodeIndex {
            if trie.node(i).is_leaf {
                recovered.push(trie.word_at(i));
            }
        }
        recovered.sort();
        assert_eq!(recovered, vec!["bat", "car", "cat"]);
    }

    #[test]
    fn subtree_sizes_sum_correctly() {
        let trie = vectorize(&["cat", "car", "bat"]);
        // root's subtree size is the whole trie.
        assert_eq!(trie.subtree_size(0) as usize, trie.num_nodes());
    }

    #[test]
    fn parent_index_always_less_than_own() {
        let trie = vectorize(&["cat", "car", "bat", "cats", "ca"]);
        for i in 1..trie.num_nodes() as NodeIndex {
            assert!(trie.node(i).parent < i);
        }
    }
}
