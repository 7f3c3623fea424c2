//! Node storage: a fixed window of sorted keys inside a per-node slot array,
//! plus the links that stitch nodes into a tree and into the successor chain.
//!
//! Nodes live in the tree's arena (`Vec<Node>`) and name each other through
//! [`NodeIdx`]. The child links own their subtree in the sense that a slot is
//! only reachable through them; `parent` and `successor` are back-references.
//! Released slots are chained into a free list through their `parent` field
//! and get reused by later insertions.

use std::ops::{Index, IndexMut};

use crate::{Keyed, Ttree};

/// Index of a node in the tree's arena. `usize::MAX` means "no node".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NodeIdx(pub(crate) usize);

impl Default for NodeIdx {
    fn default() -> Self {
        Self::NONE
    }
}

impl NodeIdx {
    pub(crate) const NONE: NodeIdx = NodeIdx(usize::MAX);

    #[inline]
    pub(crate) fn exists(self) -> bool {
        self.0 != usize::MAX
    }
}

/// Which child slot of its parent a node occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeSide {
    Root,
    Left,
    Right,
}

impl NodeSide {
    #[inline]
    pub(crate) fn flip(self) -> NodeSide {
        match self {
            NodeSide::Left => NodeSide::Right,
            NodeSide::Right => NodeSide::Left,
            NodeSide::Root => NodeSide::Root,
        }
    }

    /// Contribution of a subtree on this side to its parent's balance factor.
    #[inline]
    pub(crate) fn bfc_delta(self) -> i8 {
        match self {
            NodeSide::Left => -1,
            NodeSide::Right => 1,
            NodeSide::Root => 0,
        }
    }
}

/// A single T*-tree node.
///
/// `keys` is one allocation of `M` slots; the live keys occupy the contiguous
/// window `[min_idx, max_idx]`, sorted ascending. Slots outside the window
/// are `None`. An empty window is expressed as `min_idx == max_idx + 1`.
#[derive(Debug, Clone)]
pub(crate) struct Node<V> {
    keys: Box<[Option<V>]>,
    pub(crate) min_idx: usize,
    pub(crate) max_idx: usize,
    pub(crate) parent: NodeIdx,
    pub(crate) left: NodeIdx,
    pub(crate) right: NodeIdx,
    pub(crate) successor: NodeIdx,
    /// `height(right) - height(left)`; `-1..=1` except mid-rebalance.
    pub(crate) bfc: i8,
    pub(crate) side: NodeSide,
}

impl<V> Node<V> {
    pub(crate) fn empty(capacity: usize) -> Self {
        let mut keys = Vec::with_capacity(capacity);
        keys.resize_with(capacity, || None);

        Node {
            keys: keys.into_boxed_slice(),
            min_idx: 1,
            max_idx: 0,
            parent: NodeIdx::NONE,
            left: NodeIdx::NONE,
            right: NodeIdx::NONE,
            successor: NodeIdx::NONE,
            bfc: 0,
            side: NodeSide::Root,
        }
    }

    #[inline]
    pub(crate) fn key_count(&self) -> usize {
        if self.min_idx > self.max_idx {
            0
        } else {
            self.max_idx - self.min_idx + 1
        }
    }

    #[inline]
    pub(crate) fn window_empty(&self) -> bool {
        self.min_idx > self.max_idx
    }

    #[inline]
    pub(crate) fn is_full(&self, keys_per_node: usize) -> bool {
        self.key_count() == keys_per_node
    }

    #[inline]
    pub(crate) fn is_leaf(&self) -> bool {
        !self.left.exists() && !self.right.exists()
    }

    #[inline]
    pub(crate) fn is_internal(&self) -> bool {
        self.left.exists() && self.right.exists()
    }

    /// Exactly one child.
    #[inline]
    pub(crate) fn is_half_leaf(&self) -> bool {
        self.left.exists() != self.right.exists()
    }

    #[inline]
    pub(crate) fn child(&self, side: NodeSide) -> NodeIdx {
        match side {
            NodeSide::Left => self.left,
            NodeSide::Right => self.right,
            NodeSide::Root => unreachable!("a node has no root-side child"),
        }
    }

    pub(crate) fn set_child(&mut self, side: NodeSide, child: NodeIdx) {
        match side {
            NodeSide::Left => self.left = child,
            NodeSide::Right => self.right = child,
            NodeSide::Root => unreachable!("a node has no root-side child"),
        }
    }

    #[inline]
    pub(crate) fn item(&self, idx: usize) -> &V {
        self.keys[idx].as_ref().unwrap()
    }

    /// Item at `idx` if that slot is inside the live window.
    pub(crate) fn item_checked(&self, idx: usize) -> Option<&V> {
        self.keys.get(idx)?.as_ref()
    }

    pub(crate) fn set(&mut self, idx: usize, item: V) {
        debug_assert!(self.keys[idx].is_none(), "slot {idx} already holds a key");
        self.keys[idx] = Some(item);
    }

    pub(crate) fn take(&mut self, idx: usize) -> V {
        self.keys[idx].take().unwrap()
    }

    pub(crate) fn swap_item(&mut self, idx: usize, item: V) -> V {
        self.keys[idx].replace(item).unwrap()
    }
}

impl<V: Keyed> Node<V> {
    #[inline]
    pub(crate) fn key(&self, idx: usize) -> &V::Key {
        self.item(idx).key()
    }

    #[inline]
    pub(crate) fn min_key(&self) -> &V::Key {
        self.key(self.min_idx)
    }

    #[inline]
    pub(crate) fn max_key(&self) -> &V::Key {
        self.key(self.max_idx)
    }

    /// Open a slot at `*idx`, growing the window toward whichever end has
    /// more free capacity (ties grow right). Keys between the slot and the
    /// chosen end shift by one; `*idx` is rewritten to the freed slot.
    ///
    /// The node must not be full.
    pub(crate) fn grow_window(&mut self, keys_per_node: usize, idx: &mut usize) {
        debug_assert!(!self.is_full(keys_per_node));
        debug_assert!(*idx >= self.min_idx && *idx <= self.max_idx + 1);

        if keys_per_node - 1 - self.max_idx >= self.min_idx {
            self.max_idx += 1;
            let mut i = self.max_idx;
            while i > *idx {
                self.keys[i] = self.keys[i - 1].take();
                i -= 1;
            }
        } else {
            // Growing left: there is strictly more room on the left, so
            // min_idx >= 1 and the slot below *idx exists.
            *idx -= 1;
            self.min_idx -= 1;
            let mut i = self.min_idx;
            while i < *idx {
                self.keys[i] = self.keys[i + 1].take();
                i += 1;
            }
        }
    }

    /// Close the (already emptied) slot at `*idx`, contracting the window on
    /// its shorter side. Afterwards `*idx` names the slot of the next
    /// greater key, which may be one past the window when the maximum was
    /// removed.
    pub(crate) fn shrink_window(&mut self, keys_per_node: usize, idx: &mut usize) {
        debug_assert!(self.keys[*idx].is_none());

        if keys_per_node - 1 - self.max_idx <= self.min_idx {
            for i in *idx..self.max_idx {
                self.keys[i] = self.keys[i + 1].take();
            }
            self.max_idx -= 1;
        } else {
            let mut i = *idx;
            while i > self.min_idx {
                self.keys[i] = self.keys[i - 1].take();
                i -= 1;
            }
            self.min_idx += 1;
            *idx += 1;
        }
    }

    /// Binary search over the slots `lo..hi`. On a miss the returned index
    /// is where the key would be inserted.
    pub(crate) fn search(&self, key: &V::Key, lo: usize, hi: usize) -> Result<usize, usize> {
        let mut floor = lo;
        let mut ceil = hi;

        while floor < ceil {
            let mid = (floor + ceil) >> 1;
            match key.cmp(self.key(mid)) {
                std::cmp::Ordering::Less => ceil = mid,
                std::cmp::Ordering::Greater => floor = mid + 1,
                std::cmp::Ordering::Equal => return Ok(mid),
            }
        }

        Err(floor)
    }
}

impl<V: Keyed> Index<NodeIdx> for Ttree<V> {
    type Output = Node<V>;

    fn index(&self, idx: NodeIdx) -> &Node<V> {
        &self.nodes[idx.0]
    }
}

impl<V: Keyed> IndexMut<NodeIdx> for Ttree<V> {
    fn index_mut(&mut self, idx: NodeIdx) -> &mut Node<V> {
        &mut self.nodes[idx.0]
    }
}

impl<V: Keyed> Ttree<V> {
    /// Fetch a fresh node slot, reusing a released one when available.
    pub(crate) fn alloc_node(&mut self) -> NodeIdx {
        if self.free_head.exists() {
            let idx = self.free_head;
            self.free_head = self[idx].parent;

            let node = &mut self[idx];
            node.min_idx = 1;
            node.max_idx = 0;
            node.parent = NodeIdx::NONE;
            node.left = NodeIdx::NONE;
            node.right = NodeIdx::NONE;
            node.successor = NodeIdx::NONE;
            node.bfc = 0;
            node.side = NodeSide::Root;
            idx
        } else {
            self.nodes.push(Node::empty(self.keys_per_node));
            NodeIdx(self.nodes.len() - 1)
        }
    }

    /// Return an emptied node's slot to the free list.
    pub(crate) fn release_node(&mut self, idx: NodeIdx) {
        debug_assert!(self[idx].window_empty());

        let head = self.free_head;
        let node = &mut self[idx];
        node.left = NodeIdx::NONE;
        node.right = NodeIdx::NONE;
        node.successor = NodeIdx::NONE;
        node.parent = head;
        self.free_head = idx;
    }

    /// Deepest node reached by walking only `side` links from `n`.
    pub(crate) fn sidemost(&self, n: NodeIdx, side: NodeSide) -> NodeIdx {
        if !n.exists() {
            return NodeIdx::NONE;
        }

        let mut cur = n;
        while self[cur].child(side).exists() {
            cur = self[cur].child(side);
        }
        cur
    }

    /// Greatest lower bound of `n`: the rightmost node of its left subtree,
    /// holding the key immediately below `n`'s minimum.
    pub(crate) fn glb_of(&self, n: NodeIdx) -> NodeIdx {
        if !n.exists() || !self[n].left.exists() {
            return NodeIdx::NONE;
        }
        self.sidemost(self[n].left, NodeSide::Right)
    }
}
