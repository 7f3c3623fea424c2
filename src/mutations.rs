//! Insertion, removal and the balance bookkeeping around them.
//!
//! Both mutations bottom out in node-local window edits. Only when a window
//! overflows (insert) or drains below the low-water mark (remove) does the
//! structure change: a new leaf appears or an emptied leaf goes away, and a
//! fixup walk carries the height change upward, rotating where a balance
//! factor reaches 2. Insertion needs at most one rotation; deletion may
//! rotate at several levels on the way up.
//!
//! The successor chain is maintained at the same two points, since leaves
//! are the only nodes that are ever attached or detached.

use smallvec::SmallVec;

use crate::cursor::{Cursor, CursorSide, CursorState};
use crate::node::{NodeIdx, NodeSide};
use crate::{DuplicateKey, Keyed, NotFound, Ttree, DEFAULT_KEYS_PER_NODE};

impl<V: Keyed> Ttree<V> {
    /// Insert an item.
    ///
    /// On a unique-key tree an item whose key is already stored is handed
    /// back inside [`DuplicateKey`]. Without unique keys equal items
    /// coexist; the newest lands immediately before its equals in iteration
    /// order.
    pub fn insert(&mut self, item: V) -> Result<(), DuplicateKey<V>> {
        let mut cursor = self.seek(item.key());
        if cursor.is_opened() && self.unique {
            return Err(DuplicateKey(item));
        }

        self.insert_at(&mut cursor, item);
        Ok(())
    }

    /// Insert an item at a position previously produced by
    /// [`seek`](Ttree::seek) (or any cursor on an empty tree), skipping the
    /// descent. The cursor ends up opened on the inserted item, surviving
    /// any rotations the insertion triggers.
    ///
    /// The item must sort where the cursor says it does; inserting through
    /// a closed cursor is a programmer error.
    pub fn insert_at(&mut self, cursor: &mut Cursor, item: V) {
        assert!(
            cursor.state != CursorState::Closed,
            "insert through a closed cursor"
        );

        self.len += 1;
        if !self.root.exists() {
            let slot = self.first_slot();
            let root = self.alloc_node();
            let node = &mut self[root];
            node.set(slot, item);
            node.min_idx = slot;
            node.max_idx = slot;
            self.root = root;
            *cursor = Cursor::opened(root, slot);
            return;
        }

        let m = self.keys_per_node;
        let mut item = item;
        let mut at_node = cursor.node;
        let mut side = cursor.side;
        let mut slot = cursor.idx;

        if cursor.side == CursorSide::Bound {
            let n = cursor.node;
            if !self[n].is_full(m) {
                self[n].grow_window(m, &mut cursor.idx);
                self[n].set(cursor.idx, item);
                cursor.state = CursorState::Opened;
                return;
            }

            // The node is full: its maximum key makes way for the new one
            // and becomes the key to place, preferably in the successor.
            // The caller's cursor keeps tracking the key that was asked
            // for; only the displaced maximum travels on.
            let max_idx = self[n].max_idx;
            let displaced = self[n].take(max_idx);
            self[n].max_idx -= 1;
            self[n].grow_window(m, &mut cursor.idx);
            self[n].set(cursor.idx, item);
            cursor.state = CursorState::Opened;
            item = displaced;

            if !self[n].successor.exists() || !self[n].right.exists() {
                side = CursorSide::Right;
                slot = self.first_slot();
                at_node = n;
            } else {
                let succ = self[n].successor;
                if self[succ].is_full(m) {
                    // No room anywhere nearby: the displaced key gets a new
                    // leaf left of the successor, which cannot have a left
                    // child of its own.
                    side = CursorSide::Left;
                    slot = self.first_slot();
                    at_node = succ;
                } else {
                    let mut idx = self[succ].min_idx;
                    self[succ].grow_window(m, &mut idx);
                    self[succ].set(idx, item);
                    return;
                }
            }
        }

        // A fresh leaf hangs off `at_node`.
        let node_side = match side {
            CursorSide::Left => NodeSide::Left,
            CursorSide::Right => NodeSide::Right,
            CursorSide::Bound => unreachable!("bound insertions are handled above"),
        };
        let leaf = self.alloc_node();
        {
            let node = &mut self[leaf];
            node.set(slot, item);
            node.min_idx = slot;
            node.max_idx = slot;
            node.parent = at_node;
            node.side = node_side;
        }
        self[at_node].set_child(node_side, leaf);
        if cursor.state != CursorState::Opened {
            // Straight from a lookup miss onto a child slot: the new leaf
            // holds the requested key.
            *cursor = Cursor::opened(leaf, slot);
        }
        self.fixup_after_insertion(leaf, cursor);
    }

    /// Remove the item stored under `key` and return it.
    pub fn remove(&mut self, key: &V::Key) -> Option<V> {
        let mut cursor = self.seek(key);
        if !cursor.is_opened() {
            return None;
        }
        Some(self.remove_at(&mut cursor))
    }

    /// Remove the item under an opened cursor and return it. The cursor is
    /// closed; removing through a cursor in any other state is a programmer
    /// error.
    pub fn remove_at(&mut self, cursor: &mut Cursor) -> V {
        assert!(
            cursor.state == CursorState::Opened,
            "remove through a cursor that is not opened"
        );

        let m = self.keys_per_node;
        let mut tnode = cursor.node;
        let removed = self[tnode].take(cursor.idx);
        self[tnode].shrink_window(m, &mut cursor.idx);
        cursor.state = CursorState::Closed;
        self.len -= 1;
        if !self[tnode].window_empty() && cursor.idx > self[tnode].max_idx {
            cursor.idx = self[tnode].max_idx;
        }

        // Hysteresis: as long as the node keeps a healthy fill there is
        // nothing structural to do.
        if self[tnode].key_count() > self.low_water() {
            return removed;
        }

        if self[tnode].is_internal() {
            // Refill an internal node by borrowing the smallest key of its
            // successor, which then becomes the node to shore up. The
            // successor of an internal node never has a left child, so from
            // here on only leaves and half-leaves are in play.
            let succ = self[tnode].successor;
            let mut idx = self[tnode].max_idx + 1;
            self[tnode].grow_window(m, &mut idx);
            let borrowed = {
                let snode = &mut self[succ];
                let min = snode.min_idx;
                let v = snode.take(min);
                snode.min_idx = min + 1;
                v
            };
            self[tnode].set(idx, borrowed);
            if cursor.idx > self[tnode].max_idx {
                cursor.idx = self[tnode].max_idx;
            }

            if !self[succ].window_empty() && self[succ].is_leaf() {
                return removed;
            }
            tnode = succ;
        }

        if !self[tnode].is_leaf() {
            // A drained half-leaf absorbs its only child if the child's
            // keys fit into the spare capacity.
            let child = if self[tnode].left.exists() {
                self[tnode].left
            } else {
                self[tnode].right
            };
            let items = self[child].key_count();
            if items > m - self[tnode].key_count() {
                return removed;
            }
            self.merge_child_leaf(tnode, child, cursor);
            tnode = child;
        }

        if !self[tnode].window_empty() {
            return removed;
        }

        // The node drained completely; unhook the empty leaf and let the
        // height change bubble up.
        let parent = self[tnode].parent;
        if !parent.exists() {
            self.root = NodeIdx::NONE;
            self.release_node(tnode);
            return removed;
        }

        let side = self[tnode].side;
        self[parent].set_child(side, NodeIdx::NONE);
        self.fixup_after_deletion(tnode);
        self.release_node(tnode);
        removed
    }

    /// Swap the stored item equal to `item` (by key) for `item` itself,
    /// returning the old one. The tree shape does not change; on a miss the
    /// item rides back inside [`NotFound`].
    pub fn replace(&mut self, item: V) -> Result<V, NotFound<V>> {
        let cursor = self.seek(item.key());
        if !cursor.is_opened() {
            return Err(NotFound(item));
        }
        Ok(self[cursor.node].swap_item(cursor.idx, item))
    }

    /// Move the keys of `child` (a leaf) into `parent` (its half-leaf
    /// parent), sliding the parent's window if the slack sits on the wrong
    /// side. The child's window is left empty.
    fn merge_child_leaf(&mut self, parent: NodeIdx, child: NodeIdx, cursor: &mut Cursor) {
        let m = self.keys_per_node;
        let items = self[child].key_count();
        debug_assert!(items <= m - self[parent].key_count());

        let mut buf: SmallVec<[V; DEFAULT_KEYS_PER_NODE]> = SmallVec::new();
        {
            let cnode = &mut self[child];
            for i in cnode.min_idx..=cnode.max_idx {
                buf.push(cnode.take(i));
            }
            cnode.min_idx = 1;
            cnode.max_idx = 0;
        }

        if self[child].side == NodeSide::Right {
            // The leaf's keys land after the parent's maximum.
            let free_right = m - 1 - self[parent].max_idx;
            if items > free_right {
                let shift = items - free_right;
                let node = &mut self[parent];
                for i in node.min_idx..=node.max_idx {
                    let v = node.take(i);
                    node.set(i - shift, v);
                }
                node.min_idx -= shift;
                node.max_idx -= shift;
                if cursor.node == parent {
                    cursor.idx -= shift;
                }
            }
            let mut at = self[parent].max_idx + 1;
            for v in buf.drain(..) {
                self[parent].set(at, v);
                at += 1;
            }
            self[parent].max_idx += items;
        } else {
            // The leaf's keys land before the parent's minimum.
            let free_left = self[parent].min_idx;
            if items > free_left {
                let shift = items - free_left;
                let node = &mut self[parent];
                for i in (node.min_idx..=node.max_idx).rev() {
                    let v = node.take(i);
                    node.set(i + shift, v);
                }
                node.min_idx += shift;
                node.max_idx += shift;
                if cursor.node == parent {
                    cursor.idx += shift;
                }
            }
            let mut at = self[parent].min_idx - items;
            for v in buf.drain(..) {
                self[parent].set(at, v);
                at += 1;
            }
            self[parent].min_idx -= items;
        }
    }

    /// Hook a freshly attached leaf into the successor chain.
    fn add_successor(&mut self, n: NodeIdx) {
        let parent = self[n].parent;
        if self[n].side == NodeSide::Right {
            // A right child slots in directly after its parent.
            self[n].successor = self[parent].successor;
            self[parent].successor = n;
            return;
        }

        // A left child comes directly before its parent...
        self[n].successor = parent;
        match self[parent].side {
            NodeSide::Right => {
                // ...and is the new leftmost node of the grandparent's
                // right subtree.
                let gp = self[parent].parent;
                self[gp].successor = n;
            }
            NodeSide::Left => {
                // ...and whichever ancestor pointed at the parent now has a
                // closer next key.
                let mut node = self[parent].parent;
                while node.exists() {
                    if self[node].successor == parent {
                        self[node].successor = n;
                        break;
                    }
                    node = self[node].parent;
                }
            }
            NodeSide::Root => {}
        }
    }

    /// Unhook a leaf that is about to be detached from the successor chain.
    fn remove_successor(&mut self, n: NodeIdx) {
        let parent = self[n].parent;
        if self[n].side == NodeSide::Right {
            self[parent].successor = self[n].successor;
        } else if self[parent].side == NodeSide::Right {
            let gp = self[parent].parent;
            self[gp].successor = parent;
        } else {
            let mut node = parent;
            while node.exists() {
                if self[node].successor == n {
                    self[node].successor = parent;
                    break;
                }
                node = self[node].parent;
            }
        }
    }

    /// Walk up from a freshly attached leaf, adjusting balance factors.
    /// One rotation always restores every height an insertion can disturb.
    fn fixup_after_insertion(&mut self, n: NodeIdx, cursor: &mut Cursor) {
        self.add_successor(n);

        let mut node = n;
        let mut delta = self[node].side.bfc_delta();
        loop {
            let parent = self[node].parent;
            if !parent.exists() {
                return;
            }
            self[parent].bfc += delta;
            if self[parent].bfc == 0 {
                // This subtree's height did not change; nothing above can
                // notice.
                return;
            }
            if self[parent].bfc.abs() > 1 {
                self.rebalance(parent, Some(cursor));
                return;
            }
            delta = self[parent].side.bfc_delta();
            node = parent;
        }
    }

    /// Walk up from a freshly detached leaf. Unlike insertion, a deletion
    /// may shorten subtrees at several levels, so the walk only stops once
    /// a subtree keeps its height: a balance factor leaving zero, or a
    /// rotation whose new root ends up non-zero.
    fn fixup_after_deletion(&mut self, n: NodeIdx) {
        self.remove_successor(n);

        let mut delta = self[n].side.bfc_delta();
        let mut node = self[n].parent;
        while node.exists() {
            self[node].bfc -= delta;
            if self[node].bfc + delta == 0 {
                // The factor was zero before the update: this subtree kept
                // its height.
                break;
            }
            delta = self[node].side.bfc_delta();
            if self[node].bfc.abs() > 1 {
                let subtree = self.rebalance(node, None);
                if self[subtree].bfc != 0 {
                    break;
                }
                node = subtree;
            }
            node = self[node].parent;
        }
    }
}
