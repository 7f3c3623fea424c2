//! Key lookup.
//!
//! The classical T-tree search compares the query against both ends of every
//! node on the path, which costs `O(log(2N/M) + log(M - 2))`. Lehman and
//! Carey's variant compares against the node *minimum* only: strictly
//! smaller goes left, otherwise the node is remembered as the bound
//! candidate and the search goes right. At the bottom, one comparison with
//! the candidate's maximum decides whether the key can live inside it at
//! all, and a binary search over the interior slots (both compared slots
//! excluded) finishes the job. That makes the whole lookup a true
//! `O(log N)` in the number of keys.

use std::cmp::Ordering;

use crate::cursor::{Cursor, CursorSide};
use crate::node::NodeIdx;
use crate::{Keyed, Ttree};

impl<V: Keyed> Ttree<V> {
    /// Find the item stored under `key`.
    pub fn get(&self, key: &V::Key) -> Option<&V> {
        let cursor = self.seek(key);
        self.item_at(&cursor)
    }

    /// Position a cursor at `key`.
    ///
    /// On a hit the cursor comes back [`CursorState::Opened`] on the
    /// matching slot. On a miss it comes back [`CursorState::Pending`],
    /// naming the exact place an item with this key belongs; feeding it to
    /// [`insert_at`](Ttree::insert_at) is equivalent to
    /// [`insert`](Ttree::insert) without repeating the descent.
    ///
    /// [`CursorState::Opened`]: crate::CursorState::Opened
    /// [`CursorState::Pending`]: crate::CursorState::Pending
    pub fn seek(&self, key: &V::Key) -> Cursor {
        if !self.root.exists() {
            return Cursor::pending(NodeIdx::NONE, self.first_slot(), CursorSide::Bound);
        }

        let mut n = self.root;
        let mut target = self.root;
        let mut marked = NodeIdx::NONE;
        let mut side = CursorSide::Bound;
        let mut went_left = false;

        while n.exists() {
            target = n;
            let node = &self[n];
            match key.cmp(node.min_key()) {
                Ordering::Less => {
                    side = CursorSide::Left;
                    went_left = true;
                    n = node.left;
                }
                Ordering::Greater => {
                    // The key may still sit inside this node; remember it.
                    marked = target;
                    side = CursorSide::Right;
                    went_left = false;
                    n = node.right;
                }
                Ordering::Equal => {
                    return Cursor::opened(target, node.min_idx);
                }
            }
        }

        if marked.exists() {
            let node = &self[marked];
            match key.cmp(node.max_key()) {
                Ordering::Equal => return Cursor::opened(marked, node.max_idx),
                Ordering::Less => {
                    // The key belongs strictly inside the bound node. Its
                    // minimum and maximum were already compared, so search
                    // only the interior slots.
                    return match node.search(key, node.min_idx + 1, node.max_idx) {
                        Ok(idx) => Cursor::opened(marked, idx),
                        Err(idx) => Cursor::pending(marked, idx, CursorSide::Bound),
                    };
                }
                Ordering::Greater => {}
            }
        }

        // Not found. If the last node visited has room, the key slides into
        // its window; otherwise a new leaf on the final descent side will
        // take it.
        let node = &self[target];
        if !node.is_full(self.keys_per_node) {
            let idx = if marked != target || went_left {
                node.min_idx
            } else {
                node.max_idx + 1
            };
            return Cursor::pending(target, idx, CursorSide::Bound);
        }

        Cursor::pending(target, self.first_slot(), side)
    }
}

#[cfg(test)]
mod test {
    use crate::cursor::CursorSide;
    use crate::{CursorState, Ttree};

    #[test]
    fn lookup_every_key_in_a_populated_tree() {
        // Interleave low and high keys the way the original unit test does,
        // so both descent directions and the bound-node search get exercised.
        let mut tree = Ttree::new(4, true).unwrap();
        let total = 256u32;
        for i in 0..total / 2 {
            tree.insert(i).unwrap();
            tree.insert(total - i - 1).unwrap();
        }
        tree.dbg_check();

        for k in 0..total {
            assert_eq!(tree.get(&k), Some(&k), "key {k} went missing");
        }
        assert_eq!(tree.get(&total), None);
    }

    #[test]
    fn empty_tree_seek_is_pending() {
        let tree: Ttree<u32> = Ttree::new(4, true).unwrap();
        let cursor = tree.seek(&7);
        assert_eq!(cursor.state(), CursorState::Pending);
        assert_eq!(tree.item_at(&cursor), None);
        assert_eq!(tree.get(&7), None);
    }

    #[test]
    fn miss_in_node_with_room_is_a_bound_cursor() {
        let mut tree = Ttree::new(4, true).unwrap();
        tree.insert(10u32).unwrap();
        tree.insert(30).unwrap();

        // Below the minimum: pending at the window start.
        let cursor = tree.seek(&5);
        assert_eq!(cursor.state(), CursorState::Pending);
        assert_eq!(cursor.side, CursorSide::Bound);
        assert_eq!(cursor.idx, tree[cursor.node].min_idx);

        // Above the maximum: pending one past the window end.
        let cursor = tree.seek(&40);
        assert_eq!(cursor.state(), CursorState::Pending);
        assert_eq!(cursor.side, CursorSide::Bound);
        assert_eq!(cursor.idx, tree[cursor.node].max_idx + 1);

        // Between two keys: pending on the greater key's slot.
        let cursor = tree.seek(&20);
        assert_eq!(cursor.state(), CursorState::Pending);
        assert_eq!(cursor.side, CursorSide::Bound);
        assert_eq!(tree[cursor.node].key(cursor.idx), &30);
    }

    #[test]
    fn miss_at_a_full_node_names_a_child_slot() {
        // A lone full root: any miss must ask for a new leaf.
        let mut tree = Ttree::new(4, true).unwrap();
        for k in [10u32, 20, 30, 40] {
            tree.insert(k).unwrap();
        }
        assert_eq!(tree.depth(), 0);

        let cursor = tree.seek(&5);
        assert_eq!(cursor.state(), CursorState::Pending);
        assert_eq!(cursor.side, CursorSide::Left);

        let cursor = tree.seek(&50);
        assert_eq!(cursor.state(), CursorState::Pending);
        assert_eq!(cursor.side, CursorSide::Right);
    }

    #[test]
    fn hit_positions_the_cursor_on_the_key() {
        let mut tree = Ttree::new(4, true).unwrap();
        for k in 0..64u32 {
            tree.insert(k).unwrap();
        }

        for k in 0..64u32 {
            let cursor = tree.seek(&k);
            assert_eq!(cursor.state(), CursorState::Opened);
            assert_eq!(tree.key_at(&cursor), Some(&k));
            assert_eq!(tree.item_at(&cursor), Some(&k));
        }
    }
}
