//! AVL rotations, specialised for T*-tree nodes.
//!
//! The link surgery is ordinary AVL. Two things are not:
//!
//! - Balance factors are recomputed in closed form after a rotation, never
//!   by measuring subtree heights. A node that stays internal derives its
//!   factor from the new parent's factor and the rotation side; a node that
//!   ends up with fewer than two children just counts them.
//! - After a *double* rotation the subtree root may come out holding a
//!   single key between two non-internal children. An internal node must be
//!   full, so the root refills itself from the richer child; the donor
//!   keeps exactly one key, parked on the canonical middle slot. This key
//!   migration is the one place a T*-tree diverges from a plain AVL tree.
//!
//! An active cursor is threaded through so a key that migrates between
//! nodes carries its cursor along.

use smallvec::SmallVec;

use crate::cursor::Cursor;
use crate::node::{NodeIdx, NodeSide};
use crate::{Keyed, Ttree, DEFAULT_KEYS_PER_NODE};

impl<V: Keyed> Ttree<V> {
    /// Restore balance at a node whose factor just reached ±2. Returns the
    /// new root of the subtree. The tree's root link is refreshed when the
    /// rotation happened at the top.
    pub(crate) fn rebalance(&mut self, node: NodeIdx, cursor: Option<&mut Cursor>) -> NodeIdx {
        let heavy = if self[node].bfc < 0 { NodeSide::Left } else { NodeSide::Right };
        let heavy_child = self[node].child(heavy);

        // Same-signed (or balanced) child: one rotation levels it out.
        // Opposite-signed child: the zig-zag needs a double rotation.
        let new_root = if (self[node].bfc + self[heavy_child].bfc).abs() >= 2 {
            self.rotate_single(node, heavy)
        } else {
            let root = self.rotate_double(node, heavy);
            self.migrate_after_double(root, cursor);
            root
        };

        if self[self.root].parent.exists() {
            self.root = new_root;
        }
        new_root
    }

    /// Re-link `target`'s `side` child above it. Pure surgery: parent and
    /// side tags are patched on every node involved, balance factors are
    /// the caller's problem. Returns the promoted child.
    ///
    /// ```text
    ///        [P]              [S]
    ///       /   \            /   \
    ///     [S]    c    =>    a    [P]
    ///     / \                    / \
    ///    a   b                  b   c
    /// ```
    /// (side = Left shown; Right is the mirror image.)
    fn rotate_link(&mut self, target: NodeIdx, side: NodeSide) -> NodeIdx {
        let opside = side.flip();
        let p = target;
        let s = self[p].child(side);
        debug_assert!(s.exists());

        self[s].side = self[p].side;
        let transfer = self[s].child(opside);
        self[p].set_child(side, transfer);
        self[s].set_child(opside, p);
        self[p].side = opside;
        self[s].parent = self[p].parent;
        self[p].parent = s;
        if transfer.exists() {
            self[transfer].parent = p;
            self[transfer].side = side;
        }

        let above = self[s].parent;
        if above.exists() {
            if self[above].child(side) == p {
                self[above].set_child(side, s);
            } else {
                self[above].set_child(opside, s);
            }
        }
        s
    }

    fn rotate_single(&mut self, target: NodeIdx, side: NodeSide) -> NodeIdx {
        let new_root = self.rotate_link(target, side);
        let demoted = self[new_root].child(side.flip());

        // The demoted node dropped a level. If it is still internal, its
        // new factor follows from where the weight sat before the turn;
        // otherwise its children say it all.
        if self[demoted].is_internal() {
            let d = side.bfc_delta();
            self[demoted].bfc = if self[new_root].bfc != d { d } else { 0 };
        } else {
            self[demoted].bfc = self.leaf_bfc(demoted);
        }
        self[new_root].bfc += side.flip().bfc_delta();

        debug_assert!(self[demoted].bfc.abs() < 2);
        debug_assert!(self[new_root].bfc.abs() < 2);
        new_root
    }

    /// Two single rotations promote the grandchild over both its ancestors.
    ///
    /// ```text
    ///        [P]                 [G]
    ///       /   \               /   \
    ///     [C]    d            [C]   [P]
    ///     / \          =>     / \   / \
    ///    a  [G]              a   b c   d
    ///       / \
    ///      b   c
    /// ```
    /// (side = Left shown.)
    fn rotate_double(&mut self, target: NodeIdx, side: NodeSide) -> NodeIdx {
        let opside = side.flip();
        let child = self[target].child(side);

        let sub = self.rotate_link(child, opside);
        let demoted = self[sub].child(side);
        debug_assert_eq!(demoted, child);
        if self[demoted].is_internal() {
            self[demoted].bfc = if self[sub].bfc == opside.bfc_delta() {
                side.bfc_delta()
            } else {
                0
            };
        } else {
            self[demoted].bfc = self.leaf_bfc(demoted);
        }
        debug_assert!(self[demoted].bfc.abs() < 2);

        let old_root = target;
        let new_root = self.rotate_link(target, side);
        debug_assert_eq!(new_root, sub);
        if self[old_root].is_internal() {
            self[old_root].bfc = if self[new_root].bfc == side.bfc_delta() {
                opside.bfc_delta()
            } else {
                0
            };
        } else {
            self[old_root].bfc = self.leaf_bfc(old_root);
        }
        debug_assert!(self[old_root].bfc.abs() < 2);

        // The promoted grandchild always comes out level.
        self[new_root].bfc = 0;
        new_root
    }

    fn leaf_bfc(&self, n: NodeIdx) -> i8 {
        self[n].right.exists() as i8 - self[n].left.exists() as i8
    }

    /// The T*-tree refill rule. When a double rotation leaves its new
    /// subtree root `t` with a single key and no internal child, `t` takes
    /// all but one key from whichever child holds more (ties pick the
    /// right), so the freshly internal node comes out full whenever the
    /// donor can afford it.
    fn migrate_after_double(&mut self, t: NodeIdx, cursor: Option<&mut Cursor>) {
        if self[t].key_count() != 1 {
            return;
        }
        let left = self[t].left;
        let right = self[t].right;
        if !left.exists() || !right.exists() {
            return;
        }
        if self[left].is_internal() || self[right].is_internal() {
            return;
        }

        let m = self.keys_per_node;
        let mid = self.first_slot();
        let mut buf: SmallVec<[V; DEFAULT_KEYS_PER_NODE]> = SmallVec::new();

        if self[right].key_count() >= self[left].key_count() {
            // Take the right child's keys below its maximum; they follow
            // t's own key directly.
            let donor = right;
            let nkeys = self[donor].key_count();
            let (dmin, dmax) = (self[donor].min_idx, self[donor].max_idx);
            let old_slot = self[t].min_idx;

            let own = self[t].take(old_slot);
            self[t].set(0, own);
            self[t].min_idx = 0;
            self[t].max_idx = nkeys - 1;

            if let Some(cursor) = cursor {
                if cursor.node == donor {
                    if cursor.idx < dmax {
                        cursor.node = t;
                        cursor.idx = cursor.idx - dmin + 1;
                    } else {
                        cursor.idx = mid;
                    }
                } else if cursor.node == t && cursor.idx == old_slot {
                    cursor.idx = 0;
                }
            }

            for i in dmin..dmax {
                let v = self[donor].take(i);
                buf.push(v);
            }
            for (k, v) in buf.drain(..).enumerate() {
                self[t].set(1 + k, v);
            }
            let kept = self[donor].take(dmax);
            self[donor].set(mid, kept);
            self[donor].min_idx = mid;
            self[donor].max_idx = mid;
        } else {
            // Take the left child's keys above its minimum; they lead up to
            // t's own key, which moves to the last slot.
            let donor = left;
            let nkeys = self[donor].key_count();
            let (dmin, dmax) = (self[donor].min_idx, self[donor].max_idx);
            let old_slot = self[t].min_idx;
            let offs = m - nkeys;

            let own = self[t].take(old_slot);
            self[t].set(m - 1, own);
            self[t].min_idx = offs;
            self[t].max_idx = m - 1;

            if let Some(cursor) = cursor {
                if cursor.node == donor {
                    if cursor.idx > dmin {
                        cursor.node = t;
                        cursor.idx = offs + (cursor.idx - dmin - 1);
                    } else {
                        cursor.idx = mid;
                    }
                } else if cursor.node == t && cursor.idx == old_slot {
                    cursor.idx = m - 1;
                }
            }

            for i in dmin + 1..=dmax {
                let v = self[donor].take(i);
                buf.push(v);
            }
            for (k, v) in buf.drain(..).enumerate() {
                self[t].set(offs + k, v);
            }
            let kept = self[donor].take(dmin);
            self[donor].set(mid, kept);
            self[donor].min_idx = mid;
            self[donor].max_idx = mid;
        }
    }
}
