//! Cursors: stable positions inside the tree.
//!
//! A cursor is plain data (node index, slot, side, state); all navigation
//! goes through the tree it came from. Three states exist:
//!
//! - `Opened` names a live key. `item_at`/`key_at` read it, `cursor_next`
//!   and `cursor_prev` walk from it in sorted order.
//! - `Pending` names an insertion point instead: the result of a lookup
//!   miss, or any cursor on an empty tree. Advancing a pending cursor first
//!   snaps it to the nearest live key in the direction of travel.
//! - `Closed` is what `remove_at` leaves behind. A closed cursor stays
//!   closed; re-open it through `seek`, `cursor_first` or `cursor_last`.
//!
//! A cursor is only guaranteed to stay meaningful across mutations made
//! *through it* (`insert_at`, `remove_at`); any other mutation of the tree
//! may silently re-home the keys it points at.

use crate::node::NodeIdx;
use crate::{Keyed, Ttree};

/// Lifecycle of a [`Cursor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// Dead after a removal; navigation reports the end of iteration.
    Closed,
    /// On a live key.
    Opened,
    /// On an insertion point produced by a lookup miss.
    Pending,
}

/// Where a pending cursor's key belongs relative to its node: inside the
/// window (`Bound`), or in a new leaf hanging off the given side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CursorSide {
    Bound,
    Left,
    Right,
}

/// A position inside a [`Ttree`], produced by [`Ttree::seek`] and the
/// `cursor_*` methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub(crate) node: NodeIdx,
    pub(crate) idx: usize,
    pub(crate) side: CursorSide,
    pub(crate) state: CursorState,
}

impl Cursor {
    pub(crate) fn opened(node: NodeIdx, idx: usize) -> Cursor {
        Cursor { node, idx, side: CursorSide::Bound, state: CursorState::Opened }
    }

    pub(crate) fn pending(node: NodeIdx, idx: usize, side: CursorSide) -> Cursor {
        Cursor { node, idx, side, state: CursorState::Pending }
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    pub fn is_opened(&self) -> bool {
        self.state == CursorState::Opened
    }

    pub fn is_pending(&self) -> bool {
        self.state == CursorState::Pending
    }

    pub fn is_closed(&self) -> bool {
        self.state == CursorState::Closed
    }
}

impl<V: Keyed> Ttree<V> {
    /// A cursor on the start of the root node's window, or a pending cursor
    /// when the tree is empty.
    pub fn cursor_open(&self) -> Cursor {
        if self.root.exists() {
            Cursor::opened(self.root, self[self.root].min_idx)
        } else {
            Cursor::pending(NodeIdx::NONE, self.first_slot(), CursorSide::Bound)
        }
    }

    /// A cursor on the smallest key, or a pending cursor when the tree is
    /// empty.
    pub fn cursor_first(&self) -> Cursor {
        let leftmost = self.sidemost(self.root, crate::node::NodeSide::Left);
        if leftmost.exists() {
            Cursor::opened(leftmost, self[leftmost].min_idx)
        } else {
            Cursor::pending(NodeIdx::NONE, self.first_slot(), CursorSide::Bound)
        }
    }

    /// A cursor on the greatest key, or a pending cursor when the tree is
    /// empty.
    pub fn cursor_last(&self) -> Cursor {
        let rightmost = self.sidemost(self.root, crate::node::NodeSide::Right);
        if rightmost.exists() {
            Cursor::opened(rightmost, self[rightmost].max_idx)
        } else {
            Cursor::pending(NodeIdx::NONE, self.first_slot(), CursorSide::Bound)
        }
    }

    /// The item under an opened cursor.
    pub fn item_at(&self, cursor: &Cursor) -> Option<&V> {
        if cursor.state != CursorState::Opened || !cursor.node.exists() {
            return None;
        }
        self[cursor.node].item_checked(cursor.idx)
    }

    /// The key under an opened cursor.
    pub fn key_at(&self, cursor: &Cursor) -> Option<&V::Key> {
        self.item_at(cursor).map(Keyed::key)
    }

    /// Advance to the next key in sorted order and return its item, or
    /// `None` at the end. The cursor is left in place when the end is hit.
    ///
    /// A pending cursor snaps onto the nearest key at or after its
    /// insertion point first.
    pub fn cursor_next<'a>(&'a self, cursor: &mut Cursor) -> Option<&'a V> {
        match cursor.state {
            CursorState::Closed => return None,
            CursorState::Pending => {
                if !cursor.node.exists() {
                    return None;
                }
                let node = &self[cursor.node];
                cursor.state = CursorState::Opened;
                if cursor.side == CursorSide::Left || cursor.idx < node.min_idx {
                    cursor.side = CursorSide::Bound;
                    cursor.idx = node.min_idx;
                    return Some(node.item(cursor.idx));
                }
                if cursor.side == CursorSide::Bound && cursor.idx <= node.max_idx {
                    return Some(node.item(cursor.idx));
                }
                // The insertion point lies past the node: on its missing
                // right child, or one slot beyond the window. Fall through
                // and step off the maximum.
                cursor.idx = node.max_idx;
            }
            CursorState::Opened => {
                if !cursor.node.exists() {
                    return None;
                }
            }
        }

        cursor.side = CursorSide::Bound;
        let node = &self[cursor.node];
        if cursor.idx == node.max_idx {
            // Off the end of this node; the successor link points straight
            // at the node with the next greater key.
            if !node.successor.exists() {
                return None;
            }
            cursor.node = node.successor;
            cursor.idx = self[cursor.node].min_idx;
        } else {
            cursor.idx += 1;
        }
        Some(self[cursor.node].item(cursor.idx))
    }

    /// Step back to the previous key in sorted order and return its item,
    /// or `None` at the start. The cursor is left in place when the start
    /// is hit.
    ///
    /// A pending cursor snaps onto the nearest key at or before its
    /// insertion point first.
    pub fn cursor_prev<'a>(&'a self, cursor: &mut Cursor) -> Option<&'a V> {
        match cursor.state {
            CursorState::Closed => return None,
            CursorState::Pending => {
                if !cursor.node.exists() {
                    return None;
                }
                let node = &self[cursor.node];
                cursor.state = CursorState::Opened;
                if cursor.side == CursorSide::Right || cursor.idx > node.max_idx {
                    cursor.side = CursorSide::Bound;
                    cursor.idx = node.max_idx;
                    return Some(node.item(cursor.idx));
                }
                if cursor.side == CursorSide::Left || cursor.idx < node.min_idx {
                    cursor.side = CursorSide::Bound;
                    cursor.idx = node.min_idx;
                }
                // An in-window insertion point names the next greater key's
                // slot; stepping back from it lands on the predecessor.
            }
            CursorState::Opened => {
                if !cursor.node.exists() {
                    return None;
                }
            }
        }

        cursor.side = CursorSide::Bound;
        let node = &self[cursor.node];
        if cursor.idx == node.min_idx {
            // The key below this window lives in the greatest lower bound
            // node, or failing that in the first ancestor this node hangs
            // right of.
            let mut n = self.glb_of(cursor.node);
            if !n.exists() {
                let mut cur = cursor.node;
                while self[cur].parent.exists() && self[self[cur].parent].left == cur {
                    cur = self[cur].parent;
                }
                if !self[cur].parent.exists() {
                    return None;
                }
                n = self[cur].parent;
            }
            cursor.node = n;
            cursor.idx = self[n].max_idx;
        } else {
            cursor.idx -= 1;
        }
        Some(self[cursor.node].item(cursor.idx))
    }
}
