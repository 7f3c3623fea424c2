//! Debug formatting and the structural self-check used by the tests.

use std::fmt::{self, Debug, Formatter};

use crate::node::{NodeIdx, NodeSide};
use crate::{Keyed, Ttree};

struct DebugItems<'a, V: Keyed>(&'a Ttree<V>);

impl<'a, V: Keyed + Debug> Debug for DebugItems<'a, V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

impl<V: Keyed + Debug> Debug for Ttree<V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ttree")
            .field("keys_per_node", &self.keys_per_node)
            .field("unique", &self.unique)
            .field("len", &self.len)
            .field("(items)", &DebugItems(self))
            .finish()
    }
}

impl<V: Keyed> Ttree<V> {
    /// Validate every structural invariant, panicking on the first breach.
    ///
    /// Checks window shape and ordering inside each node, subtree key
    /// bounds, recorded balance factors against true heights, parent and
    /// side links, the successor chain, and the stored length. Meant for
    /// tests and debugging; it visits the whole tree.
    pub fn dbg_check(&self) {
        if !self.root.exists() {
            assert_eq!(self.len, 0, "empty tree claims {} keys", self.len);
            return;
        }

        assert_eq!(self[self.root].side, NodeSide::Root);
        assert!(!self[self.root].parent.exists(), "root has a parent");

        let mut count = 0;
        let mut order = Vec::new();
        self.check_node(self.root, &mut count, &mut order, None, None);
        assert_eq!(count, self.len, "stored len diverges from actual keys");

        // The successor chain is exactly the symmetric order of the nodes.
        for pair in order.windows(2) {
            assert_eq!(
                self[pair[0]].successor, pair[1],
                "successor chain skips a node"
            );
        }
        let last = *order.last().unwrap();
        assert!(!self[last].successor.exists(), "rightmost node has a successor");

        // Keys are globally ordered along the chain.
        let mut prev: Option<&V::Key> = None;
        for item in self.iter() {
            if let Some(p) = prev {
                if self.unique {
                    assert!(p < item.key(), "keys out of order (or duplicated)");
                } else {
                    assert!(p <= item.key(), "keys out of order");
                }
            }
            prev = Some(item.key());
        }
    }

    /// Returns the height (in nodes) of the subtree under `n`.
    fn check_node(
        &self,
        n: NodeIdx,
        count: &mut usize,
        order: &mut Vec<NodeIdx>,
        lower: Option<&V::Key>,
        upper: Option<&V::Key>,
    ) -> usize {
        let node = &self[n];
        // Equal keys are legal on a non-unique tree and may span nodes.
        let ordered =
            |a: &V::Key, b: &V::Key| if self.unique { a < b } else { a <= b };

        assert!(node.key_count() >= 1, "live node with an empty window");
        assert!(node.max_idx < self.keys_per_node, "window past the slot array");
        for i in node.min_idx..node.max_idx {
            assert!(ordered(node.key(i), node.key(i + 1)), "window out of order");
        }
        if let Some(lo) = lower {
            assert!(ordered(lo, node.min_key()), "subtree bound violated on the left");
        }
        if let Some(hi) = upper {
            assert!(ordered(node.max_key(), hi), "subtree bound violated on the right");
        }
        // Internal nodes are kept full on a best-effort basis: insertion
        // only grows children off full nodes and the post-rotation refill
        // restores fullness when the donor can afford it, but the delete
        // hysteresis leaves an internal node one short of the low-water
        // mark untouched, and a refill from a nearly empty donor stops
        // early. The hard bound is 1..=M, asserted above.

        *count += node.key_count();

        let lh = if node.left.exists() {
            let child = &self[node.left];
            assert_eq!(child.parent, n, "left child disowns its parent");
            assert_eq!(child.side, NodeSide::Left, "left child mis-tagged");
            self.check_node(node.left, count, order, lower, Some(node.min_key()))
        } else {
            0
        };

        order.push(n);

        let rh = if node.right.exists() {
            let child = &self[node.right];
            assert_eq!(child.parent, n, "right child disowns its parent");
            assert_eq!(child.side, NodeSide::Right, "right child mis-tagged");
            self.check_node(node.right, count, order, Some(node.max_key()), upper)
        } else {
            0
        };

        let diff = rh as isize - lh as isize;
        assert!(diff.abs() <= 1, "subtree heights differ by {diff}");
        assert_eq!(node.bfc as isize, diff, "recorded balance factor is stale");

        1 + lh.max(rh)
    }
}
