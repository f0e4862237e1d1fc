//! Red-black catalog index.
//!
//! Nodes live in an arena owned by the index and refer to one another by
//! [`NodeId`]. Slot 0 is the shared `NIL` sentinel: always BLACK, never holds
//! a payload, and never written to. Every absent child and the root's parent
//! point at it. Removed slots are recycled through a free list.
//!
//! # Color-flip accounting
//!
//! The index keeps a cumulative count of color changes caused by mutations.
//! The reference semantics is a diff of two full color snapshots, one taken
//! before and one after each insert or delete, counting every node present in
//! both whose color differs. Instead of taking snapshots, every mutating call
//! journals the pre-call color of each node the first time it is recolored and
//! compares the journal against final colors when the call returns. Nodes
//! absent from either snapshot (the node being inserted, the node being
//! removed) are excluded, so the count matches the snapshot diff exactly.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use libris_error::{LibrisError, Result};
use libris_types::{BookId, Color};
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::instrumentation::{
    record_color_flips, record_delete, record_fixup_step, record_insert, record_rotation,
};

/// Handle of a node slot inside the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct NodeId(usize);

impl NodeId {
    #[inline]
    const fn index(self) -> usize {
        self.0
    }
}

const NIL: NodeId = NodeId(0);

#[derive(Debug, Clone)]
struct Node<V> {
    key: BookId,
    color: Color,
    parent: NodeId,
    left: NodeId,
    right: NodeId,
    /// `None` for the sentinel and for slots on the free list.
    value: Option<V>,
}

impl<V> Node<V> {
    const fn sentinel() -> Self {
        Self {
            key: BookId::new(0),
            color: Color::Black,
            parent: NIL,
            left: NIL,
            right: NIL,
            value: None,
        }
    }
}

/// Up to two neighbors returned by [`CatalogIndex::nearest`], ascending by key.
pub type Neighbors<'a, V> = SmallVec<[(BookId, &'a V); 2]>;

/// Ordered index from [`BookId`] to `V`, balanced as a red-black tree.
pub struct CatalogIndex<V> {
    nodes: Vec<Node<V>>,
    free: Vec<NodeId>,
    root: NodeId,
    len: usize,
    color_flips: u64,
    /// Pre-call colors of nodes recolored by the current mutation.
    journal: SmallVec<[(NodeId, Color); 16]>,
}

impl<V> Default for CatalogIndex<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> CatalogIndex<V> {
    /// Create an empty index.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::sentinel()],
            free: Vec::new(),
            root: NIL,
            len: 0,
            color_flips: 0,
            journal: SmallVec::new(),
        }
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Cumulative number of node color changes since creation.
    #[inline]
    pub const fn color_flip_count(&self) -> u64 {
        self.color_flips
    }

    /// Insert `value` under `key`.
    ///
    /// Returns `false` and leaves the index untouched if `key` is already
    /// present: the existing payload, the shape, and the flip count are
    /// all preserved.
    pub fn insert(&mut self, key: BookId, value: V) -> bool {
        let mut parent = NIL;
        let mut cur = self.root;
        while cur != NIL {
            parent = cur;
            cur = match key.cmp(&self.key(cur)) {
                Ordering::Less => self.left(cur),
                Ordering::Greater => self.right(cur),
                Ordering::Equal => {
                    debug!(key = key.get(), "duplicate catalog key ignored");
                    return false;
                }
            };
        }

        self.journal.clear();
        let node = self.alloc(key, value, parent);
        if parent == NIL {
            self.root = node;
        } else if key < self.key(parent) {
            self.nodes[parent.index()].left = node;
        } else {
            self.nodes[parent.index()].right = node;
        }
        self.len += 1;

        self.insert_fixup(node);
        let flips = self.commit_color_flips(node);
        record_insert();
        debug!(key = key.get(), flips, len = self.len, "inserted catalog node");
        true
    }

    /// Look up the payload stored under `key`.
    pub fn get(&self, key: BookId) -> Option<&V> {
        let node = self.find_node(key);
        (node != NIL).then(|| self.payload(node))
    }

    /// Mutable lookup. Payload mutation never affects tree shape.
    pub fn get_mut(&mut self, key: BookId) -> Option<&mut V> {
        let node = self.find_node(key);
        if node == NIL {
            return None;
        }
        self.nodes[node.index()].value.as_mut()
    }

    #[inline]
    pub fn contains_key(&self, key: BookId) -> bool {
        self.find_node(key) != NIL
    }

    /// Remove `key`, returning its payload. No-op if absent.
    pub fn remove(&mut self, key: BookId) -> Option<V> {
        let z = self.find_node(key);
        if z == NIL {
            return None;
        }

        self.journal.clear();
        let mut removed_color = self.color(z);
        let x;
        let x_parent;
        if self.left(z) == NIL {
            x = self.right(z);
            x_parent = self.parent(z);
            self.transplant(z, x);
        } else if self.right(z) == NIL {
            x = self.left(z);
            x_parent = self.parent(z);
            self.transplant(z, x);
        } else {
            // Two children: splice out the in-order successor and move it
            // into z's position, taking over z's color.
            let y = self.minimum(self.right(z));
            removed_color = self.color(y);
            x = self.right(y);
            if self.parent(y) == z {
                x_parent = y;
            } else {
                x_parent = self.parent(y);
                self.transplant(y, x);
                let z_right = self.right(z);
                self.nodes[y.index()].right = z_right;
                self.nodes[z_right.index()].parent = y;
            }
            self.transplant(z, y);
            let z_left = self.left(z);
            self.nodes[y.index()].left = z_left;
            self.nodes[z_left.index()].parent = y;
            self.set_color(y, self.color(z));
        }

        if removed_color.is_black() {
            self.delete_fixup(x, x_parent);
        }

        let flips = self.commit_color_flips(z);
        let value = self.release(z);
        self.len -= 1;
        record_delete();
        debug!(key = key.get(), flips, len = self.len, "removed catalog node");
        value
    }

    /// Payloads with `lo <= key <= hi`, ascending by key.
    ///
    /// Iterative in-order walk that skips subtrees lying wholly below `lo`
    /// and stops at the first key above `hi`.
    pub fn range(&self, lo: BookId, hi: BookId) -> Vec<(BookId, &V)> {
        let mut out = Vec::new();
        if lo > hi {
            return out;
        }
        let mut stack: Vec<NodeId> = Vec::new();
        let mut cur = self.root;
        loop {
            while cur != NIL {
                if self.key(cur) < lo {
                    cur = self.right(cur);
                } else {
                    stack.push(cur);
                    cur = self.left(cur);
                }
            }
            let Some(node) = stack.pop() else {
                break;
            };
            let key = self.key(node);
            if key > hi {
                break;
            }
            out.push((key, self.payload(node)));
            cur = self.right(node);
        }
        out
    }

    /// Closest records to `target`.
    ///
    /// An exact match is returned alone. Otherwise the greatest key below and
    /// the smallest key above `target` are compared by distance: the closer
    /// one wins, and both are returned (ascending) when equidistant.
    pub fn nearest(&self, target: BookId) -> Neighbors<'_, V> {
        let (lower, higher) = self.bracket(target);
        let mut out = Neighbors::new();
        match (lower, higher) {
            (Some(lo), Some(hi)) => {
                let lo_distance = target.distance(self.key(lo));
                let hi_distance = target.distance(self.key(hi));
                match lo_distance.cmp(&hi_distance) {
                    Ordering::Less => out.push(self.entry(lo)),
                    Ordering::Greater => out.push(self.entry(hi)),
                    Ordering::Equal => {
                        out.push(self.entry(lo));
                        if lo != hi {
                            out.push(self.entry(hi));
                        }
                    }
                }
            }
            (Some(node), None) | (None, Some(node)) => out.push(self.entry(node)),
            (None, None) => {}
        }
        out
    }

    /// In-order iterator over `(key, payload)`.
    pub fn iter(&self) -> Iter<'_, V> {
        let mut iter = Iter {
            index: self,
            stack: Vec::new(),
        };
        iter.push_left_spine(self.root);
        iter
    }

    pub fn keys(&self) -> impl Iterator<Item = BookId> + '_ {
        self.iter().map(|(key, _)| key)
    }

    pub fn min_key(&self) -> Option<BookId> {
        (self.root != NIL).then(|| self.key(self.minimum(self.root)))
    }

    pub fn max_key(&self) -> Option<BookId> {
        if self.root == NIL {
            return None;
        }
        let mut cur = self.root;
        while self.right(cur) != NIL {
            cur = self.right(cur);
        }
        Some(self.key(cur))
    }

    /// Number of nodes on the longest root-to-leaf path (empty = 0).
    pub fn height(&self) -> usize {
        let mut max = 0;
        let mut stack = vec![(self.root, 0_usize)];
        while let Some((node, depth)) = stack.pop() {
            if node == NIL {
                max = max.max(depth);
                continue;
            }
            stack.push((self.left(node), depth + 1));
            stack.push((self.right(node), depth + 1));
        }
        max
    }

    /// Color of every node keyed by its key.
    pub fn color_snapshot(&self) -> BTreeMap<BookId, Color> {
        let mut snapshot = BTreeMap::new();
        let mut stack = vec![self.root];
        while let Some(node) = stack.pop() {
            if node == NIL {
                continue;
            }
            snapshot.insert(self.key(node), self.color(node));
            stack.push(self.left(node));
            stack.push(self.right(node));
        }
        snapshot
    }

    /// Color of the node stored under `key`.
    pub fn color_of(&self, key: BookId) -> Option<Color> {
        let node = self.find_node(key);
        (node != NIL).then(|| self.color(node))
    }

    /// Check every red-black and binary-search-tree invariant.
    ///
    /// Returns the black height of the tree (sentinel excluded).
    pub fn validate(&self) -> Result<usize> {
        if self.nodes[NIL.index()].color.is_red() {
            return Err(LibrisError::corrupt("sentinel is red"));
        }
        if self.color(self.root).is_red() {
            return Err(LibrisError::corrupt(format!(
                "root {} is red",
                self.key(self.root)
            )));
        }
        if self.root != NIL && self.parent(self.root) != NIL {
            return Err(LibrisError::corrupt("root has a parent"));
        }

        let mut black_height: Option<usize> = None;
        let mut seen = 0_usize;
        // (node, lower bound, upper bound, black nodes above and including node)
        let mut stack: Vec<(NodeId, Option<BookId>, Option<BookId>, usize)> =
            vec![(self.root, None, None, 0)];
        while let Some((node, lower, upper, blacks)) = stack.pop() {
            if node == NIL {
                match black_height {
                    None => black_height = Some(blacks),
                    Some(expected) if expected != blacks => {
                        return Err(LibrisError::corrupt(format!(
                            "black height mismatch: {blacks} vs {expected}"
                        )));
                    }
                    Some(_) => {}
                }
                continue;
            }
            seen += 1;
            let key = self.key(node);
            if lower.is_some_and(|lo| key <= lo) || upper.is_some_and(|hi| key >= hi) {
                return Err(LibrisError::corrupt(format!("key {key} out of order")));
            }
            if self.nodes[node.index()].value.is_none() {
                return Err(LibrisError::corrupt(format!("node {key} has no payload")));
            }
            let color = self.color(node);
            for child in [self.left(node), self.right(node)] {
                if child == NIL {
                    continue;
                }
                if self.parent(child) != node {
                    return Err(LibrisError::corrupt(format!(
                        "child {} of {key} has a stale parent link",
                        self.key(child)
                    )));
                }
                if color.is_red() && self.color(child).is_red() {
                    return Err(LibrisError::corrupt(format!(
                        "red node {key} has red child {}",
                        self.key(child)
                    )));
                }
            }
            let blacks = blacks + usize::from(color.is_black());
            stack.push((self.left(node), lower, Some(key), blacks));
            stack.push((self.right(node), Some(key), upper, blacks));
        }

        if seen != self.len {
            return Err(LibrisError::corrupt(format!(
                "reachable nodes {seen} != len {}",
                self.len
            )));
        }
        Ok(black_height.unwrap_or(0))
    }

    // ── Internal ─────────────────────────────────────────────────────────

    #[inline]
    fn key(&self, node: NodeId) -> BookId {
        self.nodes[node.index()].key
    }

    #[inline]
    fn color(&self, node: NodeId) -> Color {
        self.nodes[node.index()].color
    }

    #[inline]
    fn parent(&self, node: NodeId) -> NodeId {
        self.nodes[node.index()].parent
    }

    #[inline]
    fn left(&self, node: NodeId) -> NodeId {
        self.nodes[node.index()].left
    }

    #[inline]
    fn right(&self, node: NodeId) -> NodeId {
        self.nodes[node.index()].right
    }

    fn payload(&self, node: NodeId) -> &V {
        match &self.nodes[node.index()].value {
            Some(value) => value,
            None => unreachable!("index node {node:?} has no payload"),
        }
    }

    fn entry(&self, node: NodeId) -> (BookId, &V) {
        (self.key(node), self.payload(node))
    }

    /// Recolor a node, journaling its color the first time it changes.
    fn set_color(&mut self, node: NodeId, color: Color) {
        assert!(node != NIL, "attempted to recolor the sentinel");
        let current = self.color(node);
        if current == color {
            return;
        }
        if !self.journal.iter().any(|&(journaled, _)| journaled == node) {
            self.journal.push((node, current));
        }
        self.nodes[node.index()].color = color;
    }

    /// Fold the journal into the flip counter, skipping `excluded`.
    fn commit_color_flips(&mut self, excluded: NodeId) -> u64 {
        let flips = self
            .journal
            .iter()
            .filter(|&&(node, before)| node != excluded && self.color(node) != before)
            .count() as u64;
        self.journal.clear();
        self.color_flips += flips;
        record_color_flips(flips);
        flips
    }

    fn find_node(&self, key: BookId) -> NodeId {
        let mut cur = self.root;
        while cur != NIL {
            cur = match key.cmp(&self.key(cur)) {
                Ordering::Less => self.left(cur),
                Ordering::Greater => self.right(cur),
                Ordering::Equal => return cur,
            };
        }
        NIL
    }

    /// Greatest node below and smallest node above `target`; an exact match
    /// is reported on both sides.
    fn bracket(&self, target: BookId) -> (Option<NodeId>, Option<NodeId>) {
        let mut lower = None;
        let mut higher = None;
        let mut cur = self.root;
        while cur != NIL {
            match self.key(cur).cmp(&target) {
                Ordering::Equal => return (Some(cur), Some(cur)),
                Ordering::Less => {
                    lower = Some(cur);
                    cur = self.right(cur);
                }
                Ordering::Greater => {
                    higher = Some(cur);
                    cur = self.left(cur);
                }
            }
        }
        (lower, higher)
    }

    fn minimum(&self, mut node: NodeId) -> NodeId {
        while self.left(node) != NIL {
            node = self.left(node);
        }
        node
    }

    fn alloc(&mut self, key: BookId, value: V, parent: NodeId) -> NodeId {
        let node = Node {
            key,
            color: Color::Red,
            parent,
            left: NIL,
            right: NIL,
            value: Some(value),
        };
        if let Some(id) = self.free.pop() {
            self.nodes[id.index()] = node;
            id
        } else {
            self.nodes.push(node);
            NodeId(self.nodes.len() - 1)
        }
    }

    fn release(&mut self, id: NodeId) -> Option<V> {
        let slot = &mut self.nodes[id.index()];
        slot.parent = NIL;
        slot.left = NIL;
        slot.right = NIL;
        slot.color = Color::Black;
        let value = slot.value.take();
        self.free.push(id);
        value
    }

    /// Replace the subtree rooted at `u` with the one rooted at `v`.
    fn transplant(&mut self, u: NodeId, v: NodeId) {
        let up = self.parent(u);
        if up == NIL {
            self.root = v;
        } else if u == self.left(up) {
            self.nodes[up.index()].left = v;
        } else {
            self.nodes[up.index()].right = v;
        }
        if v != NIL {
            self.nodes[v.index()].parent = up;
        }
    }

    fn rotate_left(&mut self, x: NodeId) {
        let y = self.right(x);
        assert!(y != NIL, "rotate_left without a right child");
        let y_left = self.left(y);
        self.nodes[x.index()].right = y_left;
        if y_left != NIL {
            self.nodes[y_left.index()].parent = x;
        }
        let xp = self.parent(x);
        self.nodes[y.index()].parent = xp;
        if xp == NIL {
            self.root = y;
        } else if x == self.left(xp) {
            self.nodes[xp.index()].left = y;
        } else {
            self.nodes[xp.index()].right = y;
        }
        self.nodes[y.index()].left = x;
        self.nodes[x.index()].parent = y;
        record_rotation();
        trace!(pivot = self.key(x).get(), "rotate left");
    }

    fn rotate_right(&mut self, x: NodeId) {
        let y = self.left(x);
        assert!(y != NIL, "rotate_right without a left child");
        let y_right = self.right(y);
        self.nodes[x.index()].left = y_right;
        if y_right != NIL {
            self.nodes[y_right.index()].parent = x;
        }
        let xp = self.parent(x);
        self.nodes[y.index()].parent = xp;
        if xp == NIL {
            self.root = y;
        } else if x == self.right(xp) {
            self.nodes[xp.index()].right = y;
        } else {
            self.nodes[xp.index()].left = y;
        }
        self.nodes[y.index()].right = x;
        self.nodes[x.index()].parent = y;
        record_rotation();
        trace!(pivot = self.key(x).get(), "rotate right");
    }

    fn insert_fixup(&mut self, mut z: NodeId) {
        while self.color(self.parent(z)).is_red() {
            record_fixup_step();
            let p = self.parent(z);
            let g = self.parent(p);
            assert!(g != NIL, "red parent {} is the root", self.key(p));
            if p == self.left(g) {
                let uncle = self.right(g);
                if self.color(uncle).is_red() {
                    self.set_color(p, Color::Black);
                    self.set_color(uncle, Color::Black);
                    self.set_color(g, Color::Red);
                    z = g;
                } else {
                    if z == self.right(p) {
                        z = p;
                        self.rotate_left(z);
                    }
                    let p = self.parent(z);
                    let g = self.parent(p);
                    self.set_color(p, Color::Black);
                    self.set_color(g, Color::Red);
                    self.rotate_right(g);
                }
            } else {
                let uncle = self.left(g);
                if self.color(uncle).is_red() {
                    self.set_color(p, Color::Black);
                    self.set_color(uncle, Color::Black);
                    self.set_color(g, Color::Red);
                    z = g;
                } else {
                    if z == self.left(p) {
                        z = p;
                        self.rotate_right(z);
                    }
                    let p = self.parent(z);
                    let g = self.parent(p);
                    self.set_color(p, Color::Black);
                    self.set_color(g, Color::Red);
                    self.rotate_left(g);
                }
            }
        }
        let root = self.root;
        self.set_color(root, Color::Black);
    }

    /// Restore invariants after removing a black node.
    ///
    /// `x` carries the extra black and may be the sentinel, so its parent is
    /// tracked in `parent` rather than read from the sentinel.
    fn delete_fixup(&mut self, mut x: NodeId, mut parent: NodeId) {
        while x != self.root && self.color(x).is_black() {
            record_fixup_step();
            assert!(parent != NIL, "non-root problem node without a parent");
            if x == self.left(parent) {
                let mut w = self.right(parent);
                assert!(w != NIL, "problem node {x:?} has no sibling");
                if self.color(w).is_red() {
                    self.set_color(w, Color::Black);
                    self.set_color(parent, Color::Red);
                    self.rotate_left(parent);
                    w = self.right(parent);
                }
                if self.color(self.left(w)).is_black() && self.color(self.right(w)).is_black() {
                    self.set_color(w, Color::Red);
                    x = parent;
                    parent = self.parent(x);
                } else {
                    if self.color(self.right(w)).is_black() {
                        let near = self.left(w);
                        self.set_color(near, Color::Black);
                        self.set_color(w, Color::Red);
                        self.rotate_right(w);
                        w = self.right(parent);
                    }
                    let far = self.right(w);
                    self.set_color(w, self.color(parent));
                    self.set_color(parent, Color::Black);
                    self.set_color(far, Color::Black);
                    self.rotate_left(parent);
                    x = self.root;
                    parent = NIL;
                }
            } else {
                let mut w = self.left(parent);
                assert!(w != NIL, "problem node {x:?} has no sibling");
                if self.color(w).is_red() {
                    self.set_color(w, Color::Black);
                    self.set_color(parent, Color::Red);
                    self.rotate_right(parent);
                    w = self.left(parent);
                }
                if self.color(self.right(w)).is_black() && self.color(self.left(w)).is_black() {
                    self.set_color(w, Color::Red);
                    x = parent;
                    parent = self.parent(x);
                } else {
                    if self.color(self.left(w)).is_black() {
                        let near = self.right(w);
                        self.set_color(near, Color::Black);
                        self.set_color(w, Color::Red);
                        self.rotate_left(w);
                        w = self.left(parent);
                    }
                    let far = self.left(w);
                    self.set_color(w, self.color(parent));
                    self.set_color(parent, Color::Black);
                    self.set_color(far, Color::Black);
                    self.rotate_right(parent);
                    x = self.root;
                    parent = NIL;
                }
            }
        }
        if x != NIL {
            self.set_color(x, Color::Black);
        }
    }
}

#[allow(clippy::missing_fields_in_debug)]
impl<V> fmt::Debug for CatalogIndex<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogIndex")
            .field("len", &self.len)
            .field("height", &self.height())
            .field("color_flips", &self.color_flips)
            .finish()
    }
}

/// In-order iterator returned by [`CatalogIndex::iter`].
pub struct Iter<'a, V> {
    index: &'a CatalogIndex<V>,
    stack: Vec<NodeId>,
}

impl<V> Iter<'_, V> {
    fn push_left_spine(&mut self, mut node: NodeId) {
        while node != NIL {
            self.stack.push(node);
            node = self.index.left(node);
        }
    }
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (BookId, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.push_left_spine(self.index.right(node));
        Some(self.index.entry(node))
    }
}

impl<'a, V> IntoIterator for &'a CatalogIndex<V> {
    type Item = (BookId, &'a V);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
