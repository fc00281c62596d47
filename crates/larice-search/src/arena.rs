//! Fixed-capacity node pool with a transposition index.
//!
//! The arena owns every node slot; trees hold [`NodeId`] handles into it.
//! Handles carry a generation tag, so freeing a subtree and recycling its
//! slots invalidates old handles instead of aliasing them. Alongside the
//! pool sits the transposition index: fingerprint → [`NodeEntry`], one
//! reference-counted entry per distinct position currently in any tree.
//!
//! All mutation goes through `&mut self`; the owning tree wraps the arena
//! in its mutex and that lock is the concurrency story here.

use std::collections::HashMap;

use tracing::debug;

use larice_core::Position;

use crate::error::ArenaError;
use crate::node::{Node, NodeEntry, NodeId};

/// One storage slot. `node == None` means the slot is on the free list.
struct Slot {
    generation: u32,
    node: Option<Node>,
    next_free: Option<u32>,
}

/// Recyclable pool of tree nodes plus the fingerprint index.
pub struct NodeArena {
    slots: Vec<Slot>,
    free_head: Option<u32>,
    used: usize,
    entries: HashMap<u64, NodeEntry>,
}

impl NodeArena {
    /// Create an arena with a fixed number of node slots.
    ///
    /// Capacity never grows; exhaustion surfaces as [`ArenaError::Full`].
    pub fn new(capacity: usize) -> NodeArena {
        let slots = (0..capacity)
            .map(|i| Slot {
                generation: 0,
                node: None,
                next_free: if i + 1 < capacity {
                    Some(i as u32 + 1)
                } else {
                    None
                },
            })
            .collect();

        NodeArena {
            slots,
            free_head: if capacity > 0 { Some(0) } else { None },
            used: 0,
            entries: HashMap::new(),
        }
    }

    /// Return the fixed slot capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Return the number of currently live node slots.
    #[inline]
    pub fn used(&self) -> usize {
        self.used
    }

    /// Allocate a blank node from the pool.
    pub fn new_node(&mut self) -> Result<NodeId, ArenaError> {
        let Some(index) = self.free_head else {
            return Err(ArenaError::Full {
                capacity: self.slots.len(),
            });
        };
        let slot = &mut self.slots[index as usize];
        self.free_head = slot.next_free.take();
        slot.node = Some(Node::new());
        self.used += 1;
        Ok(NodeId::new(index, slot.generation))
    }

    /// Allocate a fresh transposition slot for a not-yet-seen fingerprint.
    pub fn new_node_position(&mut self, hash: u64, position: Position) -> &NodeEntry {
        debug_assert!(
            !self.entries.contains_key(&hash),
            "fingerprint already has a transposition entry"
        );
        self.entries.entry(hash).or_insert(NodeEntry::new(hash, position))
    }

    /// Return whether the fingerprint has a transposition entry.
    #[inline]
    pub fn contains_node_position(&self, hash: u64) -> bool {
        self.entries.contains_key(&hash)
    }

    /// Return the transposition entry for a fingerprint.
    ///
    /// Only valid to call when [`contains_node_position`](Self::contains_node_position)
    /// is true; panics otherwise.
    #[inline]
    pub fn node_position(&self, hash: u64) -> &NodeEntry {
        self.entries
            .get(&hash)
            .expect("no transposition entry for fingerprint")
    }

    /// Link a node to the transposition entry for `hash`, taking a reference.
    pub fn bind_position(&mut self, id: NodeId, hash: u64) {
        self.entries
            .get_mut(&hash)
            .expect("no transposition entry for fingerprint")
            .retain(id);
        self.node_mut(id).set_fingerprint(hash);
    }

    /// Attach `child` under `parent`: owning edge down, weak edge back up.
    pub fn attach_child(&mut self, parent: NodeId, child: NodeId) {
        self.node_mut(child).set_parent(parent);
        self.node_mut(parent).push_child(child);
    }

    /// Return a shared reference to a node. Panics on a stale handle.
    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        let slot = &self.slots[id.index()];
        assert_eq!(slot.generation, id.generation(), "stale node handle");
        slot.node.as_ref().expect("node handle points at a free slot")
    }

    /// Return a mutable reference to a node. Panics on a stale handle.
    #[inline]
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        let slot = &mut self.slots[id.index()];
        assert_eq!(slot.generation, id.generation(), "stale node handle");
        slot.node.as_mut().expect("node handle points at a free slot")
    }

    /// Return whether a handle still names a live node.
    pub fn is_live(&self, id: NodeId) -> bool {
        let slot = &self.slots[id.index()];
        slot.generation == id.generation() && slot.node.is_some()
    }

    /// Release a node and its whole subtree back to the pool.
    ///
    /// Decrements the reference count of every visited node's transposition
    /// entry and drops entries that reach zero. Descendants marked as root
    /// are left untouched; that exclusion is what lets a promoted subtree
    /// survive the release of its old ancestors. `None` is a no-op.
    pub fn unlink_node(&mut self, node: Option<NodeId>) {
        let Some(start) = node else { return };

        // Detach from a surviving parent so it keeps no dangling handle.
        if let Some(parent) = self.node(start).parent()
            && self.is_live(parent)
        {
            self.node_mut(parent).remove_child(start);
        }

        let mut released = 0usize;
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            let node = self.free_slot(id);
            released += 1;

            for &child in node.children() {
                if !self.node(child).is_root() {
                    stack.push(child);
                }
            }

            if let Some(hash) = node.fingerprint() {
                let freed = self
                    .entries
                    .get_mut(&hash)
                    .is_some_and(|entry| entry.release());
                if freed {
                    self.entries.remove(&hash);
                }
            }
        }

        debug!(released, used = self.used, "subtree unlinked");
    }

    /// Reconcile `used` and the free list with actual slot occupancy.
    ///
    /// After a resume, part of the previously allocated pool is still alive;
    /// this rescan makes the accounting match whatever survived.
    pub fn reset_nodes(&mut self) {
        let mut free_head = None;
        let mut used = 0usize;
        // Reverse scan so the free list comes out in ascending index order.
        for (index, slot) in self.slots.iter_mut().enumerate().rev() {
            if slot.node.is_some() {
                used += 1;
                slot.next_free = None;
            } else {
                slot.next_free = free_head;
                free_head = Some(index as u32);
            }
        }
        self.free_head = free_head;
        self.used = used;
        debug!(used, "arena accounting reset");
    }

    /// Refresh transposition back-references for every node under `root`.
    ///
    /// Called after a promote: entries shared with the freed part of the old
    /// tree may name a node that no longer exists.
    pub fn update_transpositions(&mut self, root: NodeId) {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let (fingerprint, children) = {
                let node = self.node(id);
                (node.fingerprint(), node.children().to_vec())
            };
            if let Some(hash) = fingerprint
                && let Some(entry) = self.entries.get_mut(&hash)
            {
                entry.set_node(Some(id));
            }
            stack.extend(children);
        }
    }

    /// Recursive invariant check over a subtree, counting visited nodes.
    ///
    /// Asserts that every node has nonzero visits, every non-root node has
    /// a prior, and every node's fingerprint resolves to a transposition
    /// entry whose back-reference names a live node. Always compiled; the
    /// test suite calls it directly.
    pub fn validate_node(&self, id: NodeId, total: &mut usize) {
        *total += 1;
        let node = self.node(id);
        assert!(node.visits() > 0, "live node has zero visits");
        assert!(
            node.is_root() || node.prior().is_some(),
            "non-root node missing prior"
        );
        let hash = node
            .fingerprint()
            .expect("node missing position fingerprint");
        let entry = self
            .entries
            .get(&hash)
            .expect("fingerprint missing from transposition index");
        let owner = entry
            .node()
            .expect("transposition entry missing owner back-reference");
        assert!(
            self.is_live(owner),
            "transposition entry references a freed node"
        );
        for &child in node.children() {
            self.validate_node(child, total);
        }
    }

    /// Free one slot and hand back its node. Bumps the generation.
    fn free_slot(&mut self, id: NodeId) -> Node {
        let slot = &mut self.slots[id.index()];
        assert_eq!(slot.generation, id.generation(), "stale node handle");
        let node = slot
            .node
            .take()
            .expect("node handle points at a free slot");
        slot.generation = slot.generation.wrapping_add(1);
        slot.next_free = self.free_head;
        self.free_head = Some(id.index() as u32);
        self.used -= 1;
        node
    }
}

impl std::fmt::Debug for NodeArena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeArena")
            .field("capacity", &self.slots.len())
            .field("used", &self.used)
            .field("positions", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::NodeArena;
    use crate::error::ArenaError;
    use larice_core::{Position, Zobrist};

    fn position_after(fen: &str) -> Position {
        fen.parse().unwrap()
    }

    #[test]
    fn allocation_tracks_used() {
        let mut arena = NodeArena::new(4);
        assert_eq!(arena.used(), 0);
        let a = arena.new_node().unwrap();
        let b = arena.new_node().unwrap();
        assert_eq!(arena.used(), 2);
        assert_ne!(a, b);
    }

    #[test]
    fn exhaustion_reports_capacity() {
        let mut arena = NodeArena::new(2);
        arena.new_node().unwrap();
        arena.new_node().unwrap();
        let err = arena.new_node().unwrap_err();
        assert_eq!(err, ArenaError::Full { capacity: 2 });
    }

    #[test]
    fn capacity_eight_scenario() {
        // Freshly embodied root plus seven children fills the pool exactly.
        let mut arena = NodeArena::new(8);
        let root = arena.new_node().unwrap();
        for _ in 0..7 {
            let child = arena.new_node().unwrap();
            arena.attach_child(root, child);
        }
        assert_eq!(arena.used(), 8);
        assert!(matches!(arena.new_node(), Err(ArenaError::Full { capacity: 8 })));
    }

    #[test]
    fn unlink_none_is_a_noop() {
        let mut arena = NodeArena::new(2);
        arena.unlink_node(None);
        assert_eq!(arena.used(), 0);
    }

    #[test]
    fn unlink_releases_whole_subtree() {
        let mut arena = NodeArena::new(8);
        let root = arena.new_node().unwrap();
        let child = arena.new_node().unwrap();
        let grandchild = arena.new_node().unwrap();
        arena.attach_child(root, child);
        arena.attach_child(child, grandchild);
        assert_eq!(arena.used(), 3);

        arena.unlink_node(Some(root));
        arena.reset_nodes();
        assert_eq!(arena.used(), 0);
    }

    #[test]
    fn freed_slots_are_recycled_with_new_generation() {
        let mut arena = NodeArena::new(1);
        let first = arena.new_node().unwrap();
        arena.unlink_node(Some(first));
        let second = arena.new_node().unwrap();
        assert_ne!(first, second, "recycled slot must carry a new generation");
        assert!(!arena.is_live(first));
        assert!(arena.is_live(second));
    }

    #[test]
    #[should_panic(expected = "stale node handle")]
    fn stale_handle_panics() {
        let mut arena = NodeArena::new(1);
        let first = arena.new_node().unwrap();
        arena.unlink_node(Some(first));
        arena.new_node().unwrap();
        arena.node(first);
    }

    #[test]
    fn shared_entry_survives_first_unlink() {
        let zobrist = Zobrist::new();
        let position = Position::starting_position();
        let hash = zobrist.hash(&position);

        let mut arena = NodeArena::new(4);
        let a = arena.new_node().unwrap();
        let b = arena.new_node().unwrap();
        arena.new_node_position(hash, position);
        arena.bind_position(a, hash);
        arena.bind_position(b, hash);
        assert_eq!(arena.node_position(hash).references(), 2);

        arena.unlink_node(Some(a));
        assert!(
            arena.contains_node_position(hash),
            "entry shared with a live node must survive"
        );
        assert_eq!(arena.node_position(hash).references(), 1);

        arena.unlink_node(Some(b));
        assert!(
            !arena.contains_node_position(hash),
            "entry must be freed with its last owner"
        );
    }

    #[test]
    fn unlink_skips_subtrees_marked_as_root() {
        let mut arena = NodeArena::new(8);
        let root = arena.new_node().unwrap();
        let child = arena.new_node().unwrap();
        let grandchild = arena.new_node().unwrap();
        let keeper = arena.new_node().unwrap();
        arena.attach_child(root, child);
        arena.attach_child(child, grandchild);
        arena.attach_child(grandchild, keeper);

        arena.node_mut(grandchild).set_as_root();
        arena.unlink_node(Some(root));
        arena.reset_nodes();

        assert_eq!(arena.used(), 2, "promoted subtree must survive");
        assert!(arena.is_live(grandchild));
        assert!(arena.is_live(keeper));
        assert!(!arena.is_live(root));
        assert!(!arena.is_live(child));
    }

    #[test]
    fn update_transpositions_repoints_back_references() {
        let zobrist = Zobrist::new();
        let position = position_after("8/8/8/3k4/8/3K4/4P3/8 w - -");
        let hash = zobrist.hash(&position);

        let mut arena = NodeArena::new(4);
        let a = arena.new_node().unwrap();
        let b = arena.new_node().unwrap();
        arena.attach_child(a, b);
        arena.new_node_position(hash, position);
        arena.bind_position(a, hash);
        arena.bind_position(b, hash);

        // Promote b, free a; the entry's back-reference may still name a.
        arena.node_mut(b).set_as_root();
        arena.unlink_node(Some(a));
        arena.update_transpositions(b);

        assert_eq!(arena.node_position(hash).node(), Some(b));
        assert!(arena.is_live(arena.node_position(hash).node().unwrap()));
    }

    #[test]
    fn validate_counts_reachable_nodes() {
        let zobrist = Zobrist::new();
        let mut arena = NodeArena::new(4);

        let root = arena.new_node().unwrap();
        let root_position = Position::starting_position();
        let root_hash = zobrist.hash(&root_position);
        arena.new_node_position(root_hash, root_position);
        arena.bind_position(root, root_hash);
        arena.node_mut(root).set_as_root();
        arena.node(root).record_visit();

        let child = arena.new_node().unwrap();
        let child_position =
            position_after("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3");
        let child_hash = zobrist.hash(&child_position);
        arena.new_node_position(child_hash, child_position);
        arena.bind_position(child, child_hash);
        arena.attach_child(root, child);
        arena.node_mut(child).set_prior(0.4);
        arena.node(child).record_visit();

        let mut total = 0;
        arena.validate_node(root, &mut total);
        assert_eq!(total, 2);
        assert_eq!(total, arena.used());
    }
}
