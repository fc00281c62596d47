//! Tree nodes, their handles, and shared transposition entries.

use std::sync::atomic::{AtomicU32, Ordering};

use larice_core::Position;

/// Handle to a node slot in the arena: slot index plus a generation tag.
///
/// The generation is bumped each time a slot is recycled, so a handle held
/// across an unlink is detectably stale instead of silently aliasing the
/// slot's next occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    #[inline]
    pub(crate) const fn new(index: u32, generation: u32) -> NodeId {
        NodeId { index, generation }
    }

    #[inline]
    pub(crate) const fn index(self) -> usize {
        self.index as usize
    }

    #[inline]
    pub(crate) const fn generation(self) -> u32 {
        self.generation
    }
}

/// A vertex of the search tree.
///
/// Structure (parent, children, flags, prior) is mutated only under the
/// owning tree's lock. The visit count is atomic so the selection walk can
/// read and bump it without taking that lock; that is the only field with
/// a concurrent-access contract.
pub struct Node {
    /// Weak back edge; never extends the parent's lifetime.
    parent: Option<NodeId>,
    /// Owning structural edges, in insertion order.
    children: Vec<NodeId>,
    /// Times the search walk has passed through this node.
    visits: AtomicU32,
    /// Prior probability assigned at expansion. `None` only on root nodes.
    prior: Option<f32>,
    /// Fingerprint keying this node's transposition entry in the arena.
    fingerprint: Option<u64>,
    is_root: bool,
    terminal: bool,
}

impl Node {
    pub(crate) fn new() -> Node {
        Node {
            parent: None,
            children: Vec::new(),
            visits: AtomicU32::new(0),
            prior: None,
            fingerprint: None,
            is_root: false,
            terminal: false,
        }
    }

    /// Return the parent handle, if this node has one.
    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Return the children in insertion order.
    #[inline]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Return the visit count.
    #[inline]
    pub fn visits(&self) -> u32 {
        self.visits.load(Ordering::Relaxed)
    }

    /// Bump the visit count. Safe to call without the tree lock.
    #[inline]
    pub fn record_visit(&self) {
        self.visits.fetch_add(1, Ordering::Relaxed);
    }

    /// Return the prior probability, if one has been assigned.
    #[inline]
    pub fn prior(&self) -> Option<f32> {
        self.prior
    }

    /// Assign the prior probability (done once, at expansion).
    #[inline]
    pub fn set_prior(&mut self, prior: f32) {
        self.prior = Some(prior);
    }

    /// Return whether this node is the tree's root.
    #[inline]
    pub fn is_root(&self) -> bool {
        self.is_root
    }

    /// Mark this node as a root. Clears the parent back edge.
    pub(crate) fn set_as_root(&mut self) {
        self.is_root = true;
        self.parent = None;
    }

    /// Return whether this node is a confirmed terminal position
    /// (checkmate, stalemate, or draw by rule).
    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    /// Record the terminal verdict for this node's position.
    #[inline]
    pub fn set_terminal(&mut self, terminal: bool) {
        self.terminal = terminal;
    }

    /// Return the fingerprint of this node's transposition entry.
    #[inline]
    pub fn fingerprint(&self) -> Option<u64> {
        self.fingerprint
    }

    pub(crate) fn set_fingerprint(&mut self, hash: u64) {
        self.fingerprint = Some(hash);
    }

    pub(crate) fn set_parent(&mut self, parent: NodeId) {
        self.parent = Some(parent);
    }

    pub(crate) fn push_child(&mut self, child: NodeId) {
        self.children.push(child);
    }

    pub(crate) fn remove_child(&mut self, child: NodeId) {
        self.children.retain(|&c| c != child);
    }
}

/// A transposition slot: one deduplicated position, shared by every node
/// that reaches it.
///
/// Reference-counted by the arena; freed when the last owning node is
/// unlinked. The back-reference names one current owner and is refreshed
/// when a resumed subtree is promoted to root.
pub struct NodeEntry {
    hash: u64,
    position: Position,
    references: u32,
    node: Option<NodeId>,
}

impl NodeEntry {
    pub(crate) fn new(hash: u64, position: Position) -> NodeEntry {
        NodeEntry {
            hash,
            position,
            references: 0,
            node: None,
        }
    }

    /// Return the fingerprint this entry is indexed under.
    #[inline]
    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// Return the stored position.
    #[inline]
    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Return the number of live nodes referencing this entry.
    #[inline]
    pub fn references(&self) -> u32 {
        self.references
    }

    /// Return the back-reference to one owning node.
    #[inline]
    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    pub(crate) fn retain(&mut self, owner: NodeId) {
        self.references += 1;
        self.node = Some(owner);
    }

    /// Drop one reference; returns `true` when the entry should be freed.
    pub(crate) fn release(&mut self) -> bool {
        self.references = self.references.saturating_sub(1);
        self.references == 0
    }

    pub(crate) fn set_node(&mut self, node: Option<NodeId>) {
        self.node = node;
    }
}

#[cfg(test)]
mod tests {
    use super::{Node, NodeEntry, NodeId};
    use larice_core::Position;

    #[test]
    fn fresh_node_is_blank() {
        let node = Node::new();
        assert_eq!(node.visits(), 0);
        assert_eq!(node.prior(), None);
        assert_eq!(node.parent(), None);
        assert!(node.children().is_empty());
        assert!(!node.is_root());
        assert!(!node.is_terminal());
        assert_eq!(node.fingerprint(), None);
    }

    #[test]
    fn record_visit_through_shared_reference() {
        let node = Node::new();
        node.record_visit();
        node.record_visit();
        assert_eq!(node.visits(), 2);
    }

    #[test]
    fn set_as_root_clears_parent() {
        let mut node = Node::new();
        node.set_parent(NodeId::new(3, 0));
        node.set_as_root();
        assert!(node.is_root());
        assert_eq!(node.parent(), None);
    }

    #[test]
    fn entry_refcount_lifecycle() {
        let mut entry = NodeEntry::new(42, Position::starting_position());
        let owner = NodeId::new(0, 0);
        entry.retain(owner);
        entry.retain(NodeId::new(1, 0));
        assert_eq!(entry.references(), 2);
        assert!(!entry.release());
        assert!(entry.release(), "last release should free the entry");
    }

    #[test]
    fn release_saturates_at_zero() {
        let mut entry = NodeEntry::new(7, Position::starting_position());
        assert!(entry.release());
        assert_eq!(entry.references(), 0);
    }
}
