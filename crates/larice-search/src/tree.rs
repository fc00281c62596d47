//! Search-tree lifecycle: root embodiment, reset, and subtree resume.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use larice_core::{Position, Zobrist};

use crate::arena::NodeArena;
use crate::error::ArenaError;
use crate::node::NodeId;

/// Everything the tree's lock protects: the arena and the root handle.
pub struct TreeState {
    arena: NodeArena,
    root: Option<NodeId>,
}

impl TreeState {
    /// Return the arena.
    #[inline]
    pub fn arena(&self) -> &NodeArena {
        &self.arena
    }

    /// Return the arena mutably. All structural mutation runs through here,
    /// under the tree's lock.
    #[inline]
    pub fn arena_mut(&mut self) -> &mut NodeArena {
        &mut self.arena
    }

    /// Return the current root handle, if the tree is embodied.
    #[inline]
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Walk the rooted tree with the arena's invariant checker and assert
    /// that the walk accounts for every live slot. Returns the node count.
    pub fn validate(&self) -> usize {
        let mut total = 0;
        if let Some(root) = self.root {
            self.arena.validate_node(root, &mut total);
        }
        assert_eq!(
            total,
            self.arena.used(),
            "live-node accounting diverged from the reachable tree"
        );
        total
    }
}

/// The search tree: owns the arena, the hasher, and at most one root.
///
/// Workers mutate tree structure only through [`lock`](Self::lock); visit
/// counts are atomic and readable without it. Between turns, with the tree
/// quiescent, [`clear_root`](Self::clear_root) either resumes the subtree
/// under the move actually played or releases everything.
pub struct SearchTree {
    state: Mutex<TreeState>,
    zobrist: Zobrist,
    resume: bool,
}

impl SearchTree {
    /// Create a tree over the given arena and hasher.
    ///
    /// With `resume` set, [`clear_root`](Self::clear_root) tries to promote
    /// a grandchild matching the new game position instead of rebuilding.
    pub fn new(arena: NodeArena, zobrist: Zobrist, resume: bool) -> SearchTree {
        SearchTree {
            state: Mutex::new(TreeState { arena, root: None }),
            zobrist,
            resume,
        }
    }

    /// Return the injected hasher, for fingerprinting new positions.
    #[inline]
    pub fn zobrist(&self) -> &Zobrist {
        &self.zobrist
    }

    /// Acquire the structural-mutation lock.
    ///
    /// Hold it only across pointer/index manipulation, never across
    /// evaluation-sized work.
    pub fn lock(&self) -> MutexGuard<'_, TreeState> {
        self.state.lock().expect("tree mutex poisoned")
    }

    /// Return a valid, initialized root for the current game position,
    /// building one if the tree is empty.
    pub fn embodied_root(&self, game: &Position) -> Result<NodeId, ArenaError> {
        let mut state = self.lock();
        if let Some(root) = state.root {
            return Ok(root);
        }

        debug_assert_eq!(state.arena.used(), 0, "embodying over live nodes");
        let hash = self.zobrist.hash(game);
        let root = state.arena.new_node()?;
        if !state.arena.contains_node_position(hash) {
            state.arena.new_node_position(hash, *game);
        }
        state.arena.bind_position(root, hash);
        state.arena.node_mut(root).set_as_root();
        state.root = Some(root);
        Ok(root)
    }

    /// Drop the root reference without releasing arena storage.
    ///
    /// For when cleanup ownership is being handed elsewhere; the nodes stay
    /// allocated until whoever took over unlinks them.
    pub fn reset(&self) {
        self.lock().root = None;
    }

    /// Advance the tree to the next turn.
    ///
    /// If resumption is enabled and some grandchild of the current root
    /// holds a position equal to `game` (full equality, not fingerprint
    /// equality) and is not a confirmed terminal, that grandchild becomes
    /// the new root and only the rest of the old tree is released.
    /// Otherwise the whole tree is released and the next
    /// [`embodied_root`](Self::embodied_root) starts fresh. Either way the
    /// arena's accounting is reconciled afterward.
    pub fn clear_root(&self, game: &Position) {
        let mut state = self.lock();
        Self::clear_root_locked(&mut state, Some(game), self.resume);
    }

    fn clear_root_locked(state: &mut TreeState, target: Option<&Position>, resume: bool) {
        if let Some(old_root) = state.root {
            let mut promoted = None;

            if resume && let Some(target) = target {
                let children = state.arena.node(old_root).children().to_vec();
                'scan: for child in children {
                    let grandchildren = state.arena.node(child).children().to_vec();
                    for grandchild in grandchildren {
                        let node = state.arena.node(grandchild);
                        if node.is_terminal() {
                            // A finished position must never be re-expanded.
                            continue;
                        }
                        let Some(hash) = node.fingerprint() else {
                            continue;
                        };
                        if state.arena.node_position(hash).position() == target {
                            promoted = Some(grandchild);
                            break 'scan;
                        }
                    }
                }
            }

            match promoted {
                Some(new_root) => {
                    // Mark first so the unlink below leaves this subtree alone.
                    state.arena.node_mut(new_root).set_as_root();
                    state.arena.unlink_node(Some(old_root));
                    state.root = Some(new_root);
                    state.arena.update_transpositions(new_root);
                    debug!(reused = state.arena.used(), "resumed subtree as new root");
                }
                None => {
                    state.arena.unlink_node(Some(old_root));
                    state.root = None;
                    debug!("tree cleared, nothing to resume");
                }
            }
        }

        state.arena.reset_nodes();
    }
}

impl Drop for SearchTree {
    fn drop(&mut self) {
        // Resumption is forced off on destruction; release everything.
        let state = self
            .state
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        Self::clear_root_locked(state, None, false);
    }
}
