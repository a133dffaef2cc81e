use alloc::vec::Vec;

use super::node::RbNode;
use crate::error::TryReserveError;

/// A simple arena allocator for tree nodes, indexed by `usize` instead of
/// pointers so the tree can stay entirely in safe Rust.
///
/// Unlike the free-list-with-tail-swap used elsewhere in this crate, removed
/// slots here are never compacted: a node's index is also its identity for
/// every parent/child link pointing at it, and a tail-swap would require
/// re-threading every such link on removal. A plain free list trades a bit
/// of fragmentation for not having to do that.
pub(crate) struct NodeArena<K, V> {
    slots: Vec<Option<RbNode<K, V>>>,
    free: Vec<usize>,
}

impl<K, V> NodeArena<K, V> {
    pub fn new() -> Self {
        NodeArena {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    pub fn add(&mut self, node: RbNode<K, V>) -> Result<usize, TryReserveError> {
        match self.free.pop() {
            Some(idx) => {
                debug_assert!(self.slots[idx].is_none(), "free slot was occupied");
                self.slots[idx] = Some(node);
                Ok(idx)
            }
            None => {
                self.slots.try_reserve(1)?;
                self.slots.push(Some(node));
                Ok(self.slots.len() - 1)
            }
        }
    }

    pub fn remove(&mut self, idx: usize) -> RbNode<K, V> {
        let node = self.slots[idx].take().expect("remove of an empty arena slot");
        self.free.push(idx);
        node
    }

    pub fn get(&self, idx: usize) -> &RbNode<K, V> {
        self.slots[idx].as_ref().expect("stale node index")
    }

    pub fn get_mut(&mut self, idx: usize) -> &mut RbNode<K, V> {
        self.slots[idx].as_mut().expect("stale node index")
    }

    pub fn slots_mut(&mut self) -> &mut [Option<RbNode<K, V>>] {
        &mut self.slots
    }
}

impl<K, V> Default for NodeArena<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
