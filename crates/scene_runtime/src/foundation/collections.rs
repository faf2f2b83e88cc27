//! Specialized collection types

use slotmap::{new_key_type, SecondaryMap, SlotMap};

new_key_type! {
    /// Stable handle to a node stored in a [`NodeArena`]
    pub struct NodeId;
}

/// Per-node side table keyed by [`NodeId`]
pub type NodeMap<T> = SecondaryMap<NodeId, T>;

/// Arena owning every node of a loaded scene.
///
/// Handles stay valid while the arena grows, and declaration order is kept
/// separately so that numeric references (zero-based indices into the node
/// list of the document) still resolve.
#[derive(Debug, Clone)]
pub struct NodeArena<T> {
    slots: SlotMap<NodeId, T>,
    order: Vec<NodeId>,
}

impl<T> NodeArena<T> {
    /// Create an empty arena
    pub fn new() -> Self {
        Self {
            slots: SlotMap::with_key(),
            order: Vec::new(),
        }
    }

    /// Append an item at the end of declaration order
    pub fn push(&mut self, item: T) -> NodeId {
        let id = self.slots.insert(item);
        self.order.push(id);
        id
    }

    /// Number of items
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the arena holds no items
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Look up an item by handle
    pub fn get(&self, id: NodeId) -> Option<&T> {
        self.slots.get(id)
    }

    /// Mutable lookup by handle
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        self.slots.get_mut(id)
    }

    /// Handle of the item declared at `index`
    pub fn id_at(&self, index: usize) -> Option<NodeId> {
        self.order.get(index).copied()
    }

    /// Handles in declaration order
    pub fn ids(&self) -> &[NodeId] {
        &self.order
    }

    /// Items with their handles, in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &T)> + '_ {
        self.order.iter().map(move |&id| (id, &self.slots[id]))
    }
}

impl<T> Default for NodeArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::ops::Index<NodeId> for NodeArena<T> {
    type Output = T;

    fn index(&self, id: NodeId) -> &T {
        &self.slots[id]
    }
}

impl<T> std::ops::IndexMut<NodeId> for NodeArena<T> {
    fn index_mut(&mut self, id: NodeId) -> &mut T {
        &mut self.slots[id]
    }
}
