//! Node arena.
//!
//! All mutable builder nodes of a compilation live in one flat vector
//! and refer to each other by index. Parent and original links are
//! therefore plain copyable handles: no reference counting, no
//! ownership cycles, and a child can reach its parent while both stay
//! mutable through the arena.
//!
//! Handles are only ever created by [`Arena::alloc`], so indexing is
//! infallible for any id that reaches the passes.

use super::node::NodeBuilder;

/// Handle to a node in the [`Arena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    /// Position in the arena.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Flat store of every builder node in a compilation.
#[derive(Debug, Default)]
pub struct Arena {
    nodes: Vec<NodeBuilder>,
}

impl Arena {
    /// Empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a node and return its handle.
    pub fn alloc(&mut self, node: NodeBuilder) -> NodeId {
        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Borrow a node.
    pub fn node(&self, id: NodeId) -> &NodeBuilder {
        &self.nodes[id.index()]
    }

    /// Mutably borrow a node.
    pub fn node_mut(&mut self, id: NodeId) -> &mut NodeBuilder {
        &mut self.nodes[id.index()]
    }

    /// Number of nodes allocated.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when nothing has been allocated.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All handles in allocation order.
    ///
    /// Passes scan this to find their dirty work; allocation order is
    /// declaration order, which keeps diagnostics stable.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId::from_index)
    }
}
