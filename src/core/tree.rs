//! Arena of state nodes.
//!
//! Nodes are addressed by [`StateId`], a stable index into the arena. A
//! node's parent is fixed when it is created and its child list only grows
//! while the hierarchy is being assembled.

use super::error::StructureError;
use super::identity::Identity;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable index of a state inside a [`StateTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StateId(usize);

impl StateId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A state in the hierarchy: its identity, an optional parent (absent means
/// root) and the ordered list of children declared under it.
///
/// Composition is a capability, not a node kind: any node with children can
/// be driven as a composite.
#[derive(Clone, Debug)]
pub struct StateNode {
    identity: Identity,
    parent: Option<StateId>,
    children: Vec<StateId>,
}

impl StateNode {
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn name(&self) -> &str {
        self.identity.name()
    }

    pub fn parent(&self) -> Option<StateId> {
        self.parent
    }

    pub fn children(&self) -> &[StateId] {
        &self.children
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Append-only arena holding every state of a machine.
#[derive(Clone, Debug, Default)]
pub struct StateTree {
    nodes: Vec<StateNode>,
}

impl StateTree {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Add a parentless node.
    pub fn add_root(&mut self, identity: Identity) -> StateId {
        let id = StateId(self.nodes.len());
        self.nodes.push(StateNode {
            identity,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Add a node, registering it as the last child of `parent` if present.
    pub fn add(
        &mut self,
        identity: Identity,
        parent: Option<StateId>,
    ) -> Result<StateId, StructureError> {
        let id = StateId(self.nodes.len());
        if let Some(parent) = parent {
            let parent_node = self
                .nodes
                .get_mut(parent.0)
                .ok_or(StructureError::UnknownState { id: parent.0 })?;
            parent_node.children.push(id);
        }
        self.nodes.push(StateNode {
            identity,
            parent,
            children: Vec::new(),
        });
        Ok(id)
    }

    pub fn get(&self, id: StateId) -> Option<&StateNode> {
        self.nodes.get(id.0)
    }

    /// Like [`get`](Self::get) but reports foreign ids as a structure error.
    pub fn node(&self, id: StateId) -> Result<&StateNode, StructureError> {
        self.get(id).ok_or(StructureError::UnknownState { id: id.0 })
    }

    pub fn contains(&self, id: StateId) -> bool {
        id.0 < self.nodes.len()
    }

    /// Combined name of a state, or `"<unknown>"` for a foreign id.
    pub fn name(&self, id: StateId) -> &str {
        self.get(id).map(StateNode::name).unwrap_or("<unknown>")
    }

    pub fn parent(&self, id: StateId) -> Option<StateId> {
        self.get(id).and_then(StateNode::parent)
    }

    pub fn children(&self, id: StateId) -> &[StateId] {
        self.get(id).map(StateNode::children).unwrap_or(&[])
    }

    /// Whether `child` is declared directly under `parent`.
    pub fn is_child_of(&self, child: StateId, parent: StateId) -> bool {
        self.children(parent).contains(&child)
    }

    /// Parent chain of `id`, nearest first.
    pub fn ancestors(&self, id: StateId) -> Vec<StateId> {
        let mut chain = Vec::new();
        let mut cursor = self.parent(id);
        while let Some(next) = cursor {
            chain.push(next);
            cursor = self.parent(next);
        }
        chain
    }

    /// Nesting depth; roots are at depth zero.
    pub fn depth(&self, id: StateId) -> usize {
        self.ancestors(id).len()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (StateId, &StateNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (StateId(index), node))
    }
}
