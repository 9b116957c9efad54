// SPDX-License-Identifier: MIT OR Apache-2.0
//! Sequence template: ordered nodes plus the override registry.

use crate::node::{NestedRef, Node, NodeId, SequenceNode};
use crate::override_field::{FieldDeclaration, OverrideDescriptor, OverrideIndex};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for a sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SequenceId(pub Uuid);

impl SequenceId {
    /// Create a new random sequence ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SequenceId {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of a registry synchronization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegistrySync {
    /// Entries created for newly declared fields
    pub added: usize,
    /// Entries removed because no node declares them anymore
    pub removed: usize,
    /// Fields that carried an index already claimed by another field
    pub reindexed: usize,
}

impl RegistrySync {
    /// Check if the registry was already in sync
    pub fn is_unchanged(&self) -> bool {
        self.added == 0 && self.removed == 0 && self.reindexed == 0
    }
}

/// A sequence of nodes.
///
/// Templates are edited through `&mut self` and then shared between players
/// as `Arc<Sequence>`; players never modify them.
#[derive(Debug)]
pub struct Sequence {
    /// Unique sequence ID
    pub id: SequenceId,
    /// Sequence name
    pub name: String,
    /// Run all nodes at once instead of in list order
    pub parallel: bool,
    /// Nodes in execution order
    nodes: Vec<SequenceNode>,
    /// Override registry
    overrides: Vec<OverrideDescriptor>,
}

impl Sequence {
    /// Create a new empty sequence
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: SequenceId::new(),
            name: name.into(),
            parallel: false,
            nodes: Vec::new(),
            overrides: Vec::new(),
        }
    }

    /// Set the parallel flag
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Switch between list-order and parallel playback
    pub fn set_parallel(&mut self, parallel: bool) {
        self.parallel = parallel;
    }

    /// Add a node, builder style
    pub fn with_node(mut self, node: impl Node + 'static) -> Self {
        self.add_node(node);
        self
    }

    /// Wrap for sharing between players
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Append a node
    pub fn add_node(&mut self, node: impl Node + 'static) -> NodeId {
        self.add_boxed(Box::new(node))
    }

    /// Append a boxed node
    pub fn add_boxed(&mut self, node: Box<dyn Node>) -> NodeId {
        let entry = SequenceNode::new(node);
        let id = entry.id();
        self.nodes.push(entry);
        self.sync_overrides();
        id
    }

    /// Insert a node at a position
    pub fn insert_node(
        &mut self,
        index: usize,
        node: Box<dyn Node>,
    ) -> Result<NodeId, SequenceError> {
        if index > self.nodes.len() {
            return Err(SequenceError::IndexOutOfRange {
                index,
                len: self.nodes.len(),
            });
        }
        let entry = SequenceNode::new(node);
        let id = entry.id();
        self.nodes.insert(index, entry);
        self.sync_overrides();
        Ok(id)
    }

    /// Remove a node, pruning its override fields
    pub fn remove_node(&mut self, node_id: NodeId) -> Option<SequenceNode> {
        let position = self.position(node_id)?;
        let removed = self.nodes.remove(position);
        self.sync_overrides();
        Some(removed)
    }

    /// Move a node to another position
    pub fn move_node(&mut self, node_id: NodeId, to: usize) -> Result<(), SequenceError> {
        let from = self
            .position(node_id)
            .ok_or(SequenceError::NodeNotFound(node_id))?;
        if to >= self.nodes.len() {
            return Err(SequenceError::IndexOutOfRange {
                index: to,
                len: self.nodes.len(),
            });
        }
        let entry = self.nodes.remove(from);
        self.nodes.insert(to, entry);
        self.sync_overrides();
        Ok(())
    }

    /// Edit a node's configuration, then resynchronize the registry
    pub fn edit_node<R>(
        &mut self,
        node_id: NodeId,
        edit: impl FnOnce(&mut dyn Node) -> R,
    ) -> Option<R> {
        let position = self.position(node_id)?;
        let result = edit(self.nodes[position].node_mut());
        self.sync_overrides();
        Some(result)
    }

    /// Rename a node
    pub fn rename_node(&mut self, node_id: NodeId, name: impl Into<String>) -> bool {
        match self.nodes.iter_mut().find(|n| n.id() == node_id) {
            Some(entry) => {
                entry.set_name(name);
                true
            }
            None => false,
        }
    }

    /// Position of a node
    pub fn position(&self, node_id: NodeId) -> Option<usize> {
        self.nodes.iter().position(|n| n.id() == node_id)
    }

    /// Get a node
    pub fn node(&self, node_id: NodeId) -> Option<&SequenceNode> {
        self.nodes.iter().find(|n| n.id() == node_id)
    }

    /// Get a node by position
    pub fn node_at(&self, index: usize) -> Option<&SequenceNode> {
        self.nodes.get(index)
    }

    /// All nodes in order
    pub fn nodes(&self) -> &[SequenceNode] {
        &self.nodes
    }

    /// Node count
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the sequence has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Override registry
    pub fn overrides(&self) -> &[OverrideDescriptor] {
        &self.overrides
    }

    /// Nested sequences referenced directly by this sequence's nodes
    pub fn nested_sequences(&self) -> impl Iterator<Item = NestedRef<'_>> {
        self.nodes.iter().filter_map(|n| n.node().nested())
    }

    /// Reconcile the override registry with the fields the nodes declare.
    ///
    /// Fields whose `(index, type)` matches an unclaimed entry keep it. Other
    /// fields get a fresh index one past the highest in the registry. Entries
    /// no field claimed are pruned afterwards. Running this twice without
    /// edits in between changes nothing.
    pub fn sync_overrides(&mut self) -> RegistrySync {
        let mut report = RegistrySync::default();
        let mut live = vec![false; self.overrides.len()];
        let mut next_index = self
            .overrides
            .iter()
            .map(|d| d.index.0 + 1)
            .max()
            .unwrap_or(0);

        for entry in &mut self.nodes {
            let node_id = entry.id();
            for FieldDeclaration { label, slot } in entry.node_mut().declare_overrides() {
                let value_type = slot.value_type();
                let existing = slot.index().and_then(|index| {
                    self.overrides
                        .iter()
                        .position(|d| d.matches(index, value_type))
                });

                match existing {
                    Some(position) if !live[position] => {
                        live[position] = true;
                        let descriptor = &mut self.overrides[position];
                        descriptor.label = label.to_string();
                        descriptor.node = node_id;
                        descriptor.default_value = slot.template_value();
                    }
                    claimed => {
                        if let (Some(_), Some(index)) = (claimed, slot.index()) {
                            tracing::warn!(
                                "Sequence '{}': override {} ({}) is declared twice, reindexing",
                                self.name,
                                index,
                                value_type
                            );
                            report.reindexed += 1;
                        }
                        let index = OverrideIndex(next_index);
                        next_index += 1;
                        slot.assign_index(index);
                        self.overrides.push(OverrideDescriptor {
                            index,
                            value_type,
                            label: label.to_string(),
                            node: node_id,
                            default_value: slot.template_value(),
                        });
                        live.push(true);
                        report.added += 1;
                    }
                }
            }
        }

        let before = self.overrides.len();
        let mut live = live.into_iter();
        self.overrides.retain(|_| live.next().unwrap_or(false));
        report.removed = before - self.overrides.len();

        if !report.is_unchanged() {
            tracing::debug!(
                "Synchronized overrides of '{}': {} added, {} removed, {} reindexed",
                self.name,
                report.added,
                report.removed,
                report.reindexed
            );
        }
        report
    }
}

impl Default for Sequence {
    fn default() -> Self {
        Self::new("Untitled Sequence")
    }
}

/// Error when editing a sequence
#[derive(Debug, Error)]
pub enum SequenceError {
    /// Position outside the node list
    #[error("Node index {index} out of range for a sequence of {len} nodes")]
    IndexOutOfRange {
        /// Requested position
        index: usize,
        /// Node count
        len: usize,
    },

    /// Node not found
    #[error("Node not found: {0:?}")]
    NodeNotFound(NodeId),

    /// Loop count that is neither -1 nor positive
    #[error("Invalid loop count {0}: expected -1 or a positive count")]
    InvalidLoopCount(i32),
}
