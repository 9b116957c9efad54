// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node dispatch contract.

use crate::override_field::FieldDeclaration;
use crate::sequence::Sequence;
use crate::task::{BoxTask, Context};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Unique identifier for a node within its sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Create a new random node ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

/// Identity of one nested occurrence of a sequence.
///
/// Assigned once to the node that references the nested sequence and kept
/// across edits. The nil value stands for the root sequence of a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NestedId(pub Uuid);

impl NestedId {
    /// The root sequence, which is not nested anywhere
    pub const ROOT: Self = Self(Uuid::nil());

    /// Create a new random nested identity
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Whether this is the root identity
    pub fn is_root(&self) -> bool {
        self.0.is_nil()
    }

    /// Raw 16-byte token
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl Default for NestedId {
    fn default() -> Self {
        Self::ROOT
    }
}

impl fmt::Display for NestedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            f.write_str("root")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// A nested sequence referenced by a node
#[derive(Debug, Clone, Copy)]
pub struct NestedRef<'a> {
    /// Identity of this occurrence
    pub identity: NestedId,
    /// The referenced sequence
    pub sequence: &'a Arc<Sequence>,
}

/// A unit of work in a sequence.
///
/// Nodes are shared by every player of their sequence and may be invoked
/// concurrently, so `invoke` takes `&self`: anything that changes while the
/// node runs belongs in the returned task.
pub trait Node: fmt::Debug + Send + Sync {
    /// Kind tag, also the default display name
    fn kind(&self) -> &'static str;

    /// Optional human-readable description
    fn description(&self) -> Option<&str> {
        None
    }

    /// Short summary derived from the node's configuration
    fn preview_value(&self) -> Option<String> {
        None
    }

    /// Fields this node exposes for per-player overrides, in a stable order
    fn declare_overrides(&mut self) -> Vec<FieldDeclaration<'_>> {
        Vec::new()
    }

    /// Nested sequence this node plays, if any
    fn nested(&self) -> Option<NestedRef<'_>> {
        None
    }

    /// Run the node.
    ///
    /// `None` means the node finished within this step. Otherwise the
    /// scheduler polls the returned task until it reports done.
    fn invoke(
        &self,
        cx: &mut Context<'_>,
        sequence: &Arc<Sequence>,
        nested: NestedId,
    ) -> Option<BoxTask>;
}

/// A node owned by a sequence, with its display name
#[derive(Debug)]
pub struct SequenceNode {
    id: NodeId,
    name: String,
    node: Box<dyn Node>,
}

impl SequenceNode {
    /// Wrap a node, named after its kind
    pub fn new(node: Box<dyn Node>) -> Self {
        Self {
            id: NodeId::new(),
            name: node.kind().to_string(),
            node,
        }
    }

    /// Unique node ID
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the node
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// The node behavior
    pub fn node(&self) -> &dyn Node {
        self.node.as_ref()
    }

    /// Mutable node behavior.
    ///
    /// Changing override fields through this requires a registry
    /// synchronization afterwards; `Sequence::edit_node` does that.
    pub fn node_mut(&mut self) -> &mut dyn Node {
        self.node.as_mut()
    }

    /// Label used in logs: `name (kind)`
    pub fn label(&self) -> String {
        if self.name == self.node.kind() {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, self.node.kind())
        }
    }
}
