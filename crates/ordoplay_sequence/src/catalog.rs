// SPDX-License-Identifier: MIT OR Apache-2.0
//! Catalog of node kinds for tooling.
//!
//! Maps a kind tag to display information and a factory creating a node with
//! default configuration.

use crate::node::Node;
use crate::nodes::{
    LogMessage, LoopCount, NestedSequence, ParallelNext, SetParameter, SkipIfParameter, SkipNodes,
    StopSequence, Wait, WaitFrames, WaitUntilParameter,
};
use crate::sequence::Sequence;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Node kind category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeCategory {
    /// Cursor and playback control
    Flow,
    /// Nested sequences
    Nesting,
    /// Waiting on time or state
    Timing,
    /// Parameter access
    Data,
    /// Diagnostics
    Debug,
    /// Custom/user-defined
    Custom,
}

/// Node kind definition
#[derive(Clone)]
pub struct NodeKind {
    /// Kind tag, as returned by `Node::kind`
    pub kind: &'static str,
    /// Category
    pub category: NodeCategory,
    /// Description
    pub description: &'static str,
    /// Creates a node with default configuration
    pub factory: fn() -> Box<dyn Node>,
}

impl fmt::Debug for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeKind")
            .field("kind", &self.kind)
            .field("category", &self.category)
            .finish_non_exhaustive()
    }
}

/// Registry of available node kinds
#[derive(Debug, Default)]
pub struct NodeCatalog {
    /// Registered kinds by tag
    kinds: IndexMap<&'static str, NodeKind>,
}

impl NodeCatalog {
    /// Create a new empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node kind, replacing any kind with the same tag
    pub fn register(&mut self, kind: NodeKind) {
        let tag = kind.kind;
        if self.kinds.insert(tag, kind).is_some() {
            tracing::warn!("Node kind '{}' registered twice, keeping the last one", tag);
        }
    }

    /// Get a kind by tag
    pub fn get(&self, kind: &str) -> Option<&NodeKind> {
        self.kinds.get(kind)
    }

    /// All kinds in registration order
    pub fn kinds(&self) -> impl Iterator<Item = &NodeKind> {
        self.kinds.values()
    }

    /// Kinds in a category
    pub fn kinds_in_category(&self, category: NodeCategory) -> impl Iterator<Item = &NodeKind> {
        self.kinds.values().filter(move |k| k.category == category)
    }

    /// Create a node from a kind tag
    pub fn create_node(&self, kind: &str) -> Option<Box<dyn Node>> {
        self.get(kind).map(|k| (k.factory)())
    }

    /// Number of kinds
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

/// Create the catalog of built-in nodes
pub fn standard_catalog() -> NodeCatalog {
    let mut catalog = NodeCatalog::new();

    // Flow control
    catalog.register(NodeKind {
        kind: "Skip Nodes",
        category: NodeCategory::Flow,
        description: "Skips the following nodes",
        factory: || Box::new(SkipNodes::new(1)),
    });
    catalog.register(NodeKind {
        kind: "Skip If Parameter",
        category: NodeCategory::Flow,
        description: "Skips the following nodes depending on a parameter",
        factory: || Box::new(SkipIfParameter::new("", true, 1)),
    });
    catalog.register(NodeKind {
        kind: "Parallel Next",
        category: NodeCategory::Flow,
        description: "Plays the following nodes at the same time",
        factory: || Box::new(ParallelNext::new(2)),
    });
    catalog.register(NodeKind {
        kind: "Stop Sequence",
        category: NodeCategory::Flow,
        description: "Stops the player running this sequence",
        factory: || Box::new(StopSequence),
    });

    // Nesting
    catalog.register(NodeKind {
        kind: "Nested Sequence",
        category: NodeCategory::Nesting,
        description: "Plays another sequence, optionally looping it",
        factory: || {
            Box::new(NestedSequence::new(
                Arc::new(Sequence::default()),
                LoopCount::ONCE,
            ))
        },
    });

    // Timing
    catalog.register(NodeKind {
        kind: "Wait",
        category: NodeCategory::Timing,
        description: "Waits for a duration",
        factory: || Box::new(Wait::new(1.0)),
    });
    catalog.register(NodeKind {
        kind: "Wait Frames",
        category: NodeCategory::Timing,
        description: "Waits for a number of steps",
        factory: || Box::new(WaitFrames::new(1)),
    });
    catalog.register(NodeKind {
        kind: "Wait Until Parameter",
        category: NodeCategory::Timing,
        description: "Waits until a parameter has a value",
        factory: || Box::new(WaitUntilParameter::new("", true)),
    });

    // Data
    catalog.register(NodeKind {
        kind: "Set Parameter",
        category: NodeCategory::Data,
        description: "Sets a player parameter",
        factory: || Box::new(SetParameter::new("", false)),
    });

    // Debug
    catalog.register(NodeKind {
        kind: "Log Message",
        category: NodeCategory::Debug,
        description: "Writes a message to the log",
        factory: || Box::new(LogMessage::new("")),
    });

    catalog
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog() {
        let catalog = standard_catalog();
        assert_eq!(catalog.len(), 10);
        assert_eq!(catalog.kinds_in_category(NodeCategory::Timing).count(), 3);
        assert!(catalog.get("Branch").is_none());
    }

    #[test]
    fn test_factories_match_kind_tags() {
        let catalog = standard_catalog();
        for kind in catalog.kinds() {
            let node = catalog.create_node(kind.kind).unwrap();
            assert_eq!(node.kind(), kind.kind);
        }
    }

    #[test]
    fn test_created_node_joins_sequence() {
        let catalog = standard_catalog();
        let mut sequence = Sequence::new("Authored");
        sequence.add_boxed(catalog.create_node("Wait").unwrap());
        sequence.add_boxed(catalog.create_node("Log Message").unwrap());
        assert_eq!(sequence.overrides().len(), 2);
    }
}
