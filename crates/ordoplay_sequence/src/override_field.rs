// SPDX-License-Identifier: MIT OR Apache-2.0
//! Override fields: node values a player may replace per instance.
//!
//! A field is addressed by its registry index and its value type. The label
//! and the owning node are informational only, so a field keeps its binding
//! when nodes are reordered. Two unrelated fields that end up with the same
//! index and type after an edit are treated as the same slot and share
//! whatever value a player bound to it.

use crate::node::{NestedId, NodeId};
use crate::sequence::Sequence;
use crate::task::Context;
use crate::value::{Value, ValueKind, ValueType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a field in its sequence's override registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OverrideIndex(pub u32);

impl fmt::Display for OverrideIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A node field whose value can be overridden per player
#[derive(Debug, Clone, PartialEq)]
pub struct OverrideField<T> {
    index: Option<OverrideIndex>,
    /// Template value used when no enabled override exists
    pub value: T,
}

impl<T: ValueKind> OverrideField<T> {
    /// Create a field that has not been registered yet
    pub fn new(value: T) -> Self {
        Self { index: None, value }
    }

    /// Registry index, once the owning sequence has synchronized its registry
    pub fn index(&self) -> Option<OverrideIndex> {
        self.index
    }

    /// Effective value for the player driving `cx`
    pub fn resolve(&self, cx: &Context<'_>, sequence: &Sequence, nested: NestedId) -> T {
        cx.resolve(self, sequence, nested)
    }
}

impl<T: ValueKind + Default> Default for OverrideField<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Type-erased access to an [`OverrideField`] used by registry synchronization
pub trait OverrideSlot {
    /// Current registry index
    fn index(&self) -> Option<OverrideIndex>;

    /// Store the index the registry assigned
    fn assign_index(&mut self, index: OverrideIndex);

    /// Concrete value type
    fn value_type(&self) -> ValueType;

    /// Template value as a dynamic value
    fn template_value(&self) -> Value;
}

impl<T: ValueKind> OverrideSlot for OverrideField<T> {
    fn index(&self) -> Option<OverrideIndex> {
        self.index
    }

    fn assign_index(&mut self, index: OverrideIndex) {
        self.index = Some(index);
    }

    fn value_type(&self) -> ValueType {
        T::VALUE_TYPE
    }

    fn template_value(&self) -> Value {
        self.value.clone().into_value()
    }
}

/// A field a node exposes for overriding, as returned by `Node::declare_overrides`
pub struct FieldDeclaration<'a> {
    /// Human-readable field label
    pub label: &'static str,
    /// The field itself
    pub slot: &'a mut dyn OverrideSlot,
}

impl<'a> FieldDeclaration<'a> {
    /// Declare a field
    pub fn new(label: &'static str, slot: &'a mut dyn OverrideSlot) -> Self {
        Self { label, slot }
    }
}

/// Registry entry describing one override field of a sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideDescriptor {
    /// Registry index
    pub index: OverrideIndex,
    /// Concrete value type
    pub value_type: ValueType,
    /// Field label, for tooling
    pub label: String,
    /// Node that declared the field
    pub node: NodeId,
    /// Template value at the last synchronization
    pub default_value: Value,
}

impl OverrideDescriptor {
    /// Whether this descriptor and a slot address the same override
    pub fn matches(&self, index: OverrideIndex, value_type: ValueType) -> bool {
        self.index == index && self.value_type == value_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_field_is_unregistered() {
        let field = OverrideField::new(2.5f32);
        assert_eq!(field.index(), None);
        assert_eq!(field.value_type(), ValueType::Float);
        assert_eq!(field.template_value(), Value::Float(2.5));
    }

    #[test]
    fn test_assign_index() {
        let mut field = OverrideField::new(String::from("hello"));
        field.assign_index(OverrideIndex(4));
        assert_eq!(field.index(), Some(OverrideIndex(4)));
        assert_eq!(OverrideSlot::index(&field), Some(OverrideIndex(4)));
    }

    #[test]
    fn test_descriptor_matches_on_index_and_type_only() {
        let descriptor = OverrideDescriptor {
            index: OverrideIndex(1),
            value_type: ValueType::Vector3,
            label: "position".to_string(),
            node: NodeId::new(),
            default_value: Value::Vector3([0.0; 3]),
        };
        assert!(descriptor.matches(OverrideIndex(1), ValueType::Vector3));
        assert!(!descriptor.matches(OverrideIndex(1), ValueType::Vector2));
        assert!(!descriptor.matches(OverrideIndex(2), ValueType::Vector3));
    }
}
