// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-player override bindings.
//!
//! A player keeps one binding group per sequence occurrence it can reach:
//! the root sequence, plus every nested sequence keyed by the identity of the
//! node that nests it. Each group holds one slot per registry entry of that
//! sequence. A disabled slot defers to the template value.

use crate::node::NestedId;
use crate::override_field::{OverrideDescriptor, OverrideField, OverrideIndex};
use crate::sequence::{Sequence, SequenceId};
use crate::value::{Value, ValueKind, ValueType};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Override state of one field for one player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingSlot {
    /// Registry index of the field
    pub index: OverrideIndex,
    /// Value type of the field
    pub value_type: ValueType,
    /// Whether the bound value replaces the template value
    pub enabled: bool,
    /// Bound value
    pub value: Value,
}

impl BindingSlot {
    /// A disabled slot holding the template default
    pub fn disabled(descriptor: &OverrideDescriptor) -> Self {
        Self {
            index: descriptor.index,
            value_type: descriptor.value_type,
            enabled: false,
            value: descriptor.default_value.clone(),
        }
    }

    /// Check if this slot addresses `(index, value_type)`
    pub fn matches(&self, index: OverrideIndex, value_type: ValueType) -> bool {
        self.index == index && self.value_type == value_type
    }
}

/// Bindings for one sequence occurrence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingGroup {
    /// Bound sequence
    pub sequence: SequenceId,
    /// Nested occurrence, or root
    pub nested: NestedId,
    /// Sequence name at the last synchronization, for tooling
    pub sequence_name: String,
    /// Slots in registry order
    slots: Vec<BindingSlot>,
}

impl BindingGroup {
    /// Create an empty group
    pub fn new(sequence: SequenceId, nested: NestedId) -> Self {
        Self {
            sequence,
            nested,
            sequence_name: String::new(),
            slots: Vec::new(),
        }
    }

    /// Check if this group binds a sequence occurrence
    pub fn is_for(&self, sequence: SequenceId, nested: NestedId) -> bool {
        self.sequence == sequence && self.nested == nested
    }

    /// All slots
    pub fn slots(&self) -> &[BindingSlot] {
        &self.slots
    }

    /// Find a slot
    pub fn slot(&self, index: OverrideIndex, value_type: ValueType) -> Option<&BindingSlot> {
        self.slots.iter().find(|s| s.matches(index, value_type))
    }
}

/// Outcome of a binding synchronization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BindingSync {
    /// Groups created for newly reachable sequence occurrences
    pub groups_added: usize,
    /// Groups dropped because their occurrence is gone
    pub groups_removed: usize,
    /// Slots created for new registry entries
    pub slots_added: usize,
    /// Slots dropped because their registry entry is gone
    pub slots_removed: usize,
    /// Slots whose bound value had the wrong type and was reset
    pub slots_reset: usize,
}

impl BindingSync {
    /// Check if the bindings were already in sync
    pub fn is_unchanged(&self) -> bool {
        *self == Self::default()
    }
}

/// All binding groups of a player
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverrideBindings {
    groups: Vec<BindingGroup>,
}

impl OverrideBindings {
    /// Create empty bindings
    pub fn new() -> Self {
        Self::default()
    }

    /// All groups
    pub fn groups(&self) -> &[BindingGroup] {
        &self.groups
    }

    /// Group for a sequence occurrence
    pub fn group(&self, sequence: SequenceId, nested: NestedId) -> Option<&BindingGroup> {
        self.groups.iter().find(|g| g.is_for(sequence, nested))
    }

    /// Mutable group for a sequence occurrence
    pub fn group_mut(
        &mut self,
        sequence: SequenceId,
        nested: NestedId,
    ) -> Option<&mut BindingGroup> {
        self.groups.iter_mut().find(|g| g.is_for(sequence, nested))
    }

    /// Effective value of a field.
    ///
    /// A missing group or slot means "not overridden", as does a disabled
    /// slot.
    pub fn resolve<T: ValueKind>(
        &self,
        field: &OverrideField<T>,
        sequence: SequenceId,
        nested: NestedId,
    ) -> T {
        field
            .index()
            .and_then(|index| self.group(sequence, nested)?.slot(index, T::VALUE_TYPE))
            .filter(|slot| slot.enabled)
            .and_then(|slot| T::from_value(&slot.value))
            .unwrap_or_else(|| field.value.clone())
    }

    /// Bind a value and enable the slot
    pub fn set_override(
        &mut self,
        sequence: SequenceId,
        nested: NestedId,
        index: OverrideIndex,
        value: impl Into<Value>,
    ) -> Result<(), BindingError> {
        let value = value.into();
        let slot = self.slot_by_index(sequence, nested, index)?;
        if slot.value_type != value.value_type() {
            return Err(BindingError::TypeMismatch {
                index,
                expected: slot.value_type,
                found: value.value_type(),
            });
        }
        slot.value = value;
        slot.enabled = true;
        Ok(())
    }

    /// Enable or disable a slot without touching its bound value
    pub fn set_enabled(
        &mut self,
        sequence: SequenceId,
        nested: NestedId,
        index: OverrideIndex,
        enabled: bool,
    ) -> Result<(), BindingError> {
        self.slot_by_index(sequence, nested, index)?.enabled = enabled;
        Ok(())
    }

    fn slot_by_index(
        &mut self,
        sequence: SequenceId,
        nested: NestedId,
        index: OverrideIndex,
    ) -> Result<&mut BindingSlot, BindingError> {
        let group = self
            .group_mut(sequence, nested)
            .ok_or(BindingError::GroupNotFound { sequence, nested })?;
        group
            .slots
            .iter_mut()
            .find(|s| s.index == index)
            .ok_or(BindingError::SlotNotFound(index))
    }

    /// Reconcile the groups with a root sequence and everything it nests.
    ///
    /// Slots whose `(index, type)` still exist keep their state; new registry
    /// entries get a disabled slot holding the template default; groups and
    /// slots without a template counterpart are dropped.
    pub fn sync(&mut self, root: &Sequence) -> BindingSync {
        let mut report = BindingSync::default();
        let mut targets = Vec::new();
        collect_occurrences(root, NestedId::ROOT, &mut Vec::new(), &mut targets);

        let mut previous = std::mem::take(&mut self.groups);
        for (sequence, nested) in targets {
            if sequence.overrides().is_empty() {
                continue;
            }

            let mut group = match previous.iter().position(|g| g.is_for(sequence.id, nested)) {
                Some(position) => previous.swap_remove(position),
                None => {
                    report.groups_added += 1;
                    BindingGroup::new(sequence.id, nested)
                }
            };
            group.sequence_name.clone_from(&sequence.name);

            let mut old_slots = std::mem::take(&mut group.slots);
            for descriptor in sequence.overrides() {
                let existing = old_slots
                    .iter()
                    .position(|s| descriptor.matches(s.index, s.value_type));
                match existing {
                    Some(position) => {
                        let mut slot = old_slots.swap_remove(position);
                        if slot.value.value_type() != slot.value_type {
                            tracing::warn!(
                                "Binding {} of '{}' ({}) held a {} value, resetting",
                                slot.index,
                                sequence.name,
                                nested,
                                slot.value.value_type()
                            );
                            slot = BindingSlot::disabled(descriptor);
                            report.slots_reset += 1;
                        }
                        group.slots.push(slot);
                    }
                    None => {
                        group.slots.push(BindingSlot::disabled(descriptor));
                        report.slots_added += 1;
                    }
                }
            }
            report.slots_removed += old_slots.len();
            self.groups.push(group);
        }
        report.groups_removed = previous.len();

        if !report.is_unchanged() {
            tracing::debug!(
                "Synchronized bindings for '{}': {:?}",
                root.name,
                report
            );
        }
        report
    }

    /// Serialize to RON format
    pub fn to_ron(&self) -> Result<String, BindingError> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }

    /// Deserialize from RON format.
    ///
    /// Imported bindings should be synchronized against the template before
    /// use; stale groups and slots are dropped then.
    pub fn from_ron(s: &str) -> Result<Self, BindingError> {
        Ok(ron::from_str(s)?)
    }
}

/// Every sequence occurrence reachable from `sequence`, depth first.
///
/// An occurrence is keyed by the identity of the innermost nesting node, so
/// a sequence nested inside a sequence that is itself nested twice yields a
/// single occurrence.
fn collect_occurrences<'a>(
    sequence: &'a Sequence,
    nested: NestedId,
    path: &mut Vec<SequenceId>,
    targets: &mut Vec<(&'a Sequence, NestedId)>,
) {
    if path.contains(&sequence.id) {
        tracing::warn!(
            "Sequence '{}' nests itself, ignoring the inner occurrence",
            sequence.name
        );
        return;
    }
    if !targets
        .iter()
        .any(|(s, n)| s.id == sequence.id && *n == nested)
    {
        targets.push((sequence, nested));
    }

    path.push(sequence.id);
    for nested_ref in sequence.nested_sequences() {
        collect_occurrences(nested_ref.sequence, nested_ref.identity, path, targets);
    }
    path.pop();
}

/// Error when editing bindings
#[derive(Debug, Error)]
pub enum BindingError {
    /// No group for the sequence occurrence
    #[error("No bindings for sequence {sequence:?} ({nested})")]
    GroupNotFound {
        /// Sequence
        sequence: SequenceId,
        /// Nested occurrence
        nested: NestedId,
    },

    /// No slot with this index
    #[error("No override slot {0}")]
    SlotNotFound(OverrideIndex),

    /// Value of the wrong type
    #[error("Override {index} expects {expected}, got {found}")]
    TypeMismatch {
        /// Slot index
        index: OverrideIndex,
        /// Slot type
        expected: ValueType,
        /// Offered value type
        found: ValueType,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] ron::Error),

    /// Deserialization error
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] ron::error::SpannedError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{LoopCount, NestedSequence};
    use crate::override_field::OverrideSlot;
    use crate::testing::Tunable;
    use std::sync::Arc;

    fn template() -> Sequence {
        let mut sequence = Sequence::new("Root");
        sequence.add_node(Tunable::new(1.0, "a"));
        sequence
    }

    #[test]
    fn test_sync_creates_disabled_slots() {
        let root = template();
        let mut bindings = OverrideBindings::new();
        let report = bindings.sync(&root);

        assert_eq!(report.groups_added, 1);
        assert_eq!(report.slots_added, 2);
        let group = bindings.group(root.id, NestedId::ROOT).unwrap();
        assert!(group.slots().iter().all(|s| !s.enabled));
        assert_eq!(group.slots()[0].value, Value::Float(1.0));

        assert!(bindings.sync(&root).is_unchanged());
    }

    #[test]
    fn test_resolve_respects_enabled_flag() {
        let mut root = template();
        let field = OverrideField::new(1.0f32);
        let mut bindings = OverrideBindings::new();
        bindings.sync(&root);

        // Unregistered fields are never overridden
        assert_eq!(bindings.resolve(&field, root.id, NestedId::ROOT), 1.0);

        let mut speed = OverrideField::new(1.0f32);
        let id = root.add_node(Tunable::new(1.0, "b"));
        bindings.sync(&root);
        let index = root
            .overrides()
            .iter()
            .find(|d| d.node == id && d.value_type == ValueType::Float)
            .unwrap()
            .index;
        speed.assign_index(index);

        bindings
            .set_override(root.id, NestedId::ROOT, index, 4.0f32)
            .unwrap();
        assert_eq!(bindings.resolve(&speed, root.id, NestedId::ROOT), 4.0);

        bindings
            .set_enabled(root.id, NestedId::ROOT, index, false)
            .unwrap();
        assert_eq!(bindings.resolve(&speed, root.id, NestedId::ROOT), 1.0);

        // Another occurrence of the same sequence is not affected
        assert_eq!(bindings.resolve(&speed, root.id, NestedId::new()), 1.0);
    }

    #[test]
    fn test_set_override_type_mismatch() {
        let root = template();
        let mut bindings = OverrideBindings::new();
        bindings.sync(&root);

        let result = bindings.set_override(root.id, NestedId::ROOT, OverrideIndex(0), true);
        assert!(matches!(
            result,
            Err(BindingError::TypeMismatch {
                expected: ValueType::Float,
                found: ValueType::Bool,
                ..
            })
        ));
        assert!(matches!(
            bindings.set_override(root.id, NestedId::ROOT, OverrideIndex(9), 1.0f32),
            Err(BindingError::SlotNotFound(OverrideIndex(9)))
        ));
        assert!(matches!(
            bindings.set_override(SequenceId::new(), NestedId::ROOT, OverrideIndex(0), 1.0f32),
            Err(BindingError::GroupNotFound { .. })
        ));
    }

    #[test]
    fn test_sync_preserves_and_prunes() {
        let mut root = template();
        let second = root.add_node(Tunable::new(2.0, "b"));
        let mut bindings = OverrideBindings::new();
        bindings.sync(&root);
        bindings
            .set_override(root.id, NestedId::ROOT, OverrideIndex(2), 9.0f32)
            .unwrap();

        // Removing the first node keeps the second node's binding
        let first = root.nodes()[0].id();
        root.remove_node(first);
        let report = bindings.sync(&root);
        assert_eq!(report.slots_removed, 2);

        let slot = bindings
            .group(root.id, NestedId::ROOT)
            .unwrap()
            .slot(OverrideIndex(2), ValueType::Float)
            .unwrap();
        assert!(slot.enabled);
        assert_eq!(slot.value, Value::Float(9.0));
        assert_eq!(root.overrides()[0].node, second);
    }

    #[test]
    fn test_nested_occurrences_get_separate_groups() {
        let inner = template().into_shared();
        let first = NestedSequence::new(Arc::clone(&inner), LoopCount::ONCE);
        let second = NestedSequence::new(Arc::clone(&inner), LoopCount::ONCE);
        let (first_id, second_id) = (first.identity(), second.identity());

        let mut root = Sequence::new("Root");
        root.add_node(first);
        root.add_node(second);

        let mut bindings = OverrideBindings::new();
        bindings.sync(&root);

        // The root itself declares nothing, so only the two occurrences
        assert_eq!(bindings.groups().len(), 2);
        bindings
            .set_override(inner.id, first_id, OverrideIndex(0), 3.0f32)
            .unwrap();
        assert!(bindings.group(inner.id, second_id).unwrap().slots()[0].value == Value::Float(1.0));
    }

    #[test]
    fn test_sync_drops_unreachable_groups() {
        let inner = template().into_shared();
        let mut root = Sequence::new("Root");
        let nested = root.add_node(NestedSequence::new(inner, LoopCount::ONCE));

        let mut bindings = OverrideBindings::new();
        bindings.sync(&root);
        assert_eq!(bindings.groups().len(), 1);

        root.remove_node(nested);
        let report = bindings.sync(&root);
        assert_eq!(report.groups_removed, 1);
        assert!(bindings.groups().is_empty());
    }

    #[test]
    fn test_imported_bad_value_is_reset() {
        let root = template();
        let mut bindings = OverrideBindings::new();
        bindings.sync(&root);
        bindings.groups[0].slots[0].value = Value::Bool(true);
        bindings.groups[0].slots[0].enabled = true;

        let report = bindings.sync(&root);
        assert_eq!(report.slots_reset, 1);
        let slot = &bindings.groups()[0].slots()[0];
        assert!(!slot.enabled);
        assert_eq!(slot.value, Value::Float(1.0));
    }

    #[test]
    fn test_ron_export_import() {
        let root = template();
        let mut bindings = OverrideBindings::new();
        bindings.sync(&root);
        bindings
            .set_override(root.id, NestedId::ROOT, OverrideIndex(1), "boss")
            .unwrap();

        let text = bindings.to_ron().unwrap();
        let loaded = OverrideBindings::from_ron(&text).unwrap();
        assert_eq!(loaded, bindings);
    }
}
