// SPDX-License-Identifier: MIT OR Apache-2.0
//! Sequence runtime for `OrdoPlay`.
//!
//! This crate runs node sequences authored as templates:
//! - Sequential playback with control-flow nodes moving a cursor
//! - Parallel fork/join, for whole sequences or the next nodes
//! - Nested sequences with loop counts
//! - Atomic cancellation of everything a player has running
//!
//! ## Architecture
//!
//! A [`Sequence`] is an immutable template shared as `Arc<Sequence>`. Each
//! [`SequencePlayer`] owns all mutable state: parameters, override bindings,
//! clock and the tree of suspended tasks. Players are stepped cooperatively
//! by the host, one `tick` or `update` per frame.
//!
//! Node fields wrapped in [`OverrideField`] are listed in the sequence's
//! override registry, and each player may bind its own values to them.

pub mod binding;
pub mod catalog;
pub mod node;
pub mod nodes;
pub mod override_field;
pub mod parameters;
pub mod player;
pub mod runtime;
pub mod scheduler;
pub mod sequence;
pub mod settings;
pub mod task;
pub mod value;

#[cfg(test)]
mod testing;

pub use binding::{BindingError, BindingGroup, BindingSlot, BindingSync, OverrideBindings};
pub use catalog::{standard_catalog, NodeCatalog, NodeCategory, NodeKind};
pub use node::{NestedId, NestedRef, Node, NodeId, SequenceNode};
pub use override_field::{
    FieldDeclaration, OverrideDescriptor, OverrideField, OverrideIndex, OverrideSlot,
};
pub use parameters::Parameters;
pub use player::{PlaybackState, SequencePlayer};
pub use runtime::{Clock, Runtime};
pub use scheduler::{ParallelJoin, SequenceRun};
pub use sequence::{RegistrySync, Sequence, SequenceError, SequenceId};
pub use settings::{PlayerSettings, SettingsError};
pub use task::{BoxTask, Context, Cursor, Progress, Task};
pub use value::{Color, EntityId, Value, ValueKind, ValueType};
