// SPDX-License-Identifier: MIT OR Apache-2.0
//! Playing another sequence from within a sequence.

use crate::node::{NestedId, NestedRef, Node};
use crate::scheduler::SequenceRun;
use crate::sequence::{Sequence, SequenceError};
use crate::task::{BoxTask, Context, Progress, Task};
use std::fmt;
use std::num::NonZeroU32;
use std::sync::Arc;

/// How many passes a nested sequence runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopCount {
    /// A fixed number of passes
    Times(NonZeroU32),
    /// Until the player stops
    Forever,
}

impl LoopCount {
    /// A single pass
    pub const ONCE: Self = Self::Times(NonZeroU32::MIN);

    /// `count` passes, `None` for zero
    pub fn times(count: u32) -> Option<Self> {
        NonZeroU32::new(count).map(Self::Times)
    }

    /// Authoring representation: the pass count, or -1 for forever
    pub fn as_i32(&self) -> i32 {
        match self {
            Self::Times(count) => i32::try_from(count.get()).unwrap_or(i32::MAX),
            Self::Forever => -1,
        }
    }
}

impl Default for LoopCount {
    fn default() -> Self {
        Self::ONCE
    }
}

impl TryFrom<i32> for LoopCount {
    type Error = SequenceError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Self::Forever),
            count if count > 0 => u32::try_from(count)
                .ok()
                .and_then(Self::times)
                .ok_or(SequenceError::InvalidLoopCount(value)),
            _ => Err(SequenceError::InvalidLoopCount(value)),
        }
    }
}

impl fmt::Display for LoopCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Times(count) => write!(f, "x{count}"),
            Self::Forever => write!(f, "loop"),
        }
    }
}

/// Runs another sequence in place, once or several times
#[derive(Debug)]
pub struct NestedSequence {
    sequence: Arc<Sequence>,
    identity: NestedId,
    loop_count: LoopCount,
}

impl NestedSequence {
    /// Create a node with a fresh occurrence identity
    pub fn new(sequence: Arc<Sequence>, loop_count: LoopCount) -> Self {
        Self::with_identity(sequence, NestedId::new(), loop_count)
    }

    /// Create a node with a known identity, as when loading saved content
    pub fn with_identity(sequence: Arc<Sequence>, identity: NestedId, loop_count: LoopCount) -> Self {
        Self {
            sequence,
            identity,
            loop_count,
        }
    }

    /// Identity of this occurrence, keying its override bindings
    pub fn identity(&self) -> NestedId {
        self.identity
    }

    /// The sequence played
    pub fn sequence(&self) -> &Arc<Sequence> {
        &self.sequence
    }

    /// Point at another sequence, keeping the identity
    pub fn set_sequence(&mut self, sequence: Arc<Sequence>) {
        self.sequence = sequence;
    }

    /// Pass count
    pub fn loop_count(&self) -> LoopCount {
        self.loop_count
    }

    /// Change the pass count
    pub fn set_loop_count(&mut self, loop_count: LoopCount) {
        self.loop_count = loop_count;
    }
}

impl Node for NestedSequence {
    fn kind(&self) -> &'static str {
        "Nested Sequence"
    }

    fn description(&self) -> Option<&str> {
        Some("Plays another sequence, optionally looping it")
    }

    fn preview_value(&self) -> Option<String> {
        Some(format!("{} {}", self.sequence.name, self.loop_count))
    }

    fn nested(&self) -> Option<NestedRef<'_>> {
        Some(NestedRef {
            identity: self.identity,
            sequence: &self.sequence,
        })
    }

    fn invoke(
        &self,
        _cx: &mut Context<'_>,
        _sequence: &Arc<Sequence>,
        _nested: NestedId,
    ) -> Option<BoxTask> {
        Some(Box::new(NestedRun {
            sequence: Arc::clone(&self.sequence),
            identity: self.identity,
            loop_count: self.loop_count,
            passes: 0,
            run: None,
            pass_suspended: false,
        }))
    }
}

/// Task running the passes of a nested sequence.
///
/// Passes follow each other within a step. A forever loop whose pass never
/// suspended yields before starting the next one, so it cannot spin a step
/// forever.
struct NestedRun {
    sequence: Arc<Sequence>,
    identity: NestedId,
    loop_count: LoopCount,
    passes: u32,
    run: Option<SequenceRun>,
    pass_suspended: bool,
}

impl Task for NestedRun {
    fn poll(&mut self, cx: &mut Context<'_>) -> Progress {
        let Self {
            sequence,
            identity,
            loop_count,
            passes,
            run,
            pass_suspended,
        } = self;

        loop {
            let current = run.get_or_insert_with(|| {
                *pass_suspended = false;
                SequenceRun::new(Arc::clone(sequence), *identity)
            });
            if current.poll(cx).is_pending() {
                *pass_suspended = true;
                return Progress::Pending;
            }

            *run = None;
            *passes = passes.saturating_add(1);
            tracing::trace!("'{}' pass {} done", sequence.name, passes);

            match loop_count {
                LoopCount::Times(count) if *passes >= count.get() => return Progress::Done,
                LoopCount::Forever if !*pass_suspended => return Progress::Pending,
                LoopCount::Times(_) | LoopCount::Forever => {}
            }
        }
    }
}
