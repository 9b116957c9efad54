// SPDX-License-Identifier: MIT OR Apache-2.0
//! Flow control nodes.
//!
//! These move the cursor of the sequence they run in. The scheduler continues
//! at `cursor + 1` once they complete.

use crate::node::{NestedId, Node};
use crate::override_field::{FieldDeclaration, OverrideField};
use crate::scheduler::ParallelJoin;
use crate::sequence::Sequence;
use crate::task::{BoxTask, Context, Progress};
use std::sync::Arc;

/// Skips the next nodes; a negative count jumps back
#[derive(Debug, Default)]
pub struct SkipNodes {
    /// Nodes to skip
    pub count: OverrideField<i32>,
}

impl SkipNodes {
    /// Create a skip node
    pub fn new(count: i32) -> Self {
        Self {
            count: OverrideField::new(count),
        }
    }
}

impl Node for SkipNodes {
    fn kind(&self) -> &'static str {
        "Skip Nodes"
    }

    fn description(&self) -> Option<&str> {
        Some("Skips the following nodes")
    }

    fn preview_value(&self) -> Option<String> {
        Some(self.count.value.to_string())
    }

    fn declare_overrides(&mut self) -> Vec<FieldDeclaration<'_>> {
        vec![FieldDeclaration::new("Count", &mut self.count)]
    }

    fn invoke(
        &self,
        cx: &mut Context<'_>,
        sequence: &Arc<Sequence>,
        nested: NestedId,
    ) -> Option<BoxTask> {
        let count = self.count.resolve(cx, sequence, nested);
        let distance = count.unsigned_abs() as usize;
        if count >= 0 {
            cx.advance_cursor(distance);
        } else {
            cx.rewind_cursor(distance);
        }
        None
    }
}

/// Skips the next nodes when a boolean parameter has the expected value
#[derive(Debug, Clone)]
pub struct SkipIfParameter {
    /// Parameter name; a missing parameter reads as `false`
    pub parameter: String,
    /// Value that triggers the skip
    pub expected: bool,
    /// Nodes to skip
    pub count: usize,
}

impl SkipIfParameter {
    /// Create a conditional skip
    pub fn new(parameter: impl Into<String>, expected: bool, count: usize) -> Self {
        Self {
            parameter: parameter.into(),
            expected,
            count,
        }
    }
}

impl Node for SkipIfParameter {
    fn kind(&self) -> &'static str {
        "Skip If Parameter"
    }

    fn description(&self) -> Option<&str> {
        Some("Skips the following nodes depending on a parameter")
    }

    fn preview_value(&self) -> Option<String> {
        Some(format!("{} == {} -> {}", self.parameter, self.expected, self.count))
    }

    fn invoke(
        &self,
        cx: &mut Context<'_>,
        _sequence: &Arc<Sequence>,
        _nested: NestedId,
    ) -> Option<BoxTask> {
        if cx.parameters().get_or_default::<bool>(&self.parameter) == self.expected {
            cx.advance_cursor(self.count);
        }
        None
    }
}

/// Runs the next nodes in parallel and waits for all of them
#[derive(Debug, Clone)]
pub struct ParallelNext {
    /// Nodes started together
    pub count: usize,
}

impl ParallelNext {
    /// Create a parallel block over the next `count` nodes
    pub fn new(count: usize) -> Self {
        Self { count }
    }
}

impl Node for ParallelNext {
    fn kind(&self) -> &'static str {
        "Parallel Next"
    }

    fn description(&self) -> Option<&str> {
        Some("Plays the following nodes at the same time")
    }

    fn preview_value(&self) -> Option<String> {
        Some(self.count.to_string())
    }

    fn invoke(
        &self,
        cx: &mut Context<'_>,
        sequence: &Arc<Sequence>,
        nested: NestedId,
    ) -> Option<BoxTask> {
        let own = cx.cursor().position()?;
        let start = own + 1;
        let end = start.saturating_add(self.count).min(sequence.len());
        if start >= end {
            return None;
        }

        // Resume after the block: the scheduler adds one to the cursor
        let last = end - 1;
        let sequence = Arc::clone(sequence);
        let mut join: Option<ParallelJoin> = None;
        Some(Box::new(move |cx: &mut Context<'_>| {
            let progress = match &mut join {
                Some(join) => join.poll(cx),
                None => {
                    let started = ParallelJoin::start(&sequence, nested, start..end, cx);
                    let progress = Progress::done_if(started.is_done());
                    join = Some(started);
                    progress
                }
            };
            if progress.is_done() {
                cx.set_current_index(last);
            }
            progress
        }))
    }
}

/// Stops the player at the end of the current step
#[derive(Debug, Clone, Copy, Default)]
pub struct StopSequence;

impl Node for StopSequence {
    fn kind(&self) -> &'static str {
        "Stop Sequence"
    }

    fn description(&self) -> Option<&str> {
        Some("Stops the player running this sequence")
    }

    fn invoke(
        &self,
        cx: &mut Context<'_>,
        _sequence: &Arc<Sequence>,
        _nested: NestedId,
    ) -> Option<BoxTask> {
        cx.request_stop();
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{SetParameter, Wait};
    use crate::runtime::Runtime;
    use crate::scheduler::SequenceRun;
    use crate::testing::{Journal, Marker};

    #[test]
    fn test_skip_past_end_finishes() {
        let journal = Journal::default();
        let sequence = Sequence::new("Seq")
            .with_node(SkipNodes::new(10))
            .with_node(Marker::recording("never", &journal))
            .into_shared();

        let mut runtime = Runtime::default();
        let mut run = SequenceRun::new(sequence, NestedId::ROOT);
        assert_eq!(run.drive(&mut runtime), Progress::Done);
        assert_eq!(journal.len(), 0);
    }

    #[test]
    fn test_skip_zero_runs_next_node() {
        let journal = Journal::default();
        let sequence = Sequence::new("Seq")
            .with_node(SkipNodes::new(0))
            .with_node(Marker::recording("next", &journal))
            .with_node(Marker::recording("last", &journal))
            .into_shared();

        let mut runtime = Runtime::default();
        let mut run = SequenceRun::new(sequence, NestedId::ROOT);
        assert_eq!(run.drive(&mut runtime), Progress::Done);
        assert_eq!(journal.entries(), vec!["next", "last"]);
    }

    #[test]
    fn test_skip_landing_on_end_finishes() {
        let journal = Journal::default();
        let sequence = Sequence::new("Seq")
            .with_node(Marker::recording("first", &journal))
            .with_node(SkipNodes::new(1))
            .with_node(Marker::recording("never", &journal))
            .into_shared();

        let mut runtime = Runtime::default();
        let mut run = SequenceRun::new(sequence, NestedId::ROOT);
        assert_eq!(run.drive(&mut runtime), Progress::Done);
        assert_eq!(run.cursor().index(), 3);
        assert_eq!(journal.entries(), vec!["first"]);
    }

    #[test]
    fn test_negative_skip_loops_back() {
        let journal = Journal::default();
        let sequence = Sequence::new("Seq")
            .with_node(Marker::recording("a", &journal))
            .with_node(SkipIfParameter::new("again", false, 2))
            .with_node(SetParameter::new("again", false))
            .with_node(SkipNodes::new(-4))
            .into_shared();

        let mut runtime = Runtime::default();
        runtime.parameters.set("again", true);
        let mut run = SequenceRun::new(sequence, NestedId::ROOT);
        assert_eq!(run.drive(&mut runtime), Progress::Done);
        assert_eq!(journal.entries(), vec!["a", "a"]);
    }

    #[test]
    fn test_negative_cursor_ends_pass() {
        let journal = Journal::default();
        let sequence = Sequence::new("Seq")
            .with_node(SkipNodes::new(-2))
            .with_node(Marker::recording("never", &journal))
            .into_shared();

        let mut runtime = Runtime::default();
        let mut run = SequenceRun::new(sequence, NestedId::ROOT);
        assert_eq!(run.drive(&mut runtime), Progress::Done);
        assert_eq!(run.cursor().index(), -1);
        assert_eq!(journal.len(), 0);
    }

    #[test]
    fn test_skip_if_parameter() {
        let journal = Journal::default();
        let sequence = Sequence::new("Seq")
            .with_node(SkipIfParameter::new("skip_intro", true, 1))
            .with_node(Marker::recording("intro", &journal))
            .with_node(Marker::recording("main", &journal))
            .into_shared();

        let mut runtime = Runtime::default();
        SequenceRun::new(Arc::clone(&sequence), NestedId::ROOT).drive(&mut runtime);
        runtime.parameters.set("skip_intro", true);
        SequenceRun::new(sequence, NestedId::ROOT).drive(&mut runtime);

        assert_eq!(journal.entries(), vec!["intro", "main", "main"]);
    }

    #[test]
    fn test_parallel_next_resumes_after_block() {
        let journal = Journal::default();
        let sequence = Sequence::new("Seq")
            .with_node(ParallelNext::new(3))
            .with_node(Wait::new(0.5))
            .with_node(Marker::recording("branch", &journal))
            .with_node(Wait::new(1.0))
            .with_node(Marker::recording("after", &journal))
            .into_shared();

        let mut runtime = Runtime::default();
        let mut run = SequenceRun::new(sequence, NestedId::ROOT);
        assert_eq!(run.drive(&mut runtime), Progress::Pending);
        assert_eq!(journal.entries(), vec!["branch"]);

        runtime.clock.advance(0.5);
        assert_eq!(run.drive(&mut runtime), Progress::Pending);
        runtime.clock.advance(0.5);
        assert_eq!(run.drive(&mut runtime), Progress::Done);
        assert_eq!(journal.entries(), vec!["branch", "after"]);
    }

    #[test]
    fn test_parallel_next_all_synchronous() {
        let journal = Journal::default();
        let sequence = Sequence::new("Seq")
            .with_node(ParallelNext::new(5))
            .with_node(Marker::recording("a", &journal))
            .with_node(Marker::recording("b", &journal))
            .into_shared();

        let mut runtime = Runtime::default();
        let mut run = SequenceRun::new(sequence, NestedId::ROOT);
        assert_eq!(run.drive(&mut runtime), Progress::Done);
        assert_eq!(journal.entries(), vec!["a", "b"]);
    }

    #[test]
    fn test_stop_sequence_requests_stop() {
        let journal = Journal::default();
        let sequence = Sequence::new("Seq")
            .with_node(StopSequence)
            .with_node(Marker::recording("never", &journal))
            .into_shared();

        let mut runtime = Runtime::default();
        let mut run = SequenceRun::new(sequence, NestedId::ROOT);
        assert_eq!(run.drive(&mut runtime), Progress::Pending);
        assert!(runtime.stop_requested);
        assert_eq!(journal.len(), 0);
    }
}
