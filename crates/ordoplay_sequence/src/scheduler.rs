// SPDX-License-Identifier: MIT OR Apache-2.0
//! Cooperative stepping of sequences.
//!
//! A [`SequenceRun`] drives one pass over one sequence. In list order it
//! invokes nodes until one suspends, then polls that task on every later step
//! until it completes and moves on to `cursor + 1`. A parallel sequence
//! starts every node in the first step and joins them with a
//! [`ParallelJoin`].
//!
//! Everything is single threaded: branches of a join are polled one after
//! another within a step, so the cursor they share is never touched by two
//! of them at once.

use crate::node::NestedId;
use crate::runtime::Runtime;
use crate::sequence::Sequence;
use crate::task::{BoxTask, Context, Cursor, Progress, Task};
use std::ops::Range;
use std::sync::Arc;

/// Fork/join over a range of a sequence's nodes
pub struct ParallelJoin {
    branches: Vec<BoxTask>,
    started: usize,
    completed: usize,
}

impl ParallelJoin {
    /// Invoke every node in `range` within the current step.
    ///
    /// The cursor is set to each node's index before it is invoked, and the
    /// next branch starts at `cursor + 1`, so a node moving the cursor forward
    /// takes the nodes it skips out of the join. Returned tasks get their
    /// first poll right away; branches that finish immediately count as
    /// completed at once. No further branch starts once a stop is requested.
    pub fn start(
        sequence: &Arc<Sequence>,
        nested: NestedId,
        range: Range<usize>,
        cx: &mut Context<'_>,
    ) -> Self {
        let mut join = Self {
            branches: Vec::new(),
            started: 0,
            completed: 0,
        };

        let mut index = range.start;
        while index < range.end {
            if cx.stop_requested() {
                break;
            }
            let Some(entry) = sequence.node_at(index) else {
                break;
            };
            cx.cursor_mut().set(index);
            join.started += 1;
            tracing::debug!(
                "'{}' [{}] {} (parallel)",
                sequence.name,
                index,
                entry.label()
            );

            match entry.node().invoke(cx, sequence, nested) {
                None => join.completed += 1,
                Some(mut task) => {
                    if task.poll(cx).is_done() {
                        join.completed += 1;
                    } else {
                        join.branches.push(task);
                    }
                }
            }

            // Nodes may claim the ones after them, as a nested block does
            index = cx.cursor().position().unwrap_or(index).max(index) + 1;
        }
        join
    }

    /// Poll every pending branch once
    pub fn poll(&mut self, cx: &mut Context<'_>) -> Progress {
        let mut finished = 0;
        self.branches.retain_mut(|task| {
            let done = task.poll(cx).is_done();
            if done {
                finished += 1;
            }
            !done
        });
        self.completed += finished;
        tracing::trace!("Parallel join {}/{}", self.completed, self.started);
        Progress::done_if(self.is_done())
    }

    /// Check if every started branch has completed
    pub fn is_done(&self) -> bool {
        self.completed == self.started
    }

    /// Branches started
    pub fn started(&self) -> usize {
        self.started
    }

    /// Branches completed
    pub fn completed(&self) -> usize {
        self.completed
    }
}

enum RunMode {
    Sequential { current: Option<BoxTask> },
    Parallel { join: Option<ParallelJoin> },
}

/// One pass over a sequence, with its own cursor
pub struct SequenceRun {
    sequence: Arc<Sequence>,
    nested: NestedId,
    cursor: Cursor,
    mode: RunMode,
}

impl SequenceRun {
    /// Prepare a pass; nothing runs until the first poll
    pub fn new(sequence: Arc<Sequence>, nested: NestedId) -> Self {
        let mode = if sequence.parallel {
            RunMode::Parallel { join: None }
        } else {
            RunMode::Sequential { current: None }
        };
        Self {
            sequence,
            nested,
            cursor: Cursor::new(),
            mode,
        }
    }

    /// The sequence being run
    pub fn sequence(&self) -> &Arc<Sequence> {
        &self.sequence
    }

    /// Nested identity the nodes are invoked with
    pub fn nested(&self) -> NestedId {
        self.nested
    }

    /// Cursor of this pass
    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    /// Run one step as the root of a player
    pub fn drive(&mut self, runtime: &mut Runtime) -> Progress {
        let mut cx = Context::new(runtime, &mut self.cursor);
        step(&self.sequence, self.nested, &mut self.mode, &mut cx)
    }
}

impl Task for SequenceRun {
    fn poll(&mut self, cx: &mut Context<'_>) -> Progress {
        let mut cx = cx.with_cursor(&mut self.cursor);
        step(&self.sequence, self.nested, &mut self.mode, &mut cx)
    }
}

fn step(
    sequence: &Arc<Sequence>,
    nested: NestedId,
    mode: &mut RunMode,
    cx: &mut Context<'_>,
) -> Progress {
    match mode {
        RunMode::Sequential { current } => step_sequential(sequence, nested, current, cx),
        RunMode::Parallel { join } => {
            let progress = match join {
                Some(join) => join.poll(cx),
                None => {
                    let started = ParallelJoin::start(sequence, nested, 0..sequence.len(), cx);
                    let progress = Progress::done_if(started.is_done());
                    *join = Some(started);
                    progress
                }
            };
            if progress.is_done() {
                cx.set_current_index(sequence.len());
            }
            progress
        }
    }
}

fn step_sequential(
    sequence: &Arc<Sequence>,
    nested: NestedId,
    current: &mut Option<BoxTask>,
    cx: &mut Context<'_>,
) -> Progress {
    loop {
        if let Some(task) = current {
            if task.poll(cx).is_pending() {
                return Progress::Pending;
            }
            *current = None;
            cx.advance_cursor(1);
        }

        if cx.stop_requested() {
            return Progress::Pending;
        }

        // Out of range in either direction ends the pass
        let Some((index, entry)) = cx
            .cursor()
            .position()
            .and_then(|index| Some((index, sequence.node_at(index)?)))
        else {
            return Progress::Done;
        };

        tracing::debug!("'{}' [{}] {}", sequence.name, index, entry.label());
        match entry.node().invoke(cx, sequence, nested) {
            Some(task) => *current = Some(task),
            None => cx.advance_cursor(1),
        }
    }
}
