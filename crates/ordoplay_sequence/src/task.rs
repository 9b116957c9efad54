// SPDX-License-Identifier: MIT OR Apache-2.0
//! Suspendable work returned by nodes and the context it is polled with.
//!
//! A task is polled once per player step until it reports [`Progress::Done`].
//! Dropping a task cancels it, together with every task it owns; this is how
//! a player stop reaches branches nested at any depth.

use crate::node::NestedId;
use crate::override_field::OverrideField;
use crate::parameters::Parameters;
use crate::runtime::Runtime;
use crate::sequence::Sequence;
use crate::value::ValueKind;

/// Result of polling a task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// Still running, poll again next step
    Pending,
    /// Finished
    Done,
}

impl Progress {
    /// `Done` when `done` holds, `Pending` otherwise
    pub fn done_if(done: bool) -> Self {
        if done {
            Self::Done
        } else {
            Self::Pending
        }
    }

    /// Check if finished
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Check if still running
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

/// A suspended unit of work
pub trait Task: Send {
    /// Advance the task by one step
    fn poll(&mut self, cx: &mut Context<'_>) -> Progress;
}

impl<F> Task for F
where
    F: FnMut(&mut Context<'_>) -> Progress + Send,
{
    fn poll(&mut self, cx: &mut Context<'_>) -> Progress {
        self(cx)
    }
}

/// Boxed task as returned by `Node::invoke`
pub type BoxTask = Box<dyn Task>;

/// Current node index of a running sequence.
///
/// Every running (sub)sequence owns one cursor. Control-flow nodes move it;
/// the scheduler continues at `cursor + 1` once the current node completes.
/// Negative values and values past the end terminate the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    index: isize,
}

impl Cursor {
    /// Create a cursor at the first node
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw index, possibly out of range
    pub fn index(&self) -> isize {
        self.index
    }

    /// Index as a node position, if not negative
    pub fn position(&self) -> Option<usize> {
        usize::try_from(self.index).ok()
    }

    /// Move to a node index
    pub fn set(&mut self, index: usize) {
        self.index = isize::try_from(index).unwrap_or(isize::MAX);
    }

    /// Move forward by `count` nodes
    pub fn advance(&mut self, count: usize) {
        let count = isize::try_from(count).unwrap_or(isize::MAX);
        self.index = self.index.saturating_add(count);
    }

    /// Move back by `count` nodes
    pub fn rewind(&mut self, count: usize) {
        let count = isize::try_from(count).unwrap_or(isize::MAX);
        self.index = self.index.saturating_sub(count);
    }
}

/// What a node or task sees of the player driving it
pub struct Context<'a> {
    runtime: &'a mut Runtime,
    cursor: &'a mut Cursor,
}

impl<'a> Context<'a> {
    /// Create a context over a player's runtime and a sequence cursor
    pub fn new(runtime: &'a mut Runtime, cursor: &'a mut Cursor) -> Self {
        Self { runtime, cursor }
    }

    /// Reborrow with another cursor, for running a nested sequence
    pub fn with_cursor<'b>(&'b mut self, cursor: &'b mut Cursor) -> Context<'b> {
        Context {
            runtime: &mut *self.runtime,
            cursor,
        }
    }

    /// Cursor of the sequence currently running
    pub fn cursor(&self) -> &Cursor {
        &*self.cursor
    }

    /// Mutable cursor of the sequence currently running
    pub fn cursor_mut(&mut self) -> &mut Cursor {
        &mut *self.cursor
    }

    /// Current node index
    pub fn current_index(&self) -> isize {
        self.cursor.index()
    }

    /// Move the cursor to a node index
    pub fn set_current_index(&mut self, index: usize) {
        self.cursor.set(index);
    }

    /// Move the cursor forward
    pub fn advance_cursor(&mut self, count: usize) {
        self.cursor.advance(count);
    }

    /// Move the cursor back
    pub fn rewind_cursor(&mut self, count: usize) {
        self.cursor.rewind(count);
    }

    /// Player parameters
    pub fn parameters(&self) -> &Parameters {
        &self.runtime.parameters
    }

    /// Mutable player parameters
    pub fn parameters_mut(&mut self) -> &mut Parameters {
        &mut self.runtime.parameters
    }

    /// Read a typed parameter
    pub fn parameter<T: ValueKind>(&self, name: &str) -> Option<T> {
        self.runtime.parameters.get(name)
    }

    /// Write a typed parameter
    pub fn set_parameter<T: ValueKind>(&mut self, name: impl Into<String>, value: T) {
        self.runtime.parameters.set(name, value);
    }

    /// Effective value of an override field for this player
    pub fn resolve<T: ValueKind>(
        &self,
        field: &OverrideField<T>,
        sequence: &Sequence,
        nested: NestedId,
    ) -> T {
        self.runtime.bindings.resolve(field, sequence.id, nested)
    }

    /// Seconds covered by the current step
    pub fn delta_time(&self) -> f64 {
        self.runtime.clock.delta
    }

    /// Seconds since the player started
    pub fn elapsed(&self) -> f64 {
        self.runtime.clock.elapsed
    }

    /// Steps taken since the player started
    pub fn frame(&self) -> u64 {
        self.runtime.clock.frame
    }

    /// Ask the player to stop at the end of this step
    pub fn request_stop(&mut self) {
        self.runtime.stop_requested = true;
    }

    /// Whether a stop has been requested during this step
    pub fn stop_requested(&self) -> bool {
        self.runtime.stop_requested
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_moves() {
        let mut cursor = Cursor::new();
        assert_eq!(cursor.position(), Some(0));

        cursor.advance(3);
        assert_eq!(cursor.index(), 3);

        cursor.rewind(5);
        assert_eq!(cursor.index(), -2);
        assert_eq!(cursor.position(), None);

        cursor.set(7);
        assert_eq!(cursor.position(), Some(7));
    }

    #[test]
    fn test_closure_task() {
        let mut runtime = Runtime::default();
        let mut cursor = Cursor::new();
        let mut cx = Context::new(&mut runtime, &mut cursor);

        let mut remaining = 2;
        let mut task = move |_: &mut Context<'_>| {
            remaining -= 1;
            Progress::done_if(remaining == 0)
        };
        assert_eq!(task.poll(&mut cx), Progress::Pending);
        assert_eq!(task.poll(&mut cx), Progress::Done);
    }

    #[test]
    fn test_context_cursor_scoping() {
        let mut runtime = Runtime::default();
        let mut outer = Cursor::new();
        let mut cx = Context::new(&mut runtime, &mut outer);
        cx.set_current_index(4);

        let mut inner = Cursor::new();
        {
            let mut nested = cx.with_cursor(&mut inner);
            nested.advance_cursor(2);
            nested.set_parameter("seen", true);
        }
        assert_eq!(cx.current_index(), 4);
        assert_eq!(cx.parameter::<bool>("seen"), Some(true));
        assert_eq!(inner.index(), 2);
    }
}
