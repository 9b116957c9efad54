// SPDX-License-Identifier: MIT OR Apache-2.0
//! Nodes that suspend on time or on a parameter.

use crate::node::{NestedId, Node};
use crate::override_field::{FieldDeclaration, OverrideField};
use crate::sequence::Sequence;
use crate::task::{BoxTask, Context, Progress};
use std::sync::Arc;

/// Tolerance for accumulated step times
const TIME_EPSILON: f64 = 1e-6;

/// Suspends for a number of seconds of player time
#[derive(Debug, Default)]
pub struct Wait {
    /// Duration in seconds
    pub seconds: OverrideField<f32>,
}

impl Wait {
    /// Create a wait node
    pub fn new(seconds: f32) -> Self {
        Self {
            seconds: OverrideField::new(seconds),
        }
    }
}

impl Node for Wait {
    fn kind(&self) -> &'static str {
        "Wait"
    }

    fn description(&self) -> Option<&str> {
        Some("Waits for a duration")
    }

    fn preview_value(&self) -> Option<String> {
        Some(format!("{}s", self.seconds.value))
    }

    fn declare_overrides(&mut self) -> Vec<FieldDeclaration<'_>> {
        vec![FieldDeclaration::new("Seconds", &mut self.seconds)]
    }

    fn invoke(
        &self,
        cx: &mut Context<'_>,
        sequence: &Arc<Sequence>,
        nested: NestedId,
    ) -> Option<BoxTask> {
        let seconds = self.seconds.resolve(cx, sequence, nested);
        if seconds <= 0.0 {
            return None;
        }
        let until = cx.elapsed() + f64::from(seconds);
        Some(Box::new(move |cx: &mut Context<'_>| {
            Progress::done_if(cx.elapsed() + TIME_EPSILON >= until)
        }))
    }
}

/// Suspends for a number of player steps
#[derive(Debug, Clone, Copy, Default)]
pub struct WaitFrames {
    /// Steps to wait
    pub frames: u32,
}

impl WaitFrames {
    /// Create a frame wait
    pub fn new(frames: u32) -> Self {
        Self { frames }
    }
}

impl Node for WaitFrames {
    fn kind(&self) -> &'static str {
        "Wait Frames"
    }

    fn preview_value(&self) -> Option<String> {
        Some(format!("{} frames", self.frames))
    }

    fn invoke(
        &self,
        cx: &mut Context<'_>,
        _sequence: &Arc<Sequence>,
        _nested: NestedId,
    ) -> Option<BoxTask> {
        if self.frames == 0 {
            return None;
        }
        let until = cx.frame() + u64::from(self.frames);
        Some(Box::new(move |cx: &mut Context<'_>| {
            Progress::done_if(cx.frame() >= until)
        }))
    }
}

/// Suspends until a boolean parameter has the expected value
#[derive(Debug, Clone)]
pub struct WaitUntilParameter {
    /// Parameter name; a missing parameter reads as `false`
    pub parameter: String,
    /// Value to wait for
    pub expected: bool,
}

impl WaitUntilParameter {
    /// Create a parameter wait
    pub fn new(parameter: impl Into<String>, expected: bool) -> Self {
        Self {
            parameter: parameter.into(),
            expected,
        }
    }
}

impl Node for WaitUntilParameter {
    fn kind(&self) -> &'static str {
        "Wait Until Parameter"
    }

    fn description(&self) -> Option<&str> {
        Some("Waits until a parameter has a value")
    }

    fn preview_value(&self) -> Option<String> {
        Some(format!("{} == {}", self.parameter, self.expected))
    }

    fn invoke(
        &self,
        cx: &mut Context<'_>,
        _sequence: &Arc<Sequence>,
        _nested: NestedId,
    ) -> Option<BoxTask> {
        if parameter_is(cx, &self.parameter, self.expected) {
            return None;
        }
        let parameter = self.parameter.clone();
        let expected = self.expected;
        Some(Box::new(move |cx: &mut Context<'_>| {
            Progress::done_if(parameter_is(cx, &parameter, expected))
        }))
    }
}

fn parameter_is(cx: &Context<'_>, name: &str, expected: bool) -> bool {
    cx.parameters().get_or_default::<bool>(name) == expected
}
