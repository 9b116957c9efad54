// SPDX-License-Identifier: MIT OR Apache-2.0
//! Writing player parameters from a sequence.

use crate::node::{NestedId, Node};
use crate::sequence::Sequence;
use crate::task::{BoxTask, Context};
use crate::value::Value;
use std::sync::Arc;

/// Sets a player parameter
#[derive(Debug, Clone)]
pub struct SetParameter {
    /// Parameter name
    pub parameter: String,
    /// Value written
    pub value: Value,
}

impl SetParameter {
    /// Create a parameter write
    pub fn new(parameter: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            parameter: parameter.into(),
            value: value.into(),
        }
    }
}

impl Node for SetParameter {
    fn kind(&self) -> &'static str {
        "Set Parameter"
    }

    fn description(&self) -> Option<&str> {
        Some("Sets a player parameter")
    }

    fn preview_value(&self) -> Option<String> {
        Some(format!("{} = {}", self.parameter, self.value))
    }

    fn invoke(
        &self,
        cx: &mut Context<'_>,
        _sequence: &Arc<Sequence>,
        _nested: NestedId,
    ) -> Option<BoxTask> {
        cx.parameters_mut()
            .set_value(self.parameter.clone(), self.value.clone());
        None
    }
}
