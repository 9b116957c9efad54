// SPDX-License-Identifier: MIT OR Apache-2.0
//! Diagnostic output from a sequence.

use crate::node::{NestedId, Node};
use crate::override_field::{FieldDeclaration, OverrideField};
use crate::sequence::Sequence;
use crate::task::{BoxTask, Context};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Severity of a logged message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LogLevel {
    /// Trace
    Trace,
    /// Debug
    Debug,
    /// Info
    #[default]
    Info,
    /// Warning
    Warn,
    /// Error
    Error,
}

/// Writes a message to the log
#[derive(Debug, Default)]
pub struct LogMessage {
    /// Message text
    pub message: OverrideField<String>,
    /// Severity
    pub level: LogLevel,
}

impl LogMessage {
    /// Create a log node at info level
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: OverrideField::new(message.into()),
            level: LogLevel::Info,
        }
    }

    /// Set the severity
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }
}

impl Node for LogMessage {
    fn kind(&self) -> &'static str {
        "Log Message"
    }

    fn description(&self) -> Option<&str> {
        Some("Writes a message to the log")
    }

    fn preview_value(&self) -> Option<String> {
        Some(self.message.value.clone())
    }

    fn declare_overrides(&mut self) -> Vec<FieldDeclaration<'_>> {
        vec![FieldDeclaration::new("Message", &mut self.message)]
    }

    fn invoke(
        &self,
        cx: &mut Context<'_>,
        sequence: &Arc<Sequence>,
        nested: NestedId,
    ) -> Option<BoxTask> {
        let message = self.message.resolve(cx, sequence, nested);
        let name = &sequence.name;
        match self.level {
            LogLevel::Trace => tracing::trace!("[{name}] {message}"),
            LogLevel::Debug => tracing::debug!("[{name}] {message}"),
            LogLevel::Info => tracing::info!("[{name}] {message}"),
            LogLevel::Warn => tracing::warn!("[{name}] {message}"),
            LogLevel::Error => tracing::error!("[{name}] {message}"),
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::Runtime;
    use crate::task::Cursor;
    use crate::value::Value;

    #[test]
    fn test_message_is_overridable() {
        let mut sequence = Sequence::new("Intro");
        sequence.add_node(LogMessage::new("hello").with_level(LogLevel::Debug));
        let descriptor = &sequence.overrides()[0];
        assert_eq!(descriptor.label, "Message");
        assert_eq!(descriptor.default_value, Value::String("hello".to_string()));

        let sequence = sequence.into_shared();
        let mut runtime = Runtime::default();
        runtime.bindings.sync(&sequence);
        let mut cursor = Cursor::new();
        let mut cx = Context::new(&mut runtime, &mut cursor);
        let node = sequence.node_at(0).unwrap().node();
        assert!(node.invoke(&mut cx, &sequence, NestedId::ROOT).is_none());
        assert_eq!(node.preview_value().as_deref(), Some("hello"));
    }
}
