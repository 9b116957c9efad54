// SPDX-License-Identifier: MIT OR Apache-2.0
//! Test nodes shared by the unit tests.

use crate::node::{NestedId, Node};
use crate::override_field::{FieldDeclaration, OverrideField};
use crate::sequence::Sequence;
use crate::task::{BoxTask, Context};
use std::sync::{Arc, Mutex};

/// Shared record of node invocations
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.0.lock().unwrap().iter().filter(|e| *e == entry).count()
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap().len()
    }
}

/// Completes immediately, recording its label
#[derive(Debug)]
pub struct Marker {
    label: String,
    journal: Journal,
}

impl Marker {
    pub fn new(label: &str) -> Self {
        Self::recording(label, &Journal::default())
    }

    pub fn recording(label: &str, journal: &Journal) -> Self {
        Self {
            label: label.to_string(),
            journal: journal.clone(),
        }
    }
}

impl Node for Marker {
    fn kind(&self) -> &'static str {
        "Marker"
    }

    fn invoke(
        &self,
        _cx: &mut Context<'_>,
        _sequence: &Arc<Sequence>,
        _nested: NestedId,
    ) -> Option<BoxTask> {
        self.journal.push(self.label.clone());
        None
    }
}

/// Records `tag=speed` using the resolved override values
#[derive(Debug)]
pub struct Tunable {
    pub speed: OverrideField<f32>,
    pub tag: OverrideField<String>,
    journal: Journal,
}

impl Tunable {
    pub fn new(speed: f32, tag: &str) -> Self {
        Self::recording(speed, tag, &Journal::default())
    }

    pub fn recording(speed: f32, tag: &str, journal: &Journal) -> Self {
        Self {
            speed: OverrideField::new(speed),
            tag: OverrideField::new(tag.to_string()),
            journal: journal.clone(),
        }
    }
}

impl Node for Tunable {
    fn kind(&self) -> &'static str {
        "Tunable"
    }

    fn declare_overrides(&mut self) -> Vec<FieldDeclaration<'_>> {
        vec![
            FieldDeclaration::new("speed", &mut self.speed),
            FieldDeclaration::new("tag", &mut self.tag),
        ]
    }

    fn invoke(
        &self,
        cx: &mut Context<'_>,
        sequence: &Arc<Sequence>,
        nested: NestedId,
    ) -> Option<BoxTask> {
        let speed = self.speed.resolve(cx, sequence, nested);
        let tag = self.tag.resolve(cx, sequence, nested);
        self.journal.push(format!("{tag}={speed}"));
        None
    }
}
