// SPDX-License-Identifier: MIT OR Apache-2.0
//! Sequence player for hosts.
//!
//! This module handles:
//! - Starting, stopping and restarting playback
//! - Stepping the running sequence from host frame time
//! - Finish and stop notifications
//! - Per-player parameters and override bindings

use crate::binding::{BindingError, BindingSync, OverrideBindings};
use crate::node::NestedId;
use crate::override_field::OverrideIndex;
use crate::parameters::Parameters;
use crate::runtime::{Clock, Runtime};
use crate::scheduler::SequenceRun;
use crate::sequence::{Sequence, SequenceId};
use crate::settings::PlayerSettings;
use crate::value::{Value, ValueKind};
use std::fmt;
use std::sync::Arc;

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Not started, or finished on its own
    #[default]
    Idle,
    /// Running
    Running,
    /// Cancelled by a stop
    Stopped,
}

impl PlaybackState {
    /// Check if running
    pub fn is_running(&self) -> bool {
        matches!(self, PlaybackState::Running)
    }
}

type FinishCallback = Box<dyn FnMut() + Send>;
type StopCallback = Box<dyn FnMut(&SequencePlayer) + Send>;

/// Runs one sequence template with its own state
pub struct SequencePlayer {
    sequence: Arc<Sequence>,
    state: PlaybackState,
    runtime: Runtime,
    run: Option<SequenceRun>,
    settings: PlayerSettings,
    /// Host time not yet consumed by fixed steps
    accumulated_time: f64,
    on_finish: Option<FinishCallback>,
    on_stop: Option<StopCallback>,
}

impl SequencePlayer {
    /// Create an idle player with bindings synchronized to `sequence`
    pub fn new(sequence: Arc<Sequence>) -> Self {
        let mut player = Self {
            sequence,
            state: PlaybackState::Idle,
            runtime: Runtime::default(),
            run: None,
            settings: PlayerSettings::default(),
            accumulated_time: 0.0,
            on_finish: None,
            on_stop: None,
        };
        player.sync_bindings();
        player
    }

    /// Set the settings, builder style
    pub fn with_settings(mut self, settings: PlayerSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Start playback; the first step runs before this returns.
    ///
    /// Does nothing when already running.
    pub fn play(&mut self) {
        if self.state.is_running() {
            return;
        }

        self.runtime.clock.reset();
        self.runtime.stop_requested = false;
        self.accumulated_time = 0.0;
        self.run = Some(SequenceRun::new(Arc::clone(&self.sequence), NestedId::ROOT));
        self.state = PlaybackState::Running;
        tracing::info!("Playing sequence '{}'", self.sequence.name);

        self.step();
    }

    /// Cancel playback and everything still suspended in it.
    ///
    /// Does nothing unless running.
    pub fn stop(&mut self) {
        if !self.state.is_running() {
            return;
        }

        self.state = PlaybackState::Stopped;
        self.run = None;
        self.runtime.stop_requested = false;
        self.accumulated_time = 0.0;
        tracing::info!("Stopped sequence '{}'", self.sequence.name);

        if let Some(mut callback) = self.on_stop.take() {
            callback(&*self);
            self.on_stop = Some(callback);
        }
    }

    /// Stop, then play from the start
    pub fn restart(&mut self) {
        tracing::info!("Restarting sequence '{}'", self.sequence.name);
        self.stop();
        self.play();
    }

    /// Check if running
    pub fn is_playing(&self) -> bool {
        self.state.is_running()
    }

    /// Current playback state
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Run one step covering `delta` seconds
    pub fn tick(&mut self, delta: f64) {
        if !self.state.is_running() {
            return;
        }
        self.runtime.clock.advance(delta);
        self.step();
    }

    /// Advance by host frame time using the player settings.
    /// Returns the number of steps run.
    pub fn update(&mut self, delta: f64) -> u32 {
        if !self.state.is_running() {
            return 0;
        }

        let scaled_delta = self.settings.scaled_delta(delta);
        let timestep = match self.settings.fixed_timestep {
            Some(timestep) if timestep > 0.0 => timestep,
            _ => {
                self.tick(scaled_delta);
                return 1;
            }
        };

        self.accumulated_time += scaled_delta;
        let mut steps = 0;
        while self.accumulated_time >= timestep && self.state.is_running() {
            self.accumulated_time -= timestep;
            self.tick(timestep);
            steps += 1;

            // Limit steps per update to prevent spiral of death
            if steps >= self.settings.max_steps_per_update {
                tracing::trace!("Dropping {:.3}s of accumulated time", self.accumulated_time);
                self.accumulated_time = 0.0;
                break;
            }
        }
        steps
    }

    fn step(&mut self) {
        let Some(run) = self.run.as_mut() else {
            return;
        };
        let progress = run.drive(&mut self.runtime);

        if self.runtime.stop_requested {
            tracing::debug!("Stop requested by '{}'", self.sequence.name);
            self.stop();
        } else if progress.is_done() {
            self.finish();
        }
    }

    fn finish(&mut self) {
        self.state = PlaybackState::Idle;
        self.run = None;
        tracing::info!(
            "Sequence '{}' finished after {} steps",
            self.sequence.name,
            self.runtime.clock.frame + 1
        );

        if let Some(mut callback) = self.on_finish.take() {
            callback();
            self.on_finish = Some(callback);
        }
    }

    /// Call `callback` whenever playback finishes on its own
    pub fn on_finish(&mut self, callback: impl FnMut() + Send + 'static) {
        self.on_finish = Some(Box::new(callback));
    }

    /// Call `callback` whenever playback is stopped
    pub fn on_stop(&mut self, callback: impl FnMut(&SequencePlayer) + Send + 'static) {
        self.on_stop = Some(Box::new(callback));
    }

    /// Cursor of the root sequence while running
    pub fn current_index(&self) -> Option<isize> {
        self.run.as_ref().map(|run| run.cursor().index())
    }

    /// The template played
    pub fn sequence(&self) -> &Arc<Sequence> {
        &self.sequence
    }

    /// Play another template; stops current playback
    pub fn set_sequence(&mut self, sequence: Arc<Sequence>) {
        self.stop();
        self.sequence = sequence;
        self.sync_bindings();
    }

    /// Player time keeping
    pub fn clock(&self) -> &Clock {
        &self.runtime.clock
    }

    /// Player settings
    pub fn settings(&self) -> &PlayerSettings {
        &self.settings
    }

    /// Mutable player settings
    pub fn settings_mut(&mut self) -> &mut PlayerSettings {
        &mut self.settings
    }

    /// Read a typed parameter
    pub fn parameter<T: ValueKind>(&self, name: &str) -> Option<T> {
        self.runtime.parameters.get(name)
    }

    /// Write a typed parameter
    pub fn set_parameter<T: ValueKind>(&mut self, name: impl Into<String>, value: T) {
        self.runtime.parameters.set(name, value);
    }

    /// All parameters
    pub fn parameters(&self) -> &Parameters {
        &self.runtime.parameters
    }

    /// Mutable parameters
    pub fn parameters_mut(&mut self) -> &mut Parameters {
        &mut self.runtime.parameters
    }

    /// Override bindings
    pub fn bindings(&self) -> &OverrideBindings {
        &self.runtime.bindings
    }

    /// Replace the bindings, e.g. with imported ones, and synchronize them
    pub fn set_bindings(&mut self, bindings: OverrideBindings) -> BindingSync {
        self.runtime.bindings = bindings;
        self.sync_bindings()
    }

    /// Bind an override value for a sequence occurrence and enable it
    pub fn set_override(
        &mut self,
        sequence: SequenceId,
        nested: NestedId,
        index: OverrideIndex,
        value: impl Into<Value>,
    ) -> Result<(), BindingError> {
        self.runtime
            .bindings
            .set_override(sequence, nested, index, value)
    }

    /// Enable or disable an override
    pub fn set_override_enabled(
        &mut self,
        sequence: SequenceId,
        nested: NestedId,
        index: OverrideIndex,
        enabled: bool,
    ) -> Result<(), BindingError> {
        self.runtime
            .bindings
            .set_enabled(sequence, nested, index, enabled)
    }

    /// Reconcile bindings with the template
    pub fn sync_bindings(&mut self) -> BindingSync {
        self.runtime.bindings.sync(&self.sequence)
    }
}

impl fmt::Debug for SequencePlayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequencePlayer")
            .field("sequence", &self.sequence.name)
            .field("state", &self.state)
            .field("current_index", &self.current_index())
            .field("clock", &self.runtime.clock)
            .finish_non_exhaustive()
    }
}
