// SPDX-License-Identifier: MIT OR Apache-2.0
//! Mutable per-player state shared with nodes while they run.

use crate::binding::OverrideBindings;
use crate::parameters::Parameters;

/// Player time keeping
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Clock {
    /// Seconds covered by the current step
    pub delta: f64,
    /// Seconds since playback started
    pub elapsed: f64,
    /// Steps since playback started
    pub frame: u64,
}

impl Clock {
    /// Advance by one step of `delta` seconds
    pub fn advance(&mut self, delta: f64) {
        self.delta = delta;
        self.elapsed += delta;
        self.frame += 1;
    }

    /// Back to zero
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Everything a running node may read or change on its player
#[derive(Debug, Default)]
pub struct Runtime {
    /// Named key/value store
    pub parameters: Parameters,
    /// Per-player override bindings
    pub bindings: OverrideBindings,
    /// Time keeping
    pub clock: Clock,
    /// Set by nodes that want the player stopped after this step
    pub stop_requested: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_advance_and_reset() {
        let mut clock = Clock::default();
        clock.advance(0.5);
        clock.advance(0.25);
        assert_eq!(clock.delta, 0.25);
        assert_eq!(clock.elapsed, 0.75);
        assert_eq!(clock.frame, 2);

        clock.reset();
        assert_eq!(clock, Clock::default());
    }
}
