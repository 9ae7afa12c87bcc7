//! Rotary Reducer: quadrature edges to discrete action pulses.
//!
//! The edge handler only records direction and time. The device loop calls
//! [`RotaryReducer::report`] every tick; once the wheel has been still for
//! the debounce interval, the pending increment becomes `|increment|`
//! pulses of the active mode's up or down set.

use crate::actions::{ActionSet, Actions};
use crate::config::Timing;
use crate::input::Direction;

/// Number of selectable rotary modes.
pub const ROTARY_MODES: usize = 6;

const UNBOUND: (ActionSet, ActionSet) = (ActionSet::new(), ActionSet::new());

/// Pending increment plus per-mode up/down action sets.
#[derive(Debug, Clone)]
pub struct RotaryReducer {
    pending: i16,
    last_edge_us: u64,
    mode: u8,
    /// `(up, down)` per mode.
    modes: [(ActionSet, ActionSet); ROTARY_MODES],
}

impl RotaryReducer {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pending: 0,
            last_edge_us: 0,
            mode: 0,
            modes: [UNBOUND; ROTARY_MODES],
        }
    }

    /// Bind the up/down sets of `mode`. Out-of-range modes are ignored.
    pub fn config_mode(&mut self, mode: u8, up: ActionSet, down: ActionSet) {
        if let Some(slot) = self.modes.get_mut(usize::from(mode)) {
            *slot = (up, down);
        }
    }

    /// Switch the active mode. A pending increment is kept and reported with
    /// the new mode's sets.
    pub fn set_mode(&mut self, mode: u8) {
        if usize::from(mode) < ROTARY_MODES {
            self.mode = mode;
        }
    }

    #[inline]
    #[must_use]
    pub fn mode(&self) -> u8 {
        self.mode
    }

    #[inline]
    #[must_use]
    pub fn pending(&self) -> i16 {
        self.pending
    }

    /// Record one edge.
    pub fn record_edge(&mut self, direction: Direction, timestamp_us: u64) {
        self.add_increment(i16::from(direction.step()), timestamp_us);
    }

    /// Record several edges drained at once, `timestamp_us` being the last.
    pub fn add_increment(&mut self, increment: i16, timestamp_us: u64) {
        if increment == 0 {
            return;
        }
        self.pending = self.pending.saturating_add(increment);
        self.last_edge_us = timestamp_us;
    }

    /// Emit pulses for a settled increment.
    ///
    /// Each pulse holds a delayed release, so a burst larger than the free
    /// delayed pool is emitted over several ticks.
    pub fn report<A: Actions>(&mut self, now_us: u64, timing: &Timing, actions: &mut A) {
        if self.pending == 0 || now_us <= self.last_edge_us + timing.rotary_debounce_us {
            return;
        }
        let pulses = self
            .pending
            .unsigned_abs()
            .min(u16::try_from(actions.schedule_capacity()).unwrap_or(u16::MAX));
        let (up, down) = &self.modes[usize::from(self.mode)];
        let set = if self.pending > 0 { up } else { down };
        for _ in 0..pulses {
            actions.press_set(set);
            actions.release_later(set, timing.rotary_release_ms);
        }
        // pulses <= |pending| <= i16::MAX + 1
        let emitted = pulses as i16;
        self.pending = if self.pending > 0 {
            self.pending - emitted
        } else {
            self.pending.wrapping_add(emitted)
        };
    }

    /// Drop any pending increment.
    pub fn reset(&mut self) {
        self.pending = 0;
    }
}

impl Default for RotaryReducer {
    fn default() -> Self {
        Self::new()
    }
}
