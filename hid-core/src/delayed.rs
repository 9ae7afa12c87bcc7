//! Delayed Action Scheduler.
//!
//! Timer fires are modelled as entries in a fixed pool that the device loop
//! drains each tick with [`DelayedActions::pop_due`]. Applying a fired
//! action therefore happens on the same context that owns the matrix.
//!
//! Scheduled actions cannot be cancelled, and a profile reset leaves them in
//! place.

use crate::actions::ActionSet;
use hid_proto::ActionCode;
use heapless::Vec;

/// Pool has no free slot; the action is never applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PoolExhausted;

/// Why a macro did not start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MacroError {
    /// Timers from earlier delayed actions are still outstanding.
    Busy,
    /// The whole sequence does not fit in the free pool slots.
    PoolExhausted,
}

/// What a fired timer applies.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DelayedAction {
    Press(ActionSet),
    Release(ActionSet),
}

#[derive(Clone, Debug)]
struct Scheduled {
    deadline_us: u64,
    /// Insertion order, breaks deadline ties.
    seq: u32,
    action: DelayedAction,
}

/// Fixed-capacity pool of pending delayed actions.
pub struct DelayedActions<const N: usize> {
    pending: Vec<Scheduled, N>,
    seq: u32,
}

impl<const N: usize> DelayedActions<N> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pending: Vec::new(),
            seq: 0,
        }
    }

    /// Schedule `action` to apply `delay_ms` after `now_us`.
    pub fn schedule(
        &mut self,
        now_us: u64,
        delay_ms: u32,
        action: DelayedAction,
    ) -> Result<(), PoolExhausted> {
        let entry = Scheduled {
            deadline_us: now_us + u64::from(delay_ms) * 1000,
            seq: self.seq,
            action,
        };
        self.pending.push(entry).map_err(|_| PoolExhausted)?;
        self.seq = self.seq.wrapping_add(1);
        Ok(())
    }

    /// Number of timers scheduled but not yet fired.
    #[inline]
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.pending.len()
    }

    /// Free slots left in the pool.
    #[inline]
    #[must_use]
    pub fn available(&self) -> usize {
        N - self.pending.len()
    }

    #[inline]
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }

    /// Schedule a macro as press/release pairs spaced `step_ms` apart,
    /// starting `step_ms` from now.
    ///
    /// Refuses to start while any timer is outstanding, so two macros never
    /// interleave.
    pub fn play_macro(
        &mut self,
        now_us: u64,
        sequence: &[ActionCode],
        step_ms: u32,
    ) -> Result<(), MacroError> {
        if !self.is_idle() {
            return Err(MacroError::Busy);
        }
        let codes = sequence.iter().copied().filter(|code| !code.is_none());
        if codes.clone().count() * 2 > N {
            return Err(MacroError::PoolExhausted);
        }
        let mut at = step_ms;
        for code in codes {
            let set = ActionSet::single(code);
            self.schedule(now_us, at, DelayedAction::Press(set.clone()))
                .map_err(|_| MacroError::PoolExhausted)?;
            at += step_ms;
            self.schedule(now_us, at, DelayedAction::Release(set))
                .map_err(|_| MacroError::PoolExhausted)?;
            at += step_ms;
        }
        Ok(())
    }

    /// Remove and return the earliest action whose deadline has passed.
    pub fn pop_due(&mut self, now_us: u64) -> Option<DelayedAction> {
        let index = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.deadline_us <= now_us)
            .min_by_key(|(_, entry)| (entry.deadline_us, entry.seq))
            .map(|(index, _)| index)?;
        // Order among the remaining entries does not matter; pop_due always
        // searches for the minimum.
        Some(self.pending.swap_remove(index).action)
    }
}

impl<const N: usize> Default for DelayedActions<N> {
    fn default() -> Self {
        Self::new()
    }
}
