//! Device-context action state.
//!
//! [`HidState`] owns everything the device loop mutates: the matrix, the
//! analog accumulators and the delayed action pool. One instance lives per
//! device context and is passed explicitly to the components that need it,
//! so the matrix has exactly one writer.
//!
//! # Tick order
//!
//! ```text
//! begin_tick(now)          apply due delayed actions
//! buttons / rotary         mutate through the Actions trait
//! dispatch_procedures      drain procedure events
//! wired or producer        compose, deliver, commit, then reset_analog
//! ```

use crate::actions::{ActionSet, Actions, MacroSequence};
use crate::compose::{Axis, Composer};
use crate::config::{GamepadProtocol, Timing, DELAYED_POOL_SIZE};
use crate::delayed::{DelayedAction, DelayedActions, MacroError};
use crate::matrix::{ActionMatrix, ProcedureEvent};
use crate::rotary::RotaryReducer;
use fixed::types::I16F16;
use hid_proto::{ActionCode, Procedure, Report, ReportKind};

/// Side effects of procedure codes, supplied by the firmware.
pub trait ProcedureHandler {
    /// A procedure code was asserted.
    fn press(&mut self, procedure: Procedure);

    /// A procedure with a paired release was withdrawn.
    fn release(&mut self, procedure: Procedure) {
        let _ = procedure;
    }

    /// Sequence for macro slot `index` (1-based) in the active profile.
    fn macro_sequence(&self, index: u8) -> Option<MacroSequence> {
        let _ = index;
        None
    }
}

/// Action state owned by the device context.
pub struct HidState<const N: usize = DELAYED_POOL_SIZE> {
    matrix: ActionMatrix,
    composer: Composer,
    delayed: DelayedActions<N>,
    timing: Timing,
    now_us: u64,
}

impl<const N: usize> HidState<N> {
    #[must_use]
    pub const fn new(timing: Timing) -> Self {
        Self {
            matrix: ActionMatrix::new(),
            composer: Composer::new(),
            delayed: DelayedActions::new(),
            timing,
            now_us: 0,
        }
    }

    /// Advance the clock and apply every delayed action now due.
    pub fn begin_tick(&mut self, now_us: u64) {
        self.now_us = now_us;
        while let Some(action) = self.delayed.pop_due(now_us) {
            match action {
                DelayedAction::Press(set) => self.press_set(&set),
                DelayedAction::Release(set) => self.release_set(&set),
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn now_us(&self) -> u64 {
        self.now_us
    }

    #[inline]
    #[must_use]
    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    #[inline]
    #[must_use]
    pub fn matrix(&self) -> &ActionMatrix {
        &self.matrix
    }

    #[inline]
    pub fn matrix_mut(&mut self) -> &mut ActionMatrix {
        &mut self.matrix
    }

    #[inline]
    #[must_use]
    pub fn is_synced(&self, kind: ReportKind) -> bool {
        self.matrix.is_synced(kind)
    }

    #[inline]
    pub fn mark_synced(&mut self, kind: ReportKind) {
        self.matrix.mark_synced(kind);
    }

    /// Add relative mouse motion.
    pub fn mouse_move(&mut self, x: i16, y: i16) {
        self.composer.mouse_move(x, y);
        self.matrix.mark_unsynced(ReportKind::Mouse);
    }

    /// Add an analog value to a gamepad axis for this tick.
    pub fn gamepad_axis(&mut self, axis: Axis, value: I16F16) {
        if self.composer.gamepad_axis(axis, value) {
            self.matrix.mark_unsynced(ReportKind::Gamepad);
        }
    }

    /// Compose the current report for `kind` without consuming anything.
    #[must_use]
    pub fn compose(&self, kind: ReportKind, protocol: GamepadProtocol) -> Report {
        self.composer.compose(kind, protocol, &self.matrix)
    }

    /// `report` was handed to a transport or queue: mark its kind synced
    /// and consume the mouse motion and scroll it carried.
    pub fn commit(&mut self, report: &Report) {
        self.composer.commit(report, &mut self.matrix);
        self.matrix.mark_synced(report.kind());
    }

    /// Drop this tick's analog input.
    pub fn reset_analog(&mut self) {
        self.composer.reset_analog();
    }

    /// Profile switch: zero the matrix and resend every kind.
    ///
    /// Delayed actions already scheduled still fire afterwards.
    pub fn reset(&mut self) {
        self.matrix.reset();
    }

    /// Timers scheduled but not yet fired.
    #[inline]
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.delayed.outstanding()
    }

    /// Start macro playback. Returns false if it was refused.
    pub fn play_macro(&mut self, sequence: &[ActionCode]) -> bool {
        match self
            .delayed
            .play_macro(self.now_us, sequence, self.timing.macro_step_ms)
        {
            Ok(()) => true,
            Err(MacroError::Busy) => {
                debug!("macro refused, {} timers outstanding", self.delayed.outstanding());
                false
            }
            Err(MacroError::PoolExhausted) => {
                warn!("macro too long for delayed pool");
                false
            }
        }
    }

    /// Drain queued procedure events.
    ///
    /// Rotary mode switches and macros are handled here; everything else is
    /// forwarded to `handler`.
    pub fn dispatch_procedures<H: ProcedureHandler>(
        &mut self,
        handler: &mut H,
        rotary: &mut RotaryReducer,
    ) {
        while let Some(event) = self.matrix.take_procedure() {
            match event {
                ProcedureEvent::Press(Procedure::RotaryMode(mode)) => rotary.set_mode(mode),
                ProcedureEvent::Press(Procedure::Macro(index)) => {
                    if let Some(sequence) = handler.macro_sequence(index) {
                        self.play_macro(&sequence);
                    }
                }
                ProcedureEvent::Press(procedure) => handler.press(procedure),
                ProcedureEvent::Release(procedure) => handler.release(procedure),
            }
        }
    }

    fn schedule(&mut self, delay_ms: u32, action: DelayedAction) {
        if self.delayed.schedule(self.now_us, delay_ms, action).is_err() {
            warn!("delayed action pool exhausted, action dropped");
        }
    }
}

impl<const N: usize> Default for HidState<N> {
    fn default() -> Self {
        Self::new(Timing::new())
    }
}

impl<const N: usize> Actions for HidState<N> {
    fn press(&mut self, code: ActionCode) {
        self.matrix.assert(code);
    }

    fn release(&mut self, code: ActionCode) {
        self.matrix.withdraw(code);
    }

    fn press_later(&mut self, set: &ActionSet, delay_ms: u32) {
        self.schedule(delay_ms, DelayedAction::Press(set.clone()));
    }

    fn release_later(&mut self, set: &ActionSet, delay_ms: u32) {
        self.schedule(delay_ms, DelayedAction::Release(set.clone()));
    }

    fn schedule_capacity(&self) -> usize {
        self.delayed.available()
    }
}
