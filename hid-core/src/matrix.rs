//! Action Matrix: per-action-code press counters.
//!
//! The matrix is the single source of truth for "is this effect asserted".
//! Several inputs may assert the same code; the code stays active until
//! every one of them has withdrawn it.

use hid_proto::{ActionCode, Procedure, ReportKind};
use heapless::Deque;

/// Procedure events buffered between dispatch points.
pub const PROCEDURE_QUEUE_LEN: usize = 8;

/// Procedure edge produced by asserting or withdrawing a procedure code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProcedureEvent {
    Press(Procedure),
    Release(Procedure),
}

/// Counter table plus one synced flag per report kind.
pub struct ActionMatrix {
    counters: [i16; 256],
    synced: [bool; ReportKind::COUNT],
    procedures: Deque<ProcedureEvent, PROCEDURE_QUEUE_LEN>,
}

impl ActionMatrix {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            counters: [0; 256],
            synced: [false; ReportKind::COUNT],
            procedures: Deque::new(),
        }
    }

    /// Assert `code`.
    ///
    /// Procedure codes never touch the counters; they queue a press event
    /// for the device context to dispatch.
    pub fn assert(&mut self, code: ActionCode) {
        if code.is_none() {
            return;
        }
        if let Some(procedure) = Procedure::from_code(code) {
            self.push_procedure(ProcedureEvent::Press(procedure));
            return;
        }
        let counter = &mut self.counters[code.raw() as usize];
        *counter = counter.saturating_add(1);
        self.mark_unsynced_for(code);
    }

    /// Withdraw `code`.
    ///
    /// Scroll codes are consumed by the composer and ignore withdrawal.
    pub fn withdraw(&mut self, code: ActionCode) {
        if code.is_none() || code.is_scroll() {
            return;
        }
        if let Some(procedure) = Procedure::from_code(code) {
            if procedure.has_release() {
                self.push_procedure(ProcedureEvent::Release(procedure));
            }
            return;
        }
        let counter = &mut self.counters[code.raw() as usize];
        *counter = counter.saturating_sub(1);
        self.mark_unsynced_for(code);
    }

    #[inline]
    #[must_use]
    pub fn is_active(&self, code: ActionCode) -> bool {
        self.counters[code.raw() as usize] > 0
    }

    /// Raw counter value. Negative after a stale withdraw crossed a reset.
    #[inline]
    #[must_use]
    pub fn counter(&self, code: ActionCode) -> i16 {
        self.counters[code.raw() as usize]
    }

    #[inline]
    #[must_use]
    pub fn is_axis(&self, code: ActionCode) -> bool {
        code.is_axis()
    }

    /// Read and zero a counter. Used for one-shot codes such as scroll.
    pub fn consume(&mut self, code: ActionCode) -> i16 {
        core::mem::take(&mut self.counters[code.raw() as usize])
    }

    /// Zero every counter and mark every kind unsynced.
    ///
    /// Pending procedure events are kept. Withdrawals already scheduled for
    /// codes asserted before the reset still land afterwards.
    pub fn reset(&mut self) {
        self.counters = [0; 256];
        self.synced = [false; ReportKind::COUNT];
    }

    #[inline]
    #[must_use]
    pub fn is_synced(&self, kind: ReportKind) -> bool {
        self.synced[kind.index()]
    }

    #[inline]
    pub fn mark_synced(&mut self, kind: ReportKind) {
        self.synced[kind.index()] = true;
    }

    #[inline]
    pub fn mark_unsynced(&mut self, kind: ReportKind) {
        self.synced[kind.index()] = false;
    }

    /// Pop the oldest pending procedure event.
    pub fn take_procedure(&mut self) -> Option<ProcedureEvent> {
        self.procedures.pop_front()
    }

    fn mark_unsynced_for(&mut self, code: ActionCode) {
        if let Some(kind) = code.kind() {
            self.mark_unsynced(kind);
        }
    }

    fn push_procedure(&mut self, event: ProcedureEvent) {
        if self.procedures.push_back(event).is_err() {
            warn!("procedure queue full, dropping {:?}", event);
        }
    }
}

impl Default for ActionMatrix {
    fn default() -> Self {
        Self::new()
    }
}
