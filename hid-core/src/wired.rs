//! Wired Scheduler: one report per transport-ready tick.
//!
//! In wired mode the device context composes and sends in the same loop.
//! Keyboard changes always go first. Mouse and gamepad compete through
//! priority counters that grow while their kind waits unsynced; mouse grows
//! [`PipelineConfig::mouse_priority_ratio`] times faster.

use crate::config::PipelineConfig;
use crate::output::{OutputError, Transport};
use crate::state::HidState;
use hid_proto::ReportKind;

/// Link state as seen from the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    /// Transport not connected.
    Idle,
    /// Connected, waiting for readiness or for something to send.
    Polling,
    /// A report went out this tick.
    Sending,
}

/// Wired arbitration between report kinds, driving one transport.
pub struct WiredScheduler<T> {
    transport: T,
    config: PipelineConfig,
    priority_mouse: u16,
    priority_gamepad: u16,
    link: LinkState,
}

impl<T: Transport> WiredScheduler<T> {
    pub fn new(transport: T, config: PipelineConfig) -> Self {
        Self {
            transport,
            config,
            priority_mouse: 0,
            priority_gamepad: 0,
            link: LinkState::Idle,
        }
    }

    /// Per-tick entry point.
    ///
    /// Returns the kind sent this tick, `None` when nothing went out. A send
    /// error leaves the kind unsynced so it is retried with fresher state.
    /// The gamepad analog accumulators are reset on every path.
    pub fn compose_and_send<const N: usize>(
        &mut self,
        hid: &mut HidState<N>,
    ) -> Result<Option<ReportKind>, OutputError> {
        let result = self.tick(hid);
        hid.reset_analog();
        result
    }

    fn tick<const N: usize>(
        &mut self,
        hid: &mut HidState<N>,
    ) -> Result<Option<ReportKind>, OutputError> {
        if !hid.is_synced(ReportKind::Mouse) {
            self.priority_mouse = self
                .priority_mouse
                .saturating_add(self.config.mouse_priority_ratio);
        }
        if !hid.is_synced(ReportKind::Gamepad) {
            self.priority_gamepad = self.priority_gamepad.saturating_add(1);
        }

        if !self.transport.is_connected() {
            self.set_link(LinkState::Idle);
            return Ok(None);
        }
        if !self.transport.is_ready() {
            self.set_link(LinkState::Polling);
            return Ok(None);
        }
        let Some(kind) = self.pick(hid) else {
            self.set_link(LinkState::Polling);
            return Ok(None);
        };

        if self.transport.is_suspended() {
            debug!("transport suspended, requesting wakeup");
            self.transport.wake();
        }
        let report = hid.compose(kind, self.config.gamepad_protocol);
        self.transport.send(&report)?;
        hid.commit(&report);
        match kind {
            ReportKind::Mouse => self.priority_mouse = 0,
            ReportKind::Gamepad => self.priority_gamepad = 0,
            ReportKind::Keyboard => {}
        }
        self.set_link(LinkState::Sending);
        Ok(Some(kind))
    }

    fn pick<const N: usize>(&self, hid: &HidState<N>) -> Option<ReportKind> {
        let mouse = !hid.is_synced(ReportKind::Mouse);
        let gamepad = !hid.is_synced(ReportKind::Gamepad);
        if !hid.is_synced(ReportKind::Keyboard) {
            Some(ReportKind::Keyboard)
        } else if mouse && self.priority_mouse > self.priority_gamepad {
            Some(ReportKind::Mouse)
        } else if gamepad {
            Some(ReportKind::Gamepad)
        } else if mouse {
            Some(ReportKind::Mouse)
        } else {
            None
        }
    }

    fn set_link(&mut self, link: LinkState) {
        let was_connected = self.link != LinkState::Idle;
        let connected = link != LinkState::Idle;
        if was_connected != connected {
            if connected {
                info!("transport connected");
            } else {
                info!("transport disconnected");
            }
        }
        self.link = link;
    }

    #[inline]
    #[must_use]
    pub fn link_state(&self) -> LinkState {
        self.link
    }

    #[inline]
    #[must_use]
    pub fn priorities(&self) -> (u16, u16) {
        (self.priority_mouse, self.priority_gamepad)
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }
}
