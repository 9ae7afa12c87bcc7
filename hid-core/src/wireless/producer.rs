//! Device-side half of the wireless pipeline.

use super::queue::ReportProducer;
use crate::config::GamepadProtocol;
use crate::state::HidState;
use hid_proto::{QueueEntry, ReportKind};

/// Serializes unsynced reports into the queue once per device tick.
///
/// Gamepad state always travels as XInput. A full queue drops the entry and
/// leaves its kind unsynced, so the next tick enqueues fresher state
/// instead of waiting for space.
#[derive(Debug, Default)]
pub struct WirelessProducer {
    mouse_engaged: bool,
    dropped: u32,
}

impl WirelessProducer {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            mouse_engaged: false,
            dropped: 0,
        }
    }

    /// Per-tick entry point. Returns the number of entries enqueued.
    pub fn produce<Q: ReportProducer, const N: usize>(
        &mut self,
        hid: &mut HidState<N>,
        queue: &mut Q,
    ) -> usize {
        let mut enqueued = 0;
        let mouse_idle = hid.is_synced(ReportKind::Mouse);

        for kind in ReportKind::ALL {
            if hid.is_synced(kind) {
                continue;
            }
            let report = hid.compose(kind, GamepadProtocol::XInput);
            let Some(entry) = QueueEntry::from_report(&report) else {
                continue;
            };
            match queue.try_enqueue(entry) {
                Ok(()) => {
                    hid.commit(&report);
                    enqueued += 1;
                    if kind == ReportKind::Mouse {
                        self.mouse_engaged = true;
                    }
                }
                Err(_) => {
                    self.dropped = self.dropped.wrapping_add(1);
                    warn!("report queue full, {:?} entry dropped", kind);
                }
            }
        }

        // A tick without mouse activity closes the motion burst. If the
        // marker does not fit it is retried on the next idle tick.
        if mouse_idle && self.mouse_engaged && queue.try_enqueue(QueueEntry::MouseEot).is_ok() {
            self.mouse_engaged = false;
            enqueued += 1;
        }

        hid.reset_analog();
        enqueued
    }

    /// A motion burst is open and will be closed by an end marker.
    #[inline]
    #[must_use]
    pub fn is_mouse_engaged(&self) -> bool {
        self.mouse_engaged
    }

    /// Entries dropped on a full queue since boot.
    #[inline]
    #[must_use]
    pub fn dropped(&self) -> u32 {
        self.dropped
    }
}
