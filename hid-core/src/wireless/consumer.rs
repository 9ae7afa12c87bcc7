//! Host-side half of the wireless pipeline.
//!
//! Each host tick drains the whole queue and coalesces it into at most one
//! report per kind. Mouse entries are summed so no motion is lost; keyboard
//! and XInput entries are states, so only the newest one matters.
//!
//! # Motion prediction
//!
//! While a motion burst is open and a tick drains no mouse entries, the
//! last sent delta is repeated so the cursor keeps moving across a late
//! device tick. When the late entries arrive together (two or more in one
//! drain) the repeated amount is subtracted back out:
//!
//! ```text
//! tick   drained            sent       predicted
//! 1      (2,0) (3,0) (1,0)  (6,0)      0
//! 2      -                  (6,0) *    1
//! 3      (2,0) (2,0)        (-2,0)     0
//! ```

use super::queue::ReportConsumer;
use crate::config::PipelineConfig;
use crate::output::{OutputError, Transport};
use embedded_hal::delay::DelayNs;
use hid_proto::{KeyboardReport, MouseReport, QueueEntry, Report, XInputReport};

/// Outcome of one host tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConsumeStats {
    /// Entries drained from the queue.
    pub drained: u8,
    /// Reports handed to the transport.
    pub sent: u8,
    /// The mouse report sent was a prediction.
    pub predicted: bool,
}

/// Drains, coalesces and forwards queue entries to a transport.
pub struct WirelessConsumer<T> {
    transport: T,
    config: PipelineConfig,
    keyboard: Option<KeyboardReport>,
    mouse: Option<MouseReport>,
    xinput: Option<XInputReport>,
    mouse_engaged: bool,
    last_mouse: MouseReport,
    predicted_count: u8,
    last_predicted: Option<MouseReport>,
}

impl<T: Transport> WirelessConsumer<T> {
    pub fn new(transport: T, config: PipelineConfig) -> Self {
        Self {
            transport,
            config,
            keyboard: None,
            mouse: None,
            xinput: None,
            mouse_engaged: false,
            last_mouse: MouseReport::default(),
            predicted_count: 0,
            last_predicted: None,
        }
    }

    /// Per-tick entry point.
    ///
    /// Reports that cannot go out this tick stay pending; further mouse
    /// entries keep adding to the pending mouse report.
    pub fn consume<Q: ReportConsumer, D: DelayNs>(
        &mut self,
        queue: &mut Q,
        delay: &mut D,
    ) -> ConsumeStats {
        let mut stats = ConsumeStats::default();
        let mut mouse_entries: u8 = 0;

        while let Some(entry) = queue.try_dequeue() {
            stats.drained = stats.drained.saturating_add(1);
            match entry {
                QueueEntry::Keyboard(report) => self.keyboard = Some(report),
                QueueEntry::XInput(report) => self.xinput = Some(report),
                QueueEntry::Mouse(report) => {
                    mouse_entries = mouse_entries.saturating_add(1);
                    self.mouse_engaged = true;
                    self.accumulate(report);
                }
                QueueEntry::MouseEot => {
                    self.mouse_engaged = false;
                    self.predicted_count = 0;
                }
            }
        }

        if mouse_entries >= 2 {
            self.reconcile(mouse_entries);
        }
        if mouse_entries == 0 && self.mouse.is_none() && self.transport.is_ready() {
            stats.predicted = self.predict();
        }

        if !self.transport.is_connected() {
            return stats;
        }
        if let Some(report) = self.keyboard {
            if self.forward(&Report::Keyboard(report), stats.sent, delay).is_ok() {
                self.keyboard = None;
                stats.sent += 1;
            }
        }
        if let Some(report) = self.mouse {
            if self.forward(&Report::Mouse(report), stats.sent, delay).is_ok() {
                self.mouse = None;
                self.last_mouse = report;
                stats.sent += 1;
            } else {
                stats.predicted = false;
            }
        }
        if let Some(report) = self.xinput {
            if self.forward(&Report::XInput(report), stats.sent, delay).is_ok() {
                self.xinput = None;
                stats.sent += 1;
            }
        }
        stats
    }

    fn accumulate(&mut self, report: MouseReport) {
        let pending = self.mouse.get_or_insert_with(MouseReport::default);
        pending.buttons = report.buttons;
        pending.x = pending.x.saturating_add(report.x);
        pending.y = pending.y.saturating_add(report.y);
        pending.scroll = pending.scroll.saturating_add(report.scroll);
        pending.pan = pending.pan.saturating_add(report.pan);
    }

    /// Subtract predicted motion once the late entries have caught up.
    fn reconcile(&mut self, mouse_entries: u8) {
        let (Some(predicted), Some(pending)) = (self.last_predicted, self.mouse.as_mut()) else {
            return;
        };
        let k = (mouse_entries - 1).min(self.predicted_count);
        if k == 0 {
            return;
        }
        let times = i16::from(k);
        pending.x = pending.x.saturating_sub(predicted.x.saturating_mul(times));
        pending.y = pending.y.saturating_sub(predicted.y.saturating_mul(times));
        self.predicted_count -= k;
        trace!("reconciled {} predicted deltas", k);
    }

    /// Queue a repeat of the last sent delta. Returns true if one was queued.
    fn predict(&mut self) -> bool {
        let last = self.last_mouse;
        if !self.mouse_engaged
            || self.predicted_count >= self.config.prediction_limit
            || (last.x == 0 && last.y == 0)
        {
            return false;
        }
        let predicted = MouseReport {
            buttons: last.buttons,
            x: last.x,
            y: last.y,
            ..MouseReport::default()
        };
        self.mouse = Some(predicted);
        self.last_predicted = Some(predicted);
        self.predicted_count += 1;
        true
    }

    fn forward<D: DelayNs>(
        &mut self,
        report: &Report,
        sent_this_tick: u8,
        delay: &mut D,
    ) -> Result<(), OutputError> {
        if !self.transport.is_ready() {
            return Err(OutputError::NotReady);
        }
        if sent_this_tick > 0 {
            delay.delay_us(self.config.send_stall_us);
        }
        if self.transport.is_suspended() {
            self.transport.wake();
        }
        self.transport.send(report).inspect_err(|err| {
            warn!("send failed: {:?}", err);
        })
    }

    /// A motion burst is open on the device side.
    #[inline]
    #[must_use]
    pub fn is_mouse_engaged(&self) -> bool {
        self.mouse_engaged
    }

    /// Predicted deltas not yet reconciled.
    #[inline]
    #[must_use]
    pub fn predicted_count(&self) -> u8 {
        self.predicted_count
    }

    /// The most recent predicted report, if any was ever made.
    #[inline]
    #[must_use]
    pub fn last_predicted(&self) -> Option<MouseReport> {
        self.last_predicted
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
