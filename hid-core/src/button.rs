//! Button State Machine.
//!
//! Each button polls its source once per tick and turns level transitions
//! into matrix mutations according to its [`ButtonMode`].
//!
//! | Mode                  | Press                  | Held past threshold | Release                                 |
//! |-----------------------|------------------------|---------------------|-----------------------------------------|
//! | `Normal`              | primary (debounced)    | -                   | primary (debounced)                     |
//! | `Sticky`              | primary + secondary    | -                   | secondary only                          |
//! | `HoldExclusive(Long)` | nothing                | secondary           | short: primary pulse; long: secondary   |
//! | `HoldOverlap(Long)`   | primary                | + secondary         | whatever is asserted                    |
//! | `HoldOverlapEarly`    | secondary              | -                   | secondary; short: delayed primary pulse |
//! | `HoldDoublePress`     | primary, or secondary  | -                   | whichever was asserted                  |
//! |                       | within the window      |                     |                                         |
//!
//! [`Button::reset`] returns to idle without withdrawing anything, so a
//! code held across a profile switch stays counted until a stale release
//! lands.

use crate::actions::{ActionSet, Actions};
use crate::config::Timing;
use crate::input::{ButtonInputs, Source};

/// Timing behaviour of one button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonMode {
    #[default]
    Normal,
    Sticky,
    HoldExclusive,
    HoldExclusiveLong,
    HoldOverlap,
    HoldOverlapLong,
    HoldOverlapEarly,
    HoldDoublePress,
}

/// One physical or virtual button bound to a primary and secondary set.
#[derive(Debug, Clone)]
pub struct Button {
    source: Source,
    mode: ButtonMode,
    primary: ActionSet,
    secondary: ActionSet,
    state: bool,
    state_secondary: bool,
    /// Last debounced transition (`Normal`).
    last_transition_us: Option<u64>,
    /// Hold start, or last primary press for `HoldDoublePress`.
    hold_start_us: Option<u64>,
    virtual_press: bool,
}

impl Button {
    #[must_use]
    pub fn new(source: Source, mode: ButtonMode, primary: ActionSet, secondary: ActionSet) -> Self {
        Self {
            source,
            mode,
            primary,
            secondary,
            state: false,
            state_secondary: false,
            last_transition_us: None,
            hold_start_us: None,
            virtual_press: false,
        }
    }

    /// `Normal` button with no secondary set.
    #[must_use]
    pub fn normal(source: Source, primary: ActionSet) -> Self {
        Self::new(source, ButtonMode::Normal, primary, ActionSet::new())
    }

    #[inline]
    #[must_use]
    pub fn mode(&self) -> ButtonMode {
        self.mode
    }

    #[inline]
    #[must_use]
    pub fn source(&self) -> Source {
        self.source
    }

    /// Primary set currently asserted (or latched, for `Sticky`).
    #[inline]
    #[must_use]
    pub fn is_primary(&self) -> bool {
        self.state
    }

    #[inline]
    #[must_use]
    pub fn is_secondary(&self) -> bool {
        self.state_secondary
    }

    /// Request one press for a `Source::Virtual` button. Consumed by the
    /// next poll.
    pub fn virtual_press(&mut self) {
        self.virtual_press = true;
    }

    /// Force idle. Nothing is withdrawn.
    pub fn reset(&mut self) {
        self.state = false;
        self.state_secondary = false;
        self.last_transition_us = None;
        self.hold_start_us = None;
        self.virtual_press = false;
    }

    /// Poll the source and apply this tick's transition.
    pub fn report<I, A>(&mut self, inputs: &mut I, now_us: u64, timing: &Timing, actions: &mut A)
    where
        I: ButtonInputs + ?Sized,
        A: Actions + ?Sized,
    {
        match self.mode {
            ButtonMode::Normal => self.handle_normal(inputs, now_us, timing, actions),
            ButtonMode::Sticky => self.handle_sticky(inputs, actions),
            ButtonMode::HoldExclusive => {
                self.handle_hold_exclusive(inputs, now_us, timing.hold_exclusive_us, timing, actions)
            }
            ButtonMode::HoldExclusiveLong => self.handle_hold_exclusive(
                inputs,
                now_us,
                timing.hold_exclusive_long_us,
                timing,
                actions,
            ),
            ButtonMode::HoldOverlap => {
                self.handle_hold_overlap(inputs, now_us, timing.hold_overlap_us, actions)
            }
            ButtonMode::HoldOverlapLong => {
                self.handle_hold_overlap(inputs, now_us, timing.hold_overlap_long_us, actions)
            }
            ButtonMode::HoldOverlapEarly => {
                self.handle_hold_overlap_early(inputs, now_us, timing, actions)
            }
            ButtonMode::HoldDoublePress => {
                self.handle_double_press(inputs, now_us, timing, actions)
            }
        }
    }

    fn is_pressed<I: ButtonInputs + ?Sized>(&mut self, inputs: &mut I) -> bool {
        match self.source {
            Source::Pin(pin) => inputs.is_pressed(pin),
            Source::Virtual => core::mem::take(&mut self.virtual_press),
        }
    }

    fn handle_normal<I, A>(&mut self, inputs: &mut I, now_us: u64, timing: &Timing, actions: &mut A)
    where
        I: ButtonInputs + ?Sized,
        A: Actions + ?Sized,
    {
        if let Some(last) = self.last_transition_us {
            if now_us < last + timing.press_debounce_us {
                return;
            }
        }
        let pressed = self.is_pressed(inputs);
        if pressed && !self.state {
            actions.press_set(&self.primary);
            self.state = true;
            self.last_transition_us = Some(now_us);
        } else if !pressed && self.state {
            actions.release_set(&self.primary);
            self.state = false;
            self.last_transition_us = Some(now_us);
        }
    }

    fn handle_sticky<I, A>(&mut self, inputs: &mut I, actions: &mut A)
    where
        I: ButtonInputs + ?Sized,
        A: Actions + ?Sized,
    {
        let pressed = self.is_pressed(inputs);
        if pressed && !self.state {
            self.state = true;
            actions.press_set(&self.primary);
            actions.press_set(&self.secondary);
        } else if !pressed && self.state {
            // Primary stays asserted as a latch.
            self.state = false;
            actions.release_set(&self.secondary);
        }
    }

    fn handle_hold_exclusive<I, A>(
        &mut self,
        inputs: &mut I,
        now_us: u64,
        threshold_us: u64,
        timing: &Timing,
        actions: &mut A,
    ) where
        I: ButtonInputs + ?Sized,
        A: Actions + ?Sized,
    {
        let pressed = self.is_pressed(inputs);
        if pressed {
            if !self.state && !self.state_secondary {
                self.state = true;
                self.hold_start_us = Some(now_us);
            } else if self.state && self.held_past(now_us, threshold_us) {
                actions.press_set(&self.secondary);
                self.state = false;
                self.state_secondary = true;
            }
        } else if self.state {
            actions.press_set(&self.primary);
            actions.release_later(&self.primary, timing.pulse_release_ms);
            self.state = false;
        } else if self.state_secondary {
            actions.release_set(&self.secondary);
            self.state_secondary = false;
        }
    }

    fn handle_hold_overlap<I, A>(
        &mut self,
        inputs: &mut I,
        now_us: u64,
        threshold_us: u64,
        actions: &mut A,
    ) where
        I: ButtonInputs + ?Sized,
        A: Actions + ?Sized,
    {
        let pressed = self.is_pressed(inputs);
        if pressed {
            if !self.state && !self.state_secondary {
                actions.press_set(&self.primary);
                self.state = true;
                self.hold_start_us = Some(now_us);
            } else if self.state && !self.state_secondary && self.held_past(now_us, threshold_us) {
                actions.press_set(&self.secondary);
                self.state_secondary = true;
            }
            return;
        }
        if self.state {
            actions.release_set(&self.primary);
            self.state = false;
        }
        if self.state_secondary {
            actions.release_set(&self.secondary);
            self.state_secondary = false;
        }
    }

    fn handle_hold_overlap_early<I, A>(
        &mut self,
        inputs: &mut I,
        now_us: u64,
        timing: &Timing,
        actions: &mut A,
    ) where
        I: ButtonInputs + ?Sized,
        A: Actions + ?Sized,
    {
        let pressed = self.is_pressed(inputs);
        if pressed && !self.state && !self.state_secondary {
            actions.press_set(&self.secondary);
            self.state_secondary = true;
            self.hold_start_us = Some(now_us);
        } else if !pressed && self.state_secondary {
            actions.release_set(&self.secondary);
            if !self.held_past(now_us, timing.hold_overlap_early_us) {
                actions.press_later(&self.primary, timing.pulse_press_ms);
                actions.release_later(&self.primary, timing.pulse_release_ms);
            }
            self.state_secondary = false;
        }
    }

    fn handle_double_press<I, A>(
        &mut self,
        inputs: &mut I,
        now_us: u64,
        timing: &Timing,
        actions: &mut A,
    ) where
        I: ButtonInputs + ?Sized,
        A: Actions + ?Sized,
    {
        let pressed = self.is_pressed(inputs);
        if pressed && !self.state && !self.state_secondary {
            let within_window = self
                .hold_start_us
                .is_some_and(|last| now_us < last + timing.double_press_window_us);
            if within_window {
                actions.press_set(&self.secondary);
                self.state_secondary = true;
            } else {
                actions.press_set(&self.primary);
                self.state = true;
                self.hold_start_us = Some(now_us);
            }
        } else if !pressed {
            if self.state {
                actions.release_set(&self.primary);
                self.state = false;
            }
            if self.state_secondary {
                actions.release_set(&self.secondary);
                self.state_secondary = false;
            }
        }
    }

    fn held_past(&self, now_us: u64, threshold_us: u64) -> bool {
        self.hold_start_us
            .is_some_and(|start| now_us > start + threshold_us)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::actions::mock::{Event, RecordingActions};
    use crate::input::mock::MockInputs;
    use crate::state::HidState;
    use hid_proto::action::*;
    use std::vec::Vec;

    const MS: u64 = 1000;
    const PIN: u8 = 2;

    fn set(code: hid_proto::ActionCode) -> ActionSet {
        ActionSet::single(code)
    }

    struct Rig {
        button: Button,
        inputs: MockInputs,
        actions: RecordingActions,
        timing: Timing,
    }

    impl Rig {
        fn new(mode: ButtonMode) -> Self {
            Self {
                button: Button::new(Source::Pin(PIN), mode, set(KEY_A), set(KEY_B)),
                inputs: MockInputs::default(),
                actions: RecordingActions::default(),
                timing: Timing::new(),
            }
        }

        fn poll(&mut self, pressed: bool, now_us: u64) -> Vec<Event> {
            self.inputs.set(PIN, pressed);
            self.button
                .report(&mut self.inputs, now_us, &self.timing, &mut self.actions);
            self.actions.take()
        }
    }

    #[test]
    fn test_normal_press_release() {
        let mut rig = Rig::new(ButtonMode::Normal);
        assert_eq!(rig.poll(true, 0), [Event::Press(KEY_A)]);
        assert!(rig.poll(true, 100 * MS).is_empty());
        assert_eq!(rig.poll(false, 200 * MS), [Event::Release(KEY_A)]);
    }

    #[test]
    fn test_normal_debounce() {
        let mut rig = Rig::new(ButtonMode::Normal);
        assert_eq!(rig.poll(true, 0), [Event::Press(KEY_A)]);
        // Bounce inside the window is ignored.
        assert!(rig.poll(false, 10 * MS).is_empty());
        assert!(rig.poll(true, 20 * MS).is_empty());
        assert!(rig.poll(false, 49 * MS).is_empty());
        assert!(rig.button.is_primary());
        assert_eq!(rig.poll(false, 50 * MS), [Event::Release(KEY_A)]);
        assert!(rig.poll(true, 60 * MS).is_empty());
        assert_eq!(rig.poll(true, 100 * MS), [Event::Press(KEY_A)]);
    }

    #[test]
    fn test_sticky_latches_primary() {
        let mut rig = Rig::new(ButtonMode::Sticky);
        assert_eq!(
            rig.poll(true, 0),
            [Event::Press(KEY_A), Event::Press(KEY_B)]
        );
        assert_eq!(rig.poll(false, 10 * MS), [Event::Release(KEY_B)]);
        assert!(rig.poll(false, 20 * MS).is_empty());
    }

    #[test]
    fn test_hold_exclusive_short_press_pulses_primary() {
        let mut rig = Rig::new(ButtonMode::HoldExclusive);
        assert!(rig.poll(true, 0).is_empty());
        assert!(rig.poll(true, 150 * MS).is_empty());
        assert_eq!(
            rig.poll(false, 180 * MS),
            [Event::Press(KEY_A), Event::ReleaseLater(set(KEY_A), 100)]
        );
        assert!(rig.poll(false, 200 * MS).is_empty());
    }

    #[test]
    fn test_hold_exclusive_long_press_only_secondary() {
        let mut rig = Rig::new(ButtonMode::HoldExclusive);
        assert!(rig.poll(true, 0).is_empty());
        // Threshold must be strictly exceeded.
        assert!(rig.poll(true, 200 * MS).is_empty());
        assert_eq!(rig.poll(true, 204 * MS), [Event::Press(KEY_B)]);
        assert!(rig.poll(true, 300 * MS).is_empty());
        assert_eq!(rig.poll(false, 400 * MS), [Event::Release(KEY_B)]);
        assert!(!rig.button.is_primary());
        assert!(!rig.button.is_secondary());
    }

    #[test]
    fn test_hold_exclusive_long_threshold() {
        let mut rig = Rig::new(ButtonMode::HoldExclusiveLong);
        assert!(rig.poll(true, 0).is_empty());
        assert!(rig.poll(true, 1_000 * MS).is_empty());
        assert_eq!(rig.poll(true, 2_004 * MS), [Event::Press(KEY_B)]);
    }

    #[test]
    fn test_hold_exclusive_never_both_asserted() {
        let mut rig = Rig::new(ButtonMode::HoldExclusive);
        let mut hid: HidState = HidState::default();
        let timing = Timing::new();
        for (pressed, t) in [(true, 0), (true, 100), (true, 250), (false, 260), (false, 400)] {
            hid.begin_tick(t * MS);
            rig.inputs.set(PIN, pressed);
            rig.button.report(&mut rig.inputs, t * MS, &timing, &mut hid);
            assert!(!(hid.matrix().is_active(KEY_A) && hid.matrix().is_active(KEY_B)));
        }
        assert!(!hid.matrix().is_active(KEY_A));
        assert!(!hid.matrix().is_active(KEY_B));
    }

    #[test]
    fn test_hold_exclusive_pulse_through_state() {
        let mut rig = Rig::new(ButtonMode::HoldExclusive);
        let mut hid: HidState = HidState::default();
        let timing = Timing::new();
        rig.inputs.set(PIN, true);
        rig.button.report(&mut rig.inputs, 0, &timing, &mut hid);
        hid.begin_tick(50 * MS);
        rig.inputs.set(PIN, false);
        rig.button.report(&mut rig.inputs, 50 * MS, &timing, &mut hid);
        assert!(hid.matrix().is_active(KEY_A));
        hid.begin_tick(149 * MS);
        assert!(hid.matrix().is_active(KEY_A));
        hid.begin_tick(150 * MS);
        assert!(!hid.matrix().is_active(KEY_A));
        assert_eq!(hid.matrix().counter(KEY_A), 0);
    }

    #[test]
    fn test_hold_overlap_is_additive() {
        let mut rig = Rig::new(ButtonMode::HoldOverlap);
        assert_eq!(rig.poll(true, 0), [Event::Press(KEY_A)]);
        assert!(rig.poll(true, 250 * MS).is_empty());
        assert_eq!(rig.poll(true, 252 * MS), [Event::Press(KEY_B)]);
        assert!(rig.poll(true, 400 * MS).is_empty());
        assert_eq!(
            rig.poll(false, 500 * MS),
            [Event::Release(KEY_A), Event::Release(KEY_B)]
        );
    }

    #[test]
    fn test_hold_overlap_short_press() {
        let mut rig = Rig::new(ButtonMode::HoldOverlapLong);
        assert_eq!(rig.poll(true, 0), [Event::Press(KEY_A)]);
        assert!(rig.poll(true, 1_000 * MS).is_empty());
        assert_eq!(rig.poll(false, 1_500 * MS), [Event::Release(KEY_A)]);
    }

    #[test]
    fn test_hold_overlap_early() {
        let mut rig = Rig::new(ButtonMode::HoldOverlapEarly);
        assert_eq!(rig.poll(true, 0), [Event::Press(KEY_B)]);
        assert_eq!(
            rig.poll(false, 100 * MS),
            [
                Event::Release(KEY_B),
                Event::PressLater(set(KEY_A), 10),
                Event::ReleaseLater(set(KEY_A), 100),
            ]
        );
        assert_eq!(rig.poll(true, 200 * MS), [Event::Press(KEY_B)]);
        assert_eq!(rig.poll(false, 400 * MS), [Event::Release(KEY_B)]);
    }

    #[test]
    fn test_double_press() {
        let mut rig = Rig::new(ButtonMode::HoldDoublePress);
        assert_eq!(rig.poll(true, 0), [Event::Press(KEY_A)]);
        assert_eq!(rig.poll(false, 50 * MS), [Event::Release(KEY_A)]);
        assert_eq!(rig.poll(true, 200 * MS), [Event::Press(KEY_B)]);
        assert_eq!(rig.poll(false, 250 * MS), [Event::Release(KEY_B)]);
        // Window runs from the last primary press, not the secondary one.
        assert_eq!(rig.poll(true, 350 * MS), [Event::Press(KEY_A)]);
        assert_eq!(rig.poll(false, 360 * MS), [Event::Release(KEY_A)]);
        assert_eq!(rig.poll(true, 700 * MS), [Event::Press(KEY_A)]);
    }

    #[test]
    fn test_virtual_press_is_one_shot() {
        let mut button = Button::normal(Source::Virtual, set(KEY_C));
        let mut inputs = MockInputs::default();
        let mut actions = RecordingActions::default();
        let timing = Timing::new();
        button.virtual_press();
        button.report(&mut inputs, 0, &timing, &mut actions);
        assert_eq!(actions.take(), [Event::Press(KEY_C)]);
        button.report(&mut inputs, 100 * MS, &timing, &mut actions);
        assert_eq!(actions.take(), [Event::Release(KEY_C)]);
    }

    #[test]
    fn test_reset_withdraws_nothing() {
        let mut rig = Rig::new(ButtonMode::Normal);
        let mut hid: HidState = HidState::default();
        rig.inputs.set(PIN, true);
        rig.button.report(&mut rig.inputs, 0, &rig.timing, &mut hid);
        rig.button.reset();
        assert!(!rig.button.is_primary());
        assert!(hid.matrix().is_active(KEY_A));
        // Still held after reset: presses again.
        rig.button.report(&mut rig.inputs, 10 * MS, &rig.timing, &mut hid);
        assert_eq!(hid.matrix().counter(KEY_A), 2);
    }
}
