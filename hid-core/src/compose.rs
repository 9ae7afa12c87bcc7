//! Report Composer: builds wire reports from matrix state.
//!
//! | Kind     | Source                                                       |
//! |----------|--------------------------------------------------------------|
//! | Keyboard | modifier bits 120..=127, first six active keys 1..=115       |
//! | Mouse    | buttons 1-5, accumulated motion, scroll up minus scroll down |
//! | Gamepad  | fixed-order button mask, six axes from accumulators or codes |
//!
//! Analog inputs arrive as [`I16F16`] values in `[-1, 1]` (`[0, 1]` for
//! triggers). Several sources may drive the same axis in one tick; their
//! values add up and the sum is clamped at compose time.

use crate::config::GamepadProtocol;
use crate::matrix::ActionMatrix;
use fixed::types::I16F16;
use hid_proto::action::{self, KEY_MAX, MODIFIER_INDEX, MOUSE_INDEX};
use hid_proto::{
    ActionCode, GamepadReport, KeyboardReport, MouseReport, Report, ReportKind, XInputReport,
};

/// Full-scale signed axis value on the wire.
const AXIS_MAX: i16 = 32767;
/// Full-scale XInput trigger value.
const TRIGGER_MAX: u8 = 255;

/// Generic gamepad button bits, lowest first. Common buttons sit on low bits
/// so games list them first.
const GAMEPAD_BUTTONS: [ActionCode; 15] = [
    action::GAMEPAD_A,
    action::GAMEPAD_B,
    action::GAMEPAD_X,
    action::GAMEPAD_Y,
    action::GAMEPAD_L1,
    action::GAMEPAD_R1,
    action::GAMEPAD_L3,
    action::GAMEPAD_R3,
    action::GAMEPAD_LEFT,
    action::GAMEPAD_RIGHT,
    action::GAMEPAD_UP,
    action::GAMEPAD_DOWN,
    action::GAMEPAD_SELECT,
    action::GAMEPAD_START,
    action::GAMEPAD_HOME,
];

/// Gamepad analog axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Axis {
    Lx = 0,
    Ly = 1,
    /// Left trigger.
    Lz = 2,
    Rx = 3,
    Ry = 4,
    /// Right trigger.
    Rz = 5,
}

impl Axis {
    pub const COUNT: usize = 6;
    pub const ALL: [Self; Self::COUNT] =
        [Self::Lx, Self::Ly, Self::Lz, Self::Rx, Self::Ry, Self::Rz];

    #[inline]
    #[must_use]
    pub const fn is_trigger(self) -> bool {
        matches!(self, Self::Lz | Self::Rz)
    }

    /// Positive code and, for sticks, the negative code that drive this axis.
    #[must_use]
    pub const fn codes(self) -> (ActionCode, Option<ActionCode>) {
        match self {
            Self::Lx => (action::GAMEPAD_AXIS_LX, Some(action::GAMEPAD_AXIS_LX_NEG)),
            Self::Ly => (action::GAMEPAD_AXIS_LY, Some(action::GAMEPAD_AXIS_LY_NEG)),
            Self::Lz => (action::GAMEPAD_AXIS_LZ, None),
            Self::Rx => (action::GAMEPAD_AXIS_RX, Some(action::GAMEPAD_AXIS_RX_NEG)),
            Self::Ry => (action::GAMEPAD_AXIS_RY, Some(action::GAMEPAD_AXIS_RY_NEG)),
            Self::Rz => (action::GAMEPAD_AXIS_RZ, None),
        }
    }
}

/// Analog accumulators and the report builders that read them.
#[derive(Debug, Default)]
pub struct Composer {
    mouse_x: i16,
    mouse_y: i16,
    axes: [I16F16; Axis::COUNT],
    /// Last committed gamepad report carried analog input.
    analog_reported: bool,
}

impl Composer {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            mouse_x: 0,
            mouse_y: 0,
            axes: [I16F16::ZERO; Axis::COUNT],
            analog_reported: false,
        }
    }

    /// Add relative mouse motion. Cleared once a mouse report is committed.
    pub fn mouse_move(&mut self, x: i16, y: i16) {
        self.mouse_x = self.mouse_x.saturating_add(x);
        self.mouse_y = self.mouse_y.saturating_add(y);
    }

    /// Add `value` to an axis accumulator.
    ///
    /// Returns true when the gamepad report must be resent: the input moved
    /// the axis, or the previous report still shows analog input that has
    /// since returned to rest.
    pub fn gamepad_axis(&mut self, axis: Axis, value: I16F16) -> bool {
        let slot = &mut self.axes[axis as usize];
        *slot = slot.saturating_add(value);
        value != I16F16::ZERO || self.analog_reported
    }

    /// Zero the gamepad accumulators. Runs every tick, sent or not.
    pub fn reset_analog(&mut self) {
        self.axes = [I16F16::ZERO; Axis::COUNT];
    }

    /// Compose the current report for `kind`. Nothing is consumed until
    /// the report is passed to [`commit`](Self::commit).
    #[must_use]
    pub fn compose(
        &self,
        kind: ReportKind,
        protocol: GamepadProtocol,
        matrix: &ActionMatrix,
    ) -> Report {
        match kind {
            ReportKind::Keyboard => Report::Keyboard(self.keyboard(matrix)),
            ReportKind::Mouse => Report::Mouse(self.mouse(matrix)),
            ReportKind::Gamepad => match protocol {
                GamepadProtocol::Generic => Report::Gamepad(self.gamepad(matrix)),
                GamepadProtocol::XInput => Report::XInput(self.xinput(matrix)),
            },
        }
    }

    /// Keyboard report. Keys past the sixth are dropped.
    #[must_use]
    pub fn keyboard(&self, matrix: &ActionMatrix) -> KeyboardReport {
        let mut report = KeyboardReport::default();
        let active = (1..=KEY_MAX).filter(|&code| matrix.is_active(ActionCode(code)));
        for (slot, code) in report.keycodes.iter_mut().zip(active) {
            *slot = code;
        }
        for bit in 0..8 {
            if matrix.is_active(ActionCode(MODIFIER_INDEX + bit)) {
                report.modifier |= 1 << bit;
            }
        }
        report
    }

    /// A composed report reached the transport.
    ///
    /// Consumes the motion and scroll a mouse report carried and records
    /// whether a gamepad report showed analog input.
    pub fn commit(&mut self, report: &Report, matrix: &mut ActionMatrix) {
        match report {
            Report::Mouse(mouse) => {
                self.mouse_x = self.mouse_x.saturating_sub(mouse.x);
                self.mouse_y = self.mouse_y.saturating_sub(mouse.y);
                matrix.consume(action::MOUSE_SCROLL_UP);
                matrix.consume(action::MOUSE_SCROLL_DOWN);
            }
            Report::Gamepad(_) | Report::XInput(_) => {
                self.analog_reported = self.axes.iter().any(|v| *v != I16F16::ZERO);
            }
            Report::Keyboard(_) => {}
        }
    }

    /// Mouse report with the motion and scroll accumulated so far.
    #[must_use]
    pub fn mouse(&self, matrix: &ActionMatrix) -> MouseReport {
        let mut buttons = 0u8;
        for bit in 0..5 {
            if matrix.is_active(ActionCode(MOUSE_INDEX + bit)) {
                buttons |= 1 << bit;
            }
        }
        let up = matrix.counter(action::MOUSE_SCROLL_UP);
        let down = matrix.counter(action::MOUSE_SCROLL_DOWN);
        let scroll = up
            .saturating_sub(down)
            .clamp(i16::from(i8::MIN), i16::from(i8::MAX)) as i8;
        MouseReport {
            buttons,
            x: self.mouse_x,
            y: self.mouse_y,
            scroll,
            pan: 0,
        }
    }

    /// Generic HID gamepad report.
    #[must_use]
    pub fn gamepad(&self, matrix: &ActionMatrix) -> GamepadReport {
        let mut buttons = 0u32;
        for (bit, &code) in GAMEPAD_BUTTONS.iter().enumerate() {
            if matrix.is_active(code) {
                buttons |= 1 << bit;
            }
        }
        GamepadReport {
            lx: scale(self.axis(matrix, Axis::Lx)),
            ly: scale(self.axis(matrix, Axis::Ly)),
            rx: scale(self.axis(matrix, Axis::Rx)),
            ry: scale(self.axis(matrix, Axis::Ry)),
            // Triggers are declared unsigned by the descriptor but carried in
            // a signed field, so 0..1 is shifted onto -1..1.
            lz: scale(sign_shift(self.axis(matrix, Axis::Lz))),
            rz: scale(sign_shift(self.axis(matrix, Axis::Rz))),
            buttons,
        }
    }

    /// XInput report. Y axes are inverted relative to the generic report.
    #[must_use]
    pub fn xinput(&self, matrix: &ActionMatrix) -> XInputReport {
        let byte = |offset: u8| {
            (0..8).fold(0u8, |bits, bit| {
                let code = ActionCode(action::GAMEPAD_INDEX + offset + bit);
                bits | (u8::from(matrix.is_active(code)) << bit)
            })
        };
        XInputReport {
            buttons_0: byte(0),
            buttons_1: byte(8),
            lz: trigger(self.axis(matrix, Axis::Lz)),
            rz: trigger(self.axis(matrix, Axis::Rz)),
            lx: scale(self.axis(matrix, Axis::Lx)),
            ly: scale(self.axis(matrix, Axis::Ly)).saturating_neg(),
            rx: scale(self.axis(matrix, Axis::Rx)),
            ry: scale(self.axis(matrix, Axis::Ry)).saturating_neg(),
        }
    }

    /// Resolve one axis: an active negative code wins, then an active
    /// positive code, then the clamped accumulator.
    #[must_use]
    pub fn axis(&self, matrix: &ActionMatrix, axis: Axis) -> I16F16 {
        let (pos, neg) = axis.codes();
        let value = self.axes[axis as usize];
        match neg {
            Some(neg) if matrix.is_active(neg) => I16F16::NEG_ONE,
            _ if matrix.is_active(pos) => I16F16::ONE,
            Some(_) => value.clamp(I16F16::NEG_ONE, I16F16::ONE),
            None => value.saturating_abs().clamp(I16F16::ZERO, I16F16::ONE),
        }
    }
}

/// Map `[-1, 1]` onto `[-32767, 32767]`, truncating toward zero.
fn scale(value: I16F16) -> i16 {
    value
        .saturating_mul_int(i32::from(AXIS_MAX))
        .round_to_zero()
        .saturating_to_num::<i16>()
}

/// Map a trigger in `[0, 1]` onto `[-1, 1]`.
fn sign_shift(value: I16F16) -> I16F16 {
    value.saturating_mul_int(2).saturating_sub(I16F16::ONE)
}

/// Map a trigger in `[0, 1]` onto `[0, 255]`.
fn trigger(value: I16F16) -> u8 {
    value
        .saturating_mul_int(i32::from(TRIGGER_MAX))
        .saturating_to_num::<u8>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixed_macro::fixed;
    use hid_proto::action::*;

    const HALF: I16F16 = fixed!(0.5: I16F16);

    #[test]
    fn test_keyboard_truncates_to_six_ascending() {
        let mut matrix = ActionMatrix::new();
        let keys = [KEY_Z, KEY_A, KEY_E, KEY_C, KEY_1, KEY_B, KEY_D];
        for &key in &keys {
            matrix.assert(key);
        }
        matrix.assert(KEY_LEFT_SHIFT);
        matrix.assert(KEY_RIGHT_ALT);

        let report = Composer::new().keyboard(&matrix);
        assert_eq!(
            report.keycodes,
            [
                KEY_A.raw(),
                KEY_B.raw(),
                KEY_C.raw(),
                KEY_D.raw(),
                KEY_E.raw(),
                KEY_Z.raw()
            ]
        );
        assert_eq!(report.modifier, 0b0100_0010);
    }

    #[test]
    fn test_keyboard_empty() {
        let matrix = ActionMatrix::new();
        assert!(Composer::new().keyboard(&matrix).is_empty());
    }

    #[test]
    fn test_mouse_buttons_motion_and_scroll() {
        let mut matrix = ActionMatrix::new();
        let mut composer = Composer::new();
        matrix.assert(MOUSE_1);
        matrix.assert(MOUSE_5);
        matrix.assert(MOUSE_SCROLL_UP);
        matrix.assert(MOUSE_SCROLL_UP);
        matrix.assert(MOUSE_SCROLL_UP);
        matrix.assert(MOUSE_SCROLL_DOWN);
        composer.mouse_move(5, -3);
        composer.mouse_move(2, 1);

        let report = composer.mouse(&matrix);
        assert_eq!(report.buttons, 0b1_0001);
        assert_eq!((report.x, report.y), (7, -2));
        assert_eq!(report.scroll, 2);
        assert_eq!(report.pan, 0);

        // Composing again without a commit reports the same motion.
        assert_eq!(composer.mouse(&matrix), report);

        // Once committed, motion and scroll are gone and buttons persist.
        composer.commit(&Report::Mouse(report), &mut matrix);
        let report = composer.mouse(&matrix);
        assert_eq!(report.buttons, 0b1_0001);
        assert_eq!((report.x, report.y, report.scroll), (0, 0, 0));
    }

    #[test]
    fn test_commit_keeps_motion_added_after_compose() {
        let mut matrix = ActionMatrix::new();
        let mut composer = Composer::new();
        composer.mouse_move(4, 1);
        let report = composer.mouse(&matrix);
        composer.mouse_move(3, 0);
        composer.commit(&Report::Mouse(report), &mut matrix);
        let report = composer.mouse(&matrix);
        assert_eq!((report.x, report.y), (3, 0));
    }

    #[test]
    fn test_axis_scaling() {
        let mut matrix = ActionMatrix::new();
        let mut composer = Composer::new();
        composer.gamepad_axis(Axis::Lx, I16F16::ONE);
        composer.gamepad_axis(Axis::Rx, I16F16::NEG_ONE);
        matrix.assert(GAMEPAD_AXIS_RY_NEG);

        let report = composer.gamepad(&matrix);
        assert_eq!(report.lx, 32767);
        assert_eq!(report.rx, -32767);
        assert_eq!(report.ry, -32767);
        assert_eq!(report.ly, 0);
        // Released triggers sit at the bottom of the shifted range.
        assert_eq!(report.lz, -32767);
        assert_eq!(report.rz, -32767);
    }

    #[test]
    fn test_axis_scaling_truncates_toward_zero() {
        let matrix = ActionMatrix::new();
        let mut composer = Composer::new();
        composer.gamepad_axis(Axis::Lx, -HALF);
        composer.gamepad_axis(Axis::Ly, HALF);
        let report = composer.gamepad(&matrix);
        assert_eq!(report.lx, -16383);
        assert_eq!(report.ly, 16383);
    }

    #[test]
    fn test_axis_priority_and_clamp() {
        let mut matrix = ActionMatrix::new();
        let mut composer = Composer::new();
        composer.gamepad_axis(Axis::Lx, HALF);
        composer.gamepad_axis(Axis::Lx, HALF);
        composer.gamepad_axis(Axis::Lx, HALF);
        assert_eq!(composer.axis(&matrix, Axis::Lx), I16F16::ONE);

        matrix.assert(GAMEPAD_AXIS_LX);
        matrix.assert(GAMEPAD_AXIS_LX_NEG);
        assert_eq!(composer.axis(&matrix, Axis::Lx), I16F16::NEG_ONE);
        matrix.withdraw(GAMEPAD_AXIS_LX_NEG);
        composer.reset_analog();
        assert_eq!(composer.axis(&matrix, Axis::Lx), I16F16::ONE);
    }

    #[test]
    fn test_trigger_uses_magnitude() {
        let matrix = ActionMatrix::new();
        let mut composer = Composer::new();
        composer.gamepad_axis(Axis::Lz, -HALF);
        assert_eq!(composer.axis(&matrix, Axis::Lz), HALF);
        composer.gamepad_axis(Axis::Rz, I16F16::ONE);
        let report = composer.gamepad(&matrix);
        assert_eq!(report.lz, 0);
        assert_eq!(report.rz, 32767);
    }

    #[test]
    fn test_gamepad_button_order() {
        let mut matrix = ActionMatrix::new();
        let composer = Composer::new();
        matrix.assert(GAMEPAD_A);
        matrix.assert(GAMEPAD_DOWN);
        matrix.assert(GAMEPAD_HOME);
        assert_eq!(composer.gamepad(&matrix).buttons, 1 | (1 << 11) | (1 << 14));
    }

    #[test]
    fn test_xinput_layout() {
        let mut matrix = ActionMatrix::new();
        let mut composer = Composer::new();
        matrix.assert(GAMEPAD_UP);
        matrix.assert(GAMEPAD_R3);
        matrix.assert(GAMEPAD_A);
        matrix.assert(GAMEPAD_AXIS_RZ);
        composer.gamepad_axis(Axis::Ly, I16F16::ONE);

        let report = composer.xinput(&matrix);
        assert_eq!(report.buttons_0, 0b1000_0001);
        assert_eq!(report.buttons_1, 0b0001_0000);
        assert_eq!(report.lz, 0);
        assert_eq!(report.rz, 255);
        assert_eq!(report.ly, -32767);
        assert_eq!(report.lx, 0);
    }

    #[test]
    fn test_compose_follows_protocol() {
        let matrix = ActionMatrix::new();
        let composer = Composer::new();
        let report = composer.compose(ReportKind::Gamepad, GamepadProtocol::XInput, &matrix);
        assert_eq!(report.kind(), ReportKind::Gamepad);
        assert!(matches!(report, Report::XInput(_)));
        let report = composer.compose(ReportKind::Gamepad, GamepadProtocol::Generic, &matrix);
        assert!(matches!(report, Report::Gamepad(_)));
    }

    #[test]
    fn test_axis_return_to_rest_needs_resend() {
        let mut matrix = ActionMatrix::new();
        let mut composer = Composer::new();
        assert!(!composer.gamepad_axis(Axis::Lx, I16F16::ZERO));
        assert!(composer.gamepad_axis(Axis::Lx, HALF));
        let report = Report::Gamepad(composer.gamepad(&matrix));
        composer.commit(&report, &mut matrix);
        composer.reset_analog();
        // Stick back at rest: the neutral report still has to go out once.
        assert!(composer.gamepad_axis(Axis::Lx, I16F16::ZERO));
        let report = Report::Gamepad(composer.gamepad(&matrix));
        composer.commit(&report, &mut matrix);
        composer.reset_analog();
        assert!(!composer.gamepad_axis(Axis::Lx, I16F16::ZERO));
    }
}
