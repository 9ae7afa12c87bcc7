//! Compile-time defaults and the runtime config structs built from them.
//!
//! All durations are in microseconds unless the name says otherwise.

/// Main loop rate.
pub const TICK_FREQUENCY_HZ: u32 = 250;
pub const TICK_INTERVAL_US: u64 = 1_000_000 / TICK_FREQUENCY_HZ as u64;

pub const PRESS_DEBOUNCE_US: u64 = 50_000;
pub const HOLD_EXCLUSIVE_US: u64 = 200_000;
pub const HOLD_EXCLUSIVE_LONG_US: u64 = 2_000_000;
pub const HOLD_OVERLAP_US: u64 = 250_000;
pub const HOLD_OVERLAP_LONG_US: u64 = 2_000_000;
pub const HOLD_OVERLAP_EARLY_US: u64 = 150_000;
pub const DOUBLE_PRESS_WINDOW_US: u64 = 300_000;
pub const ROTARY_DEBOUNCE_US: u64 = 1_000;

/// Delay before a deferred primary pulse is asserted.
pub const PULSE_PRESS_MS: u32 = 10;
/// Delay before a primary pulse is released.
pub const PULSE_RELEASE_MS: u32 = 100;
/// Delay before a rotary pulse is released.
pub const ROTARY_RELEASE_MS: u32 = 10;
/// Spacing between macro press/release steps.
pub const MACRO_STEP_MS: u32 = 10;

/// Weight of unsynced mouse ticks against unsynced gamepad ticks.
pub const MOUSE_PRIORITY_RATIO: u16 = 8;
pub const SEND_STALL_US: u32 = 250;
pub const PREDICTION_LIMIT: u8 = 4;

/// Capacity of the delayed action pool.
pub const DELAYED_POOL_SIZE: usize = 64;
/// Capacity of the device → host queue.
pub const QUEUE_CAPACITY: usize = 32;

/// Button and rotary timing thresholds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timing {
    pub press_debounce_us: u64,
    pub hold_exclusive_us: u64,
    pub hold_exclusive_long_us: u64,
    pub hold_overlap_us: u64,
    pub hold_overlap_long_us: u64,
    pub hold_overlap_early_us: u64,
    pub double_press_window_us: u64,
    pub rotary_debounce_us: u64,
    pub pulse_press_ms: u32,
    pub pulse_release_ms: u32,
    pub rotary_release_ms: u32,
    pub macro_step_ms: u32,
}

impl Timing {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            press_debounce_us: PRESS_DEBOUNCE_US,
            hold_exclusive_us: HOLD_EXCLUSIVE_US,
            hold_exclusive_long_us: HOLD_EXCLUSIVE_LONG_US,
            hold_overlap_us: HOLD_OVERLAP_US,
            hold_overlap_long_us: HOLD_OVERLAP_LONG_US,
            hold_overlap_early_us: HOLD_OVERLAP_EARLY_US,
            double_press_window_us: DOUBLE_PRESS_WINDOW_US,
            rotary_debounce_us: ROTARY_DEBOUNCE_US,
            pulse_press_ms: PULSE_PRESS_MS,
            pulse_release_ms: PULSE_RELEASE_MS,
            rotary_release_ms: ROTARY_RELEASE_MS,
            macro_step_ms: MACRO_STEP_MS,
        }
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self::new()
    }
}

/// Gamepad report flavour sent for [`ReportKind::Gamepad`](hid_proto::ReportKind).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GamepadProtocol {
    /// Generic HID gamepad (DirectInput style).
    #[default]
    Generic,
    /// Xbox 360 compatible report.
    XInput,
}

/// Transport-side knobs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PipelineConfig {
    pub mouse_priority_ratio: u16,
    pub gamepad_protocol: GamepadProtocol,
    pub send_stall_us: u32,
    pub prediction_limit: u8,
}

impl PipelineConfig {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            mouse_priority_ratio: MOUSE_PRIORITY_RATIO,
            gamepad_protocol: GamepadProtocol::Generic,
            send_stall_us: SEND_STALL_US,
            prediction_limit: PREDICTION_LIMIT,
        }
    }

    #[must_use]
    pub const fn with_protocol(mut self, protocol: GamepadProtocol) -> Self {
        self.gamepad_protocol = protocol;
        self
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new()
    }
}
