//! Platform-agnostic input-action to HID report pipeline.
//!
//! Physical inputs (buttons, a rotary encoder, analog axes) are turned into
//! action codes; the pipeline keeps a reference count per code and composes
//! keyboard, mouse and gamepad reports from them. This crate has no
//! platform dependencies and runs both on the controller and on host for
//! testing.
//!
//! # Overview
//!
//! - [`matrix`]: reference-counted action state and dirty flags ([`ActionMatrix`])
//! - [`button`]: per-button mode state machines ([`Button`], [`ButtonMode`])
//! - [`rotary`]: encoder increments to action pulses ([`RotaryReducer`])
//! - [`delayed`]: timer pool for delayed actions and macros ([`DelayedActions`])
//! - [`compose`]: report composition from the matrix ([`Composer`])
//! - [`state`]: device-context state tying the above together ([`HidState`])
//! - [`wired`]: one-report-per-tick arbitration ([`WiredScheduler`])
//! - [`wireless`]: producer/consumer queue pipeline with motion prediction
//! - [`input`] / [`output`]: hardware seams ([`ButtonInputs`], [`Transport`])
//!
//! # Tick
//!
//! ```text
//! buttons ─┐
//! rotary  ─┼─▶ HidState ─▶ WiredScheduler ──────────────────────▶ USB
//! analog  ─┘     (matrix)  └▶ WirelessProducer ─▶ queue ─▶ WirelessConsumer ─▶ radio
//! ```
//!
//! # Example
//!
//! ```rust
//! use hid_core::{Actions, HidState, GamepadProtocol};
//! use hid_proto::{action::KEY_A, Report, ReportKind};
//!
//! let mut hid: HidState = HidState::default();
//! hid.press(KEY_A);
//! hid.press(KEY_A);
//! hid.release(KEY_A);
//! // Still held by one source.
//! if let Report::Keyboard(report) = hid.compose(ReportKind::Keyboard, GamepadProtocol::Generic) {
//!     assert_eq!(report.keycodes[0], KEY_A.raw());
//! }
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting and logging (for embedded targets)
//! - **`log`**: Log through the `log` facade instead
//!
//! # No-std Support
//!
//! This crate is `#![no_std]` by default and uses no heap allocations.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

// This must go first so the logging macros are visible to every module.
mod fmt;

pub mod actions;
pub mod button;
pub mod compose;
pub mod config;
pub mod delayed;
pub mod input;
pub mod matrix;
pub mod output;
pub mod rotary;
pub mod state;
pub mod wired;
pub mod wireless;

// Re-export main types at crate root
pub use actions::{ActionSet, Actions, CapacityError, MacroSequence};
pub use button::{Button, ButtonMode};
pub use compose::{Axis, Composer};
pub use config::{GamepadProtocol, PipelineConfig, Timing};
pub use delayed::{DelayedAction, DelayedActions, MacroError, PoolExhausted};
pub use input::{ButtonInputs, Direction, Source};
pub use matrix::{ActionMatrix, ProcedureEvent};
pub use output::{OutputError, Transport};
pub use rotary::RotaryReducer;
pub use state::{HidState, ProcedureHandler};
pub use wired::{LinkState, WiredScheduler};
pub use wireless::{QueueFull, ReportConsumer, ReportProducer, WirelessConsumer, WirelessProducer};
