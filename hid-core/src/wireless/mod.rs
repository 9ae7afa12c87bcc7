//! Wireless Queue Pipeline.
//!
//! The device context serializes unsynced reports into a bounded queue;
//! the host context drains it, coalesces, predicts and sends. Only
//! [`QueueEntry`](hid_proto::QueueEntry) values cross between the two, so
//! the device-side action state needs no locking.
//!
//! ```text
//! device tick                        host tick
//! ┌──────────────────┐  QueueEntry   ┌────────────────────┐
//! │ WirelessProducer │ ────────────▶ │ WirelessConsumer   │ ──▶ Transport
//! │  (HidState)      │  bounded,     │  coalesce, predict │
//! └──────────────────┘  droppable    └────────────────────┘
//! ```

pub mod consumer;
pub mod producer;
pub mod queue;

pub use consumer::{ConsumeStats, WirelessConsumer};
pub use producer::WirelessProducer;
pub use queue::{QueueFull, ReportConsumer, ReportProducer};
