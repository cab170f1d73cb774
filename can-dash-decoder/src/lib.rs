//! CAN Dashboard Decoder Library
//!
//! Decodes fixed-format CAN frames into physical values using a static,
//! DBC-style signal table, validates them against their declared ranges, and
//! merges the results into a shared vehicle-state record read by a
//! diagnostics display.
//!
//! # Architecture
//!
//! - `SignalTable` - immutable registry of signal definitions, one per CAN ID
//! - `MessageDecoder` - pure (frame, definition) → value + range flag
//! - `VehicleState` - lock-protected record of the latest value per signal,
//!   the operating mode and the diagnostic-run log
//! - `Dispatcher` - per-frame lookup, decode, state update and log sink hand-off
//! - `ingest::run` - drives a frame source through the dispatcher until it is
//!   exhausted or stopped
//!
//! The library does NOT:
//! - Produce frames (see the simulator in can-dash-cli)
//! - Serve HTTP (the CLI exposes `VehicleState::snapshot` read-only)
//! - Talk to real bus hardware
//!
//! # Example Usage
//!
//! ```
//! use can_dash_decoder::{Dispatcher, Frame, SignalTable, VehicleState};
//! use std::sync::Arc;
//!
//! let table = Arc::new(SignalTable::builtin().unwrap());
//! let state = VehicleState::new();
//! let mut dispatcher = Dispatcher::new(table, state.clone());
//!
//! for frame in [Frame::new(0x104, &[0x02, 0x71]), Frame::new(0x999, &[0x00])] {
//!     let outcome = dispatcher.dispatch(&frame);
//!     println!("{} -> {}", frame, outcome);
//! }
//!
//! let view = state.snapshot();
//! assert!((view.signals.battery_voltage.value - 62.5).abs() < 1e-9);
//! ```

// Public modules
pub mod config;
pub mod dispatcher;
pub mod ingest;
pub mod signals;
pub mod sink;
pub mod state;
pub mod types;

// Re-export main types for convenience
pub use config::IngestConfig;
pub use dispatcher::Dispatcher;
pub use ingest::{IngestStats, StopSignal};
pub use message_decoder::MessageDecoder;
pub use signals::{SignalDefinition, SignalKind, SignalTable, TableStats, MAX_FIELD_BYTES};
pub use sink::{open_file_sink, DecodeRecord, FrameLogSink, NullSink, TextLogSink};
pub use state::{
    OperatingMode, PresentationRecord, SignalReading, SignalReadings, TestRecord, TestStatus,
    VehicleState, VehicleStateView, DIAGNOSTIC_LOG_CAPACITY,
};
pub use types::{DecodeOutcome, DecoderError, DispatchOutcome, Frame, Result, Timestamp};

mod message_decoder;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
