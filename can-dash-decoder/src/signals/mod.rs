//! Signal table and definitions
//!
//! This module contains the signal kinds, the DBC-style signal definitions and
//! the immutable table the dispatcher looks frames up in.

pub mod builtin;
pub mod database;
pub mod kind;

// Re-export key types for convenience
pub use database::{SignalDefinition, SignalTable, TableStats, MAX_FIELD_BYTES};
pub use kind::SignalKind;
