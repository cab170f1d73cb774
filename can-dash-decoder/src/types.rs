//! Core types for the CAN dashboard decoder
//!
//! This module defines the frame representation the engine consumes, the error
//! type of the library, and the outcome values reported for every decode and
//! every dispatched frame. Rejections are outcomes, not errors: a frame that
//! cannot be decoded never aborts the ingest loop.

use crate::signals::SignalKind;
use chrono::{DateTime, Utc};
use std::fmt;

/// Timestamp type used throughout the decoder
pub type Timestamp = DateTime<Utc>;

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, DecoderError>;

/// Maximum payload size of a classic CAN frame
pub const MAX_DLC: u8 = 8;

/// Software representation of a CAN frame.
///
/// `dlc` is the length asserted by the sender; `data` holds the bytes that
/// were actually captured. The two are allowed to disagree, the decoder
/// validates them before extracting anything.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// CAN identifier (standard 11-bit IDs in the built-in table)
    pub can_id: u32,
    /// Data length code as declared by the sender (0-8)
    pub dlc: u8,
    /// Captured payload bytes (up to 8)
    pub data: Vec<u8>,
    /// Generation or reception time
    pub timestamp: Timestamp,
}

impl Frame {
    /// Create a frame whose DLC matches its payload length, stamped with the current time
    pub fn new(can_id: u32, data: &[u8]) -> Self {
        Self {
            can_id,
            dlc: data.len().min(MAX_DLC as usize) as u8,
            data: data.iter().copied().take(MAX_DLC as usize).collect(),
            timestamp: Utc::now(),
        }
    }

    /// Create a frame with an explicit (possibly inconsistent) DLC
    pub fn with_dlc(can_id: u32, dlc: u8, data: &[u8]) -> Self {
        Self {
            can_id,
            dlc,
            data: data.iter().copied().take(MAX_DLC as usize).collect(),
            timestamp: Utc::now(),
        }
    }

    /// Builder method: override the capture time
    pub fn at(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// The declared payload bytes, clipped to what was actually captured
    pub fn declared_data(&self) -> &[u8] {
        let len = (self.dlc as usize).min(self.data.len());
        &self.data[..len]
    }
}

/// Human-readable form: `ID: 0x101 | DLC: 2 | Data: [13 88]`
impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ID: 0x{:03X} | DLC: {} | Data: [", self.can_id, self.dlc)?;
        for (i, byte) in self.declared_data().iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{:02X}", byte)?;
        }
        write!(f, "]")
    }
}

/// Errors that can occur in the decoder library
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    #[error("Duplicate signal definition for CAN ID 0x{0:03X}")]
    DuplicateFrameId(u32),

    #[error("Invalid signal definition: {0}")]
    InvalidSignalDefinition(String),

    #[error("Diagnostic log is full ({capacity} entries), record dropped")]
    DiagnosticLogFull { capacity: usize },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result of decoding one frame against one signal definition
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DecodeOutcome {
    /// Value extracted and scaled; `out_of_range` is a warning, not a rejection
    Decoded {
        raw: u64,
        physical: f64,
        out_of_range: bool,
    },
    /// Declared length differs from the definition's expected length
    DlcMismatch { expected: u8, actual: u8 },
    /// Payload does not hold the bytes the field (or the DLC) requires
    MalformedFrame { required: usize, available: usize },
}

/// Outcome reported by the dispatcher for each inbound frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DispatchOutcome {
    /// Signal decoded and merged into the vehicle state
    Decoded {
        kind: SignalKind,
        value: f64,
        warning: bool,
    },
    /// No definition for this CAN ID; frame ignored
    UnknownId { can_id: u32 },
    /// Declared length mismatch; frame rejected
    DlcMismatch { can_id: u32, expected: u8, actual: u8 },
    /// Payload too short for the field; frame rejected
    MalformedFrame {
        can_id: u32,
        required: usize,
        available: usize,
    },
}

impl DispatchOutcome {
    /// True if the frame was rejected (DLC mismatch or malformed payload)
    pub fn is_rejected(&self) -> bool {
        matches!(
            self,
            DispatchOutcome::DlcMismatch { .. } | DispatchOutcome::MalformedFrame { .. }
        )
    }

    /// True if the frame changed the vehicle state
    pub fn is_decoded(&self) -> bool {
        matches!(self, DispatchOutcome::Decoded { .. })
    }
}

impl fmt::Display for DispatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchOutcome::Decoded { kind, value, warning } => {
                write!(f, "{} = {:.2}", kind, value)?;
                if *warning {
                    write!(f, " (out of range)")?;
                }
                Ok(())
            }
            DispatchOutcome::UnknownId { can_id } => {
                write!(f, "unknown CAN ID 0x{:03X} ignored", can_id)
            }
            DispatchOutcome::DlcMismatch { can_id, expected, actual } => write!(
                f,
                "DLC mismatch for 0x{:03X} (expected {}, got {})",
                can_id, expected, actual
            ),
            DispatchOutcome::MalformedFrame { can_id, required, available } => write!(
                f,
                "malformed frame 0x{:03X} (needs {} bytes, has {})",
                can_id, required, available
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_display() {
        let frame = Frame::new(0x101, &[0x13, 0x88]);
        assert_eq!(format!("{}", frame), "ID: 0x101 | DLC: 2 | Data: [13 88]");

        let empty = Frame::new(0x7FF, &[]);
        assert_eq!(format!("{}", empty), "ID: 0x7FF | DLC: 0 | Data: []");
    }

    #[test]
    fn test_declared_data_is_clipped() {
        // DLC claims more than was captured
        let frame = Frame::with_dlc(0x101, 4, &[0xAA, 0xBB]);
        assert_eq!(frame.declared_data(), &[0xAA, 0xBB]);

        // DLC claims less than was captured
        let frame = Frame::with_dlc(0x101, 1, &[0xAA, 0xBB]);
        assert_eq!(frame.declared_data(), &[0xAA]);
    }

    #[test]
    fn test_payload_is_capped_at_eight_bytes() {
        let frame = Frame::new(0x200, &[0u8; 12]);
        assert_eq!(frame.dlc, 8);
        assert_eq!(frame.data.len(), 8);
    }

    #[test]
    fn test_outcome_classification() {
        let rejected = DispatchOutcome::DlcMismatch { can_id: 0x101, expected: 2, actual: 1 };
        assert!(rejected.is_rejected());
        assert!(!rejected.is_decoded());

        let unknown = DispatchOutcome::UnknownId { can_id: 0x999 };
        assert!(!unknown.is_rejected());

        let decoded = DispatchOutcome::Decoded {
            kind: SignalKind::MotorRpm,
            value: 5000.0,
            warning: false,
        };
        assert!(decoded.is_decoded());
        assert_eq!(format!("{}", decoded), "Motor_RPM = 5000.00");
    }
}
