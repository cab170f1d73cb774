//! Signal table
//!
//! Immutable registry of signal definitions keyed by CAN ID. Built once at
//! start-up, validated on construction, then shared read-only with the
//! dispatcher.

use super::SignalKind;
use crate::types::{DecoderError, Result, MAX_DLC};
use std::collections::{BTreeMap, HashMap};

/// Widest field whose raw value converts to `f64` without rounding (48 bits)
pub const MAX_FIELD_BYTES: u8 = 6;

/// A DBC-style signal definition (one signal per message in this model)
#[derive(Debug, Clone, PartialEq)]
pub struct SignalDefinition {
    /// CAN ID of the owning message (BO_)
    pub can_id: u32,
    /// Message name
    pub message_name: String,
    /// Signal name (SG_)
    pub signal_name: String,
    /// State slot this signal updates
    pub kind: SignalKind,
    /// Expected data length code of the message
    pub expected_dlc: u8,
    /// First payload byte of the field
    pub start_byte: u8,
    /// Field length in whole bytes
    pub byte_length: u8,
    /// Scale factor to convert raw value to physical value
    pub scale: f64,
    /// Offset to add after scaling
    pub offset: f64,
    /// Minimum valid physical value
    pub min: f64,
    /// Maximum valid physical value
    pub max: f64,
    /// Engineering unit (e.g., "km/h", "V")
    pub unit: String,
}

impl SignalDefinition {
    /// Create a definition for a field starting at byte 0 that spans the whole message
    pub fn new(
        can_id: u32,
        message_name: impl Into<String>,
        kind: SignalKind,
        expected_dlc: u8,
    ) -> Self {
        Self {
            can_id,
            message_name: message_name.into(),
            signal_name: kind.signal_name().to_string(),
            kind,
            expected_dlc,
            start_byte: 0,
            byte_length: expected_dlc,
            scale: 1.0,
            offset: 0.0,
            min: f64::MIN,
            max: f64::MAX,
            unit: String::new(),
        }
    }

    /// Builder method: place the field inside the payload
    pub fn with_layout(mut self, start_byte: u8, byte_length: u8) -> Self {
        self.start_byte = start_byte;
        self.byte_length = byte_length;
        self
    }

    /// Builder method: set conversion parameters
    pub fn with_scaling(mut self, scale: f64, offset: f64) -> Self {
        self.scale = scale;
        self.offset = offset;
        self
    }

    /// Builder method: set valid physical range
    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    /// Builder method: set display unit
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    /// One past the last payload byte the field reads
    pub fn end_byte(&self) -> usize {
        self.start_byte as usize + self.byte_length as usize
    }

    /// True if `physical` lies outside `[min, max]`
    pub fn is_out_of_range(&self, physical: f64) -> bool {
        physical < self.min || physical > self.max
    }

    /// Check the layout invariants of a single definition
    fn validate(&self) -> Result<()> {
        if self.expected_dlc > MAX_DLC {
            return Err(DecoderError::InvalidSignalDefinition(format!(
                "{}: expected DLC {} exceeds {}",
                self.signal_name, self.expected_dlc, MAX_DLC
            )));
        }
        if self.byte_length == 0 {
            return Err(DecoderError::InvalidSignalDefinition(format!(
                "{}: field length must be at least one byte",
                self.signal_name
            )));
        }
        if self.byte_length > MAX_FIELD_BYTES {
            return Err(DecoderError::InvalidSignalDefinition(format!(
                "{}: field length {} exceeds {} bytes",
                self.signal_name, self.byte_length, MAX_FIELD_BYTES
            )));
        }
        if self.end_byte() > self.expected_dlc as usize {
            return Err(DecoderError::InvalidSignalDefinition(format!(
                "{}: field bytes {}..{} do not fit a {}-byte message",
                self.signal_name,
                self.start_byte,
                self.end_byte(),
                self.expected_dlc
            )));
        }
        if !(self.scale.is_finite() && self.offset.is_finite()) {
            return Err(DecoderError::InvalidSignalDefinition(format!(
                "{}: scale and offset must be finite",
                self.signal_name
            )));
        }
        if self.min > self.max {
            return Err(DecoderError::InvalidSignalDefinition(format!(
                "{}: minimum {} is above maximum {}",
                self.signal_name, self.min, self.max
            )));
        }
        Ok(())
    }
}

/// The signal table
#[derive(Debug, Clone)]
pub struct SignalTable {
    /// Definitions by CAN ID (one per ID)
    definitions: BTreeMap<u32, SignalDefinition>,

    /// Kind lookup for reverse queries
    by_kind: HashMap<SignalKind, u32>,
}

impl SignalTable {
    /// Build a table, rejecting duplicate CAN IDs, duplicate kinds and bad layouts
    pub fn new(definitions: impl IntoIterator<Item = SignalDefinition>) -> Result<Self> {
        let mut table = Self {
            definitions: BTreeMap::new(),
            by_kind: HashMap::new(),
        };

        for definition in definitions {
            definition.validate()?;

            if table.definitions.contains_key(&definition.can_id) {
                return Err(DecoderError::DuplicateFrameId(definition.can_id));
            }
            if let Some(other) = table.by_kind.get(&definition.kind) {
                return Err(DecoderError::InvalidSignalDefinition(format!(
                    "{} is already defined by CAN ID 0x{:03X}",
                    definition.kind, other
                )));
            }

            log::trace!(
                "Registered signal {} on 0x{:03X}",
                definition.signal_name,
                definition.can_id
            );
            table.by_kind.insert(definition.kind, definition.can_id);
            table.definitions.insert(definition.can_id, definition);
        }

        Ok(table)
    }

    /// The built-in dashboard table
    pub fn builtin() -> Result<Self> {
        Self::new(super::builtin::definitions())
    }

    /// Find the definition for a CAN ID
    pub fn lookup(&self, can_id: u32) -> Option<&SignalDefinition> {
        self.definitions.get(&can_id)
    }

    /// Find the definition that feeds a state slot
    pub fn definition_for(&self, kind: SignalKind) -> Option<&SignalDefinition> {
        self.by_kind
            .get(&kind)
            .and_then(|can_id| self.definitions.get(can_id))
    }

    /// Iterate definitions in CAN ID order
    pub fn iter(&self) -> impl Iterator<Item = &SignalDefinition> {
        self.definitions.values()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Get table statistics
    pub fn stats(&self) -> TableStats {
        TableStats {
            num_messages: self.definitions.len(),
            num_signals: self.by_kind.len(),
        }
    }
}

/// Table statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableStats {
    /// Number of message definitions
    pub num_messages: usize,
    /// Number of signals
    pub num_signals: usize,
}
