//! Message Decoding Engine
//!
//! Extracts a signal value from a CAN frame based on its definition from the
//! signal table. Fields are byte aligned and stored big-endian (most
//! significant byte first); conversion is `raw * scale + offset`.

use crate::signals::SignalDefinition;
use crate::types::{DecodeOutcome, Frame};

/// Message decoder - extracts the signal carried by a frame
pub struct MessageDecoder;

impl MessageDecoder {
    /// Decode a CAN frame against its signal definition
    ///
    /// # Arguments
    /// * `frame` - Inbound CAN frame
    /// * `definition` - Definition looked up for `frame.can_id`
    ///
    /// # Returns
    /// * `DecodeOutcome::Decoded` with the physical value and range flag
    /// * `DecodeOutcome::DlcMismatch` if the declared length is not the expected one
    /// * `DecodeOutcome::MalformedFrame` if the payload is too short for the read
    pub fn decode(frame: &Frame, definition: &SignalDefinition) -> DecodeOutcome {
        if frame.dlc != definition.expected_dlc {
            return DecodeOutcome::DlcMismatch {
                expected: definition.expected_dlc,
                actual: frame.dlc,
            };
        }

        // The sender may declare more bytes than were captured
        let available = frame.data.len();
        let required = definition.end_byte().max(frame.dlc as usize);
        if available < required {
            log::debug!(
                "Signal '{}' requires {} bytes but frame only has {} bytes",
                definition.signal_name,
                required,
                available
            );
            return DecodeOutcome::MalformedFrame { required, available };
        }

        let raw = match Self::extract_big_endian(
            &frame.data,
            definition.start_byte as usize,
            definition.byte_length as usize,
        ) {
            Some(raw) => raw,
            None => {
                return DecodeOutcome::MalformedFrame {
                    required: definition.end_byte(),
                    available,
                }
            }
        };

        let physical = Self::to_physical(raw, definition);

        DecodeOutcome::Decoded {
            raw,
            physical,
            out_of_range: definition.is_out_of_range(physical),
        }
    }

    /// Apply physical value conversion (scale and offset)
    pub fn to_physical(raw: u64, definition: &SignalDefinition) -> f64 {
        raw as f64 * definition.scale + definition.offset
    }

    /// Extract a byte-aligned unsigned field, most significant byte first
    ///
    /// Each byte shifts the accumulator left by 8 bits before being OR-ed in.
    /// Returns `None` if the field runs past the end of `data` or is wider
    /// than 8 bytes.
    fn extract_big_endian(data: &[u8], start_byte: usize, byte_length: usize) -> Option<u64> {
        if byte_length > 8 {
            return None;
        }
        let bytes = data.get(start_byte..start_byte.checked_add(byte_length)?)?;

        Some(
            bytes
                .iter()
                .fold(0u64, |acc, &byte| (acc << 8) | byte as u64),
        )
    }
}
