//! Frame dispatcher
//!
//! The dispatcher is the entry point of the engine. For every inbound frame it:
//! 1. Looks up the signal definition for the CAN ID
//! 2. Decodes the frame with `MessageDecoder`
//! 3. Merges the value and warning flag into the vehicle state
//! 4. Hands the decode event to the log sink
//!
//! Rejected frames (unknown ID, DLC mismatch, malformed payload) never touch
//! the vehicle state. Each frame is processed on its own; nothing is carried
//! over between frames.

use crate::message_decoder::MessageDecoder;
use crate::signals::SignalTable;
use crate::sink::{DecodeRecord, FrameLogSink, NullSink};
use crate::state::VehicleState;
use crate::types::{DecodeOutcome, DispatchOutcome, Frame};
use std::sync::Arc;

/// Routes frames from the producer into the vehicle state
pub struct Dispatcher {
    /// Immutable signal table
    table: Arc<SignalTable>,
    /// Shared vehicle record (written only from here)
    state: VehicleState,
    /// Decode event recorder
    sink: Box<dyn FrameLogSink>,
}

impl Dispatcher {
    /// Create a dispatcher that does not record decode events
    pub fn new(table: Arc<SignalTable>, state: VehicleState) -> Self {
        Self::with_sink(table, state, Box::new(NullSink))
    }

    /// Create a dispatcher with a decode event sink
    ///
    /// # Example
    /// ```
    /// use can_dash_decoder::{Dispatcher, DispatchOutcome, Frame, SignalTable, VehicleState};
    /// use std::sync::Arc;
    ///
    /// let table = Arc::new(SignalTable::builtin().unwrap());
    /// let state = VehicleState::new();
    /// let mut dispatcher = Dispatcher::new(table, state.clone());
    ///
    /// let outcome = dispatcher.dispatch(&Frame::new(0x101, &[0x13, 0x88]));
    /// assert!(matches!(outcome, DispatchOutcome::Decoded { .. }));
    /// assert_eq!(state.snapshot().signals.motor_rpm.value, 5000.0);
    /// ```
    pub fn with_sink(
        table: Arc<SignalTable>,
        state: VehicleState,
        sink: Box<dyn FrameLogSink>,
    ) -> Self {
        Self { table, state, sink }
    }

    /// Process one frame and report what happened to it
    pub fn dispatch(&mut self, frame: &Frame) -> DispatchOutcome {
        let can_id = frame.can_id;

        let definition = match self.table.lookup(can_id) {
            Some(definition) => definition,
            None => {
                log::info!("Unknown CAN ID 0x{:03X} ignored", can_id);
                return DispatchOutcome::UnknownId { can_id };
            }
        };

        match MessageDecoder::decode(frame, definition) {
            DecodeOutcome::DlcMismatch { expected, actual } => {
                log::error!(
                    "DLC mismatch for {} (expected {}, got {})",
                    definition.message_name,
                    expected,
                    actual
                );
                DispatchOutcome::DlcMismatch { can_id, expected, actual }
            }
            DecodeOutcome::MalformedFrame { required, available } => {
                log::error!(
                    "Malformed frame for {}: field needs {} bytes, payload has {}",
                    definition.message_name,
                    required,
                    available
                );
                DispatchOutcome::MalformedFrame { can_id, required, available }
            }
            DecodeOutcome::Decoded { raw, physical, out_of_range } => {
                if out_of_range {
                    log::warn!(
                        "{} out of range ({:.2} {})",
                        definition.signal_name,
                        physical,
                        definition.unit
                    );
                }
                log::debug!(
                    "Decoded | {} = {:.2} {} (raw {})",
                    definition.signal_name,
                    physical,
                    definition.unit,
                    raw
                );

                self.state.apply(definition.kind, physical, out_of_range);

                self.sink.record(&DecodeRecord {
                    frame,
                    signal_name: &definition.signal_name,
                    value: physical,
                    unit: &definition.unit,
                    warning: out_of_range,
                });

                DispatchOutcome::Decoded {
                    kind: definition.kind,
                    value: physical,
                    warning: out_of_range,
                }
            }
        }
    }

    /// Handle to the vehicle state this dispatcher writes
    pub fn state(&self) -> &VehicleState {
        &self.state
    }

    /// The signal table frames are looked up in
    pub fn table(&self) -> &SignalTable {
        &self.table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::SignalKind;
    use crate::state::SignalReading;
    use std::sync::Mutex;

    /// Sink that remembers what it was given
    #[derive(Clone, Default)]
    struct RecordingSink(Arc<Mutex<Vec<(u32, String, f64, bool)>>>);

    impl FrameLogSink for RecordingSink {
        fn record(&mut self, record: &DecodeRecord<'_>) {
            self.0.lock().unwrap().push((
                record.frame.can_id,
                record.signal_name.to_string(),
                record.value,
                record.warning,
            ));
        }
    }

    fn dispatcher() -> (Dispatcher, VehicleState, RecordingSink) {
        let table = Arc::new(SignalTable::builtin().unwrap());
        let state = VehicleState::new();
        let sink = RecordingSink::default();
        let dispatcher = Dispatcher::with_sink(table, state.clone(), Box::new(sink.clone()));
        (dispatcher, state, sink)
    }

    #[test]
    fn test_decoded_frame_updates_state_and_sink() {
        let (mut dispatcher, state, sink) = dispatcher();

        let outcome = dispatcher.dispatch(&Frame::new(0x101, &[0x13, 0x88]));
        assert_eq!(
            outcome,
            DispatchOutcome::Decoded {
                kind: SignalKind::MotorRpm,
                value: 5000.0,
                warning: false
            }
        );
        assert_eq!(
            state.snapshot().signals.motor_rpm,
            SignalReading { value: 5000.0, warning: false }
        );

        let records = sink.0.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0], (0x101, "Motor_RPM".to_string(), 5000.0, false));
    }

    #[test]
    fn test_out_of_range_value_is_stored_with_warning() {
        let (mut dispatcher, state, sink) = dispatcher();

        let outcome = dispatcher.dispatch(&Frame::new(0x103, &[0xFF]));
        assert_eq!(
            outcome,
            DispatchOutcome::Decoded {
                kind: SignalKind::BatterySoc,
                value: 255.0,
                warning: true
            }
        );
        assert_eq!(
            state.snapshot().signals.battery_soc,
            SignalReading { value: 255.0, warning: true }
        );
        assert!(sink.0.lock().unwrap()[0].3);
    }

    #[test]
    fn test_rejected_frames_leave_state_and_sink_untouched() {
        let (mut dispatcher, state, sink) = dispatcher();
        dispatcher.dispatch(&Frame::new(0x102, &[0x03, 0xE8]));
        let before = state.snapshot();

        let unknown = dispatcher.dispatch(&Frame::new(0x999, &[0xAA, 0xBB]));
        assert_eq!(unknown, DispatchOutcome::UnknownId { can_id: 0x999 });

        let wrong_dlc = dispatcher.dispatch(&Frame::new(0x101, &[0x10]));
        assert_eq!(
            wrong_dlc,
            DispatchOutcome::DlcMismatch { can_id: 0x101, expected: 2, actual: 1 }
        );

        let truncated = dispatcher.dispatch(&Frame::with_dlc(0x104, 2, &[0x02]));
        assert_eq!(
            truncated,
            DispatchOutcome::MalformedFrame { can_id: 0x104, required: 2, available: 1 }
        );

        assert_eq!(state.snapshot(), before);
        assert_eq!(sink.0.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_latest_value_wins() {
        let (mut dispatcher, state, _sink) = dispatcher();
        dispatcher.dispatch(&Frame::new(0x105, &[0xC8]));
        dispatcher.dispatch(&Frame::new(0x105, &[0x32]));

        assert_eq!(
            state.snapshot().signals.motor_temperature,
            SignalReading { value: 50.0, warning: false }
        );
    }
}
