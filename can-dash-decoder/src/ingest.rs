//! Ingest loop
//!
//! Pulls frames from a producer one at a time and dispatches them
//! synchronously. The loop ends when the producer is exhausted, the frame
//! limit is reached, or the stop signal is raised.

use crate::config::IngestConfig;
use crate::dispatcher::Dispatcher;
use crate::types::{DispatchOutcome, Frame};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

/// Cooperative stop flag shared between the ingest loop and its controller
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the loop to stop after the current frame
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Per-outcome frame counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub frames: usize,
    pub decoded: usize,
    /// Decoded frames whose value was out of range
    pub warnings: usize,
    pub unknown_ids: usize,
    pub dlc_mismatches: usize,
    pub malformed: usize,
    /// Frames skipped by the message filter
    pub filtered: usize,
}

impl IngestStats {
    fn count(&mut self, outcome: &DispatchOutcome) {
        match outcome {
            DispatchOutcome::Decoded { warning, .. } => {
                self.decoded += 1;
                if *warning {
                    self.warnings += 1;
                }
            }
            DispatchOutcome::UnknownId { .. } => self.unknown_ids += 1,
            DispatchOutcome::DlcMismatch { .. } => self.dlc_mismatches += 1,
            DispatchOutcome::MalformedFrame { .. } => self.malformed += 1,
        }
    }
}

/// Drive `frames` through the dispatcher until done or stopped
///
/// `on_outcome` sees every dispatched frame with its outcome (console
/// reporting in the CLI). Frames removed by the message filter are counted
/// but not dispatched.
pub fn run<I, F>(
    dispatcher: &mut Dispatcher,
    frames: I,
    config: &IngestConfig,
    stop: &StopSignal,
    mut on_outcome: F,
) -> IngestStats
where
    I: IntoIterator<Item = Frame>,
    F: FnMut(&Frame, &DispatchOutcome),
{
    let mut stats = IngestStats::default();
    let interval = config.frame_interval();

    for frame in frames {
        if stop.is_stopped() {
            log::info!("Stop requested, ingest loop exiting");
            break;
        }
        if config.limit_reached(stats.frames) {
            log::info!("Frame limit of {} reached", stats.frames);
            break;
        }

        stats.frames += 1;

        if !config.should_process_message(frame.can_id) {
            log::trace!("Frame 0x{:03X} filtered out", frame.can_id);
            stats.filtered += 1;
            continue;
        }

        let outcome = dispatcher.dispatch(&frame);
        stats.count(&outcome);
        on_outcome(&frame, &outcome);

        if let Some(delay) = interval {
            thread::sleep(delay);
        }
    }

    log::debug!("Ingest finished: {:?}", stats);
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::SignalTable;
    use crate::state::VehicleState;

    fn dispatcher() -> (Dispatcher, VehicleState) {
        let state = VehicleState::new();
        let table = Arc::new(SignalTable::builtin().unwrap());
        (Dispatcher::new(table, state.clone()), state)
    }

    fn mixed_frames() -> Vec<Frame> {
        vec![
            Frame::new(0x101, &[0x13, 0x88]),
            Frame::new(0x103, &[0xFF]),
            Frame::new(0x999, &[0xAA, 0xBB]),
            Frame::new(0x101, &[0x10]),
            Frame::with_dlc(0x104, 2, &[0x02]),
        ]
    }

    #[test]
    fn test_counts_every_outcome() {
        let (mut dispatcher, state) = dispatcher();
        let mut seen = 0;

        let stats = run(
            &mut dispatcher,
            mixed_frames(),
            &IngestConfig::new(),
            &StopSignal::new(),
            |_, _| seen += 1,
        );

        assert_eq!(seen, 5);
        assert_eq!(
            stats,
            IngestStats {
                frames: 5,
                decoded: 2,
                warnings: 1,
                unknown_ids: 1,
                dlc_mismatches: 1,
                malformed: 1,
                filtered: 0,
            }
        );
        assert_eq!(state.snapshot().signals.motor_rpm.value, 5000.0);
    }

    #[test]
    fn test_frame_limit() {
        let (mut dispatcher, _state) = dispatcher();
        let config = IngestConfig::new().with_max_frames(2);

        let stats = run(&mut dispatcher, mixed_frames(), &config, &StopSignal::new(), |_, _| {});
        assert_eq!(stats.frames, 2);
        assert_eq!(stats.decoded, 2);
    }

    #[test]
    fn test_message_filter() {
        let (mut dispatcher, state) = dispatcher();
        let config = IngestConfig::new().with_message_filter(vec![0x103]);

        let stats = run(&mut dispatcher, mixed_frames(), &config, &StopSignal::new(), |_, _| {});
        assert_eq!(stats.filtered, 4);
        assert_eq!(stats.decoded, 1);
        assert_eq!(state.snapshot().signals.motor_rpm.value, 0.0);
    }

    #[test]
    fn test_stop_signal_ends_endless_source() {
        let (mut dispatcher, _state) = dispatcher();
        let stop = StopSignal::new();
        let trigger = stop.clone();

        let endless = std::iter::repeat_with(|| Frame::new(0x105, &[0x19]));
        let stats = run(&mut dispatcher, endless, &IngestConfig::new(), &stop, |_, _| {
            trigger.stop();
        });

        assert_eq!(stats.frames, 1);
        assert!(stop.is_stopped());
    }
}
