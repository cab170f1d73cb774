//! Self-test diagnostic run
//!
//! Feeds five known frames through the dispatcher and records the verdicts in
//! the vehicle state's diagnostic log, where the dashboard picks them up.

use can_dash_decoder::{
    DecoderError, DispatchOutcome, Dispatcher, Frame, SignalKind, TestRecord, TestStatus,
    VehicleState, VehicleStateView,
};

/// Verdict of one check: observed output and status
type Verdict = (String, TestStatus);

/// One built-in diagnostic check
struct DiagnosticCase {
    name: &'static str,
    frame: Frame,
    check: fn(&DispatchOutcome, &VehicleStateView, &VehicleStateView) -> Verdict,
}

fn cases() -> Vec<DiagnosticCase> {
    vec![
        DiagnosticCase {
            name: "Motor RPM Parsing",
            frame: Frame::new(0x101, &[0x13, 0x88]),
            check: check_motor_rpm,
        },
        DiagnosticCase {
            name: "Battery Voltage Scaling",
            frame: Frame::new(0x104, &[0x02, 0x71]),
            check: check_voltage_scaling,
        },
        DiagnosticCase {
            name: "Battery SOC Range Check",
            frame: Frame::new(0x103, &[0xFF]),
            check: check_soc_range,
        },
        DiagnosticCase {
            name: "Unknown CAN ID Handling",
            frame: Frame::new(0x999, &[0xAA, 0xBB]),
            check: check_unknown_id,
        },
        DiagnosticCase {
            name: "Wrong DLC Detection",
            frame: Frame::new(0x101, &[0x10]),
            check: check_wrong_dlc,
        },
    ]
}

fn check_motor_rpm(outcome: &DispatchOutcome, _before: &VehicleStateView, after: &VehicleStateView) -> Verdict {
    let rpm = after.signals.motor_rpm;
    if outcome.is_decoded() && rpm.value == 5000.0 && !rpm.warning {
        (format!("{} = {:.0} rpm", SignalKind::MotorRpm, rpm.value), TestStatus::Pass)
    } else {
        ("Incorrect RPM decoding".to_string(), TestStatus::Error)
    }
}

fn check_voltage_scaling(outcome: &DispatchOutcome, _before: &VehicleStateView, after: &VehicleStateView) -> Verdict {
    let voltage = after.signals.battery_voltage.value;
    if outcome.is_decoded() && (voltage - 62.5).abs() < 1e-6 {
        (format!("Voltage = {:.1} V", voltage), TestStatus::Pass)
    } else {
        ("Scaling error".to_string(), TestStatus::Error)
    }
}

fn check_soc_range(outcome: &DispatchOutcome, _before: &VehicleStateView, after: &VehicleStateView) -> Verdict {
    let soc = after.signals.battery_soc;
    let flagged = matches!(outcome, DispatchOutcome::Decoded { warning: true, .. });
    if flagged && soc.warning && soc.value > 100.0 {
        ("SOC out of range detected".to_string(), TestStatus::Warning)
    } else {
        ("Range check failed".to_string(), TestStatus::Error)
    }
}

fn check_unknown_id(outcome: &DispatchOutcome, before: &VehicleStateView, after: &VehicleStateView) -> Verdict {
    if matches!(outcome, DispatchOutcome::UnknownId { .. }) && before == after {
        ("Message ignored safely".to_string(), TestStatus::Pass)
    } else {
        ("Unknown ID modified vehicle data".to_string(), TestStatus::Error)
    }
}

fn check_wrong_dlc(outcome: &DispatchOutcome, before: &VehicleStateView, after: &VehicleStateView) -> Verdict {
    if matches!(outcome, DispatchOutcome::DlcMismatch { .. }) && before == after {
        ("DLC mismatch correctly ignored".to_string(), TestStatus::Pass)
    } else {
        ("Data modified despite wrong DLC".to_string(), TestStatus::Error)
    }
}

/// `ID=0x101 DLC=2 DATA=[13 88]`
fn describe(frame: &Frame) -> String {
    let data: Vec<String> = frame.declared_data().iter().map(|b| format!("{:02X}", b)).collect();
    format!("ID=0x{:03X} DLC={} DATA=[{}]", frame.can_id, frame.dlc, data.join(" "))
}

/// Switch the state to diagnostic mode, run every check and record it
///
/// Returns the diagnostic log as recorded.
pub fn run_diagnostics(dispatcher: &mut Dispatcher, state: &VehicleState) -> Vec<TestRecord> {
    state.begin_diagnostic_run();

    for case in cases() {
        let before = state.snapshot();
        let outcome = dispatcher.dispatch(&case.frame);
        let after = state.snapshot();

        let (output, status) = (case.check)(&outcome, &before, &after);
        log::info!("{}: {} ({})", case.name, status.label(), output);

        match state.record_test(case.name, describe(&case.frame), output, status) {
            Ok(_) => {}
            Err(DecoderError::DiagnosticLogFull { capacity }) => {
                log::warn!("Diagnostic log full ({} entries), '{}' not recorded", capacity, case.name);
            }
            Err(e) => log::error!("Failed to record '{}': {}", case.name, e),
        }
    }

    state.snapshot().tests
}

#[cfg(test)]
mod tests {
    use super::*;
    use can_dash_decoder::{open_file_sink, OperatingMode, SignalTable};
    use std::sync::Arc;

    fn setup() -> (Dispatcher, VehicleState) {
        let table = Arc::new(SignalTable::builtin().unwrap());
        let state = VehicleState::new();
        (Dispatcher::new(table, state.clone()), state)
    }

    #[test]
    fn test_all_checks_pass() {
        let (mut dispatcher, state) = setup();
        let results = run_diagnostics(&mut dispatcher, &state);

        let statuses: Vec<TestStatus> = results.iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![
                TestStatus::Pass,
                TestStatus::Pass,
                TestStatus::Warning,
                TestStatus::Pass,
                TestStatus::Pass
            ]
        );
        assert_eq!(results[0].input, "ID=0x101 DLC=2 DATA=[13 88]");
        assert_eq!(results[0].output, "Motor_RPM = 5000 rpm");
        assert_eq!(results[1].output, "Voltage = 62.5 V");
        assert_eq!(results[4].input, "ID=0x101 DLC=1 DATA=[10]");
        assert_eq!(state.snapshot().mode, OperatingMode::DiagnosticRun);
    }

    #[test]
    fn test_rerun_replaces_previous_log() {
        let (mut dispatcher, state) = setup();
        run_diagnostics(&mut dispatcher, &state);
        let results = run_diagnostics(&mut dispatcher, &state);
        assert_eq!(results.len(), 5);
    }

    #[test]
    fn test_decoded_checks_reach_the_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("can_log.txt");
        let table = Arc::new(SignalTable::builtin().unwrap());
        let state = VehicleState::new();
        let mut dispatcher = Dispatcher::with_sink(table, state.clone(), open_file_sink(&path));

        run_diagnostics(&mut dispatcher, &state);
        drop(dispatcher);

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().skip(1).collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("| 0x101 | 2 | 13 88 | Motor_RPM | 5000.00 rpm | OK"));
        assert!(lines[1].contains("| 0x104 |"));
        assert!(lines[2].ends_with("| WARNING"));
        assert!(!text.contains("0x999"));
    }

    #[test]
    fn test_unknown_id_check_detects_mutation() {
        let before = VehicleStateView::default();
        let mut after = before.clone();
        after.signals.motor_rpm.value = 1.0;

        let (_, status) = check_unknown_id(&DispatchOutcome::UnknownId { can_id: 0x999 }, &before, &after);
        assert_eq!(status, TestStatus::Error);
    }
}
