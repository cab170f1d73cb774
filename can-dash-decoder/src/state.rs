//! Shared vehicle state
//!
//! Holds the latest decoded value and warning flag for every signal, the
//! operating mode, and the bounded diagnostic-run log. The record lives behind
//! a `RwLock`: each mutation is a single write-locked section and readers only
//! ever see a cloned snapshot, so a value and its warning flag are always
//! observed together.

use crate::signals::SignalKind;
use crate::types::{DecoderError, Result};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Capacity of the diagnostic-run log
pub const DIAGNOSTIC_LOG_CAPACITY: usize = 10;

/// Latest value of one signal
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalReading {
    /// Physical value in engineering units
    pub value: f64,
    /// True if the value was outside its declared range
    pub warning: bool,
}

/// One state slot per signal kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalReadings {
    pub motor_rpm: SignalReading,
    pub vehicle_speed: SignalReading,
    pub battery_soc: SignalReading,
    pub battery_voltage: SignalReading,
    pub motor_temperature: SignalReading,
}

impl SignalReadings {
    pub fn get(&self, kind: SignalKind) -> &SignalReading {
        match kind {
            SignalKind::MotorRpm => &self.motor_rpm,
            SignalKind::VehicleSpeed => &self.vehicle_speed,
            SignalKind::BatterySoc => &self.battery_soc,
            SignalKind::BatteryVoltage => &self.battery_voltage,
            SignalKind::MotorTemperature => &self.motor_temperature,
        }
    }

    fn get_mut(&mut self, kind: SignalKind) -> &mut SignalReading {
        match kind {
            SignalKind::MotorRpm => &mut self.motor_rpm,
            SignalKind::VehicleSpeed => &mut self.vehicle_speed,
            SignalKind::BatterySoc => &mut self.battery_soc,
            SignalKind::BatteryVoltage => &mut self.battery_voltage,
            SignalKind::MotorTemperature => &mut self.motor_temperature,
        }
    }
}

/// Operating mode of the dashboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatingMode {
    /// Live signal display
    #[default]
    Normal,
    /// Diagnostic run in progress or finished; the log is displayed
    DiagnosticRun,
}

/// Status of one diagnostic test
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TestStatus {
    #[default]
    NotRun,
    Pass,
    Warning,
    Error,
}

impl TestStatus {
    /// Numeric code used by the dashboard protocol
    pub fn code(&self) -> u8 {
        match self {
            TestStatus::NotRun => 0,
            TestStatus::Pass => 1,
            TestStatus::Warning => 2,
            TestStatus::Error => 3,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TestStatus::NotRun => "NOT RUN",
            TestStatus::Pass => "PASS",
            TestStatus::Warning => "WARNING",
            TestStatus::Error => "ERROR",
        }
    }
}

impl Serialize for TestStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

/// One entry of the diagnostic-run log
#[derive(Debug, Clone, PartialEq)]
pub struct TestRecord {
    pub name: String,
    /// Description of the input frame
    pub input: String,
    /// Description of the observed result
    pub output: String,
    pub status: TestStatus,
}

/// Serialized with the status code and its label side by side
impl Serialize for TestRecord {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut record = serializer.serialize_struct("TestRecord", 5)?;
        record.serialize_field("name", &self.name)?;
        record.serialize_field("input", &self.input)?;
        record.serialize_field("output", &self.output)?;
        record.serialize_field("status", &self.status)?;
        record.serialize_field("label", self.status.label())?;
        record.end()
    }
}

/// Consistent copy of the whole vehicle record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VehicleStateView {
    pub signals: SignalReadings,
    pub mode: OperatingMode,
    pub tests: Vec<TestRecord>,
}

impl VehicleStateView {
    /// The record the presentation layer serves for the current mode
    pub fn presentation(&self) -> PresentationRecord {
        match self.mode {
            OperatingMode::Normal => PresentationRecord::Normal {
                signals: self.signals,
            },
            OperatingMode::DiagnosticRun => PresentationRecord::Diagnostic {
                tests: self.tests.clone(),
            },
        }
    }
}

/// Read contract of the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PresentationRecord {
    Normal { signals: SignalReadings },
    Diagnostic { tests: Vec<TestRecord> },
}

impl PresentationRecord {
    /// Serialize to the JSON document served on `/data`
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Shared handle to the vehicle record
///
/// Cloning the handle shares the same record.
#[derive(Debug, Clone, Default)]
pub struct VehicleState {
    inner: Arc<RwLock<VehicleStateView>>,
}

impl VehicleState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a consistent copy of the record
    pub fn snapshot(&self) -> VehicleStateView {
        self.read().clone()
    }

    /// Store a decoded value and its warning flag
    pub fn apply(&self, kind: SignalKind, value: f64, warning: bool) {
        let mut data = self.write();
        *data.signals.get_mut(kind) = SignalReading { value, warning };
    }

    /// Switch to diagnostic mode and clear the log
    pub fn begin_diagnostic_run(&self) {
        let mut data = self.write();
        data.mode = OperatingMode::DiagnosticRun;
        data.tests.clear();
    }

    /// Return to live signal display; the log is kept
    pub fn end_diagnostic_run(&self) {
        self.write().mode = OperatingMode::Normal;
    }

    /// Append a test outcome to the diagnostic log
    ///
    /// Returns the index of the new entry, or `DiagnosticLogFull` once the log
    /// holds `DIAGNOSTIC_LOG_CAPACITY` entries; the record is dropped then.
    pub fn record_test(
        &self,
        name: impl Into<String>,
        input: impl Into<String>,
        output: impl Into<String>,
        status: TestStatus,
    ) -> Result<usize> {
        let mut data = self.write();
        if data.tests.len() >= DIAGNOSTIC_LOG_CAPACITY {
            return Err(DecoderError::DiagnosticLogFull {
                capacity: DIAGNOSTIC_LOG_CAPACITY,
            });
        }

        data.tests.push(TestRecord {
            name: name.into(),
            input: input.into(),
            output: output.into(),
            status,
        });
        Ok(data.tests.len() - 1)
    }

    // Writers never leave the record half-updated, so a poisoned lock still
    // guards consistent data.
    fn read(&self) -> RwLockReadGuard<'_, VehicleStateView> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, VehicleStateView> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
