//! Built-in mini DBC for the dashboard
//!
//! Five single-signal messages, all big-endian, byte aligned, starting at byte 0.

use super::{SignalDefinition, SignalKind};

/// CAN IDs of the built-in messages
pub const MOTOR_RPM_ID: u32 = 0x101;
pub const VEHICLE_SPEED_ID: u32 = 0x102;
pub const BATTERY_SOC_ID: u32 = 0x103;
pub const BATTERY_VOLTAGE_ID: u32 = 0x104;
pub const MOTOR_TEMP_ID: u32 = 0x105;

/// Definitions of the built-in table
pub fn definitions() -> Vec<SignalDefinition> {
    vec![
        SignalDefinition::new(MOTOR_RPM_ID, "MotorRPM", SignalKind::MotorRpm, 2)
            .with_layout(0, 2)
            .with_scaling(1.0, 0.0)
            .with_range(0.0, 10000.0)
            .with_unit("rpm"),
        SignalDefinition::new(VEHICLE_SPEED_ID, "VehicleSpeed", SignalKind::VehicleSpeed, 2)
            .with_layout(0, 2)
            .with_scaling(0.1, 0.0)
            .with_range(0.0, 120.0)
            .with_unit("km/h"),
        SignalDefinition::new(BATTERY_SOC_ID, "BatterySOC", SignalKind::BatterySoc, 1)
            .with_layout(0, 1)
            .with_scaling(1.0, 0.0)
            .with_range(0.0, 100.0)
            .with_unit("%"),
        SignalDefinition::new(BATTERY_VOLTAGE_ID, "BatteryVoltage", SignalKind::BatteryVoltage, 2)
            .with_layout(0, 2)
            .with_scaling(0.1, 0.0)
            .with_range(0.0, 100.0)
            .with_unit("V"),
        SignalDefinition::new(MOTOR_TEMP_ID, "MotorTemp", SignalKind::MotorTemperature, 1)
            .with_layout(0, 1)
            .with_scaling(1.0, 0.0)
            .with_range(0.0, 150.0)
            .with_unit("C"),
    ]
}
