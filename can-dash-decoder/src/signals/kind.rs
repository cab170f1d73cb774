//! Enumerated signal identities
//!
//! Every signal the dashboard knows about has a `SignalKind`. The vehicle state
//! is indexed by kind, never by signal name, so adding a signal without a state
//! slot is a compile error rather than a silently dropped update.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a decoded vehicle signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    MotorRpm,
    VehicleSpeed,
    BatterySoc,
    BatteryVoltage,
    MotorTemperature,
}

impl SignalKind {
    /// All kinds, in dashboard order
    pub const ALL: [SignalKind; 5] = [
        SignalKind::MotorRpm,
        SignalKind::VehicleSpeed,
        SignalKind::BatterySoc,
        SignalKind::BatteryVoltage,
        SignalKind::MotorTemperature,
    ];

    /// Canonical DBC signal name
    pub fn signal_name(&self) -> &'static str {
        match self {
            SignalKind::MotorRpm => "Motor_RPM",
            SignalKind::VehicleSpeed => "Vehicle_Speed",
            SignalKind::BatterySoc => "Battery_SOC",
            SignalKind::BatteryVoltage => "Battery_Voltage",
            SignalKind::MotorTemperature => "Motor_Temperature",
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.signal_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_signal_names_are_unique() {
        let names: HashSet<&str> = SignalKind::ALL.iter().map(|k| k.signal_name()).collect();
        assert_eq!(names.len(), SignalKind::ALL.len());
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&SignalKind::BatterySoc).unwrap();
        assert_eq!(json, "\"battery_soc\"");
    }
}
