//! Vehicle simulator
//!
//! Produces the five dashboard frames once per simulation step. The dynamics
//! deliberately overshoot the RPM and speed ranges so the warning path of the
//! decoder gets exercised.

use can_dash_decoder::signals::builtin::{
    BATTERY_SOC_ID, BATTERY_VOLTAGE_ID, MOTOR_RPM_ID, MOTOR_TEMP_ID, VEHICLE_SPEED_ID,
};
use can_dash_decoder::Frame;
use std::collections::VecDeque;

/// Frames emitted per simulation step
pub const FRAMES_PER_CYCLE: usize = 5;

const RPM_STEP: f32 = 200.0;
const RPM_PEAK: f32 = 11000.0;
const SPEED_RISE: f32 = 2.5;
const SPEED_FALL: f32 = 3.0;
const SPEED_PEAK: f32 = 130.0;
const SPEED_FLOOR: f32 = 80.0;
const SOC_DRAIN: f32 = 0.01;

/// Simulated vehicle physics
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleSimulator {
    pub motor_rpm: f32,
    pub vehicle_speed: f32,
    pub battery_soc: f32,
    pub battery_voltage: f32,
    pub motor_temperature: f32,
    rpm_rising: bool,
    speed_rising: bool,
}

impl Default for VehicleSimulator {
    fn default() -> Self {
        Self {
            motor_rpm: 0.0,
            vehicle_speed: 0.0,
            battery_soc: 100.0,
            battery_voltage: 62.0,
            motor_temperature: 25.0,
            rpm_rising: true,
            speed_rising: true,
        }
    }
}

impl VehicleSimulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the simulation by one step
    pub fn step(&mut self) {
        if self.rpm_rising {
            self.motor_rpm += RPM_STEP;
            if self.motor_rpm >= RPM_PEAK {
                self.rpm_rising = false;
            }
        } else {
            self.motor_rpm -= RPM_STEP;
            if self.motor_rpm <= 0.0 {
                self.rpm_rising = true;
            }
        }

        if self.speed_rising && self.vehicle_speed < SPEED_PEAK {
            self.vehicle_speed += SPEED_RISE;
            if self.vehicle_speed >= SPEED_PEAK {
                self.speed_rising = false;
            }
        } else {
            self.vehicle_speed -= SPEED_FALL;
            if self.vehicle_speed <= SPEED_FLOOR {
                self.speed_rising = true;
            }
        }

        if self.battery_soc > 0.0 {
            self.battery_soc -= SOC_DRAIN;
        }
        self.battery_voltage = 48.0 + self.battery_soc / 100.0;

        // Temperature creeps towards a target that follows RPM
        let target_temp = 25.0 + (self.motor_rpm / 8000.0) * 75.0;
        if self.motor_temperature < target_temp {
            self.motor_temperature += 0.1;
        }
    }

    /// Encode the current values as CAN frames, in table order
    pub fn frames(&self) -> [Frame; FRAMES_PER_CYCLE] {
        [
            Frame::new(MOTOR_RPM_ID, &(self.motor_rpm as u16).to_be_bytes()),
            Frame::new(VEHICLE_SPEED_ID, &((self.vehicle_speed * 10.0) as u16).to_be_bytes()),
            Frame::new(BATTERY_SOC_ID, &[self.battery_soc as u8]),
            Frame::new(BATTERY_VOLTAGE_ID, &((self.battery_voltage * 10.0) as u16).to_be_bytes()),
            Frame::new(MOTOR_TEMP_ID, &[self.motor_temperature as u8]),
        ]
    }

    /// Endless frame stream: step, then emit the five frames
    pub fn into_frames(self) -> SimulatedFrames {
        SimulatedFrames {
            simulator: self,
            pending: VecDeque::with_capacity(FRAMES_PER_CYCLE),
        }
    }
}

/// Iterator over simulated frames (never ends on its own)
pub struct SimulatedFrames {
    simulator: VehicleSimulator,
    pending: VecDeque<Frame>,
}

impl Iterator for SimulatedFrames {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        if self.pending.is_empty() {
            self.simulator.step();
            self.pending.extend(self.simulator.frames());
        }
        self.pending.pop_front()
    }
}
