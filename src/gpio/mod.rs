//! Hardware abstraction for the HC-SR04 ultrasonic sensors.
//!
//! The sampler only needs two primitives per sensor: emit the trigger pulse
//! and wait (bounded) for the echo pin to reach a level. Keeping that behind
//! a trait lets the real `rppal` pins and the simulated sensors share the
//! same measurement path.

pub mod raspi;
pub mod simulation;

use std::time::{Duration, Instant};

pub use raspi::HcSr04;
pub use simulation::{SharedDistance, SimulatedSensor};

/// Logic level of a digital pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

/// One ultrasonic sensor (trigger output + echo input).
pub trait UltrasonicSensor: Send {
    /// Emit the 10 microsecond trigger pulse that starts a measurement.
    fn trigger(&mut self);

    /// Wait until the echo pin reads `level`, giving up after `timeout`.
    ///
    /// Returns the instant the level was observed, or `None` on timeout.
    fn wait_for_level(&mut self, level: Level, timeout: Duration) -> Option<Instant>;
}
