//! Distance sampling for one HC-SR04 measurement cycle.
//!
//! Fires the trigger pulse, waits (bounded) for the echo pin to go high
//! and back low, and converts the pulse width to centimeters. A timed-out
//! wait yields the out-of-range sentinel instead of an error: downstream
//! the sentinel simply reads as "no car here".

use crate::gpio::{Level, UltrasonicSensor};
use std::time::Duration;

/// Reported when no echo edge arrives within the timeout.
/// Always >= the occupancy threshold, so a lost pulse reads as a free space.
pub const SENTINEL_DISTANCE_CM: f64 = 999.0;

/// Speed of sound in air, cm/s. The echo travels to the object and back,
/// hence the division by two in the conversion.
pub const SPEED_OF_SOUND_CM_PER_SEC: f64 = 34_300.0;

/// Default bound on each echo-edge wait.
pub const DEFAULT_ECHO_TIMEOUT: Duration = Duration::from_millis(50);

/// Converts echo pulse widths into distances.
#[derive(Debug, Clone, Copy)]
pub struct DistanceSampler {
    echo_timeout: Duration,
}

impl DistanceSampler {
    pub fn new(echo_timeout: Duration) -> Self {
        Self { echo_timeout }
    }

    /// Run one measurement cycle and return the distance in centimeters,
    /// rounded to two decimals, or [`SENTINEL_DISTANCE_CM`] on timeout.
    ///
    /// No retry and no averaging: a single timed-out read is reported
    /// as-is and the sweep moves on.
    pub fn measure(&self, sensor: &mut dyn UltrasonicSensor) -> f64 {
        sensor.trigger();

        let Some(pulse_start) = sensor.wait_for_level(Level::High, self.echo_timeout) else {
            return SENTINEL_DISTANCE_CM;
        };
        let Some(pulse_end) = sensor.wait_for_level(Level::Low, self.echo_timeout) else {
            return SENTINEL_DISTANCE_CM;
        };

        let elapsed = pulse_end.saturating_duration_since(pulse_start).as_secs_f64();
        round2(elapsed * SPEED_OF_SOUND_CM_PER_SEC / 2.0)
    }
}

impl Default for DistanceSampler {
    fn default() -> Self {
        Self::new(DEFAULT_ECHO_TIMEOUT)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
