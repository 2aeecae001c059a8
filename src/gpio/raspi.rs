//! HC-SR04 handle backed by `rppal` GPIO.
//!
//! Echo edges are detected by busy-polling the input pin against an
//! `Instant` deadline. The HC-SR04 echo pulse for a 10 cm object is about
//! 580 microseconds wide, well below scheduler granularity, so a blocking
//! spin bounded by the timeout is the reliable option here.

use super::{Level, UltrasonicSensor};
use crate::error::Result;
use rppal::gpio::{Gpio, InputPin, OutputPin};
use std::time::{Duration, Instant};

const TRIGGER_PULSE: Duration = Duration::from_micros(10);

/// One HC-SR04 sensor: trigger (output) and echo (input) pins.
///
/// Pins are reset to their default state when the handle is dropped,
/// which is how shutdown cleanup happens.
pub struct HcSr04 {
    trig: OutputPin,
    echo: InputPin,
}

impl HcSr04 {
    /// Claim the BCM pin pair for one sensor.
    pub fn new(gpio: &Gpio, trig_pin: u8, echo_pin: u8) -> Result<Self> {
        let trig = gpio.get(trig_pin)?.into_output_low();
        let echo = gpio.get(echo_pin)?.into_input();
        Ok(Self { trig, echo })
    }

    fn echo_level(&self) -> Level {
        if self.echo.is_high() {
            Level::High
        } else {
            Level::Low
        }
    }
}

impl UltrasonicSensor for HcSr04 {
    fn trigger(&mut self) {
        self.trig.set_high();
        // thread::sleep is too coarse for a 10 us pulse, so spin
        let start = Instant::now();
        while start.elapsed() < TRIGGER_PULSE {
            std::hint::spin_loop();
        }
        self.trig.set_low();
    }

    fn wait_for_level(&mut self, level: Level, timeout: Duration) -> Option<Instant> {
        let deadline = Instant::now() + timeout;
        loop {
            let now = Instant::now();
            if self.echo_level() == level {
                return Some(now);
            }
            if now >= deadline {
                return None;
            }
            std::hint::spin_loop();
        }
    }
}
