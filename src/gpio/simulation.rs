//! Sensor simulation for testing.
//!
//! Provides simulated sensor readings for development on hosts without
//! GPIO hardware, plus a background task that periodically swaps spaces
//! between occupied and free.

use super::{Level, UltrasonicSensor};
use crate::sampler::SPEED_OF_SOUND_CM_PER_SEC;
use log::info;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared distance a simulated sensor reports, in centimeters.
///
/// `None` means "no echo": the sensor behaves as if the pulse was lost
/// and every wait times out.
pub struct SharedDistance(Mutex<Option<f64>>);

impl SharedDistance {
    pub fn new(distance_cm: Option<f64>) -> Arc<Self> {
        Arc::new(Self(Mutex::new(distance_cm)))
    }

    pub fn set(&self, distance_cm: Option<f64>) {
        *self.0.lock() = distance_cm;
    }

    pub fn get(&self) -> Option<f64> {
        *self.0.lock()
    }
}

/// Simulated ultrasonic sensor.
///
/// Synthesizes echo edge timestamps from the shared distance so the real
/// sampler math runs unchanged: the echo goes high at the trigger instant
/// and low after the round-trip time the distance implies.
pub struct SimulatedSensor {
    distance: Arc<SharedDistance>,
    pulse_at: Option<Instant>,
}

impl SimulatedSensor {
    pub fn new(distance: Arc<SharedDistance>) -> Self {
        Self {
            distance,
            pulse_at: None,
        }
    }
}

impl UltrasonicSensor for SimulatedSensor {
    fn trigger(&mut self) {
        self.pulse_at = Some(Instant::now());
    }

    fn wait_for_level(&mut self, level: Level, _timeout: Duration) -> Option<Instant> {
        let base = self.pulse_at?;
        let distance_cm = self.distance.get()?;
        match level {
            Level::High => Some(base),
            Level::Low => {
                let round_trip = distance_cm * 2.0 / SPEED_OF_SOUND_CM_PER_SEC;
                Some(base + Duration::from_secs_f64(round_trip))
            }
        }
    }
}

/// Spawn a task that periodically flips simulated spaces between a parked
/// car (5 cm) and an empty space (150 cm).
///
/// # Returns
///
/// A `JoinHandle` that can be used to abort the simulation task.
pub fn run_distance_simulation(
    distances: Vec<(String, Arc<SharedDistance>)>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(30));
        let mut occupied = false;
        loop {
            interval.tick().await;
            occupied = !occupied;
            let distance_cm = if occupied { 5.0 } else { 150.0 };
            for (id, shared) in &distances {
                shared.set(Some(distance_cm));
                info!("[Sim] {} distance set to {} cm", id, distance_cm);
            }
        }
    })
}
