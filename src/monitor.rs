//! The sweep loop: sample every space in order, reconcile, pause, repeat.
//!
//! Strictly sequential by design. One sensor is polled at a time, each
//! remote round-trip blocks the sweep, and a store failure ends the loop
//! so the process can exit rather than report stale statuses.

use crate::config::SpaceConfig;
use crate::error::Result;
use crate::gpio::UltrasonicSensor;
use crate::reconciler::StatusReconciler;
use crate::sampler::DistanceSampler;
use log::{debug, info};
use std::time::Duration;

/// One configured space paired with its claimed sensor.
pub struct MonitoredSpace {
    pub config: SpaceConfig,
    pub sensor: Box<dyn UltrasonicSensor>,
}

pub struct ParkingMonitor {
    spaces: Vec<MonitoredSpace>,
    sampler: DistanceSampler,
    reconciler: StatusReconciler,
    sweep_interval: Duration,
}

impl ParkingMonitor {
    pub fn new(
        spaces: Vec<MonitoredSpace>,
        sampler: DistanceSampler,
        reconciler: StatusReconciler,
        sweep_interval: Duration,
    ) -> Self {
        Self {
            spaces,
            sampler,
            reconciler,
            sweep_interval,
        }
    }

    /// Run sweeps until a store error. Each full sweep is followed by the
    /// configured pause. Cancelled externally via Ctrl+C in `main`.
    pub async fn run(&mut self) -> Result<()> {
        info!(
            "Starting {}-sensor parking monitor... Press Ctrl+C to stop.",
            self.spaces.len()
        );
        loop {
            self.sweep().await?;
            tokio::time::sleep(self.sweep_interval).await;
        }
    }

    /// One pass over all spaces, in configuration order.
    pub async fn sweep(&mut self) -> Result<()> {
        for space in &mut self.spaces {
            debug!("Checking {}...", space.config.id);
            // Bounded busy-wait, at most two echo timeouts per sensor
            let distance_cm = self.sampler.measure(space.sensor.as_mut());
            self.reconciler
                .reconcile(&space.config.id, distance_cm)
                .await?;
        }
        Ok(())
    }

    /// Release the sensors. Dropping the GPIO-backed handles resets their
    /// pins, which is the cleanup the hardware needs on the way out.
    pub fn shutdown(self) {
        let count = self.spaces.len();
        drop(self.spaces);
        info!("Released {} sensor pin pairs", count);
    }
}
