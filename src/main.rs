// Test-support items (in-memory store seeding, simulation helpers) are
// only exercised by the library tests
#![allow(dead_code)]

mod config;
mod error;
mod gpio;
mod monitor;
mod reconciler;
mod sampler;
mod store;

use crate::config::Config;
use crate::gpio::{HcSr04, SharedDistance, SimulatedSensor, UltrasonicSensor};
use crate::monitor::{MonitoredSpace, ParkingMonitor};
use crate::reconciler::StatusReconciler;
use crate::sampler::DistanceSampler;
use crate::store::{FirebaseStore, InMemoryStore, SpaceStore};
use clap::Parser;
use log::{error, info};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

#[derive(Parser, Debug)]
#[command(about = "Ultrasonic parking-space monitor")]
struct Args {
    /// Run against simulated sensors and an in-memory store (no hardware,
    /// no network). For development on non-Pi hosts.
    #[arg(long)]
    simulate: bool,
}

fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

#[tokio::main]
async fn main() {
    init_logger();
    config::load_dotenv();
    let args = Args::parse();

    let config = Config::from_env();
    info!("Configuration loaded:");
    info!("  Database URL: {}", config.firebase.database_url);
    info!("  Spaces: {}", config.spaces.len());
    info!("  Sweep interval: {} s", config.monitor.sweep_interval_secs);
    info!("  Echo timeout: {} ms", config.monitor.echo_timeout_ms);

    let store: Arc<dyn SpaceStore> = if args.simulate {
        info!("Simulation mode: using in-memory store");
        Arc::new(InMemoryStore::new())
    } else {
        match FirebaseStore::new(&config.firebase) {
            Ok(store) => Arc::new(store),
            Err(e) => {
                error!("Failed to set up Firebase store: {}", e);
                std::process::exit(1);
            }
        }
    };

    let mut sim_task = None;
    let spaces = if args.simulate {
        let mut spaces = Vec::new();
        let mut distances = Vec::new();
        for space in &config.spaces {
            let distance = SharedDistance::new(Some(150.0));
            distances.push((space.id.clone(), distance.clone()));
            spaces.push(MonitoredSpace {
                config: space.clone(),
                sensor: Box::new(SimulatedSensor::new(distance)) as Box<dyn UltrasonicSensor>,
            });
        }
        sim_task = Some(gpio::simulation::run_distance_simulation(distances));
        spaces
    } else {
        let gpio = match rppal::gpio::Gpio::new() {
            Ok(gpio) => gpio,
            Err(e) => {
                error!("Failed to open GPIO: {}", e);
                std::process::exit(1);
            }
        };
        let mut spaces = Vec::new();
        for space in &config.spaces {
            match HcSr04::new(&gpio, space.trig, space.echo) {
                Ok(sensor) => spaces.push(MonitoredSpace {
                    config: space.clone(),
                    sensor: Box::new(sensor) as Box<dyn UltrasonicSensor>,
                }),
                Err(e) => {
                    error!(
                        "Failed to claim pins {}/{} for {}: {}",
                        space.trig, space.echo, space.id, e
                    );
                    std::process::exit(1);
                }
            }
        }
        spaces
    };

    let sampler = DistanceSampler::new(Duration::from_millis(config.monitor.echo_timeout_ms));
    let reconciler = StatusReconciler::new(store, config.monitor.occupied_threshold_cm);
    let mut monitor = ParkingMonitor::new(
        spaces,
        sampler,
        reconciler,
        Duration::from_secs(config.monitor.sweep_interval_secs),
    );

    // Run until the store fails or the operator interrupts us. Remote
    // errors are fatal by design: no retry, no backoff.
    let mut failed = false;
    tokio::select! {
        result = monitor.run() => {
            if let Err(e) = result {
                error!("Monitor stopped on error: {}", e);
                failed = true;
            }
        }
        _ = signal::ctrl_c() => {
            info!("Stopping monitor. Cleaning up GPIO.");
        }
    }

    if let Some(task) = sim_task {
        task.abort();
    }
    monitor.shutdown();
    info!("Parking monitor stopped");

    if failed {
        std::process::exit(1);
    }
}
