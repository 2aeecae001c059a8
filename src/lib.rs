//! Parking sensor bridge library.
//!
//! Polls HC-SR04 ultrasonic sensors for parking-space occupancy and
//! reconciles each space's reservation record in a Firebase Realtime
//! Database.

pub mod config;
pub mod error;
pub mod gpio;
pub mod monitor;
pub mod reconciler;
pub mod sampler;
pub mod store;
