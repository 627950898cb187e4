//! tofchain Core - VL6180X sensor protocol driver
//!
//! This crate provides the per-chip behavior the rest of tofchain builds on:
//! - The register map and bring-up tables
//! - Identification, initialization and range scaling
//! - Single-shot and continuous range/ambient measurement
//! - Chained reset output control and address reassignment
//! - Ordered sensor groups

pub mod error;
pub mod group;
pub mod registers;
pub mod sensor;

#[cfg(any(test, feature = "sim"))]
pub mod sim;

pub use error::SensorError;
pub use group::SensorGroup;
pub use registers::DEFAULT_ADDRESS;
pub use sensor::{Identification, RegisterValue, ResetLevel, Sensor};
