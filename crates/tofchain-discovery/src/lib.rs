//! tofchain Discovery - Finding VL6180X sensors on a bus
//!
//! This crate provides two ways to build a sensor group:
//! - Address chaining: booting a reset daisy-chain one sensor at a time and
//!   moving each off the shared factory address
//! - Bus scanning for sensors that already have distinct addresses

pub mod chain;
pub mod scan;

pub use chain::{assign_addresses, ChainError, ChainTiming};
pub use scan::scan_bus;
