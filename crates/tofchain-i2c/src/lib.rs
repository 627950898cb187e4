//! tofchain I2C - Register-level access to devices on a shared I2C bus
//!
//! This crate provides the transport the sensor driver is built on:
//! - A raw byte transport trait with a Linux (`/dev/i2c-N`) implementation
//! - A bus handle that caches the currently selected slave address
//! - Devices bound to an address with 16-bit register read/write operations

pub mod bus;
pub mod device;
pub mod transport;

pub use bus::{list_bus_units, lock_bus, Bus, BusError, SharedBus};
pub use device::I2cDevice;
pub use transport::{I2cTransport, RppalTransport};
