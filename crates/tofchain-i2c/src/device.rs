//! A device bound to an address on a shared bus

use std::fmt;

use crate::bus::{lock_bus, BusError, SharedBus};
use crate::transport::I2cTransport;

/// A (bus, 7-bit address) pair.
///
/// Every register operation locks the bus for one transaction.
pub struct I2cDevice<T> {
    bus: SharedBus<T>,
    address: u8,
}

impl<T: I2cTransport> I2cDevice<T> {
    pub fn new(bus: SharedBus<T>, address: u8) -> Self {
        Self { bus, address }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Rebind the device to a new address.
    ///
    /// This only changes which address later transactions target; telling
    /// the device itself is the caller's business.
    pub fn rebind(&mut self, address: u8) {
        self.address = address;
    }

    pub fn write_byte_register(&self, register: u16, value: u8) -> Result<(), BusError> {
        lock_bus(&self.bus).write_byte_register(self.address, register, value)
    }

    pub fn write_word_register(&self, register: u16, value: u16) -> Result<(), BusError> {
        lock_bus(&self.bus).write_word_register(self.address, register, value)
    }

    pub fn read_byte_register(&self, register: u16) -> Result<u8, BusError> {
        lock_bus(&self.bus).read_byte_register(self.address, register)
    }

    pub fn read_word_register(&self, register: u16) -> Result<u16, BusError> {
        lock_bus(&self.bus).read_word_register(self.address, register)
    }
}

impl<T> fmt::Debug for I2cDevice<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("I2cDevice")
            .field("address", &format_args!("{:#04x}", self.address))
            .finish()
    }
}
