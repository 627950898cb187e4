//! Raw byte transport underneath the register bus

use rppal::i2c::I2c;
use std::io;
use tracing::debug;

/// A raw I2C byte channel.
///
/// Implementations are not synchronized: one transaction at a time, issued
/// by whoever holds `&mut self`.
pub trait I2cTransport {
    /// Select the slave address subsequent reads and writes go to
    fn select(&mut self, address: u8) -> io::Result<()>;

    /// Write `bytes` to the selected slave, returning the number written
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize>;

    /// Read into `buf` from the selected slave, returning the number read
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// Linux I2C character device (`/dev/i2c-N`) accessed through rppal
pub struct RppalTransport {
    i2c: I2c,
    unit: u8,
}

impl RppalTransport {
    /// Open `/dev/i2c-{unit}`
    pub fn open(unit: u8) -> io::Result<Self> {
        let i2c = I2c::with_bus(unit).map_err(io::Error::other)?;
        debug!(unit = unit, "Opened I2C bus");
        Ok(Self { i2c, unit })
    }

    pub fn unit(&self) -> u8 {
        self.unit
    }
}

impl I2cTransport for RppalTransport {
    fn select(&mut self, address: u8) -> io::Result<()> {
        self.i2c
            .set_slave_address(u16::from(address))
            .map_err(io::Error::other)
    }

    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.i2c.write(bytes).map_err(io::Error::other)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.i2c.read(buf).map_err(io::Error::other)
    }
}
