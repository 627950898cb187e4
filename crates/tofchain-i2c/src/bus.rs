//! I2C bus handle with register framing and slave-address caching

use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::{debug, trace};

use crate::transport::{I2cTransport, RppalTransport};

/// Directory holding the Linux I2C character devices
const DEV_DIR: &str = "/dev";

#[derive(Error, Debug)]
pub enum BusError {
    #[error("I2C device address {address:#04x}: address select failed: {source}")]
    Select {
        address: u8,
        #[source]
        source: io::Error,
    },
    #[error("I2C device address {address:#04x} register {register:#06x}: {source}")]
    Io {
        address: u8,
        register: u16,
        #[source]
        source: io::Error,
    },
    #[error(
        "I2C device address {address:#04x} register {register:#06x}: {operation} transferred {actual} of {expected} bytes"
    )]
    ShortTransfer {
        address: u8,
        register: u16,
        operation: &'static str,
        expected: usize,
        actual: usize,
    },
}

impl BusError {
    /// Address of the device the failed transaction was aimed at
    pub fn address(&self) -> u8 {
        match self {
            Self::Select { address, .. }
            | Self::Io { address, .. }
            | Self::ShortTransfer { address, .. } => *address,
        }
    }
}

/// A bus shared by every device attached to it.
///
/// The mutex is held for exactly one register transaction; it is the
/// caller-side serialization of transactions, the transport itself is not
/// synchronized.
pub type SharedBus<T> = Arc<Mutex<Bus<T>>>;

/// Lock a shared bus for one transaction.
///
/// A poisoned lock is recovered: the only state behind it is the transport
/// and the selected-address cache, and the cache is only written after a
/// successful select.
pub fn lock_bus<T>(bus: &SharedBus<T>) -> MutexGuard<'_, Bus<T>> {
    bus.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle to one physical I2C bus
pub struct Bus<T> {
    transport: T,
    /// Slave address selected by the last successful select
    selected: Option<u8>,
}

impl Bus<RppalTransport> {
    /// Open `/dev/i2c-{unit}`
    pub fn open(unit: u8) -> io::Result<Self> {
        Ok(Self::new(RppalTransport::open(unit)?))
    }
}

impl<T: I2cTransport> Bus<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            selected: None,
        }
    }

    /// Wrap the bus so devices can share it
    pub fn into_shared(self) -> SharedBus<T> {
        Arc::new(Mutex::new(self))
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Close the bus, releasing the underlying device handle
    pub fn close(self) {
        debug!(selected = ?self.selected, "Closing I2C bus");
        drop(self.transport);
    }

    fn select(&mut self, address: u8) -> Result<(), BusError> {
        if self.selected == Some(address) {
            return Ok(());
        }

        self.transport
            .select(address)
            .map_err(|source| BusError::Select { address, source })?;
        self.selected = Some(address);
        trace!(address = address, "Selected I2C slave");
        Ok(())
    }

    fn write_frame(
        &mut self,
        address: u8,
        register: u16,
        frame: &[u8],
        operation: &'static str,
    ) -> Result<(), BusError> {
        self.select(address)?;

        let written = self
            .transport
            .write(frame)
            .map_err(|source| BusError::Io {
                address,
                register,
                source,
            })?;

        if written != frame.len() {
            return Err(BusError::ShortTransfer {
                address,
                register,
                operation,
                expected: frame.len(),
                actual: written,
            });
        }

        Ok(())
    }

    fn read_register<const N: usize>(
        &mut self,
        address: u8,
        register: u16,
        operation: &'static str,
    ) -> Result<[u8; N], BusError> {
        self.write_frame(address, register, &register.to_be_bytes(), operation)?;

        let mut value = [0u8; N];
        let read = self
            .transport
            .read(&mut value)
            .map_err(|source| BusError::Io {
                address,
                register,
                source,
            })?;

        if read != N {
            return Err(BusError::ShortTransfer {
                address,
                register,
                operation,
                expected: N,
                actual: read,
            });
        }

        Ok(value)
    }

    /// Write an 8-bit value to a 16-bit register address
    pub fn write_byte_register(
        &mut self,
        address: u8,
        register: u16,
        value: u8,
    ) -> Result<(), BusError> {
        let [hi, lo] = register.to_be_bytes();
        trace!(address = address, register = register, value = value, "Write byte register");
        self.write_frame(address, register, &[hi, lo, value], "write byte register")
    }

    /// Write a 16-bit value (big-endian) to a 16-bit register address
    pub fn write_word_register(
        &mut self,
        address: u8,
        register: u16,
        value: u16,
    ) -> Result<(), BusError> {
        let [hi, lo] = register.to_be_bytes();
        let [value_hi, value_lo] = value.to_be_bytes();
        trace!(address = address, register = register, value = value, "Write word register");
        self.write_frame(
            address,
            register,
            &[hi, lo, value_hi, value_lo],
            "write word register",
        )
    }

    /// Read an 8-bit value from a 16-bit register address
    pub fn read_byte_register(&mut self, address: u8, register: u16) -> Result<u8, BusError> {
        let [value] = self.read_register::<1>(address, register, "read byte register")?;
        trace!(address = address, register = register, value = value, "Read byte register");
        Ok(value)
    }

    /// Read a 16-bit value (big-endian) from a 16-bit register address
    pub fn read_word_register(&mut self, address: u8, register: u16) -> Result<u16, BusError> {
        let bytes = self.read_register::<2>(address, register, "read word register")?;
        let value = u16::from_be_bytes(bytes);
        trace!(address = address, register = register, value = value, "Read word register");
        Ok(value)
    }
}

/// List the I2C bus unit numbers present on this system, sorted
pub fn list_bus_units() -> io::Result<Vec<u8>> {
    list_bus_units_in(Path::new(DEV_DIR))
}

fn list_bus_units_in(dir: &Path) -> io::Result<Vec<u8>> {
    let mut units = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if let Some(unit) = entry.file_name().to_str().and_then(parse_bus_unit) {
            units.push(unit);
        }
    }

    units.sort_unstable();
    debug!("Found {} I2C buses", units.len());
    Ok(units)
}

/// Parse a device node name such as `i2c-1` into its unit number
fn parse_bus_unit(name: &str) -> Option<u8> {
    name.strip_prefix("i2c-")?.parse().ok()
}
