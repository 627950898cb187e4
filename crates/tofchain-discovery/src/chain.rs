//! Address assignment along a reset daisy-chain
//!
//! Every VL6180X boots at the factory address 0x29, so sensors sharing a bus
//! are brought up one at a time. The first chip's GPIO0/CE input is driven by
//! a host pin; each later chip's is driven by the previous chip's GPIO1. Each
//! chip is released, identified at 0x29, initialized and moved to its own
//! address before the next one is released.

use std::fmt;
use std::thread;
use std::time::Duration;
use tofchain_core::{ResetLevel, Sensor, SensorError, SensorGroup, DEFAULT_ADDRESS};
use tofchain_i2c::{I2cTransport, SharedBus};
use tracing::{debug, info, warn};

/// Delays used while stepping through the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainTiming {
    /// How long a chip is held in reset
    pub reset_settle: Duration,
    /// Time for the power-on self-test after release
    pub boot: Duration,
}

impl Default for ChainTiming {
    fn default() -> Self {
        Self {
            reset_settle: Duration::from_millis(10),
            boot: Duration::from_millis(400),
        }
    }
}

/// Address assignment failed part way along the chain.
///
/// `assigned` holds every sensor that was already moved to its new address;
/// those chips stay at that address until they are reset.
pub struct ChainError<T> {
    pub assigned: SensorGroup<T>,
    pub source: SensorError,
}

impl<T> ChainError<T> {
    /// Split into the partial group and the cause
    pub fn into_parts(self) -> (SensorGroup<T>, SensorError) {
        (self.assigned, self.source)
    }
}

impl<T> fmt::Debug for ChainError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainError")
            .field("assigned", &self.assigned)
            .field("source", &self.source)
            .finish()
    }
}

impl<T> fmt::Display for ChainError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "address chain stopped after {} sensor(s): {}",
            self.assigned.len(),
            self.source
        )
    }
}

impl<T> std::error::Error for ChainError<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Walk the reset chain, giving each sensor the next address from
/// `start_address`.
///
/// `reset_on` and `reset_off` drive the host pin wired to the first chip.
/// The walk ends without error at the first position where nothing
/// identifies at the default address. Addresses are not range-checked.
pub fn assign_addresses<T, On, Off>(
    bus: &SharedBus<T>,
    start_address: u8,
    timing: &ChainTiming,
    mut reset_on: On,
    mut reset_off: Off,
) -> Result<SensorGroup<T>, ChainError<T>>
where
    T: I2cTransport,
    On: FnMut(),
    Off: FnMut(),
{
    let mut group = SensorGroup::new();
    let mut next_address = start_address;

    loop {
        let position = group.len();

        match group.last() {
            None => reset_on(),
            Some(previous) => previous.set_reset_line(ResetLevel::Low),
        }
        thread::sleep(timing.reset_settle);

        match group.last() {
            None => reset_off(),
            Some(previous) => previous.set_reset_line(ResetLevel::High),
        }
        thread::sleep(timing.boot);

        let mut sensor = Sensor::new(bus.clone(), DEFAULT_ADDRESS);
        if let Err(e) = sensor.identify() {
            debug!(position, error = %e, "No sensor at default address, chain complete");
            break;
        }

        if next_address == DEFAULT_ADDRESS {
            warn!(
                position,
                address = next_address,
                "Assigned address equals the factory default; the next sensor will collide"
            );
        }

        let step = sensor
            .initialize()
            .and_then(|()| sensor.set_address(next_address))
            .and_then(|()| group.push(sensor));

        if let Err(source) = step {
            warn!(
                position,
                address = next_address,
                error = %source,
                "Address chain aborted"
            );
            return Err(ChainError {
                assigned: group,
                source,
            });
        }

        debug!(position, address = next_address, "Sensor addressed");
        next_address = next_address.wrapping_add(1);
    }

    info!(
        count = group.len(),
        start = start_address,
        "Address chain complete"
    );
    Ok(group)
}
