//! Bus scanning for sensors that already sit at distinct addresses

use tofchain_core::{Sensor, SensorGroup};
use tofchain_i2c::{I2cTransport, SharedBus};
use tracing::{debug, info, trace};

/// Highest address probed, exclusive
const SCAN_END: u8 = 0x7F;

/// Probe every address below 0x7F and group the sensors that identify.
///
/// A probe error only means nothing compatible answered there.
pub fn scan_bus<T: I2cTransport>(bus: &SharedBus<T>) -> SensorGroup<T> {
    let mut group = SensorGroup::new();

    for address in 0..SCAN_END {
        let sensor = Sensor::new(bus.clone(), address);
        match sensor.identify() {
            Ok(()) => {
                debug!(address, "Sensor found");
                // Addresses are unique by construction, push cannot fail
                if let Err(e) = group.push(sensor) {
                    trace!(address, error = %e, "Skipping duplicate address");
                }
            }
            Err(e) => trace!(address, error = %e, "No sensor"),
        }
    }

    info!(count = group.len(), "Bus scan complete");
    group
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{assign_addresses, ChainTiming};
    use std::time::Duration;
    use tofchain_core::registers::SYSTEM_FRESH_OUT_OF_RESET;
    use tofchain_core::sim::SimChain;
    use tofchain_core::DEFAULT_ADDRESS;

    #[test]
    fn test_scan_finds_chained_sensors() {
        let chain = SimChain::new(3);
        let bus = chain.bus();
        let on = chain.clone();
        let off = chain.clone();
        let timing = ChainTiming {
            reset_settle: Duration::ZERO,
            boot: Duration::ZERO,
        };
        assign_addresses(
            &bus,
            0x50,
            &timing,
            move || on.set_controller_reset(false),
            move || off.set_controller_reset(true),
        )
        .unwrap();

        let group = scan_bus(&bus);

        assert_eq!(group.addresses(), vec![0x50, 0x51, 0x52]);
    }

    #[test]
    fn test_scan_skips_devices_that_do_not_identify() {
        let chain = SimChain::new(1);
        chain.set_controller_reset(true);
        chain.set_register(DEFAULT_ADDRESS, SYSTEM_FRESH_OUT_OF_RESET, 0);

        let group = scan_bus(&chain.bus());

        assert!(group.is_empty());
    }

    #[test]
    fn test_scan_of_empty_bus() {
        let chain = SimChain::new(0);
        assert!(scan_bus(&chain.bus()).is_empty());
    }
}
