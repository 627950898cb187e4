//! Blocking bring-up steps run before streaming, and the scan report

use anyhow::Result;
use serde::Serialize;
use std::sync::{Arc, PoisonError};
use tofchain_core::{Identification, RegisterValue, SensorError, SensorGroup};
use tofchain_discovery::{assign_addresses, scan_bus};
use tofchain_i2c::{I2cTransport, SharedBus};
use tracing::{info, warn};

use crate::config::Config;

/// Address every sensor on the chain and apply the configured scaling
pub fn bring_up_chain<T, On, Off>(
    bus: &SharedBus<T>,
    config: &Config,
    reset_on: On,
    reset_off: Off,
) -> Result<SensorGroup<T>>
where
    T: I2cTransport,
    On: FnMut(),
    Off: FnMut(),
{
    let group = match assign_addresses(
        bus,
        config.chain.start_address,
        &config.chain_timing(),
        reset_on,
        reset_off,
    ) {
        Ok(group) => group,
        Err(e) if config.chain.keep_partial && !e.assigned.is_empty() => {
            warn!(
                count = e.assigned.len(),
                error = %e.source,
                "Address chain failed, continuing with the sensors addressed so far"
            );
            e.assigned
        }
        Err(e) => {
            let (assigned, source) = e.into_parts();
            return Err(anyhow::Error::new(source).context(format!(
                "Address chain stopped after {} sensor(s)",
                assigned.len()
            )));
        }
    };

    group.set_scaling(config.sensor.scaling)?;
    info!(
        addresses = ?group.addresses(),
        scaling = config.sensor.scaling,
        "Sensors ready"
    );
    Ok(group)
}

/// One sensor found by a bus scan
#[derive(Debug, Serialize)]
pub struct ScanEntry {
    pub address: u8,
    pub identification: Identification,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registers: Option<Vec<RegisterValue>>,
}

/// Scan the bus and describe every sensor that answers
pub fn scan_report<T: I2cTransport>(
    bus: &SharedBus<T>,
    dump_registers: bool,
) -> Result<Vec<ScanEntry>, SensorError> {
    scan_bus(bus)
        .iter()
        .map(|sensor| {
            Ok(ScanEntry {
                address: sensor.address(),
                identification: sensor.identification()?,
                registers: if dump_registers {
                    Some(sensor.dump_registers()?)
                } else {
                    None
                },
            })
        })
        .collect()
}

/// Close the bus once nothing else holds it
pub fn close_bus<T: I2cTransport>(bus: SharedBus<T>) {
    match Arc::try_unwrap(bus) {
        Ok(bus) => bus
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .close(),
        Err(_) => warn!("I2C bus still in use, leaving it open"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tofchain_core::registers::{RANGE_SCALER, SYSTEM_GROUPED_PARAMETER_HOLD};
    use tofchain_core::sim::{SimChain, SimTransport};
    use tofchain_core::DEFAULT_ADDRESS;

    fn fast_config() -> Config {
        let mut config = Config::default();
        config.chain.reset_settle_ms = 0;
        config.chain.boot_ms = 0;
        config
    }

    fn bring_up(chain: &SimChain, config: &Config) -> Result<SensorGroup<SimTransport>> {
        let on = chain.clone();
        let off = chain.clone();
        bring_up_chain(
            &chain.bus(),
            config,
            move || on.set_controller_reset(false),
            move || off.set_controller_reset(true),
        )
    }

    #[test]
    fn test_bring_up_applies_scaling() {
        let chain = SimChain::new(2);
        let mut config = fast_config();
        config.sensor.scaling = 3;

        let group = bring_up(&chain, &config).unwrap();

        assert_eq!(group.addresses(), vec![0x30, 0x31]);
        // The 1x write from initialize happened at the default address
        assert_eq!(chain.writes_to(0x30, RANGE_SCALER), vec![84]);
        assert_eq!(chain.writes_to(0x31, RANGE_SCALER), vec![84]);
    }

    #[test]
    fn test_partial_chain_kept_when_configured() {
        let chain = SimChain::new(3);
        chain.fail_register_after(DEFAULT_ADDRESS, SYSTEM_GROUPED_PARAMETER_HOLD, 2);
        let mut config = fast_config();
        config.chain.keep_partial = true;

        let group = bring_up(&chain, &config).unwrap();

        assert_eq!(group.addresses(), vec![0x30]);
    }

    #[test]
    fn test_partial_chain_is_an_error_by_default() {
        let chain = SimChain::new(3);
        chain.fail_register_after(DEFAULT_ADDRESS, SYSTEM_GROUPED_PARAMETER_HOLD, 2);

        let err = bring_up(&chain, &fast_config()).unwrap_err();

        assert!(err.to_string().contains("after 1 sensor"));
    }

    #[test]
    fn test_invalid_scaling_rejected() {
        let chain = SimChain::new(1);
        let mut config = fast_config();
        config.sensor.scaling = 4;

        assert!(bring_up(&chain, &config).is_err());
    }

    #[test]
    fn test_scan_report_with_registers() {
        let chain = SimChain::new(1);
        chain.set_controller_reset(true);
        let bus = chain.bus();

        let report = scan_report(&bus, true).unwrap();

        assert_eq!(report.len(), 1);
        assert_eq!(report[0].address, DEFAULT_ADDRESS);
        assert!(report[0].identification.is_vl6180x());
        assert!(report[0].registers.as_ref().is_some_and(|r| !r.is_empty()));

        let brief = scan_report(&bus, false).unwrap();
        let json = serde_json::to_value(&brief).unwrap();
        assert!(json[0].get("registers").is_none());
    }

    #[test]
    fn test_close_bus_needs_sole_owner() {
        let chain = SimChain::new(0);
        let bus = chain.bus();
        let other = bus.clone();

        // Still shared, so left open; the last owner closes it
        close_bus(bus);
        close_bus(other);
    }
}
