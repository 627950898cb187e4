//! VL6180X time-of-flight range and ambient light sensor driver

use serde::Serialize;
use std::fmt;
use std::time::{Duration, Instant};
use tofchain_i2c::{I2cDevice, I2cTransport, SharedBus};
use tracing::{debug, trace, warn};

use crate::error::SensorError;
use crate::registers::{self as reg, RegisterInfo, Width, REGISTER_MAP};

/// Expected `IDENTIFICATION__MODEL_ID`
pub const MODEL_ID: u8 = 0xB4;

/// Largest value `SYS*__INTERMEASUREMENT_PERIOD` can hold (2.55 s)
const MAX_PERIOD_REGISTER: u16 = 254;

/// Level of the chained reset output (GPIO1) feeding the next sensor's
/// GPIO0/CE input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResetLevel {
    /// Holds the next sensor in reset
    Low,
    /// Lets the next sensor boot
    High,
}

impl ResetLevel {
    fn gpio1_value(self) -> u8 {
        match self {
            Self::Low => reg::GPIO1_DRIVE_LOW,
            Self::High => reg::GPIO1_DRIVE_HIGH,
        }
    }
}

/// Model and manufacturing information read from the identification block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identification {
    pub model_id: u8,
    pub model_rev_major: u8,
    pub model_rev_minor: u8,
    pub module_rev_major: u8,
    pub module_rev_minor: u8,
    pub date: u16,
    pub time: u16,
}

impl Identification {
    pub fn is_vl6180x(&self) -> bool {
        self.model_id == MODEL_ID
    }
}

/// Current value of one register-map entry
#[derive(Debug, Clone, Serialize)]
pub struct RegisterValue {
    pub register: &'static RegisterInfo,
    pub value: u32,
}

/// One VL6180X on a shared bus
pub struct Sensor<T> {
    device: I2cDevice<T>,
}

impl<T: I2cTransport> Sensor<T> {
    pub fn new(bus: SharedBus<T>, address: u8) -> Self {
        Self {
            device: I2cDevice::new(bus, address),
        }
    }

    /// Current 7-bit bus address
    pub fn address(&self) -> u8 {
        self.device.address()
    }

    /// Check a freshly booted VL6180X answers at this address.
    ///
    /// `SYSTEM__FRESH_OUT_OF_RESET` reads 1 until the host clears it, which
    /// this driver never does.
    pub fn identify(&self) -> Result<(), SensorError> {
        let value = self
            .device
            .read_byte_register(reg::SYSTEM_FRESH_OUT_OF_RESET)?;

        if value != 1 {
            return Err(SensorError::IdentityMismatch {
                address: self.address(),
                register: reg::SYSTEM_FRESH_OUT_OF_RESET,
                expected: 1,
                actual: value,
            });
        }

        Ok(())
    }

    /// Read the identification block
    pub fn identification(&self) -> Result<Identification, SensorError> {
        Ok(Identification {
            model_id: self.device.read_byte_register(reg::IDENTIFICATION_MODEL_ID)?,
            model_rev_major: self
                .device
                .read_byte_register(reg::IDENTIFICATION_MODEL_REV_MAJOR)?,
            model_rev_minor: self
                .device
                .read_byte_register(reg::IDENTIFICATION_MODEL_REV_MINOR)?,
            module_rev_major: self
                .device
                .read_byte_register(reg::IDENTIFICATION_MODULE_REV_MAJOR)?,
            module_rev_minor: self
                .device
                .read_byte_register(reg::IDENTIFICATION_MODULE_REV_MINOR)?,
            date: self.device.read_word_register(reg::IDENTIFICATION_DATE)?,
            time: self.device.read_word_register(reg::IDENTIFICATION_TIME)?,
        })
    }

    fn write_settings(&self, settings: &[(u16, u8)]) -> Result<(), SensorError> {
        for &(register, value) in settings {
            self.device.write_byte_register(register, value)?;
        }
        Ok(())
    }

    /// Bring the sensor up: factory tuning, default settings, 1x scaling
    pub fn initialize(&self) -> Result<(), SensorError> {
        self.identify()?;

        self.write_settings(reg::FACTORY_TUNING)?;

        // On failure the hold stays set, so the chip never latches a
        // partial settings block.
        self.device
            .write_byte_register(reg::SYSTEM_GROUPED_PARAMETER_HOLD, 1)?;
        self.write_settings(reg::DEFAULT_SETTINGS)?;
        self.device
            .write_byte_register(reg::SYSTEM_GROUPED_PARAMETER_HOLD, 0)?;

        self.device.write_word_register(
            reg::SYSALS_INTEGRATION_PERIOD,
            reg::DEFAULT_ALS_INTEGRATION_PERIOD,
        )?;

        self.set_scaling(1)?;

        debug!(address = self.address(), "Sensor initialized");
        Ok(())
    }

    /// Set the range scaling factor.
    ///
    /// At 1x range values are in mm; 2x and 3x report units of 2 mm and
    /// 3 mm, trading resolution for maximum range.
    pub fn set_scaling(&self, factor: u8) -> Result<(), SensorError> {
        if !(1..=3).contains(&factor) {
            return Err(SensorError::InvalidArgument {
                address: self.address(),
                reason: format!("scale factor {} is not between 1 and 3", factor),
            });
        }

        let part_to_part_offset = self
            .device
            .read_byte_register(reg::SYSRANGE_PART_TO_PART_RANGE_OFFSET)?;

        self.device
            .write_word_register(reg::RANGE_SCALER, reg::SCALER_VALUES[factor as usize])?;
        self.device.write_byte_register(
            reg::SYSRANGE_PART_TO_PART_RANGE_OFFSET,
            part_to_part_offset / factor,
        )?;
        self.device.write_byte_register(
            reg::SYSRANGE_CROSSTALK_VALID_HEIGHT,
            reg::DEFAULT_CROSSTALK_VALID_HEIGHT / factor,
        )?;

        // Early convergence estimate check only holds up at 1x
        let check_enables = self
            .device
            .read_byte_register(reg::SYSRANGE_RANGE_CHECK_ENABLES)?;
        let early_convergence = u8::from(factor == 1);
        self.device.write_byte_register(
            reg::SYSRANGE_RANGE_CHECK_ENABLES,
            (check_enables & 0x0f) | early_convergence,
        )?;

        debug!(address = self.address(), factor = factor, "Range scaling set");
        Ok(())
    }

    /// Move the sensor to a new bus address.
    ///
    /// The local binding only changes once the device accepted the write.
    pub fn set_address(&mut self, new_address: u8) -> Result<(), SensorError> {
        self.device
            .write_byte_register(reg::I2C_SLAVE_DEVICE_ADDRESS, new_address)?;

        debug!(
            from = self.address(),
            to = new_address,
            "Sensor address changed"
        );
        self.device.rebind(new_address);
        Ok(())
    }

    /// Single-shot range measurement in mm (scaled); `timeout_ms` of 0 waits
    /// forever
    pub fn read_range_once(&self, timeout_ms: u64) -> Result<u8, SensorError> {
        self.device
            .write_byte_register(reg::SYSRANGE_START, reg::START_SINGLE_SHOT)?;
        self.read_range_continuous(timeout_ms)
    }

    /// Single-shot ambient light measurement; `timeout_ms` of 0 waits forever
    pub fn read_ambient_once(&self, timeout_ms: u64) -> Result<u16, SensorError> {
        self.device
            .write_byte_register(reg::SYSALS_START, reg::START_SINGLE_SHOT)?;
        self.read_ambient_continuous(timeout_ms)
    }

    fn interrupt_status(&self) -> Result<u8, SensorError> {
        Ok(self
            .device
            .read_byte_register(reg::RESULT_INTERRUPT_STATUS_GPIO)?)
    }

    /// Whether a new range sample is waiting
    pub fn is_range_ready(&self) -> Result<bool, SensorError> {
        Ok(self.interrupt_status()? & reg::INTERRUPT_RANGE_READY != 0)
    }

    /// Whether a new ambient light sample is waiting
    pub fn is_ambient_ready(&self) -> Result<bool, SensorError> {
        Ok(self.interrupt_status()? & reg::INTERRUPT_ALS_READY != 0)
    }

    /// Take the pending range sample, if any, and clear its interrupt
    pub fn poll_range_ready(&self) -> Result<Option<u8>, SensorError> {
        if !self.is_range_ready()? {
            return Ok(None);
        }

        let value = self.device.read_byte_register(reg::RESULT_RANGE_VAL)?;
        self.device
            .write_byte_register(reg::SYSTEM_INTERRUPT_CLEAR, reg::CLEAR_RANGE_INTERRUPT)?;

        trace!(address = self.address(), value = value, "Range sample");
        Ok(Some(value))
    }

    /// Take the pending ambient light sample, if any, and clear its interrupt
    pub fn poll_ambient_ready(&self) -> Result<Option<u16>, SensorError> {
        if !self.is_ambient_ready()? {
            return Ok(None);
        }

        let value = self.device.read_word_register(reg::RESULT_ALS_VAL)?;
        self.device
            .write_byte_register(reg::SYSTEM_INTERRUPT_CLEAR, reg::CLEAR_ALS_INTERRUPT)?;

        trace!(address = self.address(), value = value, "Ambient sample");
        Ok(Some(value))
    }

    /// Poll until `poll` yields a value.
    ///
    /// Readiness is checked before the deadline, so a value that shows up on
    /// the last poll is returned even if the deadline has just passed. A
    /// `timeout_ms` of 0 never times out.
    pub fn read_continuous<V>(
        &self,
        operation: &'static str,
        timeout_ms: u64,
        mut poll: impl FnMut(&Self) -> Result<Option<V>, SensorError>,
    ) -> Result<V, SensorError> {
        let started = Instant::now();
        let timeout = Duration::from_millis(timeout_ms);

        loop {
            if let Some(value) = poll(self)? {
                return Ok(value);
            }

            if timeout_ms != 0 && started.elapsed() > timeout {
                return Err(SensorError::Timeout {
                    address: self.address(),
                    operation,
                    timeout_ms,
                });
            }

            std::thread::yield_now();
        }
    }

    /// Wait for the next range sample in continuous (or single-shot) mode
    pub fn read_range_continuous(&self, timeout_ms: u64) -> Result<u8, SensorError> {
        self.read_continuous("range read", timeout_ms, Self::poll_range_ready)
    }

    /// Wait for the next ambient light sample in continuous (or single-shot)
    /// mode
    pub fn read_ambient_continuous(&self, timeout_ms: u64) -> Result<u16, SensorError> {
        self.read_continuous("ambient read", timeout_ms, Self::poll_ambient_ready)
    }

    /// Start continuous ranging every `period_ms` (10 ms resolution).
    ///
    /// The period must exceed the time one measurement takes (datasheet
    /// section 2.4.4).
    pub fn start_range_continuous(&self, period_ms: u16) -> Result<(), SensorError> {
        self.device.write_byte_register(
            reg::SYSRANGE_INTERMEASUREMENT_PERIOD,
            period_register(period_ms),
        )?;
        self.device
            .write_byte_register(reg::SYSRANGE_START, reg::START_CONTINUOUS)?;

        debug!(address = self.address(), period_ms = period_ms, "Continuous ranging started");
        Ok(())
    }

    /// Start continuous ambient light measurement every `period_ms`
    pub fn start_ambient_continuous(&self, period_ms: u16) -> Result<(), SensorError> {
        self.device.write_byte_register(
            reg::SYSALS_INTERMEASUREMENT_PERIOD,
            period_register(period_ms),
        )?;
        self.device
            .write_byte_register(reg::SYSALS_START, reg::START_CONTINUOUS)?;

        debug!(address = self.address(), period_ms = period_ms, "Continuous ambient started");
        Ok(())
    }

    /// Start interleaved mode: each ambient measurement is immediately
    /// followed by a range measurement. The period must cover both.
    pub fn start_interleaved_continuous(&self, period_ms: u16) -> Result<(), SensorError> {
        self.device
            .write_byte_register(reg::INTERLEAVED_MODE_ENABLE, 1)?;
        self.device.write_byte_register(
            reg::SYSALS_INTERMEASUREMENT_PERIOD,
            period_register(period_ms),
        )?;
        self.device
            .write_byte_register(reg::SYSALS_START, reg::START_CONTINUOUS)?;

        debug!(address = self.address(), period_ms = period_ms, "Interleaved mode started");
        Ok(())
    }

    /// Stop any continuous mode.
    ///
    /// If no continuous mode is running this starts a single measurement,
    /// so wait a few hundred ms before re-arming or reading.
    pub fn stop_continuous(&self) -> Result<(), SensorError> {
        self.write_settings(&[
            (reg::SYSRANGE_START, reg::START_SINGLE_SHOT),
            (reg::SYSALS_START, reg::START_SINGLE_SHOT),
            (reg::INTERLEAVED_MODE_ENABLE, 0),
        ])?;

        debug!(address = self.address(), "Continuous mode stopped");
        Ok(())
    }

    /// Drive the chained reset output to the next sensor.
    ///
    /// The pin has no read-back, so failures are logged and not returned.
    pub fn set_reset_line(&self, level: ResetLevel) {
        if let Err(e) = self
            .device
            .write_byte_register(reg::SYSTEM_MODE_GPIO1, level.gpio1_value())
        {
            warn!(
                address = self.address(),
                level = ?level,
                error = %e,
                "Failed to drive chained reset line"
            );
        }
    }

    /// Read every entry of the register map
    pub fn dump_registers(&self) -> Result<Vec<RegisterValue>, SensorError> {
        REGISTER_MAP
            .iter()
            .map(|register| {
                let value = match register.width {
                    Width::Byte => u32::from(self.device.read_byte_register(register.address)?),
                    Width::Word => u32::from(self.device.read_word_register(register.address)?),
                    Width::Long => {
                        let hi = self.device.read_word_register(register.address)?;
                        let lo = self.device.read_word_register(register.address + 2)?;
                        (u32::from(hi) << 16) | u32::from(lo)
                    }
                };
                Ok(RegisterValue { register, value })
            })
            .collect()
    }
}

impl<T> fmt::Debug for Sensor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sensor")
            .field("device", &self.device)
            .finish()
    }
}

/// Convert a period in ms to the intermeasurement period register value
fn period_register(period_ms: u16) -> u8 {
    ((period_ms / 10).saturating_sub(1)).min(MAX_PERIOD_REGISTER) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimChain;

    fn booted_sensor() -> (SimChain, Sensor<crate::sim::SimTransport>) {
        let chain = SimChain::new(1);
        chain.set_controller_reset(true);
        let sensor = Sensor::new(chain.bus(), reg::DEFAULT_ADDRESS);
        (chain, sensor)
    }

    #[test]
    fn test_period_register() {
        assert_eq!(period_register(100), 9);
        assert_eq!(period_register(10), 0);
        assert_eq!(period_register(5), 0);
        assert_eq!(period_register(2550), 254);
        assert_eq!(period_register(u16::MAX), 254);
    }

    #[test]
    fn test_identify() {
        let (chain, sensor) = booted_sensor();
        sensor.identify().unwrap();

        chain.set_register(reg::DEFAULT_ADDRESS, reg::SYSTEM_FRESH_OUT_OF_RESET, 0);
        match sensor.identify().unwrap_err() {
            SensorError::IdentityMismatch {
                address, actual, ..
            } => {
                assert_eq!(address, reg::DEFAULT_ADDRESS);
                assert_eq!(actual, 0);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_identify_without_chip_is_transport_error() {
        let chain = SimChain::new(1);
        let sensor = Sensor::new(chain.bus(), reg::DEFAULT_ADDRESS);

        assert!(matches!(
            sensor.identify().unwrap_err(),
            SensorError::Transport(_)
        ));
    }

    #[test]
    fn test_identification() {
        let (_chain, sensor) = booted_sensor();
        let id = sensor.identification().unwrap();
        assert!(id.is_vl6180x());
    }

    #[test]
    fn test_initialize_brackets_settings_with_hold() {
        let (chain, sensor) = booted_sensor();
        sensor.initialize().unwrap();

        let writes = chain.writes();
        let hold: Vec<usize> = writes
            .iter()
            .enumerate()
            .filter(|(_, w)| w.register == reg::SYSTEM_GROUPED_PARAMETER_HOLD)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(hold.len(), 2);
        assert_eq!(writes[hold[0]].value, 1);
        assert_eq!(writes[hold[1]].value, 0);

        let bracketed: Vec<(u16, u16)> = writes[hold[0] + 1..hold[1]]
            .iter()
            .map(|w| (w.register, w.value))
            .collect();
        let expected: Vec<(u16, u16)> = reg::DEFAULT_SETTINGS
            .iter()
            .map(|&(r, v)| (r, u16::from(v)))
            .collect();
        assert_eq!(bracketed, expected);

        assert_eq!(
            chain.writes_to(reg::DEFAULT_ADDRESS, reg::SYSALS_INTEGRATION_PERIOD),
            vec![reg::DEFAULT_ALS_INTEGRATION_PERIOD]
        );
        // Factory tuning clears the scaler byte, then 1x scaling is applied
        assert_eq!(
            chain.writes_to(reg::DEFAULT_ADDRESS, reg::RANGE_SCALER),
            vec![0, 253]
        );
    }

    #[test]
    fn test_set_scaling_rewrites_dependent_registers() {
        for factor in 1..=3u8 {
            let (chain, sensor) = booted_sensor();
            let addr = reg::DEFAULT_ADDRESS;
            chain.set_register(addr, reg::SYSRANGE_PART_TO_PART_RANGE_OFFSET, 30);
            chain.set_register(addr, reg::SYSRANGE_RANGE_CHECK_ENABLES, 0xf0 | 0x02);

            sensor.set_scaling(factor).unwrap();

            assert_eq!(
                chain.writes_to(addr, reg::RANGE_SCALER),
                vec![reg::SCALER_VALUES[factor as usize]]
            );
            assert_eq!(
                chain.writes_to(addr, reg::SYSRANGE_PART_TO_PART_RANGE_OFFSET),
                vec![u16::from(30 / factor)]
            );
            assert_eq!(
                chain.writes_to(addr, reg::SYSRANGE_CROSSTALK_VALID_HEIGHT),
                vec![u16::from(20 / factor)]
            );
            let early = if factor == 1 { 1 } else { 0 };
            assert_eq!(
                chain.writes_to(addr, reg::SYSRANGE_RANGE_CHECK_ENABLES),
                vec![0x02 | early]
            );
        }
    }

    #[test]
    fn test_set_scaling_rejects_bad_factor_without_bus_access() {
        let (chain, sensor) = booted_sensor();

        for factor in [0u8, 4, 255] {
            let err = sensor.set_scaling(factor).unwrap_err();
            assert!(matches!(err, SensorError::InvalidArgument { .. }));
        }

        assert_eq!(chain.transactions(), 0);
    }

    #[test]
    fn test_set_address() {
        let (chain, mut sensor) = booted_sensor();

        sensor.set_address(0x30).unwrap();
        assert_eq!(sensor.address(), 0x30);
        assert_eq!(chain.chip_addresses(), vec![Some(0x30)]);

        // Subsequent transactions target the new address
        sensor.identify().unwrap();
    }

    #[test]
    fn test_set_address_failure_keeps_binding() {
        let (chain, mut sensor) = booted_sensor();
        chain.fail_register(reg::DEFAULT_ADDRESS, reg::I2C_SLAVE_DEVICE_ADDRESS);

        assert!(sensor.set_address(0x30).is_err());
        assert_eq!(sensor.address(), reg::DEFAULT_ADDRESS);
        assert_eq!(chain.chip_addresses(), vec![Some(reg::DEFAULT_ADDRESS)]);
    }

    #[test]
    fn test_poll_range_ready_consumes_and_clears() {
        let (chain, sensor) = booted_sensor();
        assert_eq!(sensor.poll_range_ready().unwrap(), None);

        chain.push_range_samples(reg::DEFAULT_ADDRESS, &[42, 43]);
        assert!(sensor.is_range_ready().unwrap());
        assert_eq!(sensor.poll_range_ready().unwrap(), Some(42));
        assert_eq!(sensor.poll_range_ready().unwrap(), Some(43));
        assert_eq!(sensor.poll_range_ready().unwrap(), None);

        assert_eq!(
            chain.writes_to(reg::DEFAULT_ADDRESS, reg::SYSTEM_INTERRUPT_CLEAR),
            vec![u16::from(reg::CLEAR_RANGE_INTERRUPT); 2]
        );
    }

    #[test]
    fn test_poll_ambient_ready() {
        let (chain, sensor) = booted_sensor();
        chain.push_ambient_samples(reg::DEFAULT_ADDRESS, &[1234]);

        assert!(!sensor.is_range_ready().unwrap());
        assert_eq!(sensor.poll_ambient_ready().unwrap(), Some(1234));
        assert_eq!(sensor.poll_ambient_ready().unwrap(), None);
    }

    #[test]
    fn test_read_once_triggers_single_shot() {
        let (chain, sensor) = booted_sensor();
        chain.push_range_samples(reg::DEFAULT_ADDRESS, &[77]);
        chain.push_ambient_samples(reg::DEFAULT_ADDRESS, &[512]);

        assert_eq!(sensor.read_range_once(100).unwrap(), 77);
        assert_eq!(sensor.read_ambient_once(100).unwrap(), 512);
        assert_eq!(
            chain.writes_to(reg::DEFAULT_ADDRESS, reg::SYSRANGE_START),
            vec![u16::from(reg::START_SINGLE_SHOT)]
        );
        assert_eq!(
            chain.writes_to(reg::DEFAULT_ADDRESS, reg::SYSALS_START),
            vec![u16::from(reg::START_SINGLE_SHOT)]
        );
    }

    #[test]
    fn test_read_range_times_out() {
        let (_chain, sensor) = booted_sensor();

        let err = sensor.read_range_once(5).unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(err.address(), reg::DEFAULT_ADDRESS);
    }

    #[test]
    fn test_read_continuous_zero_timeout_waits() {
        let (_chain, sensor) = booted_sensor();
        let started = Instant::now();
        let mut polls = 0;

        let value = sensor
            .read_continuous("test", 0, |_| {
                polls += 1;
                if started.elapsed() > Duration::from_millis(20) {
                    Ok(Some(polls))
                } else {
                    Ok(None)
                }
            })
            .unwrap();

        assert!(value > 1);
    }

    #[test]
    fn test_read_continuous_readiness_beats_deadline() {
        let (_chain, sensor) = booted_sensor();

        let value = sensor
            .read_continuous("test", 1, |_| {
                std::thread::sleep(Duration::from_millis(5));
                Ok(Some(9u8))
            })
            .unwrap();

        assert_eq!(value, 9);
    }

    #[test]
    fn test_read_continuous_propagates_poll_error() {
        let (chain, sensor) = booted_sensor();
        chain.fail_register(reg::DEFAULT_ADDRESS, reg::RESULT_INTERRUPT_STATUS_GPIO);

        let err = sensor.read_range_continuous(0).unwrap_err();
        assert!(matches!(err, SensorError::Transport(_)));
    }

    #[test]
    fn test_continuous_modes() {
        let (chain, sensor) = booted_sensor();
        let addr = reg::DEFAULT_ADDRESS;

        sensor.start_range_continuous(100).unwrap();
        sensor.start_ambient_continuous(500).unwrap();
        sensor.start_interleaved_continuous(3000).unwrap();
        sensor.stop_continuous().unwrap();

        assert_eq!(
            chain.writes_to(addr, reg::SYSRANGE_INTERMEASUREMENT_PERIOD),
            vec![9]
        );
        assert_eq!(
            chain.writes_to(addr, reg::SYSALS_INTERMEASUREMENT_PERIOD),
            vec![49, 254]
        );
        assert_eq!(chain.writes_to(addr, reg::SYSRANGE_START), vec![0x03, 0x01]);
        assert_eq!(chain.writes_to(addr, reg::SYSALS_START), vec![0x03, 0x03, 0x01]);
        assert_eq!(chain.writes_to(addr, reg::INTERLEAVED_MODE_ENABLE), vec![1, 0]);
    }

    #[test]
    fn test_set_reset_line_swallows_errors() {
        let (chain, sensor) = booted_sensor();

        sensor.set_reset_line(ResetLevel::High);
        assert_eq!(
            chain.register(reg::DEFAULT_ADDRESS, reg::SYSTEM_MODE_GPIO1),
            reg::GPIO1_DRIVE_HIGH
        );

        chain.fail_register(reg::DEFAULT_ADDRESS, reg::SYSTEM_MODE_GPIO1);
        sensor.set_reset_line(ResetLevel::Low);
        assert_eq!(
            chain.register(reg::DEFAULT_ADDRESS, reg::SYSTEM_MODE_GPIO1),
            reg::GPIO1_DRIVE_HIGH
        );
    }

    #[test]
    fn test_dump_registers_covers_map() {
        let (_chain, sensor) = booted_sensor();
        let dump = sensor.dump_registers().unwrap();

        assert_eq!(dump.len(), REGISTER_MAP.len());
        let fresh = dump
            .iter()
            .find(|r| r.register.address == reg::SYSTEM_FRESH_OUT_OF_RESET)
            .unwrap();
        assert_eq!(fresh.value, 1);
    }
}
