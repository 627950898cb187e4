//! Ordered group of individually addressed sensors

use std::fmt;
use tofchain_i2c::I2cTransport;
use tracing::info;

use crate::error::SensorError;
use crate::sensor::Sensor;

/// Sensors in discovery order, each at its own address.
///
/// The order is the chain order and is kept for round-robin polling.
pub struct SensorGroup<T> {
    sensors: Vec<Sensor<T>>,
}

impl<T: I2cTransport> SensorGroup<T> {
    pub fn new() -> Self {
        Self {
            sensors: Vec::new(),
        }
    }

    /// Build a group, rejecting duplicate addresses
    pub fn from_sensors(sensors: Vec<Sensor<T>>) -> Result<Self, SensorError> {
        let mut group = Self::new();
        for sensor in sensors {
            group.push(sensor)?;
        }
        Ok(group)
    }

    /// Append a sensor; its address must not already be in the group
    pub fn push(&mut self, sensor: Sensor<T>) -> Result<(), SensorError> {
        if self.contains(sensor.address()) {
            return Err(SensorError::InvalidArgument {
                address: sensor.address(),
                reason: "address already used by another sensor in the group".to_string(),
            });
        }
        self.sensors.push(sensor);
        Ok(())
    }

    pub fn contains(&self, address: u8) -> bool {
        self.sensors.iter().any(|s| s.address() == address)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sensor<T>> {
        self.sensors.iter()
    }

    /// Most recently added sensor
    pub fn last(&self) -> Option<&Sensor<T>> {
        self.sensors.last()
    }

    /// Addresses in group order
    pub fn addresses(&self) -> Vec<u8> {
        self.sensors.iter().map(Sensor::address).collect()
    }

    /// Initialize every sensor in order, stopping at the first failure
    pub fn initialize(&self) -> Result<(), SensorError> {
        for sensor in &self.sensors {
            sensor.initialize()?;
        }
        info!(count = self.sensors.len(), "Sensor group initialized");
        Ok(())
    }

    /// Apply one scaling factor to every sensor
    pub fn set_scaling(&self, factor: u8) -> Result<(), SensorError> {
        for sensor in &self.sensors {
            sensor.set_scaling(factor)?;
        }
        Ok(())
    }
}

impl<T> SensorGroup<T> {
    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }
}

impl<T: I2cTransport> Default for SensorGroup<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T: I2cTransport> IntoIterator for &'a SensorGroup<T> {
    type Item = &'a Sensor<T>;
    type IntoIter = std::slice::Iter<'a, Sensor<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T> fmt::Debug for SensorGroup<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.sensors).finish()
    }
}
