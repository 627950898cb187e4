//! Simulated chain of VL6180X sensors behind an I2C transport
//!
//! Each chip's GPIO0/CE input is driven either by the controller reset pin
//! (first chip) or by the previous chip's GPIO1 output. A chip boots at the
//! default address when its enable line goes high and loses all state when it
//! goes low. Sample queues, register overrides and per-register faults make
//! the driver's polling paths testable.

use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tofchain_i2c::{Bus, I2cTransport, SharedBus};

use crate::registers as reg;
use crate::sensor::MODEL_ID;

/// Part-to-part range offset a simulated chip boots with
const BOOT_PART_TO_PART_OFFSET: u8 = 12;
/// Range check enables a simulated chip boots with
const BOOT_RANGE_CHECK_ENABLES: u8 = 0x10;

/// A register write observed on the simulated bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimWrite {
    pub address: u8,
    pub register: u16,
    pub value: u16,
}

#[derive(Default)]
struct SimChip {
    powered: bool,
    address: u8,
    registers: HashMap<u16, u8>,
    range_samples: VecDeque<u8>,
    ambient_samples: VecDeque<u16>,
}

impl SimChip {
    fn boot(&mut self) {
        self.powered = true;
        self.address = reg::DEFAULT_ADDRESS;
        self.registers.clear();
        self.range_samples.clear();
        self.ambient_samples.clear();

        self.registers.insert(reg::IDENTIFICATION_MODEL_ID, MODEL_ID);
        self.registers.insert(reg::SYSTEM_FRESH_OUT_OF_RESET, 1);
        // GPIO1 comes up holding the next chip in reset
        self.registers
            .insert(reg::SYSTEM_MODE_GPIO1, reg::GPIO1_DRIVE_LOW);
        self.registers
            .insert(reg::SYSRANGE_PART_TO_PART_RANGE_OFFSET, BOOT_PART_TO_PART_OFFSET);
        self.registers
            .insert(reg::SYSRANGE_RANGE_CHECK_ENABLES, BOOT_RANGE_CHECK_ENABLES);
    }

    fn power_down(&mut self) {
        self.powered = false;
    }

    fn releases_next(&self) -> bool {
        self.powered && self.register(reg::SYSTEM_MODE_GPIO1) == reg::GPIO1_DRIVE_HIGH
    }

    fn register(&self, register: u16) -> u8 {
        match register {
            reg::RESULT_INTERRUPT_STATUS_GPIO => {
                let mut status = 0;
                if !self.range_samples.is_empty() {
                    status |= reg::INTERRUPT_RANGE_READY;
                }
                if !self.ambient_samples.is_empty() {
                    status |= reg::INTERRUPT_ALS_READY;
                }
                status
            }
            reg::RESULT_RANGE_VAL => self.range_samples.front().copied().unwrap_or(0),
            reg::RESULT_ALS_VAL => {
                (self.ambient_samples.front().copied().unwrap_or(0) >> 8) as u8
            }
            r if r == reg::RESULT_ALS_VAL + 1 => {
                self.ambient_samples.front().copied().unwrap_or(0) as u8
            }
            _ => self.registers.get(&register).copied().unwrap_or(0),
        }
    }

    fn write(&mut self, register: u16, value: u8) {
        self.registers.insert(register, value);

        match register {
            reg::I2C_SLAVE_DEVICE_ADDRESS => self.address = value & 0x7f,
            reg::SYSTEM_INTERRUPT_CLEAR => {
                if value & reg::CLEAR_RANGE_INTERRUPT != 0 {
                    self.range_samples.pop_front();
                }
                if value & reg::CLEAR_ALS_INTERRUPT != 0 {
                    self.ambient_samples.pop_front();
                }
            }
            _ => {}
        }
    }
}

#[derive(Default)]
struct ChainState {
    chips: Vec<SimChip>,
    controller_high: bool,
    selected: Option<u8>,
    pending_read: Option<u16>,
    /// Successful accesses left before an injected fault fires
    faults: HashMap<(u8, u16), usize>,
    writes: Vec<SimWrite>,
    transactions: usize,
}

impl ChainState {
    fn update_power(&mut self) {
        let mut enabled = self.controller_high;
        for chip in &mut self.chips {
            if enabled && !chip.powered {
                chip.boot();
            } else if !enabled && chip.powered {
                chip.power_down();
            }
            enabled = chip.releases_next();
        }
    }

    fn chip_at(&mut self, address: u8) -> Option<&mut SimChip> {
        self.chips
            .iter_mut()
            .find(|c| c.powered && c.address == address)
    }

    fn selected_chip(&mut self) -> io::Result<(u8, &mut SimChip)> {
        let address = self
            .selected
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "no slave selected"))?;
        let chip = self.chip_at(address).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotConnected,
                format!("no acknowledge from {:#04x}", address),
            )
        })?;
        Ok((address, chip))
    }

    fn check_fault(&mut self, address: u8, register: u16) -> io::Result<()> {
        match self.faults.get_mut(&(address, register)) {
            Some(0) => Err(io::Error::new(
                io::ErrorKind::Other,
                format!("injected fault at {:#04x}:{:#06x}", address, register),
            )),
            Some(remaining) => {
                *remaining -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

/// Handle to a simulated chain; clones share the same chips
#[derive(Clone, Default)]
pub struct SimChain {
    state: Arc<Mutex<ChainState>>,
}

impl SimChain {
    /// A chain of `len` chips, all held in reset
    pub fn new(len: usize) -> Self {
        let chips = (0..len).map(|_| SimChip::default()).collect();
        Self {
            state: Arc::new(Mutex::new(ChainState {
                chips,
                ..Default::default()
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, ChainState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn transport(&self) -> SimTransport {
        SimTransport {
            state: self.state.clone(),
        }
    }

    /// A shared bus on top of this chain
    pub fn bus(&self) -> SharedBus<SimTransport> {
        Bus::new(self.transport()).into_shared()
    }

    /// Drive the controller pin wired to the first chip's GPIO0/CE
    pub fn set_controller_reset(&self, high: bool) {
        let mut state = self.state();
        state.controller_high = high;
        state.update_power();
    }

    /// Address of every chip, `None` for chips held in reset
    pub fn chip_addresses(&self) -> Vec<Option<u8>> {
        self.state()
            .chips
            .iter()
            .map(|c| c.powered.then_some(c.address))
            .collect()
    }

    pub fn push_range_samples(&self, address: u8, samples: &[u8]) {
        if let Some(chip) = self.state().chip_at(address) {
            chip.range_samples.extend(samples);
        }
    }

    pub fn push_ambient_samples(&self, address: u8, samples: &[u16]) {
        if let Some(chip) = self.state().chip_at(address) {
            chip.ambient_samples.extend(samples);
        }
    }

    /// Overwrite a register without logging a write
    pub fn set_register(&self, address: u8, register: u16, value: u8) {
        if let Some(chip) = self.state().chip_at(address) {
            chip.registers.insert(register, value);
        }
    }

    pub fn register(&self, address: u8, register: u16) -> u8 {
        self.state()
            .chip_at(address)
            .map(|c| c.register(register))
            .unwrap_or(0)
    }

    /// Make every access to `register` on `address` fail
    pub fn fail_register(&self, address: u8, register: u16) {
        self.fail_register_after(address, register, 0);
    }

    /// Let `successes` accesses to `register` on `address` through, then
    /// fail every later one
    pub fn fail_register_after(&self, address: u8, register: u16, successes: usize) {
        self.state().faults.insert((address, register), successes);
    }

    pub fn writes(&self) -> Vec<SimWrite> {
        self.state().writes.clone()
    }

    /// Values written to one register of one address, in order
    pub fn writes_to(&self, address: u8, register: u16) -> Vec<u16> {
        self.state()
            .writes
            .iter()
            .filter(|w| w.address == address && w.register == register)
            .map(|w| w.value)
            .collect()
    }

    /// Number of write and read transfers seen so far
    pub fn transactions(&self) -> usize {
        self.state().transactions
    }
}

/// The I2C side of a [`SimChain`]
pub struct SimTransport {
    state: Arc<Mutex<ChainState>>,
}

impl SimTransport {
    fn state(&self) -> MutexGuard<'_, ChainState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl I2cTransport for SimTransport {
    fn select(&mut self, address: u8) -> io::Result<()> {
        self.state().selected = Some(address);
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        let mut state = self.state();
        state.transactions += 1;

        if bytes.len() < 2 || bytes.len() > 4 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("unexpected {}-byte write", bytes.len()),
            ));
        }

        let register = u16::from_be_bytes([bytes[0], bytes[1]]);
        let (address, _) = state.selected_chip()?;
        state.check_fault(address, register)?;

        if bytes.len() == 2 {
            state.pending_read = Some(register);
            return Ok(bytes.len());
        }

        let value = {
            let (_, chip) = state.selected_chip()?;
            chip.write(register, bytes[2]);
            if let Some(&low) = bytes.get(3) {
                chip.write(register + 1, low);
                u16::from_be_bytes([bytes[2], low])
            } else {
                u16::from(bytes[2])
            }
        };

        state.writes.push(SimWrite {
            address,
            register,
            value,
        });
        if register == reg::SYSTEM_MODE_GPIO1 {
            state.update_power();
        }

        Ok(bytes.len())
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.state();
        state.transactions += 1;

        let register = state.pending_read.take().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "read without register address")
        })?;
        let (_, chip) = state.selected_chip()?;

        for (offset, byte) in buf.iter_mut().enumerate() {
            *byte = chip.register(register + offset as u16);
        }

        Ok(buf.len())
    }
}
