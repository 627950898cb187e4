//! Host GPIO driving the first sensor's GPIO0/CE input

use anyhow::{Context, Result};
use rppal::gpio::{Gpio, OutputPin};
use std::cell::RefCell;
use tracing::{debug, trace};

/// Reset line of the first sensor in the chain.
///
/// Low holds the sensor in reset, high lets it boot.
pub struct ResetPin {
    pin: RefCell<OutputPin>,
    number: u8,
}

impl ResetPin {
    /// Claim BCM GPIO `number` as an output, initially high
    pub fn open(number: u8) -> Result<Self> {
        let gpio = Gpio::new().context("Failed to access GPIO")?;
        let mut pin = gpio
            .get(number)
            .with_context(|| format!("Failed to claim GPIO {}", number))?
            .into_output_high();
        // The chain has to stay powered after the process exits
        pin.set_reset_on_drop(false);

        debug!(pin = number, "Reset pin claimed");
        Ok(Self {
            pin: RefCell::new(pin),
            number,
        })
    }

    pub fn hold(&self) {
        trace!(pin = self.number, "Reset asserted");
        self.pin.borrow_mut().set_low();
    }

    pub fn release(&self) {
        trace!(pin = self.number, "Reset released");
        self.pin.borrow_mut().set_high();
    }
}
