//! Sensor driver errors

use thiserror::Error;
use tofchain_i2c::BusError;

#[derive(Error, Debug)]
pub enum SensorError {
    /// The register transaction itself failed
    #[error(transparent)]
    Transport(#[from] BusError),
    /// A fixed-value register did not hold the expected constant
    #[error(
        "device {address:#04x} register {register:#06x}: expected {expected:#04x}, got {actual:#04x}"
    )]
    IdentityMismatch {
        address: u8,
        register: u16,
        expected: u8,
        actual: u8,
    },
    /// A caller-supplied parameter was outside its valid domain
    #[error("device {address:#04x}: {reason}")]
    InvalidArgument { address: u8, reason: String },
    /// A polled condition did not become true before the deadline
    #[error("device {address:#04x}: {operation} timed out after {timeout_ms} ms")]
    Timeout {
        address: u8,
        operation: &'static str,
        timeout_ms: u64,
    },
}

impl SensorError {
    /// Address of the device the error concerns
    pub fn address(&self) -> u8 {
        match self {
            Self::Transport(e) => e.address(),
            Self::IdentityMismatch { address, .. }
            | Self::InvalidArgument { address, .. }
            | Self::Timeout { address, .. } => *address,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
