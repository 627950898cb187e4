//! Configuration loading

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tofchain_discovery::ChainTiming;
use tofchain_stream::StreamConfig;
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub bus: BusConfig,
    #[serde(default)]
    pub chain: ChainConfig,
    #[serde(default)]
    pub sensor: SensorConfig,
    #[serde(default)]
    pub stream: StreamSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusConfig {
    /// I2C bus unit number (`/dev/i2c-N`)
    #[serde(default = "default_unit")]
    pub unit: u8,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            unit: default_unit(),
        }
    }
}

fn default_unit() -> u8 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Address given to the first sensor in the chain
    #[serde(default = "default_start_address")]
    pub start_address: u8,
    /// BCM number of the GPIO wired to the first sensor's GPIO0/CE
    #[serde(default = "default_reset_pin")]
    pub reset_pin: u8,
    /// How long each sensor is held in reset
    #[serde(default = "default_reset_settle_ms")]
    pub reset_settle_ms: u64,
    /// Boot time after releasing reset
    #[serde(default = "default_boot_ms")]
    pub boot_ms: u64,
    /// Keep streaming the sensors addressed before a chain failure
    #[serde(default)]
    pub keep_partial: bool,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            start_address: default_start_address(),
            reset_pin: default_reset_pin(),
            reset_settle_ms: default_reset_settle_ms(),
            boot_ms: default_boot_ms(),
            keep_partial: false,
        }
    }
}

fn default_start_address() -> u8 {
    0x30
}

fn default_reset_pin() -> u8 {
    17
}

fn default_reset_settle_ms() -> u64 {
    10
}

fn default_boot_ms() -> u64 {
    400
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorConfig {
    /// Range scaling factor, 1 to 3
    #[serde(default = "default_scaling")]
    pub scaling: u8,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            scaling: default_scaling(),
        }
    }
}

fn default_scaling() -> u8 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamSection {
    /// Inter-measurement period, 10 ms resolution
    #[serde(default = "default_period_ms")]
    pub period_ms: u16,
    /// Wait after arming before polling
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
    /// Pause between polling sweeps (0 = busy poll)
    #[serde(default)]
    pub sweep_delay_ms: u64,
}

impl Default for StreamSection {
    fn default() -> Self {
        Self {
            period_ms: default_period_ms(),
            settle_ms: default_settle_ms(),
            sweep_delay_ms: 0,
        }
    }
}

fn default_period_ms() -> u16 {
    100
}

fn default_settle_ms() -> u64 {
    100
}

impl Config {
    pub fn chain_timing(&self) -> ChainTiming {
        ChainTiming {
            reset_settle: Duration::from_millis(self.chain.reset_settle_ms),
            boot: Duration::from_millis(self.chain.boot_ms),
        }
    }

    pub fn stream_config(&self) -> StreamConfig {
        StreamConfig {
            period_ms: self.stream.period_ms,
            settle: Duration::from_millis(self.stream.settle_ms),
            sweep_delay: Duration::from_millis(self.stream.sweep_delay_ms),
        }
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(Config::default())
    }
}

/// Save default configuration to file
pub fn save_default_config(path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(&Config::default())?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("tofchain.toml")).unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.chain.start_address, 0x30);
        assert_eq!(config.chain_timing(), ChainTiming::default());
        assert_eq!(config.stream_config(), StreamConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tofchain.toml");
        std::fs::write(
            &path,
            "[chain]\nstart_address = 64\n\n[stream]\nsweep_delay_ms = 5\n",
        )
        .unwrap();

        let config = load_config(&path).unwrap();

        assert_eq!(config.chain.start_address, 0x40);
        assert_eq!(config.chain.boot_ms, 400);
        assert_eq!(config.stream.sweep_delay_ms, 5);
        assert_eq!(config.stream.period_ms, 100);
        assert_eq!(config.bus.unit, 1);
    }

    #[test]
    fn test_saved_default_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tofchain.toml");

        save_default_config(&path).unwrap();

        assert_eq!(load_config(&path).unwrap(), Config::default());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tofchain.toml");
        std::fs::write(&path, "[sensor]\nscaling = \"lots\"\n").unwrap();

        assert!(load_config(&path).is_err());
    }
}
