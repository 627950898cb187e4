//! tofchain Daemon - Main entry point
//!
//! Addresses a reset-chained group of VL6180X sensors and streams their
//! range changes to stdout until interrupted.

mod bringup;
mod config;
mod output;
mod reset;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tofchain_i2c::{list_bus_units, Bus, RppalTransport, SharedBus};
use tofchain_stream::{spawn_range_stream, stop_signal};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use crate::config::Config;
use crate::reset::ResetPin;

#[derive(Parser, Debug)]
#[command(name = "tofchain")]
#[command(about = "VL6180X reset-chain addressing and range streaming")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "tofchain.toml")]
    config: PathBuf,

    /// I2C bus unit number, overrides the configuration
    #[arg(short, long)]
    bus: Option<u8>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// List the I2C bus units present and exit
    #[arg(long)]
    list_buses: bool,

    /// Scan the bus for already addressed sensors and exit
    #[arg(long)]
    scan_once: bool,

    /// With --scan-once, also dump every known register
    #[arg(long, requires = "scan_once")]
    dump_registers: bool,

    /// Print readings and scan results as JSON
    #[arg(long)]
    json: bool,

    /// Write a default configuration file and exit
    #[arg(long)]
    init_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Readings go to stdout, logs to stderr
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("tofchain v{}", env!("CARGO_PKG_VERSION"));

    if args.init_config {
        config::save_default_config(&args.config)?;
        println!("Wrote default configuration to {}", args.config.display());
        return Ok(());
    }

    if args.list_buses {
        let units = list_bus_units().context("Failed to list I2C buses")?;
        if units.is_empty() {
            println!("No I2C buses found");
        }
        for unit in units {
            println!("/dev/i2c-{}", unit);
        }
        return Ok(());
    }

    let mut config = config::load_config(&args.config)?;
    if let Some(unit) = args.bus {
        config.bus.unit = unit;
    }

    info!(
        unit = config.bus.unit,
        start_address = config.chain.start_address,
        reset_pin = config.chain.reset_pin,
        "Configuration loaded"
    );

    let bus = Bus::open(config.bus.unit)
        .with_context(|| format!("Failed to open /dev/i2c-{}", config.bus.unit))?;
    info!(unit = bus.transport().unit(), "I2C bus opened");
    let bus = bus.into_shared();

    let result = if args.scan_once {
        scan_once(bus.clone(), args.dump_registers, args.json).await
    } else {
        stream(bus.clone(), &config, args.json).await
    };

    bringup::close_bus(bus);
    result
}

async fn scan_once(bus: SharedBus<RppalTransport>, dump_registers: bool, json: bool) -> Result<()> {
    info!("Running single bus scan");
    let entries =
        tokio::task::spawn_blocking(move || bringup::scan_report(&bus, dump_registers)).await??;
    print!("{}", output::format_scan(&entries, json)?);
    Ok(())
}

async fn stream(bus: SharedBus<RppalTransport>, config: &Config, json: bool) -> Result<()> {
    let reset = ResetPin::open(config.chain.reset_pin)?;

    // Chain bring-up blocks for hundreds of ms per sensor
    let chain_config = config.clone();
    let group = tokio::task::spawn_blocking(move || {
        bringup::bring_up_chain(&bus, &chain_config, || reset.hold(), || reset.release())
    })
    .await??;

    if group.is_empty() {
        warn!("No sensors answered on the chain");
        return Ok(());
    }

    let (stop, token) = stop_signal();
    let (handle, mut readings) =
        spawn_range_stream(Arc::new(group), config.stream_config(), token);

    loop {
        tokio::select! {
            reading = readings.recv() => match reading {
                Some(reading) => println!("{}", output::format_reading(&reading, json)?),
                // Closed only after every sensor was stopped
                None => break,
            },
            signal = tokio::signal::ctrl_c() => {
                signal?;
                info!("Interrupted, stopping sensors");
                stop.stop();
            }
        }
    }

    handle.await??;
    info!("Range stream finished");
    Ok(())
}
