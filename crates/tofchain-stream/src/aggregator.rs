//! Group range streaming
//!
//! One blocking task per stream owns the whole run: arm every sensor,
//! settle, sweep the group until stopped, then stop every sensor. The
//! reading channel is closed only after that teardown, so a closed channel
//! means the sensors are idle again.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tofchain_core::{SensorError, SensorGroup};
use tofchain_i2c::I2cTransport;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::stop::StopToken;

/// Wait between attempts to publish into a full channel
const PUBLISH_RETRY: Duration = Duration::from_millis(1);

#[derive(Error, Debug)]
pub enum StreamError {
    #[error("failed to start continuous ranging on {address:#04x}: {source}")]
    Arm { address: u8, source: SensorError },
    #[error("range poll of {address:#04x} failed: {source}")]
    Poll { address: u8, source: SensorError },
    #[error("failed to stop continuous ranging on {address:#04x}: {source}")]
    Teardown { address: u8, source: SensorError },
}

impl StreamError {
    pub fn address(&self) -> u8 {
        match self {
            Self::Arm { address, .. }
            | Self::Poll { address, .. }
            | Self::Teardown { address, .. } => *address,
        }
    }
}

/// Stream timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConfig {
    /// Inter-measurement period each sensor is armed with (10 ms steps)
    pub period_ms: u16,
    /// Wait after arming before the first sweep
    pub settle: Duration,
    /// Pause between sweeps; zero busy-polls with a yield between sweeps
    pub sweep_delay: Duration,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            period_ms: 100,
            settle: Duration::from_millis(100),
            sweep_delay: Duration::ZERO,
        }
    }
}

/// A distance that differs from the previous one published for the sensor
#[derive(Debug, Clone, Serialize)]
pub struct RangeReading {
    /// Position of the sensor in its group
    pub index: usize,
    pub address: u8,
    /// Scaled distance; mm at 1x scaling
    pub distance: u8,
    pub observed_at: DateTime<Utc>,
}

/// Start streaming range changes from every sensor in `group`.
///
/// The task runs until `stop` fires or the receiver is dropped, and on any
/// error. Sensors are stopped in group order before the receiver sees the
/// end of the stream. A run's first reading from each sensor is always
/// published.
pub fn spawn_range_stream<T>(
    group: Arc<SensorGroup<T>>,
    config: StreamConfig,
    stop: StopToken,
) -> (JoinHandle<Result<(), StreamError>>, mpsc::Receiver<RangeReading>)
where
    T: I2cTransport + Send + 'static,
{
    let (tx, rx) = mpsc::channel(group.len().max(1));

    let handle = tokio::task::spawn_blocking(move || {
        let result = run(&group, &config, &stop, &tx);
        // Closing the channel tells the consumer teardown has finished
        drop(tx);
        result
    });

    (handle, rx)
}

fn run<T: I2cTransport>(
    group: &SensorGroup<T>,
    config: &StreamConfig,
    stop: &StopToken,
    tx: &mpsc::Sender<RangeReading>,
) -> Result<(), StreamError> {
    info!(
        sensors = group.len(),
        period_ms = config.period_ms,
        "Range stream starting"
    );

    let outcome = arm(group, config).and_then(|()| {
        thread::sleep(config.settle);
        poll_loop(group, config, stop, tx)
    });
    let teardown = teardown(group);

    match (outcome, teardown) {
        (Ok(()), teardown) => {
            info!("Range stream stopped");
            teardown
        }
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(teardown_error)) => {
            warn!(error = %teardown_error, "Teardown also failed after stream error");
            Err(e)
        }
    }
}

fn arm<T: I2cTransport>(group: &SensorGroup<T>, config: &StreamConfig) -> Result<(), StreamError> {
    for sensor in group {
        sensor
            .start_range_continuous(config.period_ms)
            .map_err(|source| StreamError::Arm {
                address: sensor.address(),
                source,
            })?;
    }
    Ok(())
}

fn poll_loop<T: I2cTransport>(
    group: &SensorGroup<T>,
    config: &StreamConfig,
    stop: &StopToken,
    tx: &mpsc::Sender<RangeReading>,
) -> Result<(), StreamError> {
    let mut last_published: HashMap<u8, u8> = HashMap::new();

    loop {
        // Covers empty groups, which have no per-sensor check
        if stop.is_stopped() {
            return Ok(());
        }

        for (index, sensor) in group.iter().enumerate() {
            if stop.is_stopped() {
                debug!("Stop requested");
                return Ok(());
            }

            let address = sensor.address();
            let Some(distance) = sensor
                .poll_range_ready()
                .map_err(|source| StreamError::Poll { address, source })?
            else {
                continue;
            };

            if last_published.insert(address, distance) == Some(distance) {
                continue;
            }

            let reading = RangeReading {
                index,
                address,
                distance,
                observed_at: Utc::now(),
            };
            if !publish(tx, stop, reading) {
                return Ok(());
            }
        }

        if config.sweep_delay.is_zero() {
            thread::yield_now();
        } else {
            thread::sleep(config.sweep_delay);
        }
    }
}

/// Hand a reading to the consumer, waiting while the channel is full.
///
/// Returns false once the stream should end: a stop was requested while
/// waiting, or the consumer is gone.
fn publish(tx: &mpsc::Sender<RangeReading>, stop: &StopToken, mut reading: RangeReading) -> bool {
    loop {
        match tx.try_send(reading) {
            Ok(()) => return true,
            Err(TrySendError::Closed(_)) => {
                debug!("Reading consumer went away");
                return false;
            }
            Err(TrySendError::Full(pending)) => {
                if stop.is_stopped() {
                    debug!("Stop requested while the consumer was behind");
                    return false;
                }
                reading = pending;
                thread::sleep(PUBLISH_RETRY);
            }
        }
    }
}

/// Stop every sensor, even after a failure, and report the first failure
fn teardown<T: I2cTransport>(group: &SensorGroup<T>) -> Result<(), StreamError> {
    let mut first_error = None;

    for sensor in group {
        if let Err(source) = sensor.stop_continuous() {
            let address = sensor.address();
            warn!(address, error = %source, "Failed to stop continuous ranging");
            first_error.get_or_insert(StreamError::Teardown { address, source });
        }
    }

    first_error.map_or(Ok(()), Err)
}
