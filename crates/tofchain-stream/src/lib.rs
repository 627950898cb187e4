//! tofchain Stream - Continuous ranging across a sensor group
//!
//! Arms every sensor of a group in continuous range mode, polls them in
//! group order and publishes each changed distance on a channel until
//! stopped. Sensors are always returned to idle before the channel closes.

pub mod aggregator;
pub mod stop;

pub use aggregator::{spawn_range_stream, RangeReading, StreamConfig, StreamError};
pub use stop::{stop_signal, StopHandle, StopToken};
