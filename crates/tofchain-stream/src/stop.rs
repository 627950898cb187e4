//! Cooperative stop signal shared between a controller and stream tasks

use tokio::sync::watch;

/// Create a connected stop handle and token
pub fn stop_signal() -> (StopHandle, StopToken) {
    let (tx, rx) = watch::channel(false);
    (StopHandle { tx }, StopToken { rx })
}

/// Controller side of a stop signal.
///
/// Dropping the handle also counts as a stop.
#[derive(Debug)]
pub struct StopHandle {
    tx: watch::Sender<bool>,
}

impl StopHandle {
    /// Ask every task holding a token to stop
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }
}

/// Task side of a stop signal; cheap to clone and check
#[derive(Debug, Clone)]
pub struct StopToken {
    rx: watch::Receiver<bool>,
}

impl StopToken {
    /// Whether a stop was requested or the handle is gone
    pub fn is_stopped(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_is_seen_by_every_token() {
        let (handle, token) = stop_signal();
        let cloned = token.clone();

        assert!(!token.is_stopped());
        handle.stop();

        assert!(token.is_stopped());
        assert!(cloned.is_stopped());
    }

    #[test]
    fn test_dropped_handle_counts_as_stop() {
        let (handle, token) = stop_signal();
        drop(handle);
        assert!(token.is_stopped());
    }
}
