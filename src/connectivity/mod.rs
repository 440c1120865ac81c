//! Connectivity monitoring.
//!
//! A monitor hands out `watch` receivers: a new receiver always holds the
//! current status, and senders only notify on actual transitions, so
//! subscribers never see two identical consecutive values.

pub mod probe;

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;

pub use probe::ProbeConnectivity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectivityStatus {
    Available,
    Unavailable,
    Losing,
    Lost,
}

impl ConnectivityStatus {
    /// Anything but `Available` shows the offline banner.
    pub fn is_offline(self) -> bool {
        self != ConnectivityStatus::Available
    }
}

impl fmt::Display for ConnectivityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectivityStatus::Available => "available",
            ConnectivityStatus::Unavailable => "unavailable",
            ConnectivityStatus::Losing => "losing",
            ConnectivityStatus::Lost => "lost",
        };
        f.write_str(s)
    }
}

pub trait ConnectivityMonitor: Send + Sync {
    fn observe(&self) -> watch::Receiver<ConnectivityStatus>;
}

/// Publish `status` unless it equals the current value.
pub(crate) fn publish(tx: &watch::Sender<ConnectivityStatus>, status: ConnectivityStatus) -> bool {
    tx.send_if_modified(|current| {
        if *current == status {
            false
        } else {
            tracing::info!("Connectivity changed: {} -> {}", current, status);
            *current = status;
            true
        }
    })
}

/// Monitor driven by explicit calls; used for `--offline` and in tests.
#[derive(Debug, Clone)]
pub struct ManualConnectivity {
    tx: Arc<watch::Sender<ConnectivityStatus>>,
}

impl ManualConnectivity {
    pub fn new(initial: ConnectivityStatus) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    pub fn set(&self, status: ConnectivityStatus) -> bool {
        publish(&self.tx, status)
    }

    pub fn current(&self) -> ConnectivityStatus {
        *self.tx.borrow()
    }
}

impl Default for ManualConnectivity {
    fn default() -> Self {
        Self::new(ConnectivityStatus::Available)
    }
}

impl ConnectivityMonitor for ManualConnectivity {
    fn observe(&self) -> watch::Receiver<ConnectivityStatus> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_available_is_online() {
        assert!(!ConnectivityStatus::Available.is_offline());
        assert!(ConnectivityStatus::Unavailable.is_offline());
        assert!(ConnectivityStatus::Losing.is_offline());
        assert!(ConnectivityStatus::Lost.is_offline());
    }

    #[test]
    fn test_new_subscriber_sees_current_snapshot() {
        let monitor = ManualConnectivity::new(ConnectivityStatus::Unavailable);
        let rx = monitor.observe();
        assert_eq!(*rx.borrow(), ConnectivityStatus::Unavailable);
    }

    #[tokio::test]
    async fn test_duplicate_status_not_emitted() {
        let monitor = ManualConnectivity::default();
        let mut rx = monitor.observe();

        assert!(!monitor.set(ConnectivityStatus::Available));
        assert!(!rx.has_changed().unwrap());

        assert!(monitor.set(ConnectivityStatus::Lost));
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), ConnectivityStatus::Lost);

        assert!(!monitor.set(ConnectivityStatus::Lost));
        assert!(!rx.has_changed().unwrap());
        assert_eq!(monitor.current(), ConnectivityStatus::Lost);
    }
}
