use std::time::Duration;

use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::time::{sleep, timeout};
use tracing::debug;

use super::{publish, ConnectivityMonitor, ConnectivityStatus};
use crate::config::ConnectivityConfig;

/// Connectivity derived from periodically opening a TCP connection.
///
/// The probe task runs until the monitor and every receiver it handed out
/// have been dropped.
pub struct ProbeConnectivity {
    rx: watch::Receiver<ConnectivityStatus>,
}

impl ProbeConnectivity {
    /// Probe once so the first snapshot is real, then keep probing in the background.
    pub async fn start(config: ConnectivityConfig) -> Self {
        let reachable = probe(&config.probe_addr, config.probe_timeout()).await;
        let initial = next_status(ConnectivityStatus::Unavailable, reachable);
        let (tx, rx) = watch::channel(initial);

        tokio::spawn(run_probe_loop(tx, config));

        Self { rx }
    }
}

impl ConnectivityMonitor for ProbeConnectivity {
    fn observe(&self) -> watch::Receiver<ConnectivityStatus> {
        self.rx.clone()
    }
}

async fn run_probe_loop(tx: watch::Sender<ConnectivityStatus>, config: ConnectivityConfig) {
    loop {
        tokio::select! {
            _ = tx.closed() => break,
            _ = sleep(config.probe_interval()) => {}
        }

        let reachable = probe(&config.probe_addr, config.probe_timeout()).await;
        let current = *tx.borrow();
        publish(&tx, next_status(current, reachable));
    }
    debug!("Connectivity probe stopped");
}

async fn probe(addr: &str, limit: Duration) -> bool {
    match timeout(limit, TcpStream::connect(addr)).await {
        Ok(Ok(_)) => true,
        Ok(Err(e)) => {
            debug!("Probe to {} failed: {}", addr, e);
            false
        }
        Err(_) => {
            debug!("Probe to {} timed out", addr);
            false
        }
    }
}

/// One failed probe after being online is `Losing`; a second one is `Lost`.
/// Failing without ever having been online stays `Unavailable`.
pub fn next_status(current: ConnectivityStatus, reachable: bool) -> ConnectivityStatus {
    if reachable {
        return ConnectivityStatus::Available;
    }
    match current {
        ConnectivityStatus::Available => ConnectivityStatus::Losing,
        ConnectivityStatus::Losing | ConnectivityStatus::Lost => ConnectivityStatus::Lost,
        ConnectivityStatus::Unavailable => ConnectivityStatus::Unavailable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[test]
    fn test_transitions_on_failure() {
        use ConnectivityStatus::*;
        assert_eq!(next_status(Available, false), Losing);
        assert_eq!(next_status(Losing, false), Lost);
        assert_eq!(next_status(Lost, false), Lost);
        assert_eq!(next_status(Unavailable, false), Unavailable);
    }

    #[test]
    fn test_any_success_is_available() {
        use ConnectivityStatus::*;
        for current in [Available, Unavailable, Losing, Lost] {
            assert_eq!(next_status(current, true), Available);
        }
    }

    #[tokio::test]
    async fn test_start_reports_reachable_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let config = ConnectivityConfig {
            probe_addr: listener.local_addr().unwrap().to_string(),
            ..Default::default()
        };

        let monitor = ProbeConnectivity::start(config).await;
        assert_eq!(*monitor.observe().borrow(), ConnectivityStatus::Available);
    }

    #[tokio::test]
    async fn test_start_reports_unreachable_address() {
        // Bind then drop to get a port nothing listens on.
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().to_string()
        };
        let config = ConnectivityConfig {
            probe_addr: addr,
            probe_timeout_ms: 200,
            ..Default::default()
        };

        let monitor = ProbeConnectivity::start(config).await;
        assert_eq!(*monitor.observe().borrow(), ConnectivityStatus::Unavailable);
    }
}
