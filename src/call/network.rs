//! Environment signals and the background connectivity watcher.

use crate::config::NetworkConfig;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Signals from the environment hosting the call, independent of the
/// transport's own event stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvSignal {
    Online,
    Offline,
    /// The hosting view was hidden (tab switched, window minimized).
    Hidden,
    Visible,
}

/// Tracks reachability and reports only changes.
#[derive(Debug, Clone, Copy)]
pub struct LinkState {
    online: bool,
}

impl Default for LinkState {
    fn default() -> Self {
        Self { online: true }
    }
}

impl LinkState {
    /// Record a probe result. Returns a signal when reachability flipped.
    pub fn observe(&mut self, reachable: bool) -> Option<EnvSignal> {
        if reachable == self.online {
            return None;
        }
        self.online = reachable;
        Some(if reachable {
            EnvSignal::Online
        } else {
            EnvSignal::Offline
        })
    }

    pub fn is_online(&self) -> bool {
        self.online
    }
}

/// Polls a TCP endpoint and reports connectivity changes.
#[derive(Debug, Clone)]
pub struct ConnectivityWatcher {
    addr: String,
    interval: Duration,
    timeout: Duration,
}

impl ConnectivityWatcher {
    pub fn new(addr: impl Into<String>, interval: Duration, timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            interval,
            timeout,
        }
    }

    pub fn from_config(config: &NetworkConfig) -> Self {
        Self::new(
            config.probe_addr.clone(),
            Duration::from_millis(config.probe_interval_ms),
            Duration::from_millis(config.probe_timeout_ms),
        )
    }

    async fn probe(&self) -> bool {
        matches!(
            tokio::time::timeout(self.timeout, TcpStream::connect(&self.addr)).await,
            Ok(Ok(_))
        )
    }

    /// Start watching in the background. The task stops when the handle is
    /// dropped or the receiver goes away.
    pub fn spawn(self, tx: mpsc::Sender<EnvSignal>) -> WatcherHandle {
        let task = tokio::spawn(async move {
            let mut link = LinkState::default();
            let mut ticker = tokio::time::interval(self.interval);
            loop {
                ticker.tick().await;
                let reachable = self.probe().await;
                if let Some(signal) = link.observe(reachable) {
                    log::info!("connectivity changed: {:?} ({})", signal, self.addr);
                    if tx.send(signal).await.is_err() {
                        break;
                    }
                }
            }
        });
        WatcherHandle { task }
    }
}

/// Aborts the watcher task on drop.
#[derive(Debug)]
pub struct WatcherHandle {
    task: JoinHandle<()>,
}

impl WatcherHandle {
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
