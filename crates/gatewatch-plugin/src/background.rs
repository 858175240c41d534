//! Background listener for renderer-side queue updates.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use gatewatch_host::IpcBus;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, warn};

/// IPC channel the renderer publishes queue updates on.
pub const QUEUE_UPDATE_CHANNEL: &str = "queue-it-update";

/// Drains renderer queue updates in the background.
///
/// The plugin does no processing of these payloads today; the listener
/// keeps the channel drained and counts what arrives so diagnostics can
/// confirm the renderer side is alive.
pub struct BackgroundListener;

impl BackgroundListener {
    /// Subscribes to the queue update channel and starts draining it.
    pub fn start(ipc: &IpcBus) -> BackgroundHandle {
        let mut rx = ipc.subscribe(QUEUE_UPDATE_CHANNEL);
        let (stop_tx, mut stop_rx) = mpsc::unbounded_channel::<()>();
        let received = Arc::new(AtomicU64::new(0));
        let counter = received.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = rx.recv() => match result {
                        Ok(payload) => {
                            counter.fetch_add(1, Ordering::Relaxed);
                            debug!(
                                target: "gatewatch::ipc",
                                "queue-it-update: {}",
                                payload
                            );
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(
                                target: "gatewatch::ipc",
                                "Dropped {} queue updates",
                                skipped
                            );
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                    _ = stop_rx.recv() => break,
                }
            }
            debug!(target: "gatewatch::ipc", "Queue update listener stopped");
        });

        BackgroundHandle { stop_tx, received }
    }
}

/// Handle to the running listener. Dropping it stops the task.
pub struct BackgroundHandle {
    stop_tx: mpsc::UnboundedSender<()>,
    received: Arc<AtomicU64>,
}

impl BackgroundHandle {
    pub fn stop(&self) {
        let _ = self.stop_tx.send(());
    }

    /// Number of updates seen since start.
    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    async fn wait_for_count(handle: &BackgroundHandle, expected: u64) {
        for _ in 0..40 {
            if handle.received() == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        panic!(
            "listener saw {} updates, expected {}",
            handle.received(),
            expected
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_drains_and_counts_updates() {
        let ipc = IpcBus::new();
        let handle = BackgroundListener::start(&ipc);

        for n in 0..3 {
            ipc.emit(QUEUE_UPDATE_CHANNEL, json!({ "position": n }));
        }
        wait_for_count(&handle, 3).await;

        handle.stop();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_stop_unsubscribes_from_the_channel() {
        let ipc = IpcBus::new();
        let handle = BackgroundListener::start(&ipc);

        ipc.emit(QUEUE_UPDATE_CHANNEL, json!({}));
        wait_for_count(&handle, 1).await;

        handle.stop();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(ipc.emit(QUEUE_UPDATE_CHANNEL, json!({})), 0);
        assert_eq!(handle.received(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_dropping_the_handle_stops_the_task() {
        let ipc = IpcBus::new();
        let handle = BackgroundListener::start(&ipc);
        drop(handle);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(ipc.emit(QUEUE_UPDATE_CHANNEL, json!({})), 0);
    }
}
