//! Named broadcast channels between host components and plugins.

use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::trace;

/// Host IPC: named channels carrying JSON payloads.
///
/// Channels come into existence on first use from either side, so a plugin
/// can subscribe before anything has been emitted.
pub struct IpcBus {
    channels: DashMap<String, broadcast::Sender<Value>>,
}

impl IpcBus {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
        }
    }

    /// Subscribe to a named channel.
    pub fn subscribe(&self, channel: &str) -> broadcast::Receiver<Value> {
        self.sender(channel).subscribe()
    }

    /// Emits a payload; returns how many subscribers received it.
    pub fn emit(&self, channel: &str, payload: Value) -> usize {
        trace!(target: "gatewatch::ipc", "Emit on '{}'", channel);
        self.sender(channel).send(payload).unwrap_or(0)
    }

    fn sender(&self, channel: &str) -> broadcast::Sender<Value> {
        self.channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(256).0)
            .clone()
    }
}

impl Default for IpcBus {
    fn default() -> Self {
        Self::new()
    }
}
