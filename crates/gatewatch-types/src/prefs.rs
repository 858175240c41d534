//! Preference vocabulary and change notifications.
//!
//! The host preference registry is stringly typed: defaults are registered
//! as `"0"` and the settings panel writes string values back. `PrefKey` is
//! the plugin-side vocabulary for the four keys it owns.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The four preferences the plugin registers with the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrefKey {
    /// Priority group for tabs sitting in a waiting room.
    WaitingRoomPriority,
    /// Priority group for tabs in an active queue.
    QueuePriority,
    /// Priority group for tabs on an event listing page.
    EventPriority,
    /// Priority group for tabs in the checkout flow.
    CheckoutPriority,
}

impl PrefKey {
    /// All keys, in the order the plugin registers them.
    pub const ALL: [PrefKey; 4] = [
        PrefKey::WaitingRoomPriority,
        PrefKey::QueuePriority,
        PrefKey::EventPriority,
        PrefKey::CheckoutPriority,
    ];

    /// The key name as stored in the host registry.
    pub fn as_str(self) -> &'static str {
        match self {
            PrefKey::WaitingRoomPriority => "waiting_room_priority",
            PrefKey::QueuePriority => "queue_priority",
            PrefKey::EventPriority => "event_priority",
            PrefKey::CheckoutPriority => "checkout_priority",
        }
    }

    /// Parses a registry key name; `None` for keys the plugin does not own.
    pub fn parse(s: &str) -> Option<PrefKey> {
        match s {
            "waiting_room_priority" => Some(PrefKey::WaitingRoomPriority),
            "queue_priority" => Some(PrefKey::QueuePriority),
            "event_priority" => Some(PrefKey::EventPriority),
            "checkout_priority" => Some(PrefKey::CheckoutPriority),
            _ => None,
        }
    }
}

impl fmt::Display for PrefKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A partial preference write: only the keys being changed.
///
/// Serializes as a flat object, e.g. `{"queue_priority":"5"}`. The
/// settings panel dispatches exactly one key per user edit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PreferenceUpdate(pub BTreeMap<String, String>);

impl PreferenceUpdate {
    /// An update carrying a single key.
    pub fn single(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut map = BTreeMap::new();
        map.insert(key.into(), value.into());
        Self(map)
    }

    /// Collects change notifications into an update.
    pub fn from_changes(changes: &[PreferenceChange]) -> Self {
        Self(
            changes
                .iter()
                .map(|c| (c.key.clone(), c.value.clone()))
                .collect(),
        )
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Broadcast by the host registry whenever a stored value changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceChange {
    /// Registry key name.
    pub key: String,
    /// The new stored value.
    pub value: String,
}
