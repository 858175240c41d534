//! Priority group values and per-page snapshots.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{PageState, PrefKey};

/// A value outside the 0-9 priority range.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid priority {0:?}: expected an integer 0 through 9")]
pub struct InvalidPriority(pub String);

/// A tab priority group, an integer from 0 (lowest) through 9.
///
/// 0 is the default for unclassified pages and unset preferences.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct Priority(u8);

impl Priority {
    pub const MIN: Priority = Priority(0);
    pub const MAX: Priority = Priority(9);

    /// Parses a stored preference value (`"0"` through `"9"`).
    pub fn parse(s: &str) -> Result<Self, InvalidPriority> {
        s.parse::<u8>()
            .ok()
            .and_then(|v| Self::try_from(v).ok())
            .ok_or_else(|| InvalidPriority(s.to_string()))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Priority {
    type Error = InvalidPriority;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value <= Self::MAX.0 {
            Ok(Self(value))
        } else {
            Err(InvalidPriority(value.to_string()))
        }
    }
}

impl From<Priority> for u8 {
    fn from(p: Priority) -> u8 {
        p.0
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The four priority values captured when a page attaches.
///
/// Monitors hold a snapshot for the lifetime of the page; preference edits
/// made afterwards apply to new page loads only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrioritySnapshot {
    pub waiting_room: Priority,
    pub queue: Priority,
    pub event: Priority,
    pub checkout: Priority,
}

impl PrioritySnapshot {
    pub fn get(&self, key: PrefKey) -> Priority {
        match key {
            PrefKey::WaitingRoomPriority => self.waiting_room,
            PrefKey::QueuePriority => self.queue,
            PrefKey::EventPriority => self.event,
            PrefKey::CheckoutPriority => self.checkout,
        }
    }

    pub fn set(&mut self, key: PrefKey, value: Priority) {
        match key {
            PrefKey::WaitingRoomPriority => self.waiting_room = value,
            PrefKey::QueuePriority => self.queue = value,
            PrefKey::EventPriority => self.event = value,
            PrefKey::CheckoutPriority => self.checkout = value,
        }
    }

    /// Priority group for a classified state; unclassified pages get 0.
    pub fn priority_for(&self, state: Option<PageState>) -> Priority {
        state.map(|s| self.get(s.pref_key())).unwrap_or_default()
    }
}
