//! Host-owned preference registry.
//!
//! Preferences are stringly typed: plugins register defaults as strings and
//! the settings panel writes string values back. The registry is the only
//! place preference state lives; plugins read it at page load and never
//! store values of their own. Values persist as a flat TOML table.

use crate::HostError;
use anyhow::Context;
use dashmap::DashMap;
use gatewatch_types::{PreferenceChange, PreferenceUpdate};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::broadcast;
use tracing::debug;

/// Registered preference values, shared host-wide.
pub struct PreferenceRegistry {
    values: DashMap<String, String>,
    change_tx: broadcast::Sender<PreferenceChange>,
}

impl PreferenceRegistry {
    pub fn new() -> Self {
        let (change_tx, _) = broadcast::channel(256);
        Self {
            values: DashMap::new(),
            change_tx,
        }
    }

    /// Registers a preference with its default value.
    ///
    /// The first registration wins: an existing stored value, whether from
    /// an earlier registration or a loaded store file, is kept.
    pub fn register(&self, key: &str, default: &str) {
        self.values
            .entry(key.to_string())
            .or_insert_with(|| default.to_string());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).map(|v| v.value().clone())
    }

    /// All stored values, sorted by key.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.values
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect()
    }

    /// Sets a registered preference, broadcasting if the value changed.
    pub fn set(&self, key: &str, value: &str) -> crate::Result<()> {
        let mut entry = self
            .values
            .get_mut(key)
            .ok_or_else(|| HostError::UnknownPreference(key.to_string()))?;
        if *entry != value {
            *entry = value.to_string();
            drop(entry);
            let _ = self.change_tx.send(PreferenceChange {
                key: key.to_string(),
                value: value.to_string(),
            });
        }
        Ok(())
    }

    /// Applies a partial update, skipping unknown keys.
    ///
    /// Returns the changes that actually took effect; writes that match the
    /// stored value are dropped without a notification.
    pub fn apply(&self, update: &PreferenceUpdate) -> Vec<PreferenceChange> {
        let mut applied = Vec::new();
        for (key, value) in update.iter() {
            match self.values.get_mut(key) {
                Some(mut entry) => {
                    if *entry != value {
                        *entry = value.to_string();
                        drop(entry);
                        let change = PreferenceChange {
                            key: key.to_string(),
                            value: value.to_string(),
                        };
                        let _ = self.change_tx.send(change.clone());
                        applied.push(change);
                    }
                }
                None => {
                    debug!(
                        target: "gatewatch::prefs",
                        "Ignoring update for unregistered preference: {}",
                        key
                    );
                }
            }
        }
        applied
    }

    /// Subscribe to change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<PreferenceChange> {
        self.change_tx.subscribe()
    }

    /// Replaces stored values with the file contents.
    ///
    /// Keys in the file overwrite stored values; keys only in memory are
    /// kept. Returns the changes relative to the previous state.
    pub fn load_from(&self, path: &Path) -> anyhow::Result<Vec<PreferenceChange>> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading preference store {}", path.display()))?;
        let stored: BTreeMap<String, String> = toml::from_str(&content)
            .with_context(|| format!("parsing preference store {}", path.display()))?;

        let mut changed = Vec::new();
        for (key, value) in stored {
            let prev = self.values.insert(key.clone(), value.clone());
            if prev.as_deref() != Some(value.as_str()) {
                let change = PreferenceChange { key, value };
                let _ = self.change_tx.send(change.clone());
                changed.push(change);
            }
        }
        Ok(changed)
    }

    /// Writes all stored values as a flat TOML table.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(&self.snapshot())
            .context("serializing preference store")?;
        std::fs::write(path, content)
            .with_context(|| format!("writing preference store {}", path.display()))?;
        Ok(())
    }
}

impl Default for PreferenceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Default store location under the platform data dir.
pub fn default_store_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("gatewatch")
        .join("preferences.toml")
}
