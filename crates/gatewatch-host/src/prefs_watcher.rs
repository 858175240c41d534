//! Preference store file watcher.
//!
//! Reloads the preference file when it changes on disk so external edits
//! reach a running host without a restart. Changes picked up this way are
//! forwarded to open setting panels like any other preference write.

use crate::{PreferenceRegistry, Result, SettingPanelRegistry};
use gatewatch_types::PreferenceUpdate;
use notify::{
    event::{AccessKind, AccessMode, ModifyKind},
    Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Watches the preference store file and reloads it on change.
pub struct PrefsWatcher {
    path: PathBuf,
    registry: Arc<PreferenceRegistry>,
    panels: Arc<SettingPanelRegistry>,
}

impl PrefsWatcher {
    pub fn new(
        path: PathBuf,
        registry: Arc<PreferenceRegistry>,
        panels: Arc<SettingPanelRegistry>,
    ) -> Self {
        Self {
            path,
            registry,
            panels,
        }
    }

    /// Start watching the store file.
    /// Returns a handle that can be used to stop watching.
    pub fn start(self) -> Result<PrefsWatcherHandle> {
        let (stop_tx, mut stop_rx) = mpsc::unbounded_channel::<()>();

        let (notify_tx, mut notify_rx) = mpsc::unbounded_channel();
        let mut file_watcher = notify::recommended_watcher(
            move |res: std::result::Result<Event, notify::Error>| {
                if let Ok(event) = res {
                    let _ = notify_tx.send(event);
                }
            },
        )
        .map_err(|e| {
            crate::HostError::IoError(std::io::Error::new(
                std::io::ErrorKind::Other,
                e.to_string(),
            ))
        })?;

        file_watcher
            .watch(&self.path, RecursiveMode::NonRecursive)
            .map_err(|e| {
                crate::HostError::IoError(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    e.to_string(),
                ))
            })?;

        let Self {
            path,
            registry,
            panels,
        } = self;

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    Some(event) = notify_rx.recv() => {
                        let should_read = matches!(
                            event.kind,
                            EventKind::Modify(ModifyKind::Data(_))
                                | EventKind::Modify(ModifyKind::Any)
                                | EventKind::Access(AccessKind::Close(AccessMode::Write))
                        );

                        if should_read {
                            match registry.load_from(&path) {
                                Ok(changes) if !changes.is_empty() => {
                                    info!(
                                        target: "gatewatch::prefs",
                                        "Reloaded preference store: {} value(s) changed",
                                        changes.len()
                                    );
                                    panels.preferences_updated(
                                        &PreferenceUpdate::from_changes(&changes),
                                    );
                                }
                                Ok(_) => {}
                                Err(e) => {
                                    warn!(
                                        target: "gatewatch::prefs",
                                        "Failed to reload preference store: {:#}",
                                        e
                                    );
                                }
                            }
                        }
                    }
                    Some(()) = stop_rx.recv() => {
                        debug!(
                            target: "gatewatch::prefs",
                            "Stopping preference store watcher"
                        );
                        break;
                    }
                    else => {
                        break;
                    }
                }
            }
        });

        Ok(PrefsWatcherHandle {
            stop_tx,
            _file_watcher: file_watcher,
        })
    }
}

/// Handle to control a running store watcher.
pub struct PrefsWatcherHandle {
    stop_tx: mpsc::UnboundedSender<()>,
    _file_watcher: RecommendedWatcher,
}

impl PrefsWatcherHandle {
    /// Stop the watcher.
    pub fn stop(&self) {
        let _ = self.stop_tx.send(());
    }
}
