//! Action dispatch: the host messaging pipeline.

use crate::{PreferenceRegistry, SettingPanelRegistry};
use gatewatch_types::{Action, ActionEnvelope, PreferenceUpdate};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Routes dispatched actions and fans them out to subscribers.
///
/// `preferences:update` actions are applied to the preference registry and
/// forwarded to open setting panels before the broadcast goes out. Other
/// actions, including per-tab priority reports, pass straight through.
#[derive(Clone)]
pub struct ActionBus {
    prefs: Arc<PreferenceRegistry>,
    panels: Arc<SettingPanelRegistry>,
    store_path: Option<PathBuf>,
    tx: broadcast::Sender<ActionEnvelope>,
}

impl ActionBus {
    pub fn new(prefs: Arc<PreferenceRegistry>, panels: Arc<SettingPanelRegistry>) -> Self {
        let (tx, _) = broadcast::channel(256);
        Self {
            prefs,
            panels,
            store_path: None,
            tx,
        }
    }

    /// Persist preferences to this path after each applied update.
    pub fn set_store_path(&mut self, path: PathBuf) {
        self.store_path = Some(path);
    }

    /// Dispatches an action into the host.
    pub fn dispatch(&self, action: Action) -> ActionEnvelope {
        let envelope = ActionEnvelope::new(action);
        debug!(target: "gatewatch::host", "Dispatching {}", envelope.topic);

        if let Action::PreferencesUpdate { changes } = &envelope.action {
            let applied = self.prefs.apply(changes);
            if !applied.is_empty() {
                self.panels
                    .preferences_updated(&PreferenceUpdate::from_changes(&applied));

                if let Some(path) = &self.store_path {
                    if let Err(e) = self.prefs.save_to(path) {
                        warn!(
                            target: "gatewatch::prefs",
                            "Failed to persist preferences: {:#}",
                            e
                        );
                    }
                }
            }
        }

        let _ = self.tx.send(envelope.clone());
        envelope
    }

    /// Subscribe to every dispatched action.
    pub fn subscribe(&self) -> broadcast::Receiver<ActionEnvelope> {
        self.tx.subscribe()
    }
}
