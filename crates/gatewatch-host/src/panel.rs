//! Setting panels: registration, instantiation, and widget events.

use crate::{ActionBus, HostError, Result};
use dashmap::DashMap;
use gatewatch_types::{Action, PreferenceUpdate, Widget};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tracing::info;
use uuid::Uuid;

/// A live settings panel instance.
///
/// Widget events arrive by name; a handler that wants to dispatch into the
/// host returns the action rather than dispatching itself, so panels never
/// re-enter the host while their own state is locked.
pub trait SettingPanel: Send {
    /// The widget tree to render.
    fn root(&self) -> Widget;
    /// A user changed the named widget. Returns the action to dispatch, if any.
    fn widget_changed(&mut self, name: &str, value: &str) -> Result<Option<Action>>;
    /// Stored preferences changed; update displayed values.
    fn preferences_updated(&mut self, changes: &PreferenceUpdate);
}

/// What a panel factory receives when the host opens the panel.
#[derive(Clone)]
pub struct PanelContext {
    /// Preference values at open time.
    pub preferences: BTreeMap<String, String>,
    /// Dispatch surface into the host.
    pub actions: ActionBus,
}

type PanelFactory = dyn Fn(PanelContext) -> Box<dyn SettingPanel> + Send + Sync;

struct RegisteredPanel {
    title: String,
    factory: Box<PanelFactory>,
}

struct OpenPanel {
    registration_id: Uuid,
    panel: Arc<Mutex<Box<dyn SettingPanel>>>,
}

/// Registered panel factories and the panel instances currently open.
pub struct SettingPanelRegistry {
    factories: DashMap<Uuid, RegisteredPanel>,
    open: DashMap<Uuid, OpenPanel>,
}

impl SettingPanelRegistry {
    pub fn new() -> Self {
        Self {
            factories: DashMap::new(),
            open: DashMap::new(),
        }
    }

    /// Registers a panel factory under a title. Returns the registration id.
    pub fn add(
        &self,
        title: &str,
        factory: impl Fn(PanelContext) -> Box<dyn SettingPanel> + Send + Sync + 'static,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.factories.insert(
            id,
            RegisteredPanel {
                title: title.to_string(),
                factory: Box::new(factory),
            },
        );
        info!(target: "gatewatch::panel", "Registered setting panel '{}'", title);
        id
    }

    /// Removes a registration and closes any panels opened from it.
    pub fn remove(&self, id: Uuid) -> Result<()> {
        let (_, registered) = self
            .factories
            .remove(&id)
            .ok_or(HostError::PanelNotFound(id))?;
        self.open.retain(|_, p| p.registration_id != id);
        info!(target: "gatewatch::panel", "Removed setting panel '{}'", registered.title);
        Ok(())
    }

    /// Instantiates a registered panel.
    pub fn open(&self, id: Uuid, ctx: PanelContext) -> Result<PanelHandle> {
        let registered = self.factories.get(&id).ok_or(HostError::PanelNotFound(id))?;
        let actions = ctx.actions.clone();
        let panel = (registered.factory)(ctx);
        let title = registered.title.clone();
        drop(registered);

        let instance_id = Uuid::new_v4();
        let panel = Arc::new(Mutex::new(panel));
        self.open.insert(
            instance_id,
            OpenPanel {
                registration_id: id,
                panel: panel.clone(),
            },
        );
        Ok(PanelHandle {
            instance_id,
            title,
            panel,
            actions,
        })
    }

    /// Closes an open panel instance.
    pub fn close(&self, instance_id: Uuid) {
        self.open.remove(&instance_id);
    }

    /// Titles of all registered panels, sorted.
    pub fn titles(&self) -> Vec<String> {
        let mut titles: Vec<String> = self.factories.iter().map(|e| e.title.clone()).collect();
        titles.sort();
        titles
    }

    /// Registration ids and titles, sorted by title. This is what a settings
    /// page renders its panel list from.
    pub fn registrations(&self) -> Vec<(Uuid, String)> {
        let mut entries: Vec<(Uuid, String)> = self
            .factories
            .iter()
            .map(|e| (*e.key(), e.title.clone()))
            .collect();
        entries.sort_by(|a, b| a.1.cmp(&b.1));
        entries
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    /// Forwards applied preference changes to every open panel.
    pub fn preferences_updated(&self, changes: &PreferenceUpdate) {
        for entry in self.open.iter() {
            entry.panel.lock().unwrap().preferences_updated(changes);
        }
    }
}

impl Default for SettingPanelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Driver for one open panel instance.
pub struct PanelHandle {
    instance_id: Uuid,
    title: String,
    panel: Arc<Mutex<Box<dyn SettingPanel>>>,
    actions: ActionBus,
}

impl PanelHandle {
    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// The panel's current widget tree.
    pub fn root(&self) -> Widget {
        self.panel.lock().unwrap().root()
    }

    /// Delivers a UI change event, dispatching whatever the panel returns.
    pub fn widget_changed(&self, name: &str, value: &str) -> Result<()> {
        let action = self.panel.lock().unwrap().widget_changed(name, value)?;
        if let Some(action) = action {
            self.actions.dispatch(action);
        }
        Ok(())
    }
}
