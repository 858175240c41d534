//! The SeatGeek settings panel.

use gatewatch_host::{HostError, PanelContext, Result, SettingPanel};
use gatewatch_types::{Action, PrefKey, PreferenceUpdate, Priority, PrioritySnapshot, Widget};
use tracing::debug;

use crate::monitor::snapshot_from_prefs;

const PANEL_HEADING: &str = "Priority Groups";

const PANEL_BLURB: &str = "Use the following values to assign a unique priority group to \
     tabs as they reach certain stages in the order flow";

fn label(key: PrefKey) -> &'static str {
    match key {
        PrefKey::WaitingRoomPriority => "Tabs in waiting room",
        PrefKey::QueuePriority => "Tabs in queue",
        PrefKey::EventPriority => "Tabs on an event page",
        PrefKey::CheckoutPriority => "Tabs on a checkout page",
    }
}

/// Four dropdowns, one per order-flow stage, each a priority group 0-9.
///
/// Every user edit dispatches a preferences update carrying only the edited
/// key. External preference changes flow back in through
/// `preferences_updated`; values equal to what the panel already shows are
/// left untouched, which also makes the panel's own dispatches echo back
/// harmlessly.
pub struct PrioritySettingsPanel {
    values: PrioritySnapshot,
}

impl PrioritySettingsPanel {
    pub fn new(ctx: PanelContext) -> Self {
        Self {
            values: snapshot_from_prefs(&ctx.preferences),
        }
    }
}

impl SettingPanel for PrioritySettingsPanel {
    fn root(&self) -> Widget {
        let options: Vec<String> = (0..=9).map(|n: u8| n.to_string()).collect();
        let mut children = vec![Widget::Text {
            content: PANEL_BLURB.to_string(),
        }];
        for key in PrefKey::ALL {
            children.push(Widget::Select {
                name: key.as_str().to_string(),
                label: label(key).to_string(),
                value: self.values.get(key).to_string(),
                options: options.clone(),
            });
        }
        Widget::Section {
            title: PANEL_HEADING.to_string(),
            children,
        }
    }

    fn widget_changed(&mut self, name: &str, value: &str) -> Result<Option<Action>> {
        let Some(key) = PrefKey::parse(name) else {
            return Err(HostError::UnknownWidget(name.to_string()));
        };
        let priority = Priority::parse(value)?;
        self.values.set(key, priority);
        Ok(Some(Action::PreferencesUpdate {
            changes: PreferenceUpdate::single(key.as_str(), priority.to_string()),
        }))
    }

    fn preferences_updated(&mut self, changes: &PreferenceUpdate) {
        for (name, value) in changes.iter() {
            let Some(key) = PrefKey::parse(name) else {
                continue;
            };
            match Priority::parse(value) {
                Ok(priority) => {
                    if self.values.get(key) != priority {
                        self.values.set(key, priority);
                    }
                }
                Err(e) => {
                    debug!(target: "gatewatch::panel", "Ignoring update for {}: {}", key, e);
                }
            }
        }
    }
}
