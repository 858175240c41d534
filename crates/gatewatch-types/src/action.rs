//! Actions the plugin dispatches through the host messaging API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{PreferenceUpdate, Priority};

/// A message dispatched to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Tab priority report, dispatched under `tab:{uuid}:update`.
    TabUpdate {
        tab_id: Uuid,
        priority_group: Priority,
    },
    /// Partial preference write, dispatched under `preferences:update`.
    PreferencesUpdate { changes: PreferenceUpdate },
}

impl Action {
    /// The host topic this action is dispatched under.
    pub fn topic(&self) -> String {
        match self {
            Action::TabUpdate { tab_id, .. } => format!("tab:{tab_id}:update"),
            Action::PreferencesUpdate { .. } => "preferences:update".to_string(),
        }
    }

    /// The payload object as the host receives it.
    pub fn payload(&self) -> Value {
        match self {
            Action::TabUpdate { priority_group, .. } => {
                serde_json::json!({ "priorityGroup": priority_group })
            }
            Action::PreferencesUpdate { changes } => Value::Object(
                changes
                    .iter()
                    .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
                    .collect(),
            ),
        }
    }
}

/// A dispatched action as seen by bus subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionEnvelope {
    /// Host topic string.
    pub topic: String,
    /// The action itself.
    pub action: Action,
    /// When the host accepted the dispatch.
    pub dispatched_at: DateTime<Utc>,
}

impl ActionEnvelope {
    pub fn new(action: Action) -> Self {
        Self {
            topic: action.topic(),
            action,
            dispatched_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod serialization_tests {
    use super::*;
    use crate::PrefKey;

    #[test]
    fn test_tab_update_topic_embeds_the_tab_id() {
        let tab_id = Uuid::nil();
        let action = Action::TabUpdate {
            tab_id,
            priority_group: Priority::try_from(5).unwrap(),
        };
        assert_eq!(
            action.topic(),
            "tab:00000000-0000-0000-0000-000000000000:update"
        );
    }

    #[test]
    fn test_tab_update_payload_uses_camel_case_key() {
        let action = Action::TabUpdate {
            tab_id: Uuid::nil(),
            priority_group: Priority::try_from(3).unwrap(),
        };
        assert_eq!(
            action.payload().to_string(),
            r#"{"priorityGroup":3}"#
        );
    }

    #[test]
    fn test_preferences_update_topic_is_fixed() {
        let action = Action::PreferencesUpdate {
            changes: PreferenceUpdate::single(PrefKey::QueuePriority.as_str(), "5"),
        };
        assert_eq!(action.topic(), "preferences:update");
    }

    #[test]
    fn test_preferences_update_payload_is_the_partial_map() {
        let action = Action::PreferencesUpdate {
            changes: PreferenceUpdate::single(PrefKey::EventPriority.as_str(), "2"),
        };
        assert_eq!(action.payload().to_string(), r#"{"event_priority":"2"}"#);
    }

    #[test]
    fn test_action_serialization_tags() {
        let action = Action::TabUpdate {
            tab_id: Uuid::nil(),
            priority_group: Priority::MIN,
        };
        let json = serde_json::to_string(&action).unwrap();
        assert!(json.contains(r#""type":"tab_update""#));
        assert!(json.contains(r#""priority_group":0"#));

        let action = Action::PreferencesUpdate {
            changes: PreferenceUpdate::default(),
        };
        let json = serde_json::to_string(&action).unwrap();
        assert!(json.contains(r#""type":"preferences_update""#));
    }

    #[test]
    fn test_action_roundtrip() {
        let original = Action::TabUpdate {
            tab_id: Uuid::new_v4(),
            priority_group: Priority::try_from(9).unwrap(),
        };
        let json = serde_json::to_string(&original).unwrap();
        let parsed: Action = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_envelope_topic_matches_action() {
        let envelope = ActionEnvelope::new(Action::PreferencesUpdate {
            changes: PreferenceUpdate::single(PrefKey::CheckoutPriority.as_str(), "1"),
        });
        assert_eq!(envelope.topic, envelope.action.topic());
    }
}
