//! Webhook event payloads
//!
//! Only one event shape matters downstream: an item update whose display key
//! marks an archive transition. Everything else is accepted and ignored.

use serde::Deserialize;

/// Display key the board uses for archive transitions
const ARCHIVE_TRANSITION_KEY: &str = "action_archived_card";

/// Action type carried by item update events
const UPDATE_ACTION_TYPE: &str = "updateCard";

/// Inbound board change notification
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub action: EventAction,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventAction {
    #[serde(rename = "type", default)]
    pub action_type: String,

    #[serde(default)]
    pub display: EventDisplay,

    #[serde(default)]
    pub data: EventData,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventDisplay {
    #[serde(rename = "translationKey", default)]
    pub translation_key: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventData {
    #[serde(default)]
    pub card: EventItemRef,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventItemRef {
    #[serde(default)]
    pub id: String,
}

impl WebhookEvent {
    /// The archived item's ID, if this event describes an archive transition
    pub fn archived_item_id(&self) -> Option<&str> {
        let action = &self.action;
        if action.action_type == UPDATE_ACTION_TYPE
            && action.display.translation_key == ARCHIVE_TRANSITION_KEY
            && !action.data.card.id.is_empty()
        {
            Some(&action.data.card.id)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(action_type: &str, translation_key: &str, id: &str) -> WebhookEvent {
        WebhookEvent {
            action: EventAction {
                action_type: action_type.into(),
                display: EventDisplay {
                    translation_key: translation_key.into(),
                },
                data: EventData {
                    card: EventItemRef { id: id.into() },
                },
            },
        }
    }

    #[test]
    fn test_archive_event_yields_id() {
        let e = event("updateCard", "action_archived_card", "item-1");
        assert_eq!(e.archived_item_id(), Some("item-1"));
    }

    #[test]
    fn test_other_translation_key_yields_nothing() {
        let e = event("updateCard", "action_renamed_card", "item-1");
        assert_eq!(e.archived_item_id(), None);
    }

    #[test]
    fn test_other_action_type_yields_nothing() {
        let e = event("createCard", "action_archived_card", "item-1");
        assert_eq!(e.archived_item_id(), None);
    }

    #[test]
    fn test_missing_id_yields_nothing() {
        let e = event("updateCard", "action_archived_card", "");
        assert_eq!(e.archived_item_id(), None);
    }

    #[test]
    fn test_deserialize_from_wire_json() {
        let body = r#"{
            "action": {
                "type": "updateCard",
                "display": { "translationKey": "action_archived_card" },
                "data": { "card": { "id": "abc123" } }
            }
        }"#;
        let e: WebhookEvent = serde_json::from_str(body).unwrap();
        assert_eq!(e.archived_item_id(), Some("abc123"));
    }
}
