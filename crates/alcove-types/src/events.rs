use serde::{Deserialize, Serialize};

use crate::models::Notification;

/// Frames pushed by the notification socket, tagged by `type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PushEvent {
    /// A message addressed to the current user was created.
    NewMessage {
        sender_id: String,
        #[serde(default)]
        sender_name: Option<String>,
    },

    /// Someone reacted to one of the current user's messages.
    Reaction {
        reactor_id: String,
        #[serde(default)]
        reactor_name: Option<String>,
        message_id: String,
    },

    /// Authoritative feed snapshot, sent once right after the socket opens.
    /// There is no separate REST fetch for the initial feed state.
    InitialNotifications { notifications: Vec<Notification> },
}

impl PushEvent {
    /// Identity of the user that caused this event. `None` for snapshot
    /// frames, which have no single actor.
    pub fn actor_id(&self) -> Option<&str> {
        match self {
            Self::NewMessage { sender_id, .. } => Some(sender_id),
            Self::Reaction { reactor_id, .. } => Some(reactor_id),
            Self::InitialNotifications { .. } => None,
        }
    }

    /// Display name of the actor, when the payload carries one.
    pub fn actor_name(&self) -> Option<&str> {
        match self {
            Self::NewMessage { sender_name, .. } => sender_name.as_deref(),
            Self::Reaction { reactor_name, .. } => reactor_name.as_deref(),
            Self::InitialNotifications { .. } => None,
        }
    }
}

/// Frames sent from client to server over the same socket, tagged by `action`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientCommand {
    /// Acknowledge notifications as seen. Fire-and-forget: the feed drops
    /// the entries locally without waiting for server confirmation.
    MarkSeen { notification_ids: Vec<String> },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NotificationKind;

    #[test]
    fn new_message_frame_decodes() {
        let ev: PushEvent = serde_json::from_str(
            r#"{"type":"new_message","sender_id":"u7","sender_name":"Alice Johnson"}"#,
        )
        .unwrap();
        assert_eq!(ev.actor_id(), Some("u7"));
        assert_eq!(ev.actor_name(), Some("Alice Johnson"));
    }

    #[test]
    fn reaction_frame_tolerates_missing_name() {
        let ev: PushEvent = serde_json::from_str(
            r#"{"type":"reaction","reactor_id":"u3","message_id":"m4"}"#,
        )
        .unwrap();
        assert_eq!(ev.actor_id(), Some("u3"));
        assert_eq!(ev.actor_name(), None);
    }

    #[test]
    fn initial_notifications_frame_decodes() {
        let ev: PushEvent = serde_json::from_str(
            r#"{
                "type": "initial_notifications",
                "notifications": [
                    {"id":"n1","kind":"new_message","actor":"Bob Smith","time_ago":"2 minutes ago","unread":true}
                ]
            }"#,
        )
        .unwrap();
        match ev {
            PushEvent::InitialNotifications { notifications } => {
                assert_eq!(notifications.len(), 1);
                assert_eq!(notifications[0].kind, NotificationKind::NewMessage);
            }
            other => panic!("wrong variant: {:?}", other),
        }
    }

    #[test]
    fn mark_seen_uses_action_tag() {
        let cmd = ClientCommand::MarkSeen {
            notification_ids: vec!["n1".into(), "n2".into()],
        };
        let json = serde_json::to_string(&cmd).unwrap();
        assert_eq!(
            json,
            r#"{"action":"mark_seen","notification_ids":["n1","n2"]}"#
        );
    }
}
