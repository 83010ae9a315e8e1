use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Delivery state of a message, as reported by the server. "read" can also be
/// set locally when the current user views a peer's message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Sent,
    Delivered,
    Read,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    Online,
    #[default]
    Offline,
}

/// One (user, emoji) reaction on a message. The server enforces at most one
/// reaction per (message, user, emoji) triple; the client mirrors that rule
/// when toggling optimistically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reaction {
    pub user_id: String,
    pub emoji: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub sender_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver_id: Option<String>,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub status: MessageStatus,
    #[serde(default)]
    pub reactions: Vec<Reaction>,
}

impl Message {
    /// Whether `user_id` already has a reaction with this emoji.
    pub fn has_reaction(&self, user_id: &str, emoji: &str) -> bool {
        self.reactions
            .iter()
            .any(|r| r.user_id == user_id && r.emoji == emoji)
    }
}

/// A user as reported by the directory endpoint. Entirely server-sourced;
/// the client never mutates these fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub full_name: String,
    #[serde(default)]
    pub profile_photo: Option<String>,
    #[serde(default)]
    pub presence: Presence,
    /// Human-readable "last seen" label, present when offline.
    #[serde(default)]
    pub last_seen: Option<String>,
    #[serde(default)]
    pub last_message: Option<String>,
    #[serde(default)]
    pub unread_count: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NewMessage,
    Reaction,
}

/// An entry in the live notification feed. Ephemeral: exists only while the
/// feed holds it, discarded on acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub kind: NotificationKind,
    /// Display name of the user that triggered the notification.
    pub actor: String,
    #[serde(default)]
    pub avatar: Option<String>,
    /// Server-rendered timestamp label ("2 minutes ago").
    pub time_ago: String,
    pub unread: bool,
}

/// Quick-pick palette offered by message composers and reaction pickers.
pub const COMMON_EMOJIS: [&str; 32] = [
    "👍", "👎", "❤️", "😂", "😢", "😡", "🎉", "👏", "🙌", "🤔", "👀", "✅", "❌", "🔥", "💯", "⭐",
    "🚀", "💪", "👋", "🤝", "🙏", "💬", "📝", "📌", "🎯", "🏆", "💰", "⏰", "📞", "📧", "🔍", "💡",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&MessageStatus::Read).unwrap(), "\"read\"");
        let s: MessageStatus = serde_json::from_str("\"delivered\"").unwrap();
        assert_eq!(s, MessageStatus::Delivered);
    }

    #[test]
    fn profile_tolerates_missing_optional_fields() {
        let p: UserProfile = serde_json::from_str(
            r#"{"id":"u2","email":"bob@example.com","full_name":"Bob Smith"}"#,
        )
        .unwrap();
        assert_eq!(p.presence, Presence::Offline);
        assert!(p.profile_photo.is_none());
        assert!(p.last_seen.is_none());
    }

    #[test]
    fn has_reaction_matches_user_and_emoji() {
        let msg: Message = serde_json::from_str(
            r#"{
                "id": "m1",
                "sender_id": "u1",
                "content": "hi",
                "timestamp": "2025-06-01T12:00:00Z",
                "status": "sent",
                "reactions": [
                    {"user_id": "u2", "emoji": "👍", "timestamp": "2025-06-01T12:01:00Z"}
                ]
            }"#,
        )
        .unwrap();
        assert!(msg.has_reaction("u2", "👍"));
        assert!(!msg.has_reaction("u2", "🎉"));
        assert!(!msg.has_reaction("u1", "👍"));
    }
}
