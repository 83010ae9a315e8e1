use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::UserProfile;

// -- Auth --

/// Account creation payload. Sent as multipart form data, not JSON, because
/// the optional profile photo rides along as a file part.
#[derive(Debug, Clone)]
pub struct RegisterRequest {
    pub email: String,
    pub full_name: String,
    pub password: String,
    pub profile_photo: Option<std::path::PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Access/refresh credential pair plus the current-user record the client
/// persists for the lifetime of the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access: String,
    pub refresh: String,
    pub user: UserProfile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
}

// -- Conversations --

/// Result of resolving the conversation for (current user, peer). `id` is
/// null until the first message between the pair allocates one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationRef {
    pub id: Option<String>,
}

// -- Messages --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub receiver_id: String,
    pub content: String,
}

/// The created message record. `conversation` carries a newly allocated id
/// when none existed for the pair before this send.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentMessage {
    pub id: String,
    pub conversation: String,
    pub sender_id: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

// -- Reactions --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactRequest {
    pub emoji: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversation_ref_accepts_null_id() {
        let r: ConversationRef = serde_json::from_str(r#"{"id":null}"#).unwrap();
        assert!(r.id.is_none());
        let r: ConversationRef = serde_json::from_str(r#"{"id":"c9"}"#).unwrap();
        assert_eq!(r.id.as_deref(), Some("c9"));
    }

    #[test]
    fn sent_message_decodes_server_shape() {
        let m: SentMessage = serde_json::from_str(
            r#"{
                "id": "m1",
                "conversation": "c9",
                "sender_id": "u1",
                "content": "hi",
                "timestamp": "2025-06-01T12:00:00Z"
            }"#,
        )
        .unwrap();
        assert_eq!(m.conversation, "c9");
        assert_eq!(m.content, "hi");
    }
}
