use async_trait::async_trait;

use alcove_api::{ApiClient, ApiError};
use alcove_types::api::SentMessage;
use alcove_types::models::{Message, UserProfile};

/// The remote surface the controllers drive. [`ApiClient`] is the production
/// implementation; tests substitute an in-memory double with failure
/// injection and call counting.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn conversation_with(&self, peer_email: &str) -> Result<Option<String>, ApiError>;
    async fn fetch_messages(&self, conversation_id: &str) -> Result<Vec<Message>, ApiError>;
    async fn send_message(&self, receiver_id: &str, content: &str)
    -> Result<SentMessage, ApiError>;
    async fn delete_message(&self, message_id: &str) -> Result<(), ApiError>;
    async fn add_reaction(&self, message_id: &str, emoji: &str) -> Result<(), ApiError>;
    async fn remove_reaction(&self, message_id: &str, emoji: &str) -> Result<(), ApiError>;
    async fn fetch_users(&self) -> Result<Vec<UserProfile>, ApiError>;
}

#[async_trait]
impl ChatBackend for ApiClient {
    async fn conversation_with(&self, peer_email: &str) -> Result<Option<String>, ApiError> {
        ApiClient::conversation_with(self, peer_email).await
    }

    async fn fetch_messages(&self, conversation_id: &str) -> Result<Vec<Message>, ApiError> {
        ApiClient::fetch_messages(self, conversation_id).await
    }

    async fn send_message(
        &self,
        receiver_id: &str,
        content: &str,
    ) -> Result<SentMessage, ApiError> {
        ApiClient::send_message(self, receiver_id, content).await
    }

    async fn delete_message(&self, message_id: &str) -> Result<(), ApiError> {
        ApiClient::delete_message(self, message_id).await
    }

    async fn add_reaction(&self, message_id: &str, emoji: &str) -> Result<(), ApiError> {
        ApiClient::add_reaction(self, message_id, emoji).await
    }

    async fn remove_reaction(&self, message_id: &str, emoji: &str) -> Result<(), ApiError> {
        ApiClient::remove_reaction(self, message_id, emoji).await
    }

    async fn fetch_users(&self) -> Result<Vec<UserProfile>, ApiError> {
        ApiClient::fetch_users(self).await
    }
}
