use alcove_types::api::ConversationRef;
use alcove_types::models::Message;

use crate::error::ApiError;
use crate::http::ApiClient;

impl ApiClient {
    /// Resolve the conversation id for (current user, peer), if the pair has
    /// ever exchanged a message. Returns `None` until the first send
    /// allocates one server-side.
    pub async fn conversation_with(&self, peer_email: &str) -> Result<Option<String>, ApiError> {
        let url = self.url(&format!("conversations/with/{}/", peer_email));
        let resp = self.send_authorized(|http| http.get(&url)).await?;
        let conversation: ConversationRef = resp.json().await?;
        Ok(conversation.id)
    }

    /// Fetch the full, authoritative message list for a conversation.
    pub async fn fetch_messages(&self, conversation_id: &str) -> Result<Vec<Message>, ApiError> {
        let url = self.url(&format!("conversations/{}", conversation_id));
        let resp = self.send_authorized(|http| http.get(&url)).await?;
        Ok(resp.json().await?)
    }
}
