use alcove_types::api::{SendMessageRequest, SentMessage};

use crate::error::ApiError;
use crate::http::ApiClient;

impl ApiClient {
    /// Create a message addressed to `receiver_id`. The response carries the
    /// server-assigned message record, including the conversation id — newly
    /// allocated when this was the first message between the pair.
    pub async fn send_message(
        &self,
        receiver_id: &str,
        content: &str,
    ) -> Result<SentMessage, ApiError> {
        let url = self.url("messages/send/");
        let body = SendMessageRequest {
            receiver_id: receiver_id.to_string(),
            content: content.to_string(),
        };
        let resp = self
            .send_authorized(|http| http.post(&url).json(&body))
            .await?;
        Ok(resp.json().await?)
    }

    pub async fn delete_message(&self, message_id: &str) -> Result<(), ApiError> {
        let url = self.url(&format!("messages/{}/delete/", message_id));
        self.send_authorized(|http| http.delete(&url)).await?;
        Ok(())
    }
}
