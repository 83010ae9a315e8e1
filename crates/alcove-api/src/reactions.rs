use alcove_types::api::ReactRequest;

use crate::error::ApiError;
use crate::http::ApiClient;

impl ApiClient {
    pub async fn add_reaction(&self, message_id: &str, emoji: &str) -> Result<(), ApiError> {
        let url = self.url(&format!("messages/{}/react/", message_id));
        let body = ReactRequest {
            emoji: emoji.to_string(),
        };
        self.send_authorized(|http| http.post(&url).json(&body))
            .await?;
        Ok(())
    }

    pub async fn remove_reaction(&self, message_id: &str, emoji: &str) -> Result<(), ApiError> {
        let url = self.url(&format!("messages/{}/remove-reaction/", message_id));
        let body = ReactRequest {
            emoji: emoji.to_string(),
        };
        self.send_authorized(|http| http.post(&url).json(&body))
            .await?;
        Ok(())
    }
}
