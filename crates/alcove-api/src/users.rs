use alcove_types::models::UserProfile;

use crate::error::ApiError;
use crate::http::ApiClient;

impl ApiClient {
    /// Fetch the user directory, minus the current user.
    pub async fn fetch_users(&self) -> Result<Vec<UserProfile>, ApiError> {
        let url = self.url("users/all/");
        let resp = self.send_authorized(|http| http.get(&url)).await?;
        let users: Vec<UserProfile> = resp.json().await?;

        let me = self.session().user_id();
        Ok(users.into_iter().filter(|u| u.id != me).collect())
    }
}
