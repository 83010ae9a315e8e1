use alcove_types::models::UserProfile;
use serde::{Deserialize, Serialize};

/// Everything needed to resume an authenticated session after a restart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSession {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserProfile,
}
