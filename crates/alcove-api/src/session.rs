use std::sync::RwLock;

use alcove_types::models::UserProfile;

/// Authenticated session context: the current-user record plus the live
/// credential pair. One instance is created at login (or restored from the
/// session store) and handed to every component that needs identity or
/// authorization — nothing reads credentials from ambient global state.
pub struct Session {
    user: UserProfile,
    tokens: RwLock<TokenPair>,
}

#[derive(Clone)]
struct TokenPair {
    access: String,
    refresh: String,
}

impl Session {
    pub fn new(user: UserProfile, access: String, refresh: String) -> Self {
        Self {
            user,
            tokens: RwLock::new(TokenPair { access, refresh }),
        }
    }

    pub fn user(&self) -> &UserProfile {
        &self.user
    }

    pub fn user_id(&self) -> &str {
        &self.user.id
    }

    pub fn access_token(&self) -> String {
        self.tokens.read().expect("token lock poisoned").access.clone()
    }

    pub fn refresh_token(&self) -> String {
        self.tokens.read().expect("token lock poisoned").refresh.clone()
    }

    /// Swap in a fresh access credential after a successful refresh. The
    /// refresh credential is untouched.
    pub fn set_access_token(&self, access: String) {
        self.tokens.write().expect("token lock poisoned").access = access;
    }
}
