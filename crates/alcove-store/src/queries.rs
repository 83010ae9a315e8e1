use anyhow::Result;
use rusqlite::OptionalExtension;

use crate::Store;
use crate::models::StoredSession;

const ACCESS_TOKEN: &str = "access_token";
const REFRESH_TOKEN: &str = "refresh_token";
const CURRENT_USER: &str = "current_user";

impl Store {
    fn put(&self, key: &str, value: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
                 ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
                (key, value),
            )?;
            Ok(())
        })
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            let value = conn
                .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| {
                    row.get(0)
                })
                .optional()?;
            Ok(value)
        })
    }

    // -- Session --

    pub fn save_session(&self, session: &StoredSession) -> Result<()> {
        self.put(ACCESS_TOKEN, &session.access_token)?;
        self.put(REFRESH_TOKEN, &session.refresh_token)?;
        self.put(CURRENT_USER, &serde_json::to_string(&session.user)?)?;
        Ok(())
    }

    /// Update only the access credential, after a successful refresh.
    pub fn save_access_token(&self, access_token: &str) -> Result<()> {
        self.put(ACCESS_TOKEN, access_token)
    }

    pub fn load_session(&self) -> Result<Option<StoredSession>> {
        let (Some(access_token), Some(refresh_token), Some(user_json)) = (
            self.get(ACCESS_TOKEN)?,
            self.get(REFRESH_TOKEN)?,
            self.get(CURRENT_USER)?,
        ) else {
            return Ok(None);
        };

        Ok(Some(StoredSession {
            access_token,
            refresh_token,
            user: serde_json::from_str(&user_json)?,
        }))
    }

    /// Logout: drop every persisted credential.
    pub fn clear_session(&self) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "DELETE FROM kv WHERE key IN (?1, ?2, ?3)",
                (ACCESS_TOKEN, REFRESH_TOKEN, CURRENT_USER),
            )?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alcove_types::models::{Presence, UserProfile};

    fn sample_session() -> StoredSession {
        StoredSession {
            access_token: "access-1".into(),
            refresh_token: "refresh-1".into(),
            user: UserProfile {
                id: "u1".into(),
                email: "me@example.com".into(),
                full_name: "Current User".into(),
                profile_photo: None,
                presence: Presence::Online,
                last_seen: None,
                last_message: None,
                unread_count: None,
            },
        }
    }

    #[test]
    fn save_and_load_round_trip() {
        let store = Store::open_in_memory().unwrap();
        assert!(store.load_session().unwrap().is_none());

        store.save_session(&sample_session()).unwrap();
        let loaded = store.load_session().unwrap().unwrap();
        assert_eq!(loaded.access_token, "access-1");
        assert_eq!(loaded.user.email, "me@example.com");
    }

    #[test]
    fn refresh_updates_only_access_token() {
        let store = Store::open_in_memory().unwrap();
        store.save_session(&sample_session()).unwrap();

        store.save_access_token("access-2").unwrap();
        let loaded = store.load_session().unwrap().unwrap();
        assert_eq!(loaded.access_token, "access-2");
        assert_eq!(loaded.refresh_token, "refresh-1");
    }

    #[test]
    fn clear_removes_everything() {
        let store = Store::open_in_memory().unwrap();
        store.save_session(&sample_session()).unwrap();
        store.clear_session().unwrap();
        assert!(store.load_session().unwrap().is_none());
    }

    #[test]
    fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.db");

        {
            let store = Store::open(&path).unwrap();
            store.save_session(&sample_session()).unwrap();
        }

        let store = Store::open(&path).unwrap();
        let loaded = store.load_session().unwrap().unwrap();
        assert_eq!(loaded.user.id, "u1");
    }
}
