//! Auth session store
//!
//! The bearer token and user profile live in durable storage under two keys
//! that are always written and cleared together. An in-memory mirror is
//! loaded once at start-up and updated in the same critical section as every
//! durable write.

use crate::http::{ApiClient, ApiRequest};
use cloudpanel_common::{KeyValueStore, Result, UserProfile};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Storage key of the bearer token
pub const AUTH_TOKEN_KEY: &str = "auth_token";

/// Storage key of the JSON-encoded user profile
pub const USER_DATA_KEY: &str = "user_data";

/// Authenticated-user context
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub user: UserProfile,
}

/// Durable session store
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn KeyValueStore>,
    current: Arc<RwLock<Option<Session>>>,
}

impl SessionStore {
    /// Initialize from durable storage
    ///
    /// A token without a readable profile, or a profile without a token, is
    /// not a session; both keys are cleared.
    pub fn load(storage: Arc<dyn KeyValueStore>) -> Result<Self> {
        let token = storage.get(AUTH_TOKEN_KEY)?;
        let user = storage.get(USER_DATA_KEY)?;

        let session = match (token, user) {
            (Some(token), Some(user)) => match serde_json::from_str::<UserProfile>(&user) {
                Ok(user) => Some(Session { token, user }),
                Err(e) => {
                    warn!("Discarding session with unreadable profile: {}", e);
                    storage.remove_all(&[AUTH_TOKEN_KEY, USER_DATA_KEY])?;
                    None
                }
            },
            (None, None) => None,
            _ => {
                warn!("Discarding half-written session");
                storage.remove_all(&[AUTH_TOKEN_KEY, USER_DATA_KEY])?;
                None
            }
        };

        if let Some(session) = &session {
            debug!("Restored session for {}", session.user.email);
        }

        Ok(Self {
            storage,
            current: Arc::new(RwLock::new(session)),
        })
    }

    /// Persist token and profile as one unit
    pub fn save_session(&self, token: &str, profile: &UserProfile) -> Result<()> {
        let user = serde_json::to_string(profile)?;
        let mut current = self.current.write();
        self.storage
            .put_all(&[(AUTH_TOKEN_KEY, token), (USER_DATA_KEY, &user)])?;
        *current = Some(Session {
            token: token.to_string(),
            user: profile.clone(),
        });
        info!("Session saved for {}", profile.email);
        Ok(())
    }

    /// Remove token and profile; clearing an empty store is fine
    pub fn clear_session(&self) -> Result<()> {
        let mut current = self.current.write();
        self.storage.remove_all(&[AUTH_TOKEN_KEY, USER_DATA_KEY])?;
        if current.take().is_some() {
            info!("Session cleared");
        }
        Ok(())
    }

    /// Clear the session only if it still holds `token`
    ///
    /// Returns whether anything was cleared. A request that started before a
    /// re-login must not wipe the newer session.
    pub fn clear_if_token(&self, token: &str) -> Result<bool> {
        let mut current = self.current.write();
        match current.as_ref() {
            Some(session) if session.token == token => {
                self.storage.remove_all(&[AUTH_TOKEN_KEY, USER_DATA_KEY])?;
                *current = None;
                info!("Session cleared after authorization failure");
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Rewrite the profile only if the session still holds `token`
    ///
    /// Returns whether anything was written. A verify reply that lands after
    /// a logout or a re-login must not bring the old session back.
    pub fn refresh_if_token(&self, token: &str, profile: &UserProfile) -> Result<bool> {
        let user = serde_json::to_string(profile)?;
        let mut current = self.current.write();
        match current.as_ref() {
            Some(session) if session.token == token => {
                self.storage
                    .put_all(&[(AUTH_TOKEN_KEY, token), (USER_DATA_KEY, &user)])?;
                *current = Some(Session {
                    token: token.to_string(),
                    user: profile.clone(),
                });
                debug!("Profile refreshed for {}", profile.email);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.read().is_some()
    }

    pub fn current_user(&self) -> Option<UserProfile> {
        self.current.read().as_ref().map(|s| s.user.clone())
    }

    /// Owned snapshot of the bearer token
    pub fn bearer(&self) -> Option<String> {
        self.current.read().as_ref().map(|s| s.token.clone())
    }

    pub fn session(&self) -> Option<Session> {
        self.current.read().clone()
    }
}

/// Send a request carrying the current bearer token, if any
///
/// The token is read once; when the backend rejects it the session is
/// cleared, unless it has been replaced in the meantime.
pub async fn send_authorized<T: DeserializeOwned>(
    api: &ApiClient,
    session: &SessionStore,
    request: ApiRequest,
) -> Result<T> {
    let bearer = session.bearer();
    let result = api.send(request.bearer(bearer.clone())).await;

    if let (Err(e), Some(token)) = (&result, &bearer) {
        if e.is_auth_expired() {
            if let Err(clear_err) = session.clear_if_token(token) {
                error!("Failed to clear expired session: {}", clear_err);
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedTransport;
    use cloudpanel_common::{MemoryStore, SqliteStore};
    use serde_json::json;
    use tempfile::TempDir;

    fn profile() -> UserProfile {
        UserProfile::new("Asha", "asha@example.com")
    }

    #[test]
    fn save_then_clear_round_trip() {
        let storage = Arc::new(MemoryStore::new());
        let store = SessionStore::load(storage.clone()).unwrap();
        assert!(!store.is_authenticated());

        store.save_session("tok", &profile()).unwrap();
        assert!(store.is_authenticated());
        assert_eq!(store.current_user(), Some(profile()));
        assert_eq!(store.bearer().as_deref(), Some("tok"));
        assert_eq!(storage.get(AUTH_TOKEN_KEY).unwrap().as_deref(), Some("tok"));

        store.clear_session().unwrap();
        assert!(!store.is_authenticated());
        assert!(store.current_user().is_none());
        assert!(storage.get(AUTH_TOKEN_KEY).unwrap().is_none());
        assert!(storage.get(USER_DATA_KEY).unwrap().is_none());

        // Idempotent
        store.clear_session().unwrap();
    }

    #[test]
    fn session_survives_restart() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("session.db");

        {
            let store = SessionStore::load(Arc::new(SqliteStore::open(&path).unwrap())).unwrap();
            store.save_session("tok", &profile()).unwrap();
        }

        let store = SessionStore::load(Arc::new(SqliteStore::open(&path).unwrap())).unwrap();
        assert_eq!(store.bearer().as_deref(), Some("tok"));
        assert_eq!(store.current_user(), Some(profile()));
    }

    #[test]
    fn half_written_session_is_discarded() {
        let storage = Arc::new(MemoryStore::new());
        storage.put_all(&[(AUTH_TOKEN_KEY, "orphan")]).unwrap();

        let store = SessionStore::load(storage.clone()).unwrap();
        assert!(!store.is_authenticated());
        assert!(storage.get(AUTH_TOKEN_KEY).unwrap().is_none());
    }

    #[test]
    fn unreadable_profile_is_discarded() {
        let storage = Arc::new(MemoryStore::new());
        storage
            .put_all(&[(AUTH_TOKEN_KEY, "tok"), (USER_DATA_KEY, "{broken")])
            .unwrap();

        let store = SessionStore::load(storage.clone()).unwrap();
        assert!(!store.is_authenticated());
        assert!(storage.get(USER_DATA_KEY).unwrap().is_none());
    }

    #[test]
    fn clear_if_token_ignores_newer_session() {
        let store = SessionStore::load(Arc::new(MemoryStore::new())).unwrap();
        store.save_session("new", &profile()).unwrap();

        assert!(!store.clear_if_token("old").unwrap());
        assert!(store.is_authenticated());

        assert!(store.clear_if_token("new").unwrap());
        assert!(!store.is_authenticated());
    }

    #[test]
    fn refresh_if_token_ignores_replaced_session() {
        let storage = Arc::new(MemoryStore::new());
        let store = SessionStore::load(storage.clone()).unwrap();
        let newer = UserProfile::new("Other", "other@example.com");

        assert!(!store.refresh_if_token("tok", &profile()).unwrap());
        assert!(!store.is_authenticated());
        assert!(storage.get(AUTH_TOKEN_KEY).unwrap().is_none());

        store.save_session("new", &newer).unwrap();
        assert!(!store.refresh_if_token("old", &profile()).unwrap());
        assert_eq!(store.current_user(), Some(newer));

        assert!(store.refresh_if_token("new", &profile()).unwrap());
        assert_eq!(store.current_user(), Some(profile()));
        let stored = storage.get(USER_DATA_KEY).unwrap().unwrap();
        assert!(stored.contains("asha@example.com"));
    }

    #[tokio::test]
    async fn rejected_bearer_clears_session() {
        let transport = ScriptedTransport::new();
        transport.reply("GET", "/service-list", 401, json!({"detail": "Invalid token"}));
        let api = ApiClient::new("http://backend.test", transport.clone());
        let store = SessionStore::load(Arc::new(MemoryStore::new())).unwrap();
        store.save_session("stale", &profile()).unwrap();

        let err =
            send_authorized::<serde_json::Value>(&api, &store, ApiRequest::get("/service-list"))
                .await
                .unwrap_err();

        assert!(err.is_auth_expired());
        assert!(!store.is_authenticated());
        assert_eq!(transport.requests()[0].bearer.as_deref(), Some("stale"));
    }

    #[tokio::test]
    async fn clear_during_flight_fails_cleanly() {
        let transport = ScriptedTransport::new();
        let gate = transport.gated("GET", "/service-list");
        let api = ApiClient::new("http://backend.test", transport.clone());
        let store = SessionStore::load(Arc::new(MemoryStore::new())).unwrap();
        store.save_session("tok", &profile()).unwrap();

        let in_flight = {
            let api = api.clone();
            let store = store.clone();
            tokio::spawn(async move {
                let request = ApiRequest::get("/service-list");
                send_authorized::<serde_json::Value>(&api, &store, request).await
            })
        };
        while transport.count("GET", "/service-list") == 0 {
            tokio::task::yield_now().await;
        }

        store.clear_session().unwrap();
        gate.send((401, r#"{"detail":"Invalid token"}"#.to_string())).unwrap();

        let err = in_flight.await.unwrap().unwrap_err();
        assert!(err.is_auth_expired());
        assert!(!store.is_authenticated());
    }
}
