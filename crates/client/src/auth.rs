//! Login, logout and session verification

use crate::http::{ApiClient, ApiRequest};
use crate::notify::{Notification, Notifier};
use crate::session::SessionStore;
use cloudpanel_common::{LoginResponse, Result, UserProfile, VerifySessionResponse};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Validated login form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// What the header shows for the current auth state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthBanner {
    pub label: String,
    pub show_logout: bool,
}

impl AuthBanner {
    pub fn for_user(user: Option<&UserProfile>) -> Self {
        match user {
            Some(user) => Self {
                label: user.email.clone(),
                show_logout: true,
            },
            None => Self {
                label: "Sign In".to_string(),
                show_logout: false,
            },
        }
    }
}

/// Drives the session lifecycle against the backend
#[derive(Clone)]
pub struct AuthClient {
    api: ApiClient,
    session: SessionStore,
    notifier: Arc<dyn Notifier>,
}

impl AuthClient {
    pub fn new(api: ApiClient, session: SessionStore, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            session,
            notifier,
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Exchange credentials for a token and persist the session
    pub async fn login(&self, credentials: &Credentials) -> Result<UserProfile> {
        let request = ApiRequest::post("/login").form(&[
            ("username", credentials.username.as_str()),
            ("password", credentials.password.as_str()),
        ]);

        let response: LoginResponse = match self.api.send(request).await {
            Ok(response) => response,
            Err(e) => {
                self.notifier
                    .notify(Notification::error(e.user_message("Login failed")));
                return Err(e);
            }
        };

        let profile = match response.user {
            Some(user) => user,
            None => self
                .fetch_profile(&response.access_token)
                .await
                .unwrap_or_else(|| UserProfile::new("", credentials.username.clone())),
        };

        if let Err(e) = self.session.save_session(&response.access_token, &profile) {
            error!("Failed to persist session: {}", e);
            self.notifier
                .notify(Notification::error(e.user_message("Login failed")));
            return Err(e);
        }

        info!("Logged in as {}", profile.email);
        self.notifier
            .notify(Notification::success(format!("Signed in as {}", profile.email)));
        Ok(profile)
    }

    async fn fetch_profile(&self, token: &str) -> Option<UserProfile> {
        let request = ApiRequest::get("/verify-session").query("token", token);
        match self.api.send::<VerifySessionResponse>(request).await {
            Ok(VerifySessionResponse {
                success: true,
                user: Some(user),
            }) => Some(user),
            Ok(_) => None,
            Err(e) => {
                warn!("Could not load profile after login: {}", e);
                None
            }
        }
    }

    /// Confirm the stored token is still valid
    ///
    /// Any outcome other than an explicit success clears the session.
    pub async fn verify_session(&self) -> bool {
        let Some(token) = self.session.bearer() else {
            debug!("No stored session to verify");
            return false;
        };

        let request = ApiRequest::get("/verify-session").query("token", &token);
        let outcome = self.api.send::<VerifySessionResponse>(request).await;

        let refreshed = match outcome {
            Ok(VerifySessionResponse {
                success: true,
                user: Some(user),
            }) => Some(user),
            Ok(VerifySessionResponse { success: true, user: None }) => self.session.current_user(),
            Ok(_) => {
                info!("Backend no longer accepts the stored session");
                None
            }
            Err(e) => {
                warn!("Session verification failed: {}", e);
                None
            }
        };

        match refreshed {
            Some(user) => match self.session.refresh_if_token(&token, &user) {
                Ok(true) => true,
                Ok(false) => {
                    debug!("Session changed while verifying, discarding reply");
                    false
                }
                Err(e) => {
                    error!("Failed to refresh stored profile: {}", e);
                    false
                }
            },
            None => {
                if let Err(e) = self.session.clear_if_token(&token) {
                    error!("Failed to clear session: {}", e);
                }
                false
            }
        }
    }

    /// Tell the backend and drop the local session
    ///
    /// The local session is cleared even when the backend call fails.
    pub async fn logout(&self) -> Result<()> {
        if let Some(token) = self.session.bearer() {
            let request = ApiRequest::post("/logout").json(&json!({ "token": token }))?;
            if let Err(e) = self.api.send::<serde_json::Value>(request).await {
                warn!("Error during logout: {}", e);
            }
        }

        self.session.clear_session()?;
        self.notifier.notify(Notification::info("Signed out"));
        Ok(())
    }

    pub fn banner(&self) -> AuthBanner {
        AuthBanner::for_user(self.session.current_user().as_ref())
    }

    /// Verify the stored session and report the resulting banner
    pub async fn init(&self) -> AuthBanner {
        self.verify_session().await;
        self.banner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::RequestBody;
    use crate::notify::{NotificationCenter, NotificationKind};
    use crate::testing::ScriptedTransport;
    use cloudpanel_common::MemoryStore;
    use std::time::Duration;

    struct Fixture {
        transport: Arc<ScriptedTransport>,
        notes: Arc<NotificationCenter>,
        auth: AuthClient,
    }

    fn fixture() -> Fixture {
        let transport = ScriptedTransport::new();
        let notes = Arc::new(NotificationCenter::new(Duration::from_secs(5)));
        let api = ApiClient::new("http://backend.test/api", transport.clone());
        let session = SessionStore::load(Arc::new(MemoryStore::new())).unwrap();
        let auth = AuthClient::new(api, session, notes.clone());
        Fixture {
            transport,
            notes,
            auth,
        }
    }

    fn credentials() -> Credentials {
        Credentials {
            username: "asha@example.com".to_string(),
            password: "secret".to_string(),
        }
    }

    #[tokio::test]
    async fn login_saves_token_and_profile() {
        let f = fixture();
        f.transport.reply("POST", "/login", 200, json!({"access_token": "tok"}));
        f.transport.reply(
            "GET",
            "/verify-session",
            200,
            json!({"success": true, "user": {"name": "Asha", "email": "asha@example.com"}}),
        );

        let profile = f.auth.login(&credentials()).await.unwrap();
        assert_eq!(profile.name, "Asha");
        assert!(f.auth.session().is_authenticated());
        assert_eq!(f.auth.session().bearer().as_deref(), Some("tok"));
        assert_eq!(f.auth.banner().label, "asha@example.com");

        let login = &f.transport.requests()[0];
        assert!(matches!(login.body, RequestBody::Form(_)));
    }

    #[tokio::test]
    async fn login_falls_back_to_username_profile() {
        let f = fixture();
        f.transport.reply("POST", "/login", 200, json!({"access_token": "tok"}));
        f.transport.fail("GET", "/verify-session", "connection reset");

        let profile = f.auth.login(&credentials()).await.unwrap();
        assert_eq!(profile.email, "asha@example.com");
        assert!(f.auth.session().is_authenticated());
    }

    #[tokio::test]
    async fn rejected_login_surfaces_detail() {
        let f = fixture();
        f.transport.reply(
            "POST",
            "/login",
            401,
            json!({"detail": "Incorrect username or password"}),
        );

        assert!(f.auth.login(&credentials()).await.is_err());
        assert!(!f.auth.session().is_authenticated());

        let notes = f.notes.history();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].kind, NotificationKind::Error);
        assert_eq!(notes[0].message, "Incorrect username or password");
    }

    #[tokio::test]
    async fn verify_without_token_makes_no_call() {
        let f = fixture();
        assert!(!f.auth.verify_session().await);
        assert!(f.transport.requests().is_empty());
    }

    #[tokio::test]
    async fn verify_success_refreshes_profile() {
        let f = fixture();
        f.auth
            .session()
            .save_session("tok", &UserProfile::new("Old", "old@example.com"))
            .unwrap();
        f.transport.reply(
            "GET",
            "/verify-session",
            200,
            json!({"success": true, "user": {"name": "New", "email": "new@example.com"}}),
        );

        assert!(f.auth.verify_session().await);
        assert_eq!(f.auth.session().current_user().unwrap().email, "new@example.com");
        assert_eq!(
            f.transport.requests()[0].query,
            vec![("token".to_string(), "tok".to_string())]
        );
    }

    #[tokio::test]
    async fn verify_rejection_clears_session() {
        let f = fixture();
        f.auth
            .session()
            .save_session("tok", &UserProfile::new("A", "a@example.com"))
            .unwrap();
        f.transport.reply("GET", "/verify-session", 200, json!({"success": false}));

        assert!(!f.auth.verify_session().await);
        assert!(!f.auth.session().is_authenticated());
        assert!(f.auth.session().current_user().is_none());
    }

    #[tokio::test]
    async fn verify_network_failure_clears_session() {
        let f = fixture();
        f.auth
            .session()
            .save_session("tok", &UserProfile::new("A", "a@example.com"))
            .unwrap();
        f.transport.fail("GET", "/verify-session", "connection refused");

        assert!(!f.auth.verify_session().await);
        assert!(!f.auth.session().is_authenticated());
        assert_eq!(f.auth.init().await, AuthBanner::for_user(None));
    }

    #[tokio::test]
    async fn verify_reply_after_logout_is_discarded() {
        let f = fixture();
        f.auth
            .session()
            .save_session("tok", &UserProfile::new("A", "a@example.com"))
            .unwrap();
        let gate = f.transport.gated("GET", "/verify-session");
        f.transport.reply("POST", "/logout", 200, json!({"message": "Logged out"}));

        let auth = Arc::new(f.auth);
        let in_flight = {
            let auth = auth.clone();
            tokio::spawn(async move { auth.verify_session().await })
        };
        while f.transport.count("GET", "/verify-session") == 0 {
            tokio::task::yield_now().await;
        }

        auth.logout().await.unwrap();
        gate.send((
            200,
            json!({"success": true, "user": {"name": "A", "email": "a@example.com"}}).to_string(),
        ))
        .unwrap();

        assert!(!in_flight.await.unwrap());
        assert!(!auth.session().is_authenticated());
        assert!(auth.session().bearer().is_none());
    }

    #[tokio::test]
    async fn logout_clears_even_when_backend_fails() {
        let f = fixture();
        f.auth
            .session()
            .save_session("tok", &UserProfile::new("A", "a@example.com"))
            .unwrap();
        f.transport.fail("POST", "/logout", "connection refused");

        f.auth.logout().await.unwrap();
        assert!(!f.auth.session().is_authenticated());
        assert!(!f.auth.banner().show_logout);
        assert_eq!(
            f.transport.requests()[0].body,
            RequestBody::Json(json!({"token": "tok"}))
        );
    }
}
