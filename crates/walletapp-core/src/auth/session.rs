use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::models::{Credentials, Registration, User};

/// Snapshot of who is logged in.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user: Option<User>,
    /// True until the first restore attempt has finished
    pub loading: bool,
    /// Set when the session ended because a token refresh failed.
    /// Front ends react by sending the user back to the login prompt.
    pub login_required: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            user: None,
            loading: true,
            login_required: false,
        }
    }
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

/// Shared, observable session record.
///
/// Held by the API client (which ends the session when a refresh fails) and
/// by the [`SessionContext`]. Views subscribe to follow login/logout.
#[derive(Debug)]
pub struct SessionState {
    tx: watch::Sender<Session>,
}

impl Default for SessionState {
    fn default() -> Self {
        let (tx, _rx) = watch::channel(Session::default());
        Self { tx }
    }
}

impl SessionState {
    pub fn snapshot(&self) -> Session {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.tx.subscribe()
    }

    pub(crate) fn set_user(&self, user: User) {
        self.tx.send_modify(|s| {
            s.user = Some(user);
            s.login_required = false;
        });
    }

    pub(crate) fn finish_loading(&self) {
        self.tx.send_if_modified(|s| std::mem::replace(&mut s.loading, false));
    }

    pub(crate) fn end(&self, login_required: bool) {
        self.tx.send_modify(|s| {
            s.user = None;
            s.login_required = login_required;
        });
    }
}

/// Session lifecycle built on the API client and its token store.
#[derive(Clone)]
pub struct SessionContext {
    api: ApiClient,
}

impl SessionContext {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn session(&self) -> Session {
        self.api.session_state().snapshot()
    }

    pub fn current_user(&self) -> Option<User> {
        self.session().user
    }

    pub fn is_authenticated(&self) -> bool {
        self.session().is_authenticated()
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.api.session_state().subscribe()
    }

    /// Rebuild the session from stored tokens on start-up.
    /// Any failure demotes silently to logged out.
    pub async fn restore(&self) -> Option<User> {
        let user = if self.api.tokens().is_empty() {
            debug!("No stored tokens, starting logged out");
            None
        } else {
            match self.api.user_details().await {
                Ok(user) => {
                    info!(username = %user.username, "Session restored");
                    self.api.session_state().set_user(user.clone());
                    Some(user)
                }
                Err(e) => {
                    warn!(error = %e, "Failed to restore session");
                    self.logout();
                    None
                }
            }
        };
        self.api.session_state().finish_loading();
        user
    }

    /// Authenticate, persist the token pair and load the user.
    /// A rejected login leaves the session untouched.
    pub async fn login(&self, credentials: &Credentials) -> Result<User, ApiError> {
        credentials.validate()?;

        let pair = self.api.login(credentials).await?;
        self.api.tokens().save(pair);

        match self.api.user_details().await {
            Ok(user) => {
                info!(username = %user.username, "Login successful");
                self.api.session_state().set_user(user.clone());
                Ok(user)
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch user details after login");
                self.logout();
                Err(e)
            }
        }
    }

    /// Create an account. Does not log the new user in.
    pub async fn register(&self, registration: &Registration) -> Result<serde_json::Value, ApiError> {
        registration.validate()?;
        let created = self.api.register(registration).await?;
        info!(username = %registration.username, "Registration accepted");
        Ok(created)
    }

    pub fn logout(&self) {
        self.api.tokens().clear();
        self.api.session_state().end(false);
        info!("Logged out");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::api::testing::{json, ScriptedTransport};
    use crate::auth::{TokenPair, TokenStore};

    const ALICE: &str = r#"{"id": 1, "username": "alice", "email": "alice@example.com"}"#;

    fn context(transport: Arc<ScriptedTransport>, tokens: TokenStore) -> SessionContext {
        SessionContext::new(ApiClient::with_transport(transport, tokens))
    }

    #[test]
    fn test_initial_session_is_loading() {
        let state = SessionState::default();
        let s = state.snapshot();
        assert!(s.loading);
        assert!(s.user.is_none());
    }

    #[tokio::test]
    async fn test_login_stores_tokens_and_user() {
        let transport = ScriptedTransport::new(|req| match req.path.as_str() {
            "/auth/login/" => json(200, r#"{"access": "tok1", "refresh": "ref1"}"#),
            "/auth/user/" if req.bearer.as_deref() == Some("tok1") => json(200, ALICE),
            _ => json(401, r#"{"detail": "no"}"#),
        });
        let ctx = context(transport.clone(), TokenStore::in_memory());

        let user = ctx.login(&Credentials::new("alice", "x")).await.unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(ctx.api().tokens().read(), Some(TokenPair::new("tok1", "ref1")));
        assert_eq!(ctx.current_user().unwrap().username, "alice");

        let login = &transport.requests()[0];
        assert!(login.bearer.is_none());
        assert_eq!(login.body.as_ref().unwrap()["username"], "alice");
    }

    #[tokio::test]
    async fn test_rejected_login_leaves_session_untouched() {
        let transport = ScriptedTransport::new(|_| {
            json(401, r#"{"detail": "No active account found with the given credentials"}"#)
        });
        let ctx = context(transport.clone(), TokenStore::in_memory());

        let err = ctx.login(&Credentials::new("alice", "bad")).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidCredentials));
        assert!(ctx.api().tokens().is_empty());
        assert!(!ctx.session().login_required);
        // no refresh attempt for the login endpoint
        assert_eq!(transport.count_path("/auth/refresh/"), 0);
    }

    #[tokio::test]
    async fn test_requests_after_login_carry_new_token() {
        let transport = ScriptedTransport::new(|req| match req.path.as_str() {
            "/auth/login/" => json(200, r#"{"access": "tok1", "refresh": "ref1"}"#),
            _ if req.bearer.as_deref() != Some("tok1") => json(401, "{}"),
            "/auth/user/" => json(200, ALICE),
            "/api/transactions/" => json(200, "[]"),
            _ => json(404, ""),
        });
        let ctx = context(transport.clone(), TokenStore::in_memory());

        ctx.login(&Credentials::new("alice", "x")).await.unwrap();
        let transactions = ctx.api().transactions().get_all().await.unwrap();
        assert!(transactions.is_empty());

        let listed = transport
            .requests()
            .into_iter()
            .find(|r| r.path == "/api/transactions/")
            .unwrap();
        assert_eq!(listed.bearer.as_deref(), Some("tok1"));
        assert_eq!(transport.count_path("/auth/refresh/"), 0);
    }

    #[tokio::test]
    async fn test_register_does_not_log_in() {
        let transport = ScriptedTransport::new(|req| match req.path.as_str() {
            "/auth/register/" => json(201, r#"{"username": "bob", "email": "b@x.io"}"#),
            _ => json(500, ""),
        });
        let ctx = context(transport, TokenStore::in_memory());
        let reg = Registration {
            username: "bob".into(),
            email: "b@x.io".into(),
            password: "pw".into(),
            password2: "pw".into(),
        };
        let created = ctx.register(&reg).await.unwrap();
        assert_eq!(created["username"], "bob");
        assert!(!ctx.is_authenticated());
        assert!(ctx.api().tokens().is_empty());
    }

    #[tokio::test]
    async fn test_register_surfaces_validation_payload() {
        let transport = ScriptedTransport::new(|_| {
            json(400, r#"{"username": ["A user with that username already exists."]}"#)
        });
        let ctx = context(transport, TokenStore::in_memory());
        let reg = Registration {
            username: "bob".into(),
            email: "b@x.io".into(),
            password: "pw".into(),
            password2: "pw".into(),
        };
        let err = ctx.register(&reg).await.unwrap_err();
        assert_eq!(
            err.user_message(),
            "username: A user with that username already exists."
        );
    }

    #[tokio::test]
    async fn test_restore_round_trip() {
        let transport = ScriptedTransport::new(|req| match req.path.as_str() {
            "/auth/login/" => json(200, r#"{"access": "tok1", "refresh": "ref1"}"#),
            "/auth/user/" if req.bearer.as_deref() == Some("tok1") => json(200, ALICE),
            _ => json(401, "{}"),
        });

        let path = std::env::temp_dir()
            .join(format!("walletapp-session-{}", std::process::id()))
            .join("tokens.json");
        let open = || TokenStore::new(Box::new(crate::auth::FileBackend::new(path.clone())));

        let first = context(transport.clone(), open());
        let logged_in = first.login(&Credentials::new("alice", "x")).await.unwrap();

        // a fresh process reading the same storage
        let second = context(transport, open());
        assert!(second.session().loading);
        let restored = second.restore().await;
        assert_eq!(restored, Some(logged_in));
        assert!(!second.session().loading);

        second.logout();
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn test_restore_without_tokens() {
        let transport = ScriptedTransport::new(|_| json(500, ""));
        let ctx = context(transport.clone(), TokenStore::in_memory());
        assert!(ctx.restore().await.is_none());
        assert!(!ctx.session().loading);
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_failed_restore_logs_out() {
        let transport = ScriptedTransport::new(|req| match req.path.as_str() {
            "/auth/user/" => json(500, "boom"),
            _ => json(404, ""),
        });
        let tokens = TokenStore::in_memory();
        tokens.save(TokenPair::new("a", "r"));
        let ctx = context(transport, tokens);

        assert!(ctx.restore().await.is_none());
        assert!(ctx.api().tokens().is_empty());
        assert!(!ctx.session().loading);
    }

    #[tokio::test]
    async fn test_logout_always_clears() {
        let transport = ScriptedTransport::new(|req| match req.path.as_str() {
            "/auth/user/" => json(200, ALICE),
            _ => json(404, ""),
        });
        let tokens = TokenStore::in_memory();
        tokens.save(TokenPair::new("a", "r"));
        let ctx = context(transport, tokens);
        ctx.restore().await;
        assert!(ctx.is_authenticated());

        ctx.logout();
        assert!(ctx.api().tokens().is_empty());
        assert!(ctx.current_user().is_none());

        // logging out twice is harmless
        ctx.logout();
        assert!(ctx.api().tokens().is_empty());
        assert!(!ctx.is_authenticated());
    }

    #[tokio::test]
    async fn test_subscribers_see_logout() {
        let transport = ScriptedTransport::new(|_| json(200, ALICE));
        let tokens = TokenStore::in_memory();
        tokens.save(TokenPair::new("a", "r"));
        let ctx = context(transport, tokens);
        ctx.restore().await;

        let mut rx = ctx.subscribe();
        ctx.logout();
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().user.is_none());
    }
}
