//! API client for the wallet backend.
//!
//! Every call goes through a two-step pipeline: the access token from the
//! [`TokenStore`] is attached as a bearer credential, and a 401 answer on a
//! fresh request triggers a single token refresh followed by a single retry.
//! A second 401 on the retried request goes back to the caller.

use std::sync::Arc;

use reqwest::Method;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::resources::{Resource, ResourceClient};
use super::transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
use super::ApiError;
use crate::auth::{SessionState, TokenPair, TokenStore};
use crate::config::Config;
use crate::models::{Account, Budget, Category, Credentials, Registration, Transaction, User};

// ============================================================================
// Endpoints
// ============================================================================

const LOGIN_PATH: &str = "/auth/login/";
const REGISTER_PATH: &str = "/auth/register/";
const USER_PATH: &str = "/auth/user/";
const REFRESH_PATH: &str = "/auth/refresh/";

/// Retry marker carried by each logical request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    Fresh,
    Retried,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access: String,
    /// Present when the backend rotates refresh tokens
    #[serde(default)]
    refresh: Option<String>,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

/// API client for the wallet backend.
/// Clone is cheap - all state is shared behind `Arc`s.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    tokens: Arc<TokenStore>,
    session: Arc<SessionState>,
    /// Serializes refresh attempts so concurrent 401s share one refresh
    refresh_lock: Arc<Mutex<()>>,
}

impl ApiClient {
    /// Create a client talking to the configured backend over HTTP
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let transport = ReqwestTransport::new(&config.api_base_url, config.request_timeout_secs)?;
        Ok(Self::with_transport(Arc::new(transport), config.token_store()))
    }

    pub fn with_transport(transport: Arc<dyn Transport>, tokens: TokenStore) -> Self {
        Self {
            transport,
            tokens: Arc::new(tokens),
            session: Arc::new(SessionState::default()),
            refresh_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn session_state(&self) -> &SessionState {
        &self.session
    }

    // ========================================================================
    // Auth endpoints (no bearer, no refresh)
    // ========================================================================

    /// Exchange credentials for a token pair. Does not store it.
    /// A 401 here means the credentials were rejected.
    pub async fn login(&self, credentials: &Credentials) -> Result<TokenPair, ApiError> {
        let request = HttpRequest::new(Method::POST, LOGIN_PATH).with_body(to_json(credentials)?);
        let response = match self.send_public(request).await {
            Err(ApiError::Unauthorized) => return Err(ApiError::InvalidCredentials),
            other => other?,
        };
        decode(&response)
    }

    pub async fn register(&self, registration: &Registration) -> Result<serde_json::Value, ApiError> {
        let request =
            HttpRequest::new(Method::POST, REGISTER_PATH).with_body(to_json(registration)?);
        let response = self.send_public(request).await?;
        if response.body.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        decode(&response)
    }

    pub async fn user_details(&self) -> Result<User, ApiError> {
        self.get(USER_PATH, Vec::new()).await
    }

    async fn send_public(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let response = self.transport.send(request).await?;
        check_response(response)
    }

    // ========================================================================
    // Authenticated pipeline
    // ========================================================================

    /// Send a request with the stored access token, refreshing once on 401.
    pub(crate) async fn execute(&self, mut request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let mut attempt = Attempt::Fresh;

        loop {
            let sent_token = self.tokens.access_token();
            request.bearer = sent_token.clone();

            let response = self.transport.send(request.clone()).await?;
            if response.status != 401 {
                return check_response(response);
            }

            match attempt {
                Attempt::Fresh => {
                    debug!(path = %request.path, "Got 401, refreshing access token");
                    self.refresh_after_unauthorized(sent_token.as_deref()).await?;
                    attempt = Attempt::Retried;
                }
                Attempt::Retried => {
                    warn!(path = %request.path, "Still unauthorized after token refresh");
                    return Err(ApiError::Unauthorized);
                }
            }
        }
    }

    /// Obtain a new access token after `sent_token` was rejected.
    ///
    /// Only one refresh runs at a time. A caller that waited on the lock
    /// reuses the token another caller obtained instead of refreshing again.
    async fn refresh_after_unauthorized(&self, sent_token: Option<&str>) -> Result<(), ApiError> {
        let _guard = self.refresh_lock.lock().await;

        let current = self.tokens.access_token();
        if current.is_some() && current.as_deref() != sent_token {
            debug!("Access token already refreshed by a concurrent request");
            return Ok(());
        }

        let Some(refresh) = self.tokens.refresh_token() else {
            warn!("No refresh token available, ending session");
            self.expire_session();
            return Err(ApiError::SessionExpired);
        };

        match self.request_refresh(&refresh).await {
            Ok(renewed) => {
                self.tokens.set_access(renewed.access, renewed.refresh);
                info!("Access token refreshed");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed, ending session");
                self.expire_session();
                Err(ApiError::SessionExpired)
            }
        }
    }

    async fn request_refresh(&self, refresh: &str) -> Result<RefreshResponse, ApiError> {
        let request = HttpRequest::new(Method::POST, REFRESH_PATH)
            .with_body(to_json(&RefreshRequest { refresh })?);
        let response = self.send_public(request).await?;
        decode(&response)
    }

    /// Tokens and session always go away together.
    fn expire_session(&self) {
        self.tokens.clear();
        self.session.end(true);
    }

    // ========================================================================
    // JSON helpers
    // ========================================================================

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Vec<(String, String)>,
    ) -> Result<T, ApiError> {
        let response = self
            .execute(HttpRequest::new(Method::GET, path).with_query(query))
            .await?;
        decode(&response)
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self
            .execute(HttpRequest::new(Method::POST, path).with_body(to_json(body)?))
            .await?;
        decode(&response)
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self
            .execute(HttpRequest::new(Method::PUT, path).with_body(to_json(body)?))
            .await?;
        decode(&response)
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.execute(HttpRequest::new(Method::DELETE, path)).await?;
        Ok(())
    }

    // ========================================================================
    // Resource clients
    // ========================================================================

    pub fn resource<R: Resource>(&self) -> ResourceClient<R> {
        ResourceClient::new(self.clone(), R::PATH)
    }

    pub fn accounts(&self) -> ResourceClient<Account> {
        self.resource()
    }

    pub fn categories(&self) -> ResourceClient<Category> {
        self.resource()
    }

    pub fn transactions(&self) -> ResourceClient<Transaction> {
        self.resource()
    }

    pub fn budgets(&self) -> ResourceClient<Budget> {
        self.resource()
    }
}

fn to_json<B: Serialize + ?Sized>(body: &B) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(body)
        .map_err(|e| ApiError::InvalidInput(format!("Failed to encode request body: {}", e)))
}

/// Map non-success statuses onto the error taxonomy.
fn check_response(response: HttpResponse) -> Result<HttpResponse, ApiError> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(ApiError::from_status(response.status, &response.body))
    }
}

fn decode<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    serde_json::from_str(&response.body)
        .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse response: {}", e)))
}
