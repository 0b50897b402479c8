//! Backend auth API client.
//!
//! [`AuthClient`] is the only code that talks to the backend. It issues one
//! request per call: no retry, no backoff, no client-side timeout. Callers
//! that need those wrap the call themselves.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use takeabreak_settings::ApiSettings;

use crate::errors::AuthError;
use crate::types::{AuthResponse, User};

/// Code exchange endpoint.
pub const EXCHANGE_PATH: &str = "/api/v1/auth/google";
/// Token refresh endpoint.
pub const REFRESH_PATH: &str = "/api/v1/auth/refresh";
/// Current user endpoint.
pub const CURRENT_USER_PATH: &str = "/api/v1/users/me";
/// Logout endpoint.
pub const LOGOUT_PATH: &str = "/api/v1/auth/logout";

const DEFAULT_EXCHANGE_ERROR: &str = "Authentication failed";

/// The backend auth operations the session lifecycle depends on.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchange a provider authorization code for a token pair and user.
    async fn exchange_code(&self, code: &str) -> Result<AuthResponse, AuthError>;

    /// Mint a new token pair from a refresh token.
    async fn refresh(&self, refresh_token: &str) -> Result<AuthResponse, AuthError>;

    /// Fetch the profile of the access token's owner.
    async fn current_user(&self, access_token: &str) -> Result<User, AuthError>;

    /// Ask the backend to invalidate the session. Best effort.
    async fn logout(&self, access_token: &str) -> Result<(), AuthError>;
}

/// HTTP client for the backend auth API.
#[derive(Clone, Debug)]
pub struct AuthClient {
    base_url: String,
    http: reqwest::Client,
}

impl AuthClient {
    /// Client for the given base address.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_http_client(base_url, reqwest::Client::new())
    }

    /// Client reusing an existing connection pool.
    pub fn with_http_client(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, http }
    }

    /// Client for the configured backend.
    pub fn from_settings(settings: &ApiSettings) -> Self {
        Self::new(settings.base_url.clone())
    }

    /// Base address, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[async_trait]
impl AuthApi for AuthClient {
    #[tracing::instrument(skip_all)]
    async fn exchange_code(&self, code: &str) -> Result<AuthResponse, AuthError> {
        let resp = self
            .http
            .post(self.endpoint(EXCHANGE_PATH))
            .json(&serde_json::json!({ "code": code }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let message = exchange_error_message(&text);
            tracing::warn!(status = status.as_u16(), reason = %message, "code exchange rejected");
            return Err(AuthError::ExchangeFailed(message));
        }

        decode(resp).await
    }

    #[tracing::instrument(skip_all)]
    async fn refresh(&self, refresh_token: &str) -> Result<AuthResponse, AuthError> {
        let resp = self
            .http
            .post(self.endpoint(REFRESH_PATH))
            .bearer_auth(refresh_token)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?;

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            tracing::warn!(status, "token refresh rejected");
            return Err(AuthError::RefreshFailed { status });
        }

        decode(resp).await
    }

    #[tracing::instrument(skip_all)]
    async fn current_user(&self, access_token: &str) -> Result<User, AuthError> {
        let resp = self
            .http
            .get(self.endpoint(CURRENT_USER_PATH))
            .bearer_auth(access_token)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?;

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            return Err(AuthError::ProfileFailed { status });
        }

        decode(resp).await
    }

    #[tracing::instrument(skip_all)]
    async fn logout(&self, access_token: &str) -> Result<(), AuthError> {
        let resp = self
            .http
            .post(self.endpoint(LOGOUT_PATH))
            .bearer_auth(access_token)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?;

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            return Err(AuthError::LogoutFailed { status });
        }
        Ok(())
    }
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, AuthError> {
    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes).map_err(AuthError::InvalidResponse)
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Best-effort `{"error": ".."}` extraction from a rejection body.
fn exchange_error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| DEFAULT_EXCHANGE_ERROR.to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
