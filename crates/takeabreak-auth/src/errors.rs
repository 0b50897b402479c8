//! Auth error types.

use crate::navigation::LandingError;

/// Errors that can occur during sign-in, refresh, logout, or session storage.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The identity provider reported an error on the callback (user denied).
    #[error("identity provider denied sign-in: {0}")]
    ProviderDenied(String),

    /// The callback carried neither an authorization code nor an error.
    #[error("callback is missing the authorization code")]
    InvalidCallback,

    /// The backend rejected the authorization code.
    #[error("code exchange failed: {0}")]
    ExchangeFailed(String),

    /// The backend rejected the refresh token.
    #[error("token refresh failed ({status})")]
    RefreshFailed {
        /// HTTP status code.
        status: u16,
    },

    /// The current-user profile could not be fetched.
    #[error("failed to get user profile ({status})")]
    ProfileFailed {
        /// HTTP status code.
        status: u16,
    },

    /// The backend did not acknowledge the logout.
    #[error("logout failed ({status})")]
    LogoutFailed {
        /// HTTP status code.
        status: u16,
    },

    /// Transport-level failure (connect, TLS, reset).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A success response body did not have the expected shape.
    #[error("unexpected response body: {0}")]
    InvalidResponse(#[source] serde_json::Error),

    /// File I/O error in session storage.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A configured URL could not be parsed.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Session snapshot serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Tokens or user were empty, so no authenticated session can be built.
    #[error("incomplete session: {0}")]
    IncompleteSession(&'static str),

    /// The session was cleared while the write was in flight.
    #[error("session was cleared before the write could apply")]
    StaleSession,

    /// The operation needs an authenticated session and there is none.
    #[error("not authenticated")]
    NotAuthenticated,
}

impl AuthError {
    /// The landing-page error code this failure surfaces as.
    ///
    /// Every failure maps onto one of the three user-facing codes; the
    /// technical message is never shown to the user.
    pub fn landing_error(&self) -> LandingError {
        match self {
            Self::ProviderDenied(_) => LandingError::OauthDenied,
            Self::InvalidCallback => LandingError::OauthInvalid,
            _ => LandingError::AuthFailed,
        }
    }

    /// Whether the failure came from the transport rather than the backend.
    pub fn is_network_fault(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exchange_failed_display() {
        let err = AuthError::ExchangeFailed("invalid_grant".to_string());
        assert_eq!(err.to_string(), "code exchange failed: invalid_grant");
    }

    #[test]
    fn refresh_failed_display() {
        let err = AuthError::RefreshFailed { status: 401 };
        assert_eq!(err.to_string(), "token refresh failed (401)");
    }

    #[test]
    fn landing_error_mapping() {
        assert_eq!(
            AuthError::ProviderDenied("access_denied".into()).landing_error(),
            LandingError::OauthDenied
        );
        assert_eq!(
            AuthError::InvalidCallback.landing_error(),
            LandingError::OauthInvalid
        );
        assert_eq!(
            AuthError::ExchangeFailed("x".into()).landing_error(),
            LandingError::AuthFailed
        );
        assert_eq!(
            AuthError::RefreshFailed { status: 401 }.landing_error(),
            LandingError::AuthFailed
        );
        assert_eq!(
            AuthError::StaleSession.landing_error(),
            LandingError::AuthFailed
        );
    }

    #[test]
    fn io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "not found");
        let auth_err = AuthError::from(io_err);
        assert!(auth_err.to_string().contains("not found"));
        assert!(!auth_err.is_network_fault());
    }
}
