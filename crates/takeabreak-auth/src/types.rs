//! Core auth data types: user profile, token pair, session.
//!
//! Token-bearing types implement [`Debug`] by hand so credentials never end
//! up in logs or panic messages.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::AuthError;

/// Break length used when the profile does not carry a preference.
pub const DEFAULT_BREAK_DURATION_MINUTES: u32 = 10;

const REDACTED: &str = "[redacted]";

fn default_break_duration() -> u32 {
    DEFAULT_BREAK_DURATION_MINUTES
}

/// The backend sends `null` for unset preferences.
fn break_duration_or_default<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u32>::deserialize(deserializer)?.unwrap_or(DEFAULT_BREAK_DURATION_MINUTES))
}

/// User profile as returned by the backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Opaque stable identifier.
    pub id: String,
    /// Account email, unique per account.
    pub email: String,
    /// Display name.
    #[serde(default)]
    pub full_name: String,
    /// Profile picture URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    /// Work domain derived from the email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_domain: Option<String>,
    /// IANA timezone name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    /// Preferred break length in minutes.
    #[serde(
        default = "default_break_duration",
        deserialize_with = "break_duration_or_default"
    )]
    pub preferred_break_duration: u32,
    /// Free-text onboarding answer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biggest_challenge: Option<String>,
    /// Account creation timestamp (ISO-8601), as sent by the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl User {
    /// First word of the display name, used in greetings.
    pub fn first_name(&self) -> &str {
        self.full_name.split_whitespace().next().unwrap_or_default()
    }
}

/// Access/refresh token pair issued by the backend.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived bearer credential.
    pub access_token: String,
    /// Long-lived credential for minting new access tokens.
    pub refresh_token: String,
    /// Access token lifetime in seconds. Advisory only.
    #[serde(default)]
    pub expires_in: u64,
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &REDACTED)
            .field("refresh_token", &REDACTED)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Success payload of the code-exchange and refresh endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct AuthResponse {
    /// Issued tokens.
    #[serde(flatten)]
    pub tokens: TokenPair,
    /// The authenticated user.
    pub user: User,
}

impl AuthResponse {
    /// Split into the parts the session store takes.
    pub fn into_parts(self) -> (TokenPair, User) {
        (self.tokens, self.user)
    }
}

/// Credentials kept in a session. `expires_in` is not retained.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionTokens {
    /// Bearer credential for authenticated requests.
    pub access_token: String,
    /// Credential presented only to refresh/logout.
    pub refresh_token: String,
}

impl fmt::Debug for SessionTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionTokens")
            .field("access_token", &REDACTED)
            .field("refresh_token", &REDACTED)
            .finish()
    }
}

impl From<&TokenPair> for SessionTokens {
    fn from(pair: &TokenPair) -> Self {
        Self {
            access_token: pair.access_token.clone(),
            refresh_token: pair.refresh_token.clone(),
        }
    }
}

/// The local view of who is signed in.
///
/// `is_authenticated` holds exactly when a user and both tokens are present
/// and non-empty. The constructors are the only way to build one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    user: Option<User>,
    tokens: Option<SessionTokens>,
    is_authenticated: bool,
    is_loading: bool,
}

impl Session {
    /// The signed-out session.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build an authenticated session, rejecting empty credentials.
    pub fn authenticated(tokens: &TokenPair, user: User) -> Result<Self, AuthError> {
        if tokens.access_token.is_empty() {
            return Err(AuthError::IncompleteSession("empty access token"));
        }
        if tokens.refresh_token.is_empty() {
            return Err(AuthError::IncompleteSession("empty refresh token"));
        }
        if user.id.is_empty() {
            return Err(AuthError::IncompleteSession("empty user id"));
        }
        Ok(Self {
            user: Some(user),
            tokens: Some(tokens.into()),
            is_authenticated: true,
            is_loading: false,
        })
    }

    /// Rebuild from stored parts, deriving the flag from what is present.
    pub(crate) fn from_parts(user: Option<User>, tokens: Option<SessionTokens>) -> Self {
        match (user, tokens) {
            (Some(user), Some(tokens))
                if !user.id.is_empty()
                    && !tokens.access_token.is_empty()
                    && !tokens.refresh_token.is_empty() =>
            {
                Self {
                    user: Some(user),
                    tokens: Some(tokens),
                    is_authenticated: true,
                    is_loading: false,
                }
            }
            _ => Self::empty(),
        }
    }

    pub(crate) fn with_loading(mut self, loading: bool) -> Self {
        self.is_loading = loading;
        self
    }

    /// Swap the profile on an authenticated session. `None` if signed out
    /// or if the profile belongs to someone else.
    pub(crate) fn with_user(mut self, user: User) -> Option<Self> {
        let same_user = self.user.as_ref().is_some_and(|u| u.id == user.id);
        if !self.is_authenticated || !same_user {
            return None;
        }
        self.user = Some(user);
        Some(self)
    }

    /// Signed-in user, if any.
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Session credentials, if any.
    pub fn tokens(&self) -> Option<&SessionTokens> {
        self.tokens.as_ref()
    }

    /// Whether a complete session is present.
    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }

    /// Whether a sign-in is in flight.
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
