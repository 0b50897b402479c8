//! Routes, landing-page error codes and their user-facing copy.

use std::fmt;

/// Public landing page.
pub const LANDING_PATH: &str = "/";
/// Protected dashboard view.
pub const DASHBOARD_PATH: &str = "/dashboard";
/// Where the identity provider redirects after consent.
pub const CALLBACK_PATH: &str = "/auth/callback";

/// Error codes the landing page understands in its `error` query parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LandingError {
    /// The provider reported a denial.
    OauthDenied,
    /// The callback had no authorization code.
    OauthInvalid,
    /// The exchange (or anything after it) failed.
    AuthFailed,
}

impl LandingError {
    /// Wire value of the `error` query parameter.
    pub fn code(self) -> &'static str {
        match self {
            Self::OauthDenied => "oauth_denied",
            Self::OauthInvalid => "oauth_invalid",
            Self::AuthFailed => "auth_failed",
        }
    }

    /// Parse a query value. Unknown codes are `None`.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "oauth_denied" => Some(Self::OauthDenied),
            "oauth_invalid" => Some(Self::OauthInvalid),
            "auth_failed" => Some(Self::AuthFailed),
            _ => None,
        }
    }

    /// Copy shown above the sign-in button.
    pub fn message(self) -> &'static str {
        match self {
            Self::OauthDenied => "Sign-in was cancelled. Please try again.",
            Self::OauthInvalid => "Invalid authorization. Please try signing in again.",
            Self::AuthFailed => "Authentication failed. Please try again.",
        }
    }
}

impl fmt::Display for LandingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Where the application should go next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavigationTarget {
    /// The protected dashboard.
    Dashboard,
    /// The landing page, optionally showing an error.
    Landing {
        /// Error to surface, if any.
        error: Option<LandingError>,
    },
}

impl NavigationTarget {
    /// Landing page carrying an error code.
    pub fn landing_with(error: LandingError) -> Self {
        Self::Landing { error: Some(error) }
    }

    /// Plain landing page.
    pub fn landing() -> Self {
        Self::Landing { error: None }
    }

    /// Path plus query, e.g. `/?error=auth_failed`.
    pub fn path(&self) -> String {
        match self {
            Self::Dashboard => DASHBOARD_PATH.to_string(),
            Self::Landing { error: None } => LANDING_PATH.to_string(),
            Self::Landing { error: Some(e) } => format!("{LANDING_PATH}?error={}", e.code()),
        }
    }

    /// The landing error this target carries.
    pub fn error(&self) -> Option<LandingError> {
        match self {
            Self::Landing { error } => *error,
            Self::Dashboard => None,
        }
    }
}

impl fmt::Display for NavigationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Message for the landing page's `error` query value.
pub fn landing_message(error: Option<&str>) -> Option<&'static str> {
    error.and_then(LandingError::from_code).map(LandingError::message)
}

/// A signed-in visitor of the landing page is sent on to the dashboard.
pub fn landing_redirect(is_authenticated: bool) -> Option<NavigationTarget> {
    is_authenticated.then_some(NavigationTarget::Dashboard)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_roundtrip() {
        for e in [
            LandingError::OauthDenied,
            LandingError::OauthInvalid,
            LandingError::AuthFailed,
        ] {
            assert_eq!(LandingError::from_code(e.code()), Some(e));
        }
        assert_eq!(LandingError::from_code("access_denied"), None);
    }

    #[test]
    fn target_paths() {
        assert_eq!(NavigationTarget::Dashboard.path(), "/dashboard");
        assert_eq!(NavigationTarget::landing().path(), "/");
        assert_eq!(
            NavigationTarget::landing_with(LandingError::OauthDenied).to_string(),
            "/?error=oauth_denied"
        );
    }

    #[test]
    fn landing_messages() {
        assert_eq!(
            landing_message(Some("auth_failed")),
            Some("Authentication failed. Please try again.")
        );
        assert_eq!(
            landing_message(Some("oauth_denied")),
            Some("Sign-in was cancelled. Please try again.")
        );
        assert_eq!(landing_message(Some("something_else")), None);
        assert_eq!(landing_message(None), None);
    }

    #[test]
    fn signed_in_visitor_goes_to_dashboard() {
        assert_eq!(landing_redirect(true), Some(NavigationTarget::Dashboard));
        assert_eq!(landing_redirect(false), None);
    }
}
