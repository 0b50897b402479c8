//! Google sign-in URL.

use takeabreak_settings::GoogleSettings;
use url::Url;

use crate::errors::AuthError;

/// Build the provider authorization URL the sign-in button opens.
///
/// Requests offline access with forced consent so the backend always
/// receives a refresh token from Google.
pub fn authorization_url(settings: &GoogleSettings) -> Result<String, AuthError> {
    let scope = settings.scopes.join(" ");
    let url = Url::parse_with_params(
        &settings.auth_url,
        &[
            ("client_id", settings.client_id.as_str()),
            ("redirect_uri", settings.redirect_uri.as_str()),
            ("response_type", "code"),
            ("scope", scope.as_str()),
            ("access_type", "offline"),
            ("prompt", "consent"),
        ],
    )?;
    Ok(url.into())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorization_url_contains_required_params() {
        let url = authorization_url(&GoogleSettings::default()).unwrap();
        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("access_type=offline"));
        assert!(url.contains("prompt=consent"));
        assert!(url.contains("scope=openid+email+profile"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fauth%2Fcallback"));
    }

    #[test]
    fn authorization_url_roundtrips_values() {
        let settings = GoogleSettings {
            client_id: "abc&def".to_string(),
            ..GoogleSettings::default()
        };
        let url = Url::parse(&authorization_url(&settings).unwrap()).unwrap();
        let client_id = url
            .query_pairs()
            .find(|(k, _)| k == "client_id")
            .map(|(_, v)| v.into_owned());
        assert_eq!(client_id.as_deref(), Some("abc&def"));
    }

    #[test]
    fn invalid_auth_url_is_an_error() {
        let settings = GoogleSettings {
            auth_url: "not a url".to_string(),
            ..GoogleSettings::default()
        };
        assert!(matches!(
            authorization_url(&settings),
            Err(AuthError::InvalidUrl(_))
        ));
    }
}
