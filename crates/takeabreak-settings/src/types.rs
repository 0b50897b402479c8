//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase")]` and implement
//! [`Default`] with development defaults, so a partial JSON file only needs
//! the keys it overrides.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root settings type for the takeabreak client.
///
/// ```json
/// {
///   "api": { "baseUrl": "https://api.takeabreak.life" },
///   "google": { "clientId": "1234.apps.googleusercontent.com" }
/// }
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TakeabreakSettings {
    /// Backend auth API settings.
    pub api: ApiSettings,
    /// Google sign-in settings.
    pub google: GoogleSettings,
    /// Local session storage settings.
    pub storage: StorageSettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
}

/// Backend auth API settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiSettings {
    /// Base address of the backend, without a trailing slash.
    pub base_url: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5001".to_string(),
        }
    }
}

/// Google OAuth sign-in settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GoogleSettings {
    /// Provider authorization endpoint.
    pub auth_url: String,
    /// OAuth client ID registered with Google.
    pub client_id: String,
    /// Redirect URI the provider sends the user back to.
    pub redirect_uri: String,
    /// Scopes requested at sign-in.
    pub scopes: Vec<String>,
}

impl Default for GoogleSettings {
    fn default() -> Self {
        Self {
            auth_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            client_id: "308841816308-psjme25k9i27tvfp20pvtlv15cbrkuao.apps.googleusercontent.com"
                .to_string(),
            redirect_uri: "http://localhost:3000/auth/callback".to_string(),
            scopes: vec![
                "openid".to_string(),
                "email".to_string(),
                "profile".to_string(),
            ],
        }
    }
}

/// Local session storage settings.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageSettings {
    /// Directory holding the persisted session. `None` means `~/.takeabreak`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
}

impl StorageSettings {
    /// Resolve the data directory, falling back to `~/.takeabreak`.
    pub fn resolve_data_dir(&self) -> PathBuf {
        match &self.data_dir {
            Some(dir) => PathBuf::from(dir),
            None => crate::loader::home_dir().join(".takeabreak"),
        }
    }
}

/// Logging configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Minimum level for stderr output (`RUST_LOG` takes precedence).
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(TakeabreakSettings::default()).unwrap();
        assert_eq!(json["api"]["baseUrl"], "http://localhost:5001");
        assert!(json["google"]["redirectUri"].is_string());
        assert!(json["storage"].get("dataDir").is_none());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let settings: TakeabreakSettings =
            serde_json::from_str(r#"{"google": {"clientId": "abc"}}"#).unwrap();
        assert_eq!(settings.google.client_id, "abc");
        assert_eq!(settings.google.scopes.len(), 3);
        assert_eq!(settings.api.base_url, "http://localhost:5001");
    }

    #[test]
    fn explicit_data_dir_wins() {
        let storage = StorageSettings {
            data_dir: Some("/var/lib/takeabreak".to_string()),
        };
        assert_eq!(
            storage.resolve_data_dir(),
            PathBuf::from("/var/lib/takeabreak")
        );
    }

    #[test]
    fn default_data_dir_is_under_home() {
        let dir = StorageSettings::default().resolve_data_dir();
        assert!(dir.ends_with(".takeabreak"));
    }
}
