//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`TakeabreakSettings::default()`]
//! 2. If `~/.takeabreak/settings.json` exists, deep-merge user values over defaults
//! 3. Apply environment variable overrides (highest priority)
//! 4. Validate the result

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::errors::{Result, SettingsError};
use crate::types::TakeabreakSettings;

pub(crate) fn home_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home)
}

/// Resolve the path to the settings file (`~/.takeabreak/settings.json`).
pub fn settings_path() -> PathBuf {
    home_dir().join(".takeabreak").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<TakeabreakSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON or an invalid value, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<TakeabreakSettings> {
    let mut settings = load_file_layer(path)?;
    apply_env_overrides(&mut settings);
    validate(&settings)?;
    Ok(settings)
}

fn load_file_layer(path: &Path) -> Result<TakeabreakSettings> {
    let defaults = serde_json::to_value(TakeabreakSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    Ok(serde_json::from_value(merged)?)
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment variable overrides to loaded settings.
///
/// Invalid values are logged and ignored (fall back to file/default).
pub fn apply_env_overrides(settings: &mut TakeabreakSettings) {
    if let Some(v) = read_env_url("TAKEABREAK_API_URL") {
        settings.api.base_url = v;
    }
    if let Some(v) = read_env_string("TAKEABREAK_DATA_DIR") {
        settings.storage.data_dir = Some(v);
    }
    if let Some(v) = read_env_string("TAKEABREAK_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(v) = read_env_string("GOOGLE_CLIENT_ID") {
        settings.google.client_id = v;
    }
    if let Some(v) = read_env_url("GOOGLE_REDIRECT_URI") {
        settings.google.redirect_uri = v;
    }
}

/// Check values that would only fail later, deep inside a request.
pub fn validate(settings: &TakeabreakSettings) -> Result<()> {
    if parse_http_url(&settings.api.base_url).is_none() {
        return Err(SettingsError::InvalidValue(format!(
            "api.baseUrl must be an http(s) URL, got {:?}",
            settings.api.base_url
        )));
    }
    if settings.google.client_id.trim().is_empty() {
        return Err(SettingsError::InvalidValue(
            "google.clientId must not be empty".to_string(),
        ));
    }
    Ok(())
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Accept `http://` and `https://` URLs with a host, dropping any trailing
/// slashes.
pub fn parse_http_url(val: &str) -> Option<String> {
    let val = val.trim();
    let url = Url::parse(val).ok()?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return None;
    }
    Some(val.trim_end_matches('/').to_string())
}

// ── Env var readers (thin wrappers) ─────────────────────────────────────────

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn read_env_url(name: &str) -> Option<String> {
    let val = read_env_string(name)?;
    let result = parse_http_url(&val);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid URL env var, ignoring");
    }
    result
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── deep_merge ──────────────────────────────────────────────────

    #[test]
    fn merge_nested_override() {
        let target = serde_json::json!({
            "google": {"clientId": "a", "redirectUri": "http://x"}
        });
        let source = serde_json::json!({
            "google": {"clientId": "b"}
        });
        let merged = deep_merge(target, source);
        assert_eq!(merged["google"]["clientId"], "b");
        assert_eq!(merged["google"]["redirectUri"], "http://x");
    }

    #[test]
    fn merge_array_replace() {
        let target = serde_json::json!({"scopes": ["openid", "email"]});
        let source = serde_json::json!({"scopes": ["openid"]});
        let merged = deep_merge(target, source);
        assert_eq!(merged["scopes"], serde_json::json!(["openid"]));
    }

    #[test]
    fn merge_null_preserves_target() {
        let target = serde_json::json!({"a": 1, "b": 2});
        let source = serde_json::json!({"a": null});
        let merged = deep_merge(target, source);
        assert_eq!(merged["a"], 1);
        assert_eq!(merged["b"], 2);
    }

    // ── load_settings_from_path ─────────────────────────────────────

    #[test]
    fn load_missing_file_returns_defaults() {
        let settings = load_file_layer(Path::new("/nonexistent/settings.json")).unwrap();
        assert_eq!(settings.api.base_url, "http://localhost:5001");
    }

    #[test]
    fn load_partial_json_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"api": {"baseUrl": "https://api.takeabreak.life"}, "logging": {"level": "debug"}}"#,
        )
        .unwrap();

        let settings = load_file_layer(&path).unwrap();
        assert_eq!(settings.api.base_url, "https://api.takeabreak.life");
        assert_eq!(settings.logging.level, "debug");
        assert_eq!(
            settings.google.redirect_uri,
            "http://localhost:3000/auth/callback"
        );
    }

    #[test]
    fn load_invalid_json_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "not valid json").unwrap();

        let result = load_settings_from_path(&path);
        assert!(matches!(result.unwrap_err(), SettingsError::Json(_)));
    }

    // ── validate ────────────────────────────────────────────────────

    #[test]
    fn validate_rejects_non_http_base_url() {
        let mut settings = TakeabreakSettings::default();
        settings.api.base_url = "ftp://example.com".to_string();
        let err = validate(&settings).unwrap_err();
        assert!(matches!(err, SettingsError::InvalidValue(_)));
        assert!(err.to_string().contains("api.baseUrl"));
    }

    #[test]
    fn validate_rejects_empty_client_id() {
        let mut settings = TakeabreakSettings::default();
        settings.google.client_id = "  ".to_string();
        assert!(validate(&settings).is_err());
    }

    #[test]
    fn validate_accepts_defaults() {
        assert!(validate(&TakeabreakSettings::default()).is_ok());
    }

    // ── parse_http_url ──────────────────────────────────────────────

    #[test]
    fn parse_http_url_trims_trailing_slash() {
        assert_eq!(
            parse_http_url("https://api.example.com/"),
            Some("https://api.example.com".to_string())
        );
        assert_eq!(
            parse_http_url("http://localhost:5001"),
            Some("http://localhost:5001".to_string())
        );
    }

    #[test]
    fn parse_http_url_rejects_other_schemes() {
        assert_eq!(parse_http_url("localhost:5001"), None);
        assert_eq!(parse_http_url("ws://localhost"), None);
        assert_eq!(parse_http_url("https://"), None);
        assert_eq!(parse_http_url(""), None);
    }

    #[test]
    fn parse_http_url_rejects_malformed_hosts() {
        assert_eq!(parse_http_url("http://exa mple"), None);
        assert_eq!(parse_http_url("https://:::"), None);
        assert_eq!(parse_http_url("http://[::1"), None);
        assert_eq!(
            parse_http_url("http://[::1]:5001/"),
            Some("http://[::1]:5001".to_string())
        );
    }
}
