//! Session snapshot persistence.
//!
//! The store saves a [`PersistedSession`] after every mutation. The loading
//! flag is not part of the snapshot, so a restart can never come back up
//! mid-sign-in.

use std::fmt;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::errors::AuthError;
use crate::types::{Session, SessionTokens, User};

/// Fixed storage name of the session snapshot.
pub const STORAGE_NAME: &str = "auth-storage";

/// Current snapshot schema version.
pub const STORAGE_VERSION: u32 = 1;

/// Serialized session snapshot.
///
/// ```json
/// {"version":1,"user":{..},"accessToken":"..","refreshToken":"..","isAuthenticated":true}
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSession {
    /// Schema version.
    pub version: u32,
    /// Signed-in user.
    pub user: Option<User>,
    /// Access token.
    pub access_token: Option<String>,
    /// Refresh token.
    pub refresh_token: Option<String>,
    /// Stored authentication flag. Recomputed on restore.
    pub is_authenticated: bool,
}

impl fmt::Debug for PersistedSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistedSession")
            .field("version", &self.version)
            .field("user", &self.user.as_ref().map(|u| &u.id))
            .field("has_access_token", &self.access_token.is_some())
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("is_authenticated", &self.is_authenticated)
            .finish()
    }
}

impl From<&Session> for PersistedSession {
    fn from(session: &Session) -> Self {
        let tokens = session.tokens();
        Self {
            version: STORAGE_VERSION,
            user: session.user().cloned(),
            access_token: tokens.map(|t| t.access_token.clone()),
            refresh_token: tokens.map(|t| t.refresh_token.clone()),
            is_authenticated: session.is_authenticated(),
        }
    }
}

impl PersistedSession {
    /// Rebuild the session, normalizing whatever was stored.
    ///
    /// `is_loading` always comes back false; `is_authenticated` is derived
    /// from the presence of a user and both tokens.
    pub fn into_session(self) -> Session {
        let tokens = match (self.access_token, self.refresh_token) {
            (Some(access_token), Some(refresh_token)) => Some(SessionTokens {
                access_token,
                refresh_token,
            }),
            _ => None,
        };
        let session = Session::from_parts(self.user, tokens);
        if self.is_authenticated != session.is_authenticated() {
            tracing::warn!(
                stored = self.is_authenticated,
                derived = session.is_authenticated(),
                "stored auth flag disagrees with stored credentials"
            );
        }
        session
    }
}

/// Durable backend for the session snapshot.
pub trait SessionPersistence: Send + Sync {
    /// Load the last snapshot. `None` if absent or unreadable.
    fn load(&self) -> Option<PersistedSession>;

    /// Durably replace the snapshot.
    fn save(&self, snapshot: &PersistedSession) -> Result<(), AuthError>;
}

/// Parse a raw snapshot, rejecting unknown versions.
fn parse_snapshot(data: &str) -> Option<PersistedSession> {
    match serde_json::from_str::<PersistedSession>(data) {
        Ok(snapshot) if snapshot.version == STORAGE_VERSION => Some(snapshot),
        Ok(snapshot) => {
            tracing::warn!("unsupported session storage version: {}", snapshot.version);
            None
        }
        Err(e) => {
            tracing::warn!("failed to parse session storage: {e}");
            None
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File storage
// ─────────────────────────────────────────────────────────────────────────────

/// Snapshot kept in `<data_dir>/auth-storage.json` with 0o600 permissions.
#[derive(Clone, Debug)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Storage at an explicit file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Storage under the given data directory, using [`STORAGE_NAME`].
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(format!("{STORAGE_NAME}.json")))
    }

    /// The snapshot file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionPersistence for FileStorage {
    fn load(&self) -> Option<PersistedSession> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!("failed to read session storage: {e}");
                return None;
            }
        };
        parse_snapshot(&data)
    }

    fn save(&self, snapshot: &PersistedSession) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(snapshot)?;
        std::fs::write(&self.path, &json)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            let _ = std::fs::set_permissions(&self.path, perms);
        }

        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Memory storage
// ─────────────────────────────────────────────────────────────────────────────

/// In-process snapshot slot holding the raw serialized JSON.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    raw: Mutex<Option<String>>,
}

impl MemoryStorage {
    /// Empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot pre-seeded with raw content (which need not be valid).
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            raw: Mutex::new(Some(raw.into())),
        }
    }

    /// The last saved raw JSON.
    pub fn raw(&self) -> Option<String> {
        self.raw.lock().clone()
    }
}

impl SessionPersistence for MemoryStorage {
    fn load(&self) -> Option<PersistedSession> {
        parse_snapshot(self.raw.lock().as_deref()?)
    }

    fn save(&self, snapshot: &PersistedSession) -> Result<(), AuthError> {
        let json = serde_json::to_string(snapshot)?;
        *self.raw.lock() = Some(json);
        Ok(())
    }
}

impl<T: SessionPersistence + ?Sized> SessionPersistence for std::sync::Arc<T> {
    fn load(&self) -> Option<PersistedSession> {
        (**self).load()
    }

    fn save(&self, snapshot: &PersistedSession) -> Result<(), AuthError> {
        (**self).save(snapshot)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::tests::{make_tokens, make_user};
    use tempfile::TempDir;

    fn signed_in() -> PersistedSession {
        let session = Session::authenticated(&make_tokens("AT1", "RT1"), make_user("u1")).unwrap();
        PersistedSession::from(&session)
    }

    #[test]
    fn in_dir_uses_storage_name() {
        let storage = FileStorage::in_dir(Path::new("/home/user/.takeabreak"));
        assert_eq!(
            storage.path(),
            Path::new("/home/user/.takeabreak/auth-storage.json")
        );
    }

    #[test]
    fn snapshot_layout_is_camel_case_without_loading() {
        let json = serde_json::to_value(signed_in()).unwrap();
        assert_eq!(json["version"], 1);
        assert_eq!(json["accessToken"], "AT1");
        assert_eq!(json["refreshToken"], "RT1");
        assert_eq!(json["isAuthenticated"], true);
        assert_eq!(json["user"]["id"], "u1");
        assert!(json.get("isLoading").is_none());
    }

    #[test]
    fn load_missing_file_returns_none() {
        let dir = TempDir::new().unwrap();
        assert!(FileStorage::in_dir(dir.path()).load().is_none());
    }

    #[test]
    fn load_invalid_json_returns_none() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::in_dir(dir.path());
        std::fs::write(storage.path(), "not json").unwrap();
        assert!(storage.load().is_none());
    }

    #[test]
    fn load_wrong_version_returns_none() {
        let storage = MemoryStorage::with_raw(
            r#"{"version":2,"user":null,"accessToken":null,"refreshToken":null,"isAuthenticated":false}"#,
        );
        assert!(storage.load().is_none());
    }

    #[test]
    fn file_save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::in_dir(&dir.path().join("nested"));
        storage.save(&signed_in()).unwrap();

        let loaded = storage.load().unwrap();
        assert_eq!(loaded, signed_in());
    }

    #[cfg(unix)]
    #[test]
    fn save_sets_permissions_0600() {
        use std::os::unix::fs::PermissionsExt;
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::in_dir(dir.path());
        storage.save(&signed_in()).unwrap();
        let perms = std::fs::metadata(storage.path()).unwrap().permissions();
        assert_eq!(perms.mode() & 0o777, 0o600);
    }

    #[test]
    fn into_session_recomputes_flag() {
        let mut snapshot = signed_in();
        snapshot.access_token = None;
        let session = snapshot.into_session();
        assert!(!session.is_authenticated());
        assert!(session.user().is_none());
    }

    #[test]
    fn into_session_ignores_stored_loading_flag() {
        let storage = MemoryStorage::with_raw(
            r#"{"version":1,"user":{"id":"u1","email":"a@b.com","full_name":"A B"},
                "accessToken":"AT1","refreshToken":"RT1","isAuthenticated":true,"isLoading":true}"#,
        );
        let session = storage.load().unwrap().into_session();
        assert!(session.is_authenticated());
        assert!(!session.is_loading());
    }

    #[test]
    fn debug_hides_tokens() {
        let rendered = format!("{:?}", signed_in());
        assert!(!rendered.contains("AT1"));
        assert!(!rendered.contains("RT1"));
    }
}
