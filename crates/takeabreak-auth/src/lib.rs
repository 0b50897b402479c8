//! # takeabreak-auth
//!
//! Google sign-in and session lifecycle for the takeabreak client.
//!
//! The flow:
//! - [`google::authorization_url`] builds the URL the sign-in button opens
//! - [`callback::CallbackController`] turns the provider redirect into a
//!   session by exchanging the code with the backend
//! - [`session::SessionStore`] holds the session and persists it to
//!   `<data_dir>/auth-storage.json` with owner-only permissions
//! - [`guard::RouteGuard`] decides whether protected views may render
//! - [`manager::AuthManager`] handles logout, token refresh and profile reload
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use takeabreak_auth::{AuthClient, AuthManager, FileStorage, SessionStore};
//!
//! let store = Arc::new(SessionStore::restore(FileStorage::in_dir(
//!     std::path::Path::new("/home/user/.takeabreak"),
//! )));
//! let manager = AuthManager::new(Arc::new(AuthClient::new("http://localhost:5001")), store);
//! println!("signed in: {}", manager.store().is_authenticated());
//! ```

#![deny(unsafe_code)]

pub mod callback;
pub mod client;
pub mod errors;
pub mod google;
pub mod guard;
pub mod manager;
pub mod navigation;
pub mod session;
pub mod storage;
pub mod types;

pub use callback::{
    CallbackController, CallbackOutcome, CallbackParams, CallbackResult, CallbackState,
};
pub use client::{AuthApi, AuthClient};
pub use errors::AuthError;
pub use google::authorization_url;
pub use guard::{GuardDecision, RouteGuard};
pub use manager::AuthManager;
pub use navigation::{LandingError, NavigationTarget, landing_message, landing_redirect};
pub use session::SessionStore;
pub use storage::{FileStorage, MemoryStorage, PersistedSession, SessionPersistence};
pub use types::{AuthResponse, Session, SessionTokens, TokenPair, User};

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
