//! Session store: the single source of truth for who is signed in.
//!
//! Every mutation replaces the whole [`Session`] under one lock, then saves a
//! [`PersistedSession`] snapshot through the configured backend. Readers see
//! either the old or the new session, never a mix.
//!
//! Observers subscribe to the authentication flag through a
//! [`tokio::sync::watch`] channel that only fires when the flag changes.
//!
//! Every [`SessionStore::clear_session`] bumps an epoch. A write that started
//! before a clear (an in-flight code exchange racing a logout) goes through
//! [`SessionStore::set_session_if_current`] and is rejected, so the clear wins.

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::errors::AuthError;
use crate::storage::{PersistedSession, SessionPersistence};
use crate::types::{Session, TokenPair, User};

struct StoreState {
    session: Session,
    epoch: u64,
}

/// Shared, persisted session state.
pub struct SessionStore {
    state: Mutex<StoreState>,
    persistence: Box<dyn SessionPersistence>,
    authenticated: watch::Sender<bool>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("SessionStore")
            .field("session", &state.session)
            .field("epoch", &state.epoch)
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Store starting from the empty session, without reading the backend.
    pub fn new(persistence: impl SessionPersistence + 'static) -> Self {
        Self::with_session(Session::empty(), Box::new(persistence))
    }

    /// Store restored from the backend's last snapshot.
    ///
    /// Absent or malformed snapshots start from the empty session. The
    /// loading flag always comes back false.
    pub fn restore(persistence: impl SessionPersistence + 'static) -> Self {
        let session = persistence
            .load()
            .map(PersistedSession::into_session)
            .unwrap_or_default();
        tracing::debug!(
            authenticated = session.is_authenticated(),
            "restored session"
        );
        Self::with_session(session, Box::new(persistence))
    }

    fn with_session(session: Session, persistence: Box<dyn SessionPersistence>) -> Self {
        let (authenticated, _) = watch::channel(session.is_authenticated());
        Self {
            state: Mutex::new(StoreState { session, epoch: 0 }),
            persistence,
            authenticated,
        }
    }

    /// Replace the whole session with an authenticated one.
    ///
    /// Fails with [`AuthError::IncompleteSession`] (state untouched) if a
    /// token or the user id is empty.
    pub fn set_session(&self, tokens: &TokenPair, user: User) -> Result<Session, AuthError> {
        let next = Session::authenticated(tokens, user)?;
        let mut state = self.state.lock();
        self.commit(&mut state, next.clone());
        tracing::info!(user_id = next.user().map(|u| u.id.as_str()), "session set");
        Ok(next)
    }

    /// Like [`set_session`](Self::set_session), but only if no clear happened
    /// since `epoch` was read.
    pub fn set_session_if_current(
        &self,
        epoch: u64,
        tokens: &TokenPair,
        user: User,
    ) -> Result<Session, AuthError> {
        let next = Session::authenticated(tokens, user)?;
        let mut state = self.state.lock();
        if state.epoch != epoch {
            tracing::info!("session cleared during the request, dropping the result");
            return Err(AuthError::StaleSession);
        }
        self.commit(&mut state, next.clone());
        tracing::info!(user_id = next.user().map(|u| u.id.as_str()), "session set");
        Ok(next)
    }

    /// Reset to the empty session. Safe to call when already empty.
    pub fn clear_session(&self) {
        let mut state = self.state.lock();
        state.epoch = state.epoch.wrapping_add(1);
        self.commit(&mut state, Session::empty());
        tracing::info!("session cleared");
    }

    /// Toggle the transient loading flag. Tokens and user are untouched.
    pub fn set_loading(&self, loading: bool) {
        let mut state = self.state.lock();
        let next = state.session.clone().with_loading(loading);
        self.commit(&mut state, next);
    }

    /// Replace the profile of the signed-in user.
    ///
    /// Returns `false` without touching anything if no session is
    /// authenticated or the profile belongs to another user; a session is
    /// never created here.
    pub fn update_user(&self, user: User) -> bool {
        let mut state = self.state.lock();
        self.apply_user(&mut state, user)
    }

    /// Like [`update_user`](Self::update_user), but only if no clear happened
    /// since `epoch` was read.
    pub fn update_user_if_current(&self, epoch: u64, user: User) -> Result<(), AuthError> {
        let mut state = self.state.lock();
        if state.epoch != epoch {
            tracing::info!("session cleared during the profile fetch, dropping the result");
            return Err(AuthError::StaleSession);
        }
        if self.apply_user(&mut state, user) {
            Ok(())
        } else {
            Err(AuthError::NotAuthenticated)
        }
    }

    fn apply_user(&self, state: &mut StoreState, user: User) -> bool {
        let Some(next) = state.session.clone().with_user(user) else {
            tracing::debug!("ignoring profile update that does not match the session");
            return false;
        };
        self.commit(state, next);
        true
    }

    /// Save the snapshot, swap the session in, notify observers.
    ///
    /// The save is blocking file I/O under the store lock, so saved snapshots
    /// stay in the same order as the swaps.
    fn commit(&self, state: &mut StoreState, next: Session) {
        if let Err(e) = self.persistence.save(&PersistedSession::from(&next)) {
            tracing::warn!("failed to persist session: {e}");
        }
        let authenticated = next.is_authenticated();
        state.session = next;
        let _ = self.authenticated.send_if_modified(|current| {
            if *current == authenticated {
                false
            } else {
                *current = authenticated;
                true
            }
        });
    }

    /// Copy of the current session.
    pub fn snapshot(&self) -> Session {
        self.state.lock().session.clone()
    }

    /// Whether a complete session is present.
    pub fn is_authenticated(&self) -> bool {
        self.state.lock().session.is_authenticated()
    }

    /// Whether a sign-in is in flight.
    pub fn is_loading(&self) -> bool {
        self.state.lock().session.is_loading()
    }

    /// Current access token.
    pub fn access_token(&self) -> Option<String> {
        let state = self.state.lock();
        state.session.tokens().map(|t| t.access_token.clone())
    }

    /// Current refresh token.
    pub fn refresh_token(&self) -> Option<String> {
        let state = self.state.lock();
        state.session.tokens().map(|t| t.refresh_token.clone())
    }

    /// Number of clears so far, for [`set_session_if_current`](Self::set_session_if_current).
    pub fn epoch(&self) -> u64 {
        self.state.lock().epoch
    }

    /// Subscribe to changes of the authentication flag.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.authenticated.subscribe()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
