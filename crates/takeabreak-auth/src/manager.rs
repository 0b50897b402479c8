//! Session transitions after sign-in: logout, refresh, profile reload.

use std::sync::Arc;

use crate::callback::CallbackController;
use crate::client::AuthApi;
use crate::errors::AuthError;
use crate::guard::RouteGuard;
use crate::session::SessionStore;
use crate::types::{Session, User};

/// Couples the backend client with the session store.
#[derive(Clone)]
pub struct AuthManager {
    api: Arc<dyn AuthApi>,
    store: Arc<SessionStore>,
}

impl AuthManager {
    /// Manager over a client and a store.
    pub fn new(api: Arc<dyn AuthApi>, store: Arc<SessionStore>) -> Self {
        Self { api, store }
    }

    /// The shared store.
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// A fresh controller for one provider redirect.
    pub fn callback_controller(&self) -> CallbackController {
        CallbackController::new(Arc::clone(&self.api), Arc::clone(&self.store))
    }

    /// A guard for a protected view.
    pub fn route_guard(&self) -> RouteGuard {
        RouteGuard::new(&self.store)
    }

    /// Sign out.
    ///
    /// The local session is cleared before the backend is told, so a slow or
    /// unreachable backend never keeps the user signed in. The backend call
    /// is best effort: any failure is logged and swallowed.
    #[tracing::instrument(skip_all)]
    pub async fn logout(&self) {
        let access_token = self.store.access_token();
        self.store.clear_session();
        if let Some(access_token) = access_token {
            if let Err(e) = self.api.logout(&access_token).await {
                tracing::warn!("logout request failed, local session already cleared: {e}");
            }
        }
    }

    /// Mint a new token pair with the stored refresh token.
    ///
    /// Any failure tears the session down; the user has to sign in again.
    /// Nothing is retried here.
    #[tracing::instrument(skip_all)]
    pub async fn refresh(&self) -> Result<Session, AuthError> {
        let Some(refresh_token) = self.store.refresh_token() else {
            return Err(AuthError::NotAuthenticated);
        };
        let epoch = self.store.epoch();

        let result = match self.api.refresh(&refresh_token).await {
            Ok(resp) => {
                let (tokens, user) = resp.into_parts();
                self.store.set_session_if_current(epoch, &tokens, user)
            }
            Err(e) => Err(e),
        };

        result.inspect_err(|e| {
            tracing::warn!("token refresh failed, clearing session: {e}");
            self.store.clear_session();
        })
    }

    /// Re-fetch the profile and store it.
    ///
    /// Failures leave the session as it is. A profile fetched for a session
    /// that was cleared in the meantime is dropped with
    /// [`AuthError::StaleSession`].
    #[tracing::instrument(skip_all)]
    pub async fn reload_user(&self) -> Result<User, AuthError> {
        let Some(access_token) = self.store.access_token() else {
            return Err(AuthError::NotAuthenticated);
        };
        let epoch = self.store.epoch();
        let user = self.api.current_user(&access_token).await?;
        self.store.update_user_if_current(epoch, user.clone())?;
        Ok(user)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
