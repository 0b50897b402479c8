//! OAuth callback controller.
//!
//! A one-shot state machine consuming the identity-provider redirect:
//!
//! ```text
//! Idle ──run()──► Exchanging ──► Resolved
//!   └──(error / no code)─────────► Resolved
//! ```
//!
//! Once resolved, further calls to [`CallbackController::run`] return the
//! stored outcome and touch nothing. The loading flag is dropped on every
//! exit path, including a panic inside the exchange.

use std::sync::Arc;

use crate::client::AuthApi;
use crate::errors::AuthError;
use crate::navigation::NavigationTarget;
use crate::session::SessionStore;
use crate::types::Session;

/// Query parameters of the provider redirect.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallbackParams {
    /// Authorization code.
    pub code: Option<String>,
    /// Provider-reported error (e.g. `access_denied`).
    pub error: Option<String>,
}

impl CallbackParams {
    /// Parse a query string, with or without the leading `?`.
    ///
    /// A full redirect URL is accepted too; everything before the `?` is
    /// ignored. Empty values count as absent.
    pub fn from_query(query: &str) -> Self {
        let query = query.split_once('?').map_or(query, |(_, q)| q);
        let mut params = Self::default();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "code" if params.code.is_none() => params.code = Some(value.into_owned()),
                "error" if params.error.is_none() => params.error = Some(value.into_owned()),
                _ => {}
            }
        }
        params
    }
}

/// How a callback resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CallbackResult {
    /// Tokens obtained and stored.
    Success(Session),
    /// The provider reported a denial.
    Denied,
    /// No authorization code on the redirect.
    InvalidRequest,
    /// The backend (or the store) rejected the result.
    ExchangeFailed(String),
}

/// Result plus the single navigation it triggers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallbackOutcome {
    /// How the callback resolved.
    pub result: CallbackResult,
    /// Where to navigate.
    pub target: NavigationTarget,
}

impl CallbackOutcome {
    fn failed(err: &AuthError, result: CallbackResult) -> Self {
        Self {
            result,
            target: NavigationTarget::landing_with(err.landing_error()),
        }
    }
}

/// Controller lifecycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CallbackState {
    /// Mounted, nothing evaluated yet.
    Idle,
    /// Waiting on the code exchange.
    Exchanging,
    /// Terminal.
    Resolved(CallbackOutcome),
}

/// Drops the loading flag when it goes out of scope.
struct LoadingGuard<'a> {
    store: &'a SessionStore,
}

impl<'a> LoadingGuard<'a> {
    fn start(store: &'a SessionStore) -> Self {
        store.set_loading(true);
        Self { store }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.store.set_loading(false);
    }
}

/// Drives one provider redirect to a navigation outcome.
pub struct CallbackController {
    api: Arc<dyn AuthApi>,
    store: Arc<SessionStore>,
    state: CallbackState,
}

impl CallbackController {
    /// New controller in the `Idle` state.
    pub fn new(api: Arc<dyn AuthApi>, store: Arc<SessionStore>) -> Self {
        Self {
            api,
            store,
            state: CallbackState::Idle,
        }
    }

    /// Current state.
    pub fn state(&self) -> &CallbackState {
        &self.state
    }

    /// Evaluate the redirect once and return the outcome.
    pub async fn run(&mut self, params: &CallbackParams) -> CallbackOutcome {
        if let CallbackState::Resolved(outcome) = &self.state {
            tracing::debug!("callback already resolved, ignoring re-run");
            return outcome.clone();
        }

        let outcome = self.evaluate(params).await;
        tracing::info!(target_path = %outcome.target, "callback resolved");
        self.state = CallbackState::Resolved(outcome.clone());
        outcome
    }

    async fn evaluate(&mut self, params: &CallbackParams) -> CallbackOutcome {
        if let Some(error) = &params.error {
            tracing::warn!(provider_error = %error, "identity provider returned an error");
            self.store.clear_session();
            let err = AuthError::ProviderDenied(error.clone());
            return CallbackOutcome::failed(&err, CallbackResult::Denied);
        }

        let Some(code) = params.code.as_deref() else {
            tracing::warn!("no authorization code received");
            self.store.clear_session();
            return CallbackOutcome::failed(
                &AuthError::InvalidCallback,
                CallbackResult::InvalidRequest,
            );
        };

        self.state = CallbackState::Exchanging;
        let store = Arc::clone(&self.store);
        let _loading = LoadingGuard::start(&store);
        let epoch = store.epoch();

        let stored = match self.api.exchange_code(code).await {
            Ok(resp) => {
                let (tokens, user) = resp.into_parts();
                store.set_session_if_current(epoch, &tokens, user)
            }
            Err(e) => Err(e),
        };

        match stored {
            Ok(session) => CallbackOutcome {
                result: CallbackResult::Success(session),
                target: NavigationTarget::Dashboard,
            },
            Err(e) => {
                tracing::warn!("authentication failed: {e}");
                store.clear_session();
                CallbackOutcome::failed(&e, CallbackResult::ExchangeFailed(e.to_string()))
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
