//! Route guard for protected views.
//!
//! The guard subscribes to the store's authentication flag, so a logout
//! anywhere in the application revokes access on the next check without
//! polling.

use tokio::sync::watch;

use crate::navigation::NavigationTarget;
use crate::session::SessionStore;

/// What a protected view should do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardDecision {
    /// Render the protected content.
    Allow,
    /// Show a neutral loading indicator and navigate away.
    Redirect(NavigationTarget),
}

impl GuardDecision {
    fn from_authenticated(authenticated: bool) -> Self {
        if authenticated {
            Self::Allow
        } else {
            Self::Redirect(NavigationTarget::landing())
        }
    }

    /// Whether the protected content may be rendered.
    pub fn renders_protected_content(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Pending redirect, if any.
    pub fn redirect_target(&self) -> Option<NavigationTarget> {
        match self {
            Self::Allow => None,
            Self::Redirect(target) => Some(*target),
        }
    }
}

/// Gate for one protected view.
#[derive(Debug)]
pub struct RouteGuard {
    authenticated: watch::Receiver<bool>,
}

impl RouteGuard {
    /// Guard observing the given store.
    pub fn new(store: &SessionStore) -> Self {
        Self {
            authenticated: store.subscribe(),
        }
    }

    /// Evaluate against the latest session state.
    pub fn check(&self) -> GuardDecision {
        GuardDecision::from_authenticated(*self.authenticated.borrow())
    }

    /// Wait for the authentication flag to change and re-evaluate.
    ///
    /// Returns `None` once the store is gone.
    pub async fn changed(&mut self) -> Option<GuardDecision> {
        self.authenticated.changed().await.ok()?;
        let authenticated = *self.authenticated.borrow_and_update();
        let decision = GuardDecision::from_authenticated(authenticated);
        tracing::debug!(?decision, "route guard re-evaluated");
        Some(decision)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
