//! Watchable current-user state.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use crate::claims;
use crate::provider::{IdentityProvider, User};
use crate::store::TokenStore;

const DEFAULT_DISPLAY_NAME: &str = "User";

/// Current account state, observable across the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CurrentUser {
    /// Session restore has not resolved yet. Treat as neither authenticated
    /// nor unauthenticated.
    Loading,
    SignedOut,
    SignedIn(User),
}

impl CurrentUser {
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::SignedIn(user) => Some(user),
            _ => None,
        }
    }
}

/// Holds the current [`User`] in a `watch` channel so any number of
/// observers can follow auth transitions.
///
/// Starts at [`CurrentUser::Loading`] until [`IdentityStore::hydrate`]
/// resolves the startup restore. Only the session flow writes here.
pub struct IdentityStore {
    token_store: Arc<dyn TokenStore>,
    tx: watch::Sender<CurrentUser>,
    rx: watch::Receiver<CurrentUser>,
}

impl IdentityStore {
    pub fn new(token_store: Arc<dyn TokenStore>) -> Self {
        let (tx, rx) = watch::channel(CurrentUser::Loading);
        Self { token_store, tx, rx }
    }

    /// Point-in-time value.
    pub fn current(&self) -> CurrentUser {
        self.rx.borrow().clone()
    }

    /// Subscribe to changes via a [`watch::Receiver`].
    ///
    /// Callers can `.changed().await` on the returned receiver to be
    /// notified of every transition.
    pub fn subscribe(&self) -> watch::Receiver<CurrentUser> {
        self.rx.clone()
    }

    pub fn set_user(&self, user: User) {
        self.tx.send_replace(CurrentUser::SignedIn(user));
    }

    pub fn clear(&self) {
        self.tx.send_replace(CurrentUser::SignedOut);
    }

    /// Resolve the startup value with one best-effort session restore.
    ///
    /// `None` from the provider means signed out; restore failures are not
    /// distinguished from the absence of a session.
    pub async fn hydrate(&self, provider: &dyn IdentityProvider) {
        match provider.restore_session().await {
            Some(user) => {
                debug!(email = %user.email, "session restored");
                self.tx.send_replace(CurrentUser::SignedIn(user));
            }
            None => {
                debug!("no session to restore");
                self.tx.send_replace(CurrentUser::SignedOut);
            }
        }
    }

    /// Name to render for the current account: the user's `name`, then the
    /// stored token's display claims, then the user's email, then a fixed
    /// default.
    pub fn display_name(&self) -> String {
        let current = self.current();
        let user = current.user();
        if let Some(name) = user.and_then(|u| u.name.as_deref()).filter(|n| !n.is_empty()) {
            return name.to_string();
        }
        if let Some(name) = self.name_from_token() {
            return name;
        }
        if let Some(email) = user.map(|u| u.email.as_str()).filter(|e| !e.is_empty()) {
            return email.to_string();
        }
        DEFAULT_DISPLAY_NAME.to_string()
    }

    fn name_from_token(&self) -> Option<String> {
        let token = self.token_store.load().ok().flatten()?;
        let claims = claims::decode(&token)?;
        claims::display_name(&claims).map(str::to_string)
    }
}
