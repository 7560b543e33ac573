//! Session orchestration over the credential store.
//!
//! The store answers "what do we have"; the controller decides what to do
//! about it: persist a login, attempt a silent refresh when the access
//! token has aged out, or give up and report that a fresh login is needed.
//! Refresh attempts are serialized through `&mut self` - overlapping
//! logical callers must share one controller.

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use super::client::{TokenGrant, TokenRefresher};
use crate::tokens::{AuthPhase, SessionStore};

pub struct SessionController<R: TokenRefresher> {
    store: SessionStore,
    refresher: R,
}

impl<R: TokenRefresher> SessionController<R> {
    pub fn new(store: SessionStore, refresher: R) -> Self {
        Self { store, refresher }
    }

    /// Direct access to the underlying store, for status display and tests.
    pub fn store(&mut self) -> &mut SessionStore {
        &mut self.store
    }

    /// Classify the stored credentials at startup: decide between restoring
    /// the session, refreshing it, or sending the user to login.
    pub fn bootstrap(&mut self) -> AuthPhase {
        let phase = self.store.auth_phase();
        debug!(?phase, "Session bootstrap");
        phase
    }

    /// Persist a grant obtained from a successful login.
    pub fn complete_login(&mut self, grant: &TokenGrant) {
        self.store.save_tokens(
            &grant.access_token,
            &grant.refresh_token,
            grant.refresh_expires_in,
        );
        info!("Login complete, session saved");
    }

    pub fn logout(&mut self) {
        self.store.clear_tokens();
        info!("Session cleared");
    }

    /// An access token fit to put on an outgoing request.
    ///
    /// Performs at most one silent refresh when the access token is expired
    /// but the refresh token is still usable. `Ok(None)` means no usable
    /// credential exists and the caller should route to login; a refresh
    /// failure is surfaced as an error so the caller can distinguish
    /// "logged out" from "refresh endpoint unreachable".
    pub async fn access_token_for_request(&mut self) -> Result<Option<String>> {
        match self.store.auth_phase() {
            AuthPhase::Unauthenticated | AuthPhase::Expired => Ok(None),
            AuthPhase::Authenticated => Ok(self.store.access_token()),
            AuthPhase::AccessExpiredRefreshable => {
                let Some(refresh_token) = self.store.refresh_token() else {
                    warn!("Refreshable phase without a refresh token");
                    return Ok(None);
                };

                let grant = self
                    .refresher
                    .refresh(&refresh_token)
                    .await
                    .context("Token refresh failed")?;

                self.store.save_tokens(
                    &grant.access_token,
                    &grant.refresh_token,
                    grant.refresh_expires_in,
                );
                debug!("Silent refresh succeeded");
                Ok(self.store.access_token())
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
