//! The session credential store.
//!
//! `SessionStore` owns the three persisted credential values (access token,
//! refresh token, refresh-expiry timestamp) behind a short-TTL read-through
//! cache, so hot paths like a per-request auth check don't hit the backing
//! store every time.
//!
//! Consistency rules:
//! - `save_tokens` writes through, invalidates, then eagerly refills the
//!   cache, so a read immediately after a save always sees the saved values.
//! - `clear_tokens` invalidates only; the next read repopulates lazily.
//! - The three keys are written sequentially with no cross-key atomicity. A
//!   crash mid-save can leave them inconsistent; the expiry predicates are
//!   written to fail safe in that case.

use chrono::Utc;
use tracing::{debug, warn};

use super::cache::TokenCache;
use super::expiry::{is_token_expired, TOKEN_REFRESH_BUFFER_SECONDS};
use crate::storage::{version, Storage};

// ============================================================================
// Persisted keys
// ============================================================================

pub(crate) const ACCESS_TOKEN_KEY: &str = "narbox_access_token";
pub(crate) const REFRESH_TOKEN_KEY: &str = "narbox_refresh_token";
pub(crate) const REFRESH_EXPIRES_AT_KEY: &str = "narbox_refresh_token_expires_at";

/// Where a credential pair sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPhase {
    /// No stored tokens
    Unauthenticated,
    /// Access token present and not expired
    Authenticated,
    /// Access token expired or missing, refresh token still usable
    AccessExpiredRefreshable,
    /// Both tokens beyond use; only a fresh login helps
    Expired,
}

pub struct SessionStore {
    storage: Storage,
    cache: Option<TokenCache>,
}

impl SessionStore {
    /// Create a store over the given storage. Runs the schema version guard
    /// before any token operation can observe the persisted layout.
    pub fn new(storage: Storage) -> Self {
        version::ensure_current(&storage);
        Self {
            storage,
            cache: None,
        }
    }

    /// Persist a new credential pair.
    ///
    /// `refresh_expires_in_secs` is the refresh token's lifetime as reported
    /// at grant time; when absent, no expiry is recorded and the token is
    /// treated as non-expiring. Any previously stored expiry is removed so
    /// it cannot outlive the token it described.
    pub fn save_tokens(
        &mut self,
        access_token: &str,
        refresh_token: &str,
        refresh_expires_in_secs: Option<i64>,
    ) {
        self.storage.write(ACCESS_TOKEN_KEY, access_token);
        self.storage.write(REFRESH_TOKEN_KEY, refresh_token);
        match refresh_expires_in_secs {
            Some(secs) => {
                let expires_at_ms = Utc::now().timestamp_millis() + secs * 1000;
                self.storage
                    .write(REFRESH_EXPIRES_AT_KEY, &expires_at_ms.to_string());
            }
            None => self.storage.remove(REFRESH_EXPIRES_AT_KEY),
        }

        // Eager refill: the next read must be consistent with this save
        self.cache = None;
        self.update_cache();
        debug!(
            has_refresh_expiry = refresh_expires_in_secs.is_some(),
            "Saved credential pair"
        );
    }

    /// Remove all stored credentials. Idempotent.
    pub fn clear_tokens(&mut self) {
        self.storage.remove(ACCESS_TOKEN_KEY);
        self.storage.remove(REFRESH_TOKEN_KEY);
        self.storage.remove(REFRESH_EXPIRES_AT_KEY);
        self.cache = None;
        debug!("Cleared credential pair");
    }

    pub fn access_token(&mut self) -> Option<String> {
        self.snapshot().access_token.clone()
    }

    pub fn refresh_token(&mut self) -> Option<String> {
        self.snapshot().refresh_token.clone()
    }

    /// Whether the refresh token should be considered unusable.
    ///
    /// A missing refresh token is always "expired" (nothing to refresh
    /// with). A present token with no stored expiry is assumed valid -
    /// credentials saved before expiry tracking existed have no timestamp
    /// and must keep working. An unparseable timestamp fails safe toward
    /// requiring re-authentication.
    pub fn is_refresh_token_expired(&mut self) -> bool {
        let snap = self.snapshot();
        if snap.refresh_token.is_none() {
            return true;
        }
        match &snap.refresh_expires_at {
            None => false,
            Some(raw) => match raw.parse::<i64>() {
                Ok(expires_at_ms) => expires_at_ms < Utc::now().timestamp_millis(),
                Err(_) => {
                    warn!(value = %raw, "Unparseable refresh expiry, treating as expired");
                    true
                }
            },
        }
    }

    /// Whether any usable credential exists: both tokens present, and at
    /// least one of them not expired. Does not attempt a refresh - that is
    /// the caller's job.
    pub fn has_valid_auth(&mut self) -> bool {
        let (access, refresh) = {
            let snap = self.snapshot();
            (snap.access_token.clone(), snap.refresh_token.clone())
        };
        let (Some(access), Some(_)) = (access, refresh) else {
            return false;
        };

        let access_expired = is_token_expired(&access, TOKEN_REFRESH_BUFFER_SECONDS);
        let refresh_expired = self.is_refresh_token_expired();
        !(access_expired && refresh_expired)
    }

    /// Classify the stored credential pair for bootstrap/refresh decisions.
    pub fn auth_phase(&mut self) -> AuthPhase {
        let (access, refresh) = {
            let snap = self.snapshot();
            (snap.access_token.clone(), snap.refresh_token.clone())
        };

        if access.is_none() && refresh.is_none() {
            return AuthPhase::Unauthenticated;
        }

        let access_valid = access
            .as_deref()
            .is_some_and(|t| !is_token_expired(t, TOKEN_REFRESH_BUFFER_SECONDS));
        if access_valid {
            AuthPhase::Authenticated
        } else if !self.is_refresh_token_expired() {
            AuthPhase::AccessExpiredRefreshable
        } else {
            AuthPhase::Expired
        }
    }

    /// Re-read all three keys and install a fresh snapshot. Failed reads
    /// surface as `None` fields, never as stale data.
    fn update_cache(&mut self) {
        self.cache = Some(TokenCache {
            access_token: self.storage.read(ACCESS_TOKEN_KEY),
            refresh_token: self.storage.read(REFRESH_TOKEN_KEY),
            refresh_expires_at: self.storage.read(REFRESH_EXPIRES_AT_KEY),
            last_updated: Utc::now(),
        });
    }

    fn snapshot(&mut self) -> &TokenCache {
        let fresh = self.cache.as_ref().is_some_and(TokenCache::is_fresh);
        if !fresh {
            self.update_cache();
        }
        // update_cache always installs a snapshot
        self.cache.get_or_insert_with(|| TokenCache {
            access_token: None,
            refresh_token: None,
            refresh_expires_at: None,
            last_updated: Utc::now(),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::tokens::cache::CACHE_TTL_MS;
    use crate::tokens::expiry::testutil::token_with_exp;
    use chrono::Duration;

    fn fresh_access() -> String {
        token_with_exp(Utc::now().timestamp() + 3600)
    }

    fn stale_access() -> String {
        token_with_exp(Utc::now().timestamp() - 3600)
    }

    fn store_with_backend() -> (SessionStore, MemoryStore) {
        let backend = MemoryStore::new();
        let store = SessionStore::new(Storage::new(backend.clone()));
        (store, backend)
    }

    /// Age the current snapshot past the cache TTL without touching clocks.
    fn expire_snapshot(store: &mut SessionStore) {
        if let Some(cache) = store.cache.as_mut() {
            cache.last_updated = Utc::now() - Duration::milliseconds(CACHE_TTL_MS + 1);
        }
    }

    #[test]
    fn test_save_then_read_round_trip() {
        let (mut store, _) = store_with_backend();
        let access = fresh_access();
        store.save_tokens(&access, "refresh-1", None);

        assert_eq!(store.access_token(), Some(access));
        assert_eq!(store.refresh_token(), Some("refresh-1".to_string()));
    }

    #[test]
    fn test_clear_is_idempotent() {
        let (mut store, _) = store_with_backend();
        store.save_tokens(&fresh_access(), "refresh-1", None);

        store.clear_tokens();
        store.clear_tokens();
        assert_eq!(store.access_token(), None);
        assert_eq!(store.refresh_token(), None);
    }

    #[test]
    fn test_cached_read_misses_direct_store_mutation() {
        let (mut store, backend) = store_with_backend();
        store.save_tokens(&fresh_access(), "refresh-1", None);
        let saved = store.access_token();

        backend.set(ACCESS_TOKEN_KEY, "mutated-behind-our-back");
        // Snapshot is still within its TTL, so the mutation is invisible
        assert_eq!(store.access_token(), saved);

        expire_snapshot(&mut store);
        assert_eq!(
            store.access_token(),
            Some("mutated-behind-our-back".to_string())
        );
    }

    #[test]
    fn test_clear_invalidates_immediately() {
        let (mut store, backend) = store_with_backend();
        store.save_tokens(&fresh_access(), "refresh-1", None);
        store.clear_tokens();

        // No stale window after a clear: the very next read hits the store
        backend.set(ACCESS_TOKEN_KEY, "written-after-clear");
        assert_eq!(
            store.access_token(),
            Some("written-after-clear".to_string())
        );
    }

    #[test]
    fn test_refresh_without_stored_expiry_never_expires() {
        let (mut store, _) = store_with_backend();
        store.save_tokens(&fresh_access(), "refresh-1", None);
        assert!(!store.is_refresh_token_expired());
    }

    #[test]
    fn test_refresh_expiry_tracking() {
        let (mut store, _) = store_with_backend();
        store.save_tokens(&fresh_access(), "refresh-1", Some(3600));
        assert!(!store.is_refresh_token_expired());

        // A negative lifetime puts the stored timestamp in the past
        store.save_tokens(&fresh_access(), "refresh-1", Some(-10));
        assert!(store.is_refresh_token_expired());
    }

    #[test]
    fn test_save_without_lifetime_drops_stale_expiry() {
        let (mut store, backend) = store_with_backend();
        store.save_tokens(&fresh_access(), "refresh-1", Some(-10));
        assert!(store.is_refresh_token_expired());

        store.save_tokens(&fresh_access(), "refresh-2", None);
        assert_eq!(backend.get(REFRESH_EXPIRES_AT_KEY), None);
        assert!(!store.is_refresh_token_expired());
    }

    #[test]
    fn test_missing_refresh_token_counts_as_expired() {
        let (mut store, _) = store_with_backend();
        assert!(store.is_refresh_token_expired());
    }

    #[test]
    fn test_garbage_stored_expiry_fails_safe() {
        let (mut store, backend) = store_with_backend();
        store.save_tokens(&fresh_access(), "refresh-1", None);
        backend.set(REFRESH_EXPIRES_AT_KEY, "not-a-number");
        expire_snapshot(&mut store);

        assert!(store.is_refresh_token_expired());
    }

    #[test]
    fn test_has_valid_auth_truth_table() {
        // No tokens at all
        let (mut store, _) = store_with_backend();
        assert!(!store.has_valid_auth());

        // Fresh access token
        store.save_tokens(&fresh_access(), "refresh-1", None);
        assert!(store.has_valid_auth());

        // Expired access, usable refresh
        store.save_tokens(&stale_access(), "refresh-1", Some(3600));
        assert!(store.has_valid_auth());

        // Expired access, refresh with no expiry metadata
        store.save_tokens(&stale_access(), "refresh-1", None);
        assert!(store.has_valid_auth());

        // Both expired
        store.save_tokens(&stale_access(), "refresh-1", Some(-10));
        assert!(!store.has_valid_auth());
    }

    #[test]
    fn test_auth_phase_transitions() {
        let (mut store, _) = store_with_backend();
        assert_eq!(store.auth_phase(), AuthPhase::Unauthenticated);

        store.save_tokens(&fresh_access(), "refresh-1", Some(3600));
        assert_eq!(store.auth_phase(), AuthPhase::Authenticated);

        store.save_tokens(&stale_access(), "refresh-1", Some(3600));
        assert_eq!(store.auth_phase(), AuthPhase::AccessExpiredRefreshable);

        store.save_tokens(&stale_access(), "refresh-1", Some(-10));
        assert_eq!(store.auth_phase(), AuthPhase::Expired);

        store.clear_tokens();
        assert_eq!(store.auth_phase(), AuthPhase::Unauthenticated);
    }

    #[test]
    fn test_unavailable_storage_degrades_to_unauthenticated() {
        let mut store = SessionStore::new(Storage::unavailable());
        store.save_tokens(&fresh_access(), "refresh-1", Some(3600));

        // Writes were no-ops, so nothing can be read back once the eager
        // snapshot ages out
        expire_snapshot(&mut store);
        assert_eq!(store.access_token(), None);
        assert!(!store.has_valid_auth());
        assert_eq!(store.auth_phase(), AuthPhase::Unauthenticated);
    }
}
