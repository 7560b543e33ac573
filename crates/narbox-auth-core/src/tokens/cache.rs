use chrono::{DateTime, Utc};

/// How long a snapshot may serve reads before the backing store is
/// consulted again. Long enough to absorb bursts of per-request token
/// checks, short enough that an out-of-band store change is picked up
/// quickly.
pub(crate) const CACHE_TTL_MS: i64 = 5000;

/// In-memory snapshot of the three persisted credential values.
///
/// Values are kept as the raw stored strings; parsing (JWT claims, the
/// refresh-expiry timestamp) happens in the predicates so a corrupt stored
/// value can fail safe instead of poisoning the snapshot. Owned exclusively
/// by `SessionStore` and never handed out.
#[derive(Debug, Clone)]
pub(crate) struct TokenCache {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub refresh_expires_at: Option<String>,
    pub last_updated: DateTime<Utc>,
}

impl TokenCache {
    pub fn is_fresh(&self) -> bool {
        (Utc::now() - self.last_updated).num_milliseconds() < CACHE_TTL_MS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn snapshot() -> TokenCache {
        TokenCache {
            access_token: None,
            refresh_token: None,
            refresh_expires_at: None,
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn test_fresh_snapshot() {
        assert!(snapshot().is_fresh());
    }

    #[test]
    fn test_snapshot_goes_stale_after_ttl() {
        let mut snap = snapshot();
        snap.last_updated = Utc::now() - Duration::milliseconds(CACHE_TTL_MS + 1);
        assert!(!snap.is_fresh());
    }
}
