//! Storage schema versioning.
//!
//! A single integer key records the layout version of everything persisted
//! by this crate. `ensure_current` runs once per `SessionStore`
//! construction, before any token operation, and walks the migration
//! registry forward until the stored version matches the code's. Migration
//! is best-effort: a failing read or write is logged and the app keeps
//! going with whatever layout is on disk.

use tracing::{debug, warn};

use super::Storage;

/// Stored layout version key
pub(crate) const STORAGE_VERSION_KEY: &str = "narbox_storage_version";

/// Version expected by this build
pub(crate) const CURRENT_STORAGE_VERSION: u32 = 1;

type Migration = fn(&Storage);

/// `MIGRATIONS[v]` upgrades the layout from version `v` to `v + 1`.
const MIGRATIONS: &[Migration] = &[migrate_v0_to_v1];

/// v1 is the first tracked layout. Stores written before version tracking
/// existed (version 0) already use the same keys, so nothing to rewrite.
fn migrate_v0_to_v1(_storage: &Storage) {}

pub(crate) fn ensure_current(storage: &Storage) {
    if !storage.is_available() {
        return;
    }

    let stored = match storage.read(STORAGE_VERSION_KEY) {
        Some(raw) => match raw.parse::<u32>() {
            Ok(v) => v,
            Err(_) => {
                warn!(value = %raw, "Unparseable storage version, assuming 0");
                0
            }
        },
        None => 0,
    };

    if stored >= CURRENT_STORAGE_VERSION {
        return;
    }

    for from in stored..CURRENT_STORAGE_VERSION {
        match MIGRATIONS.get(from as usize) {
            Some(migration) => {
                debug!(from, to = from + 1, "Running storage migration");
                migration(storage);
            }
            None => {
                warn!(from, "No migration registered, skipping");
            }
        }
    }

    storage.write(STORAGE_VERSION_KEY, &CURRENT_STORAGE_VERSION.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn test_stamps_version_on_fresh_store() {
        let backend = MemoryStore::new();
        let storage = Storage::new(backend.clone());

        ensure_current(&storage);
        assert_eq!(
            backend.get(STORAGE_VERSION_KEY),
            Some(CURRENT_STORAGE_VERSION.to_string())
        );
    }

    #[test]
    fn test_current_version_left_untouched() {
        let backend = MemoryStore::new();
        backend.set(STORAGE_VERSION_KEY, &CURRENT_STORAGE_VERSION.to_string());
        let storage = Storage::new(backend.clone());

        ensure_current(&storage);
        assert_eq!(
            backend.get(STORAGE_VERSION_KEY),
            Some(CURRENT_STORAGE_VERSION.to_string())
        );
    }

    #[test]
    fn test_garbage_version_treated_as_zero_and_restamped() {
        let backend = MemoryStore::new();
        backend.set(STORAGE_VERSION_KEY, "banana");
        let storage = Storage::new(backend.clone());

        ensure_current(&storage);
        assert_eq!(
            backend.get(STORAGE_VERSION_KEY),
            Some(CURRENT_STORAGE_VERSION.to_string())
        );
    }

    #[test]
    fn test_unavailable_storage_skips_migration() {
        // Just verifying it does not panic or loop
        ensure_current(&Storage::unavailable());
    }
}
