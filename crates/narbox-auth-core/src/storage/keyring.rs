//! OS keychain storage backend.
//!
//! Each storage key becomes its own keyring entry under a fixed service
//! name, so tokens never touch the filesystem. An absent entry is a normal
//! condition (`None`), not an error.

use keyring::Entry;

use super::{StorageBackend, StorageError};

const SERVICE_NAME: &str = "narbox-auth";

#[derive(Default)]
pub struct KeyringStore;

impl KeyringStore {
    pub fn new() -> Self {
        Self
    }

    fn entry(key: &str) -> Result<Entry, StorageError> {
        Entry::new(SERVICE_NAME, key).map_err(|e| StorageError::Keyring(e.to_string()))
    }
}

impl StorageBackend for KeyringStore {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        match Self::entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(StorageError::Keyring(e.to_string())),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        Self::entry(key)?
            .set_password(value)
            .map_err(|e| StorageError::Keyring(e.to_string()))
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match Self::entry(key)?.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(StorageError::Keyring(e.to_string())),
        }
    }
}
