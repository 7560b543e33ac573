//! Encrypted-at-rest variant of the file backend.
//!
//! The serialized key-value map is sealed with XChaCha20-Poly1305 under a
//! key derived from a passphrase with Argon2. On-disk layout is
//! `base64(salt || nonce || ciphertext)`; salt and nonce are regenerated on
//! every write, so the key is re-derived per operation and no key material
//! is ever persisted.

use std::collections::HashMap;
use std::path::PathBuf;

use argon2::Argon2;
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    XChaCha20Poly1305, XNonce,
};
use rand::RngCore;
use tracing::warn;

use super::{StorageBackend, StorageError};

/// Store file name inside the data directory
const STORE_FILE: &str = "session.enc";

const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 24;
const KEY_LEN: usize = 32;

pub struct EncryptedFileStore {
    path: PathBuf,
    passphrase: String,
}

impl EncryptedFileStore {
    /// Create a store rooted at `dir`, creating the directory if needed.
    pub fn new(dir: PathBuf, passphrase: &str) -> Result<Self, StorageError> {
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            path: dir.join(STORE_FILE),
            passphrase: passphrase.to_string(),
        })
    }

    fn derive_key(&self, salt: &[u8]) -> Result<[u8; KEY_LEN], StorageError> {
        let mut key = [0u8; KEY_LEN];
        Argon2::default()
            .hash_password_into(self.passphrase.as_bytes(), salt, &mut key)
            .map_err(|e| StorageError::Crypto(format!("Key derivation failed: {e}")))?;
        Ok(key)
    }

    fn load_map(&self) -> Result<HashMap<String, String>, StorageError> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        let combined = BASE64_STANDARD
            .decode(contents.trim())
            .map_err(|e| StorageError::Crypto(format!("Invalid store encoding: {e}")))?;

        if combined.len() < SALT_LEN + NONCE_LEN {
            return Err(StorageError::Crypto("Store file too short".into()));
        }
        let (salt, rest) = combined.split_at(SALT_LEN);
        let (nonce, ciphertext) = rest.split_at(NONCE_LEN);

        let key = self.derive_key(salt)?;
        let cipher = XChaCha20Poly1305::new_from_slice(&key)
            .map_err(|e| StorageError::Crypto(format!("Cipher init failed: {e}")))?;

        let plaintext = cipher
            .decrypt(XNonce::from_slice(nonce), ciphertext)
            .map_err(|_| StorageError::Crypto("Decryption failed (wrong passphrase?)".into()))?;

        Ok(serde_json::from_slice(&plaintext)?)
    }

    fn load_map_for_write(&self) -> HashMap<String, String> {
        match self.load_map() {
            Ok(map) => map,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Discarding unreadable store file");
                HashMap::new()
            }
        }
    }

    fn save_map(&self, map: &HashMap<String, String>) -> Result<(), StorageError> {
        let plaintext = serde_json::to_vec(map)?;

        let mut salt = [0u8; SALT_LEN];
        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut salt);
        rand::thread_rng().fill_bytes(&mut nonce);

        let key = self.derive_key(&salt)?;
        let cipher = XChaCha20Poly1305::new_from_slice(&key)
            .map_err(|e| StorageError::Crypto(format!("Cipher init failed: {e}")))?;

        let ciphertext = cipher
            .encrypt(XNonce::from_slice(&nonce), plaintext.as_slice())
            .map_err(|_| StorageError::Crypto("Encryption failed".into()))?;

        let mut combined = salt.to_vec();
        combined.extend_from_slice(&nonce);
        combined.extend_from_slice(&ciphertext);

        std::fs::write(&self.path, BASE64_STANDARD.encode(&combined))?;
        Ok(())
    }
}

impl StorageBackend for EncryptedFileStore {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.load_map()?.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut map = self.load_map_for_write();
        map.insert(key.to_string(), value.to_string());
        self.save_map(&map)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut map = self.load_map_for_write();
        if map.remove(key).is_some() {
            self.save_map(&map)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = EncryptedFileStore::new(dir.path().to_path_buf(), "hunter2").unwrap();

        store.write("k", "v").unwrap();
        assert_eq!(store.read("k").unwrap(), Some("v".to_string()));

        store.remove("k").unwrap();
        assert_eq!(store.read("k").unwrap(), None);
    }

    #[test]
    fn test_file_is_not_plaintext() {
        let dir = tempfile::tempdir().unwrap();
        let store = EncryptedFileStore::new(dir.path().to_path_buf(), "hunter2").unwrap();
        store.write("token", "very-secret-value").unwrap();

        let contents = std::fs::read_to_string(dir.path().join(STORE_FILE)).unwrap();
        assert!(!contents.contains("very-secret-value"));
        assert!(!contents.contains("token"));
    }

    #[test]
    fn test_wrong_passphrase_fails_read() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = EncryptedFileStore::new(dir.path().to_path_buf(), "correct").unwrap();
            store.write("k", "v").unwrap();
        }
        let store = EncryptedFileStore::new(dir.path().to_path_buf(), "wrong").unwrap();
        assert!(store.read("k").is_err());
    }
}
