//! Plain-file storage backend.
//!
//! All keys live in a single JSON object so the on-disk layout stays
//! human-inspectable: `{ "narbox_access_token": "...", ... }`. Every
//! operation re-reads the file; credential access is infrequent and the
//! file is tiny, so simplicity wins over caching here (the read-through
//! cache lives in `SessionStore`, not in the backend).

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::warn;

use super::{StorageBackend, StorageError};

/// Store file name inside the data directory
const STORE_FILE: &str = "session.json";

pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir`, creating the directory if needed.
    pub fn new(dir: PathBuf) -> Result<Self, StorageError> {
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            path: dir.join(STORE_FILE),
        })
    }

    fn load_map(&self) -> Result<HashMap<String, String>, StorageError> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Like `load_map`, but a corrupt file yields an empty map so a write
    /// can recover the store instead of failing forever.
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
        let contents = serde_json::to_string_pretty(map)?;
        std::fs::write(&self.path, contents)?;
        Ok(())
    }
}

impl StorageBackend for FileStore {
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
