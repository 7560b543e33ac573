//! The `StorageBackend` trait and the never-failing `Storage` facade.

use tracing::warn;

use super::StorageError;

/// A synchronous, string-keyed persistent store.
///
/// Backends may fail; the `Storage` facade is responsible for converting
/// failures into safe defaults before they reach token logic.
pub trait StorageBackend: Send {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Facade over an optional backend.
///
/// All operations are infallible from the caller's point of view: backend
/// errors are logged and swallowed, and a `Storage` built with
/// `Storage::unavailable()` turns every operation into a no-op. Callers
/// holding credentials must therefore treat `None` reads as "not stored",
/// never as "stored empty".
pub struct Storage {
    backend: Option<Box<dyn StorageBackend>>,
}

impl Storage {
    pub fn new(backend: impl StorageBackend + 'static) -> Self {
        Self {
            backend: Some(Box::new(backend)),
        }
    }

    /// A storage with no backing store. Reads return `None`, writes and
    /// removes do nothing. Used in execution contexts that have no
    /// persistent store (e.g. sandboxed test harnesses).
    pub fn unavailable() -> Self {
        Self { backend: None }
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    pub fn read(&self, key: &str) -> Option<String> {
        let backend = self.backend.as_ref()?;
        match backend.read(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "Storage read failed, returning none");
                None
            }
        }
    }

    pub fn write(&self, key: &str, value: &str) {
        let Some(backend) = self.backend.as_ref() else {
            return;
        };
        if let Err(e) = backend.write(key, value) {
            warn!(key, error = %e, "Storage write failed, value not persisted");
        }
    }

    pub fn remove(&self, key: &str) {
        let Some(backend) = self.backend.as_ref() else {
            return;
        };
        if let Err(e) = backend.remove(key) {
            warn!(key, error = %e, "Storage remove failed");
        }
    }
}
