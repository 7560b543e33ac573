//! Persistent key-value storage for session credentials.
//!
//! This module provides the `Storage` facade over pluggable backends:
//! - `MemoryStore`: in-process map, used by tests and embedders
//! - `FileStore`: plain JSON file in a caller-supplied directory
//! - `EncryptedFileStore`: same layout, encrypted at rest
//! - `KeyringStore`: one OS keychain entry per key
//!
//! `Storage` never surfaces backend failures to callers. Reads degrade to
//! `None` and writes to no-ops, with the underlying error logged. A
//! `Storage` can also be constructed with no backend at all for execution
//! contexts where no persistent store exists.

pub mod backend;
pub mod encrypted;
pub mod error;
pub mod file;
pub mod keyring;
pub mod memory;
pub mod version;

pub use backend::{Storage, StorageBackend};
pub use encrypted::EncryptedFileStore;
pub use error::StorageError;
pub use file::FileStore;
pub use self::keyring::KeyringStore;
pub use memory::MemoryStore;
