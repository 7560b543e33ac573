//! Core library for narbox-auth.
//!
//! A client-resident session credential store for the Narbox API: access
//! and refresh tokens persisted through pluggable storage backends, served
//! through a short-TTL cache, with expiry evaluation and silent-refresh
//! orchestration layered on top.
//!
//! Typical wiring:
//!
//! ```no_run
//! use narbox_auth_core::{AuthApiClient, Config, FileStore, SessionController, SessionStore, Storage};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config::load()?;
//! let store = SessionStore::new(Storage::new(FileStore::new(Config::data_dir()?)?));
//! let client = AuthApiClient::new(config.api_base_url())?;
//! let mut session = SessionController::new(store, client);
//! let _phase = session.bootstrap();
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod storage;
pub mod tokens;

pub use auth::{AuthApiClient, AuthApiError, SessionController, TokenGrant, TokenRefresher};
pub use config::Config;
pub use storage::{
    EncryptedFileStore, FileStore, KeyringStore, MemoryStore, Storage, StorageBackend,
    StorageError,
};
pub use tokens::{is_token_expired, AuthPhase, SessionStore, TOKEN_REFRESH_BUFFER_SECONDS};
