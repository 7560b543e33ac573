//! Session token lifecycle.
//!
//! This module provides:
//! - `SessionStore`: the credential store over a `Storage` backend, with a
//!   short-TTL read-through cache
//! - `is_token_expired`: JWT expiry check with a safety buffer
//! - `AuthPhase`: where a credential pair sits in its lifecycle
//!
//! Access tokens are decodable JWTs carrying an `exp` claim; refresh tokens
//! are opaque, with their expiry tracked as a stored absolute timestamp.

mod cache;
pub mod expiry;
pub mod store;

pub use expiry::{is_token_expired, TOKEN_REFRESH_BUFFER_SECONDS};
pub use store::{AuthPhase, SessionStore};
