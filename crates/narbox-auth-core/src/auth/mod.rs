//! Auth API client and session orchestration.
//!
//! This module provides:
//! - `AuthApiClient`: login/refresh against the Narbox auth endpoints
//! - `SessionController`: bootstrap, login completion, silent refresh and
//!   logout on top of a `SessionStore`
//!
//! The credential store itself never talks to the network; everything that
//! does lives here.

pub mod client;
pub mod controller;
pub mod error;

pub use client::{AuthApiClient, TokenGrant, TokenRefresher};
pub use controller::SessionController;
pub use error::AuthApiError;
