//! Access-token expiry evaluation.
//!
//! Pure functions over token material; no storage access. The access token
//! is a JWT whose payload carries an `exp` claim (seconds since epoch). The
//! signature is not verified here - the server does that; this check only
//! decides whether a token is worth sending at all.

use anyhow::{bail, Context, Result};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Utc;
use serde::Deserialize;
use tracing::debug;

/// Seconds before the actual `exp` at which a token is already treated as
/// expired. Covers the window where a token passes the client check but has
/// expired by the time the request reaches the server, so "expired" means
/// "refresh before use", not "already rejected".
pub const TOKEN_REFRESH_BUFFER_SECONDS: i64 = 30;

#[derive(Deserialize)]
struct Claims {
    exp: i64,
}

/// Whether `token` expires within `buffer_seconds` from now.
///
/// Anything that prevents reading the `exp` claim - wrong segment count,
/// bad base64, bad JSON, missing claim - counts as expired.
pub fn is_token_expired(token: &str, buffer_seconds: i64) -> bool {
    match decode_exp(token) {
        Ok(exp) => exp < Utc::now().timestamp() + buffer_seconds,
        Err(e) => {
            debug!(error = %e, "Token not decodable, treating as expired");
            true
        }
    }
}

fn decode_exp(token: &str) -> Result<i64> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        bail!("expected 3 token segments, got {}", parts.len());
    }

    let payload = URL_SAFE_NO_PAD
        .decode(parts[1])
        .context("invalid base64 in token payload")?;

    let claims: Claims =
        serde_json::from_slice(&payload).context("token payload missing exp claim")?;

    Ok(claims.exp)
}

#[cfg(test)]
pub(crate) mod testutil {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

    /// Build an unsigned JWT with the given `exp` claim. The signature
    /// segment is junk; expiry evaluation never looks at it.
    pub fn token_with_exp(exp: i64) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"exp":{exp}}}"#));
        format!("{header}.{payload}.sig")
    }
}

#[cfg(test)]
mod tests {
    use super::testutil::token_with_exp;
    use super::*;

    #[test]
    fn test_past_exp_is_expired() {
        let token = token_with_exp(Utc::now().timestamp() - 3600);
        assert!(is_token_expired(&token, TOKEN_REFRESH_BUFFER_SECONDS));
    }

    #[test]
    fn test_far_future_exp_is_not_expired() {
        let token = token_with_exp(Utc::now().timestamp() + 3600);
        assert!(!is_token_expired(&token, TOKEN_REFRESH_BUFFER_SECONDS));
    }

    #[test]
    fn test_exp_inside_buffer_is_expired() {
        // Valid for another 10s, but the 30s buffer writes it off
        let token = token_with_exp(Utc::now().timestamp() + 10);
        assert!(is_token_expired(&token, TOKEN_REFRESH_BUFFER_SECONDS));
        assert!(!is_token_expired(&token, 0));
    }

    #[test]
    fn test_garbage_token_is_expired() {
        assert!(is_token_expired("not-a-real-token", TOKEN_REFRESH_BUFFER_SECONDS));
        assert!(is_token_expired("", TOKEN_REFRESH_BUFFER_SECONDS));
        assert!(is_token_expired("a.!!!.c", TOKEN_REFRESH_BUFFER_SECONDS));
    }

    #[test]
    fn test_payload_without_exp_is_expired() {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256"}"#);
        let payload = URL_SAFE_NO_PAD.encode(br#"{"sub":"user-1"}"#);
        let token = format!("{header}.{payload}.sig");
        assert!(is_token_expired(&token, TOKEN_REFRESH_BUFFER_SECONDS));
    }

    #[test]
    fn test_buffer_constant() {
        assert_eq!(TOKEN_REFRESH_BUFFER_SECONDS, 30);
    }
}
