//! HTTP client for the Narbox auth endpoints.
//!
//! Two operations matter to the credential lifecycle: password login and
//! refresh-token exchange. Both return a `TokenGrant` that callers hand to
//! `SessionStore::save_tokens`.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use super::AuthApiError;

// ============================================================================
// Constants
// ============================================================================

/// Default base URL for the Narbox API
pub(crate) const DEFAULT_API_BASE_URL: &str = "https://api.narbox.io";

/// HTTP request timeout in seconds.
/// 30s allows for slow responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// A freshly issued credential pair, as returned by login and refresh.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: String,
    /// Refresh-token lifetime in seconds; older deployments omit it
    #[serde(default)]
    pub refresh_expires_in: Option<i64>,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

/// Exchanges a refresh token for a new grant. Seam between the session
/// controller and the network so refresh orchestration is testable without
/// a server.
pub trait TokenRefresher {
    fn refresh(
        &self,
        refresh_token: &str,
    ) -> impl std::future::Future<Output = Result<TokenGrant>> + Send;
}

/// API client for the Narbox auth service.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct AuthApiClient {
    client: Client,
    base_url: String,
}

impl AuthApiClient {
    /// Create a new client against the given base URL.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Authenticate with email and password.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenGrant> {
        debug!(email, "Logging in");
        self.post("/auth/login", &LoginRequest { email, password })
            .await
    }

    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(AuthApiError::from_status(status, &body).into())
        }
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to send POST request to {}", url))?;

        let response = Self::check_response(response).await?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }
}

impl TokenRefresher for AuthApiClient {
    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant> {
        debug!("Exchanging refresh token");
        self.post("/auth/refresh", &RefreshRequest { refresh_token })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_grant_parses_camel_case() {
        let grant: TokenGrant = serde_json::from_str(
            r#"{"accessToken":"a","refreshToken":"r","refreshExpiresIn":1209600}"#,
        )
        .unwrap();
        assert_eq!(grant.access_token, "a");
        assert_eq!(grant.refresh_expires_in, Some(1209600));
    }

    #[test]
    fn test_token_grant_tolerates_missing_refresh_lifetime() {
        let grant: TokenGrant =
            serde_json::from_str(r#"{"accessToken":"a","refreshToken":"r"}"#).unwrap();
        assert_eq!(grant.refresh_expires_in, None);
    }
}
