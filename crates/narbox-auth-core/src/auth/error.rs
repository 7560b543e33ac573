use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthApiError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl AuthApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            format!(
                "{}... (truncated, {} total bytes)",
                &body[..MAX_ERROR_BODY_LENGTH],
                body.len()
            )
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            400 => AuthApiError::BadRequest(truncated),
            // The auth endpoints answer 401 for bad logins and dead refresh
            // tokens alike
            401 => AuthApiError::InvalidCredentials,
            403 => AuthApiError::AccessDenied(truncated),
            429 => AuthApiError::RateLimited,
            500..=599 => AuthApiError::ServerError(truncated),
            _ => AuthApiError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let e = AuthApiError::from_status(reqwest::StatusCode::UNAUTHORIZED, "nope");
        assert!(matches!(e, AuthApiError::InvalidCredentials));

        let e = AuthApiError::from_status(reqwest::StatusCode::INTERNAL_SERVER_ERROR, "boom");
        assert!(matches!(e, AuthApiError::ServerError(_)));
    }

    #[test]
    fn test_long_bodies_are_truncated() {
        let body = "x".repeat(2000);
        let e = AuthApiError::from_status(reqwest::StatusCode::BAD_REQUEST, &body);
        let msg = e.to_string();
        assert!(msg.len() < 700);
        assert!(msg.contains("truncated"));
    }
}
