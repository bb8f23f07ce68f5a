//! Hydrus API Error Types
//!
//! Maps HTTP status codes and transport failures to specific error variants.
//! Nothing is retried at this layer; callers see the failure as-is.

/// Hydrus API error types
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Access key missing or invalid")]
    Unauthorized,

    #[error("Access key lacks permission: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limited by the client API")]
    RateLimited,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Server error ({0}): {1}")]
    Server(u16, String),

    #[error("Request timeout")]
    Timeout,

    #[error("Request error: {0}")]
    Request(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Create an ApiError from an HTTP status code and response body
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            401 | 419 => ApiError::Unauthorized,
            403 => ApiError::Forbidden(body.to_string()),
            404 => ApiError::NotFound(body.to_string()),
            408 => ApiError::Timeout,
            429 => ApiError::RateLimited,
            500..=599 => ApiError::Server(status, body.to_string()),
            _ => ApiError::Request(format!("HTTP {}: {}", status, body)),
        }
    }

    /// Whether the failure came from the transport rather than the server
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Network(_) | ApiError::Timeout)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            ApiError::from_status(status.as_u16(), &err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}
