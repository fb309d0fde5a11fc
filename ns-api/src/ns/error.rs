//! NS API client error types.

use super::convert::ConversionError;

/// Errors from the NS API client.
#[derive(Debug, thiserror::Error)]
pub enum NsApiError {
    /// HTTP request failed (connection refused, TLS, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned a non-success status code
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Credentials rejected
    #[error("unauthorized: check NS_API_USERNAME and NS_API_KEY")]
    Unauthorized,

    /// Response could not be turned into records
    #[error("failed to parse response: {0}")]
    Conversion(#[from] ConversionError),

    /// JSON projection failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Client is missing required configuration
    #[error("not configured: {0}")]
    NotConfigured(String),
}

impl NsApiError {
    /// HTTP status of a failed response, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            NsApiError::Api { status, .. } => Some(*status),
            NsApiError::Unauthorized => Some(401),
            NsApiError::Http(e) => e.status().map(|s| s.as_u16()),
            NsApiError::Conversion(_) | NsApiError::Json(_) | NsApiError::NotConfigured(_) => None,
        }
    }
}
