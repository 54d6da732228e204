//! Client error types.

use ab_usage_core::TransportError;

/// Errors that can occur when talking to the AgenticBilling API.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP request failed before a response was produced.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server returned an error response.
    #[error("API error {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Server-provided message, or the raw body when it was not the
        /// structured error shape.
        message: String,
    },

    /// Response body could not be decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<ClientError> for TransportError {
    fn from(error: ClientError) -> Self {
        match error {
            ClientError::Api { status, message } => Self::Api { status, message },
            other => Self::Connection(other.to_string()),
        }
    }
}
