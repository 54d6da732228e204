//! Transport collaborator interface.
//!
//! The preview loop hands a fully-validated event to a [`UsageTransport`]
//! and reports whatever comes back. The HTTP implementation lives in the
//! client crate; tests use in-memory stubs.

use async_trait::async_trait;

use crate::event::UsageEvent;

/// A transport failure, reported to the operator and retryable from the
/// preview loop.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The request never produced a server response.
    #[error("transport error: {0}")]
    Connection(String),

    /// The server rejected the request.
    #[error("API error {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Server-provided message.
        message: String,
    },
}

/// Sends one validated usage event to the metering API.
#[async_trait]
pub trait UsageTransport: Send + Sync {
    /// Transmit the event and return the parsed server response.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] on connection or server failure.
    async fn send(&self, event: &UsageEvent) -> Result<serde_json::Value, TransportError>;
}
