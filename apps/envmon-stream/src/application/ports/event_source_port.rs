//! Event Source Port (Driven Port)
//!
//! Interface to the remote telemetry stream. An implementation opens the
//! long-lived request and hands back the raw body as a stream of chunks.

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;

use super::credentials_port::BearerToken;

/// Raw body chunks from an open stream.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, TransportError>> + Send>>;

/// Connection-level failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The connection could not be established.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The remote answered with a non-success status.
    #[error("unexpected status {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body or reason phrase.
        message: String,
    },

    /// Reading the body failed mid-stream.
    #[error("read failed: {0}")]
    ReadFailed(String),

    /// No bytes arrived within the stall timeout.
    #[error("stream stalled: no data for {0:?}")]
    Stalled(std::time::Duration),
}

/// Outcome of a failed open.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OpenError {
    /// The remote rejected the credential (401/403).
    #[error("unauthorized (status {status})")]
    Unauthorized {
        /// HTTP status code.
        status: u16,
    },

    /// Any other failure.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Port for opening the telemetry event stream.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Open the stream with the given credential.
    ///
    /// Resolves once response headers are received.
    async fn open(&self, token: &BearerToken) -> Result<ByteStream, OpenError>;
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn stalled_reports_timeout() {
        let err = TransportError::Stalled(Duration::from_secs(30));
        assert_eq!(err.to_string(), "stream stalled: no data for 30s");
    }

    #[test]
    fn transport_error_converts_to_open_error() {
        let err: OpenError = TransportError::ReadFailed("reset".into()).into();
        assert_eq!(err.to_string(), "read failed: reset");
    }
}
