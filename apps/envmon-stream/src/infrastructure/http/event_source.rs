//! HTTP Event Source
//!
//! Opens `GET /stream` and exposes the response body as raw chunks.

use async_trait::async_trait;
use futures_util::StreamExt;

use super::client::{ApiClient, StatusCategory, categorize_status, error_message};
use crate::application::ports::{
    BearerToken, ByteStream, EventSource, OpenError, TransportError,
};

/// Path of the event stream endpoint.
pub const STREAM_PATH: &str = "/stream";

/// Event source backed by a long-lived HTTP response.
#[derive(Debug, Clone)]
pub struct HttpEventSource {
    client: ApiClient,
}

impl HttpEventSource {
    /// Create a new event source.
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EventSource for HttpEventSource {
    async fn open(&self, token: &BearerToken) -> Result<ByteStream, OpenError> {
        let response = self
            .client
            .stream(STREAM_PATH, token)
            .send()
            .await
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            if categorize_status(status) == StatusCategory::Unauthorized {
                return Err(OpenError::Unauthorized {
                    status: status.as_u16(),
                });
            }
            let message = error_message(response).await;
            return Err(TransportError::Status {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        tracing::debug!(status = status.as_u16(), "Event stream opened");

        let body = response.bytes_stream().map(|chunk| {
            chunk
                .map(|bytes| bytes.to_vec())
                .map_err(|e| TransportError::ReadFailed(e.to_string()))
        });
        Ok(Box::pin(body))
    }
}
