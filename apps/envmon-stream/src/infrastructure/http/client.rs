//! Shared HTTP client for the sensor API.

use reqwest::{Client, RequestBuilder, Response, StatusCode};

use super::api_types::ApiErrorResponse;
use crate::application::ports::BearerToken;
use crate::infrastructure::config::ApiSettings;

/// Longest error body carried into error messages.
const MAX_ERROR_BODY: usize = 512;

/// HTTP client construction errors.
#[derive(Debug, thiserror::Error)]
pub enum HttpClientError {
    /// The underlying client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Build(String),
}

/// HTTP client for the sensor API.
///
/// Holds two connection pools: one with a whole-request timeout for bounded
/// calls, and one with only a connect timeout for the long-lived stream.
#[derive(Debug, Clone)]
pub struct ApiClient {
    bounded: Client,
    streaming: Client,
    settings: ApiSettings,
}

impl ApiClient {
    /// Create a new client from settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn new(settings: &ApiSettings) -> Result<Self, HttpClientError> {
        let bounded = Client::builder()
            .timeout(settings.request_timeout)
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|e| HttpClientError::Build(e.to_string()))?;

        let streaming = Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|e| HttpClientError::Build(e.to_string()))?;

        Ok(Self {
            bounded,
            streaming,
            settings: settings.clone(),
        })
    }

    /// Absolute URL for an API path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        self.settings.endpoint(path)
    }

    /// Bounded `GET`.
    #[must_use]
    pub fn get(&self, path: &str, token: &BearerToken) -> RequestBuilder {
        authorized(self.bounded.get(self.url(path)), token)
    }

    /// Bounded `POST`.
    #[must_use]
    pub fn post(&self, path: &str, token: &BearerToken) -> RequestBuilder {
        authorized(self.bounded.post(self.url(path)), token)
    }

    /// Unbounded `GET` for the event stream.
    #[must_use]
    pub fn stream(&self, path: &str, token: &BearerToken) -> RequestBuilder {
        authorized(self.streaming.get(self.url(path)), token)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .header(reqwest::header::CACHE_CONTROL, "no-cache")
    }
}

fn authorized(request: RequestBuilder, token: &BearerToken) -> RequestBuilder {
    request.header(reqwest::header::AUTHORIZATION, token.authorization_header())
}

/// Error category of a non-success status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCategory {
    /// 401 or 403.
    Unauthorized,
    /// 404.
    NotFound,
    /// Anything else.
    Failed,
}

/// Categorize a non-success HTTP status.
#[must_use]
pub const fn categorize_status(status: StatusCode) -> StatusCategory {
    match status.as_u16() {
        401 | 403 => StatusCategory::Unauthorized,
        404 => StatusCategory::NotFound,
        _ => StatusCategory::Failed,
    }
}

/// Best-effort error message from a failed response.
pub async fn error_message(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    let message = serde_json::from_str::<ApiErrorResponse>(&body)
        .map(|e| e.error)
        .unwrap_or(body);

    if message.trim().is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string();
    }
    truncate(message, MAX_ERROR_BODY)
}

fn truncate(mut text: String, max: usize) -> String {
    if text.len() > max {
        let mut end = max;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        text.truncate(end);
    }
    text
}
