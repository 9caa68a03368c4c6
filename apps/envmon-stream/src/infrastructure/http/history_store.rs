//! HTTP History Store
//!
//! Adapter for `GET /history` and `GET /current`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::StatusCode;

use super::api_types::{CurrentEnvelope, HistoryEnvelope};
use super::client::{ApiClient, StatusCategory, categorize_status, error_message};
use crate::application::ports::{
    AuthError, BearerToken, CredentialProvider, HistoryRecord, HistoryRequest, HistoryResponse, HistoryStore,
    QueryError,
};
use crate::infrastructure::metrics::{self, Outcome};

/// Path of the history endpoint.
pub const HISTORY_PATH: &str = "/history";
/// Path of the latest-reading endpoint.
pub const CURRENT_PATH: &str = "/current";

/// History store backed by the sensor API.
pub struct HttpHistoryStore {
    client: ApiClient,
    credentials: Arc<dyn CredentialProvider>,
}

impl HttpHistoryStore {
    /// Create a new history store.
    #[must_use]
    pub fn new(client: ApiClient, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            client,
            credentials,
        }
    }

    async fn token(&self) -> Result<BearerToken, QueryError> {
        self.credentials
            .bearer_token()
            .await
            .map_err(|AuthError::MissingCredential| QueryError::Unauthorized)
    }

    async fn run_query(&self, request: &HistoryRequest) -> Result<HistoryResponse, QueryError> {
        let token = self.token().await?;
        let response = self
            .client
            .get(HISTORY_PATH, &token)
            .query(&query_params(request))
            .send()
            .await
            .map_err(|e| QueryError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, response).await);
        }

        let envelope: HistoryEnvelope = response
            .json()
            .await
            .map_err(|e| QueryError::InvalidResponse(e.to_string()))?;
        if !envelope.success {
            return Err(QueryError::Unsuccessful);
        }
        Ok(envelope.into_response())
    }

    async fn run_latest(&self) -> Result<Option<HistoryRecord>, QueryError> {
        let token = self.token().await?;
        let response = self
            .client
            .get(CURRENT_PATH, &token)
            .send()
            .await
            .map_err(|e| QueryError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(status_error(status, response).await);
        }

        let envelope: CurrentEnvelope = response
            .json()
            .await
            .map_err(|e| QueryError::InvalidResponse(e.to_string()))?;
        if !envelope.success {
            return Err(QueryError::Unsuccessful);
        }
        Ok(envelope.data.map(HistoryRecord::from))
    }
}

#[async_trait]
impl HistoryStore for HttpHistoryStore {
    #[tracing::instrument(skip(self), fields(paged = request.page.is_some()))]
    async fn query(&self, request: &HistoryRequest) -> Result<HistoryResponse, QueryError> {
        let result = self.run_query(request).await;
        let kind = if request.page.is_some() { "page" } else { "series" };
        metrics::record_history_query(kind, Outcome::of(&result));
        if let Err(e) = &result {
            tracing::warn!(error = %e, "History query failed");
        }
        result
    }

    async fn latest(&self) -> Result<Option<HistoryRecord>, QueryError> {
        let result = self.run_latest().await;
        metrics::record_history_query("latest", Outcome::of(&result));
        result
    }
}

async fn status_error(status: StatusCode, response: reqwest::Response) -> QueryError {
    if categorize_status(status) == StatusCategory::Unauthorized {
        return QueryError::Unauthorized;
    }
    QueryError::Status {
        status: status.as_u16(),
        message: error_message(response).await,
    }
}

fn format_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Query string for a history request. The lower bound is omitted when
/// the window is unbounded.
fn query_params(request: &HistoryRequest) -> Vec<(&'static str, String)> {
    let mut params = Vec::with_capacity(5);
    if let Some(start) = request.window.start {
        params.push(("start", format_time(start)));
    }
    params.push(("end", format_time(request.window.end)));
    if let Some(limit) = request.limit {
        params.push(("limit", limit.to_string()));
    }
    if let Some(page) = request.page {
        params.push(("page", page.page.to_string()));
        params.push(("per_page", page.per_page.to_string()));
    }
    params
}
