//! History Store Port (Driven Port)
//!
//! Interface to the queryable historical store. The store returns raw
//! records newest-first and does not compute status.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::window::QueryWindow;

/// One page selector (1-indexed).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Page number, starting at 1.
    pub page: u32,
    /// Rows per page.
    pub per_page: u32,
}

/// Request against the historical store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRequest {
    /// Time window; an absent `start` is omitted from the request.
    pub window: QueryWindow,
    /// Cap on returned points for unpaginated queries.
    pub limit: Option<u32>,
    /// Page selector for paginated queries.
    pub page: Option<PageRequest>,
}

impl HistoryRequest {
    /// Unpaginated series request capped at `limit` points.
    #[must_use]
    pub const fn series(window: QueryWindow, limit: u32) -> Self {
        Self {
            window,
            limit: Some(limit),
            page: None,
        }
    }

    /// Single-page request.
    #[must_use]
    pub const fn page(window: QueryWindow, page: u32, per_page: u32) -> Self {
        Self {
            window,
            limit: None,
            page: Some(PageRequest { page, per_page }),
        }
    }
}

/// Raw record as stored (status not included).
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRecord {
    /// When the sample was recorded.
    pub recorded_at: DateTime<Utc>,
    /// Temperature in °C.
    pub temperature: f64,
    /// Relative humidity in %.
    pub humidity: f64,
    /// Gas concentration in ppm.
    pub co_level: f64,
    /// Reporting device, when the store tracks it.
    pub device_id: Option<String>,
}

/// Pagination metadata reported by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Total number of pages.
    pub pages: u32,
    /// Total number of matching records.
    pub total: u64,
}

/// Successful store response.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HistoryResponse {
    /// Records, newest first.
    pub records: Vec<HistoryRecord>,
    /// Present for paginated requests.
    pub pagination: Option<Pagination>,
}

/// Historical query errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// The request could not be sent or the response not read.
    #[error("history request failed: {0}")]
    RequestFailed(String),

    /// The credential was missing or rejected.
    #[error("history request unauthorized")]
    Unauthorized,

    /// The store answered with a non-success HTTP status.
    #[error("history request returned status {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body or reason phrase.
        message: String,
    },

    /// The store answered `success: false`.
    #[error("history store reported an unsuccessful query")]
    Unsuccessful,

    /// The response body could not be decoded.
    #[error("invalid history response: {0}")]
    InvalidResponse(String),

    /// Pages are 1-indexed.
    #[error("invalid page {0}: pages start at 1")]
    InvalidPage(u32),
}

/// Port for querying historical readings.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Run a history query.
    async fn query(&self, request: &HistoryRequest) -> Result<HistoryResponse, QueryError>;

    /// Most recent stored record, if any.
    async fn latest(&self) -> Result<Option<HistoryRecord>, QueryError>;
}
