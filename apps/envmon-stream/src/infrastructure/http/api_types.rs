//! API Wire Types
//!
//! Response bodies of the sensor API and their conversion into port DTOs.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::application::ports::{HistoryRecord, HistoryResponse, Pagination};
use crate::infrastructure::stream::payload::deserialize_timestamp;

/// Error body returned on failure: `{"error": "..."}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    /// Error description.
    #[serde(alias = "message")]
    pub error: String,
}

/// One stored sensor row.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryRow {
    /// Sample time.
    #[serde(alias = "timestamp", deserialize_with = "deserialize_timestamp")]
    pub recorded_at: DateTime<Utc>,
    /// Temperature in °C.
    pub temperature: f64,
    /// Relative humidity in %.
    pub humidity: f64,
    /// Gas concentration in ppm.
    pub co_level: f64,
    /// Reporting device.
    #[serde(default)]
    pub device_id: Option<String>,
}

impl From<HistoryRow> for HistoryRecord {
    fn from(row: HistoryRow) -> Self {
        Self {
            recorded_at: row.recorded_at,
            temperature: row.temperature,
            humidity: row.humidity,
            co_level: row.co_level,
            device_id: row.device_id,
        }
    }
}

/// Pagination block.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PaginationBody {
    /// Total number of pages.
    #[serde(default)]
    pub pages: u32,
    /// Total number of matching records.
    #[serde(default)]
    pub total: u64,
}

/// `GET /history` response.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryEnvelope {
    /// Whether the query succeeded.
    #[serde(default)]
    pub success: bool,
    /// Matching rows, newest first.
    #[serde(default)]
    pub data: Vec<HistoryRow>,
    /// Present for paginated queries.
    #[serde(default)]
    pub pagination: Option<PaginationBody>,
}

impl HistoryEnvelope {
    /// Convert into the port response.
    #[must_use]
    pub fn into_response(self) -> HistoryResponse {
        HistoryResponse {
            records: self.data.into_iter().map(HistoryRecord::from).collect(),
            pagination: self.pagination.map(|p| Pagination {
                pages: p.pages,
                total: p.total,
            }),
        }
    }
}

/// `GET /current` response.
#[derive(Debug, Clone, Deserialize)]
pub struct CurrentEnvelope {
    /// Whether the query succeeded.
    #[serde(default)]
    pub success: bool,
    /// Latest row.
    #[serde(default)]
    pub data: Option<HistoryRow>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_envelope_with_pagination() {
        let body = r#"{"success": true, "count": 1,
            "data": [{"id": 7, "recorded_at": "2024-05-17T09:30:00+00:00",
                      "temperature": 24.5, "humidity": 60.0, "co_level": 3.2}],
            "pagination": {"pages": 4, "total": 61, "page": 1}}"#;
        let envelope: HistoryEnvelope = serde_json::from_str(body).unwrap();
        assert!(envelope.success);

        let response = envelope.into_response();
        assert_eq!(response.records.len(), 1);
        assert!(response.records[0].device_id.is_none());
        assert_eq!(
            response.pagination,
            Some(Pagination {
                pages: 4,
                total: 61
            })
        );
    }

    #[test]
    fn timestamp_alias_accepted() {
        let body = r#"{"timestamp": "2024-05-17T09:30:00", "temperature": 1,
            "humidity": 2, "co_level": 3, "device_id": "esp32-1"}"#;
        let row: HistoryRow = serde_json::from_str(body).unwrap();
        assert_eq!(row.device_id.as_deref(), Some("esp32-1"));
    }

    #[test]
    fn error_body() {
        let err: ApiErrorResponse =
            serde_json::from_str(r#"{"error": "Limit must be between 1 and 1000"}"#).unwrap();
        assert!(err.error.starts_with("Limit"));
    }

    #[test]
    fn missing_success_is_false() {
        let envelope: HistoryEnvelope = serde_json::from_str(r#"{"data": []}"#).unwrap();
        assert!(!envelope.success);
    }
}
