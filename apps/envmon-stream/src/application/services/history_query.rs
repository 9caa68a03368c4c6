//! Historical Query Service
//!
//! Translates time windows into store requests and reshapes the results
//! into chart series (oldest first) or paginated tables.
//!
//! The store does not compute status, so every record is classified here
//! with the same thresholds the live stream uses.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::application::ports::{HistoryRecord, HistoryRequest, HistoryStore, QueryError};
use crate::domain::reading::{Measurements, Reading};
use crate::domain::window::{DEFAULT_PAGE_SIZE, DEFAULT_SERIES_LIMIT, QueryWindow, TimeRange};

/// One page of tabular history.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryPage {
    /// Rows on this page, in store order (newest first).
    pub rows: Vec<Reading>,
    /// Total number of pages (at least 1).
    pub total_pages: u32,
    /// Total number of matching records.
    pub total_records: u64,
}

/// Query settings.
#[derive(Debug, Clone, Copy)]
pub struct HistoryQueryConfig {
    /// Point cap for chart series.
    pub series_limit: u32,
    /// Default rows per table page.
    pub page_size: u32,
}

impl Default for HistoryQueryConfig {
    fn default() -> Self {
        Self {
            series_limit: DEFAULT_SERIES_LIMIT,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Stateless query facade over a [`HistoryStore`].
///
/// Safe to share and to call concurrently with an active stream session.
#[derive(Clone)]
pub struct HistoryQueryService {
    store: Arc<dyn HistoryStore>,
    config: HistoryQueryConfig,
}

impl HistoryQueryService {
    /// Create a new service.
    #[must_use]
    pub fn new(store: Arc<dyn HistoryStore>, config: HistoryQueryConfig) -> Self {
        Self { store, config }
    }

    /// Configured rows per page.
    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.config.page_size
    }

    /// Fetch an unpaginated series, sorted oldest to newest.
    ///
    /// # Errors
    ///
    /// Returns the store's [`QueryError`] unchanged.
    pub async fn fetch_series(
        &self,
        start: Option<DateTime<Utc>>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Reading>, QueryError> {
        let request = HistoryRequest::series(QueryWindow::new(start, end), self.config.series_limit);
        let response = self.store.query(&request).await?;

        let mut series: Vec<Reading> = response.records.into_iter().map(to_reading).collect();
        series.sort_by_key(Reading::timestamp);

        tracing::debug!(
            points = series.len(),
            bounded = start.is_some(),
            "Fetched history series"
        );
        Ok(series)
    }

    /// Fetch a series for a named range ending at `now`.
    ///
    /// # Errors
    ///
    /// Returns the store's [`QueryError`] unchanged.
    pub async fn fetch_range(
        &self,
        range: TimeRange,
        now: DateTime<Utc>,
    ) -> Result<Vec<Reading>, QueryError> {
        let (start, end) = range.bounds(now);
        self.fetch_series(start, end).await
    }

    /// Fetch one page of tabular history.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidPage`] for page 0, otherwise the store's
    /// error unchanged.
    pub async fn fetch_page(
        &self,
        window: QueryWindow,
        page: u32,
        page_size: u32,
    ) -> Result<HistoryPage, QueryError> {
        if page == 0 {
            return Err(QueryError::InvalidPage(page));
        }

        let request = HistoryRequest::page(window, page, page_size.max(1));
        let response = self.store.query(&request).await?;

        let (total_pages, total_records) = response
            .pagination
            .map_or((1, 0), |p| (p.pages.max(1), p.total));

        Ok(HistoryPage {
            rows: response.records.into_iter().map(to_reading).collect(),
            total_pages,
            total_records,
        })
    }

    /// Most recent stored reading.
    ///
    /// # Errors
    ///
    /// Returns the store's [`QueryError`] unchanged.
    pub async fn fetch_latest(&self) -> Result<Option<Reading>, QueryError> {
        Ok(self.store.latest().await?.map(to_reading))
    }
}

fn to_reading(record: HistoryRecord) -> Reading {
    Reading::new(
        record.recorded_at,
        Measurements::new(record.temperature, record.humidity, record.co_level),
        record.device_id.unwrap_or_default(),
    )
}

// =============================================================================
// Table Cursor
// =============================================================================

/// Pagination cursor for a tabular history view.
///
/// Selecting a new window always loads page 1. State is only committed after
/// a successful fetch, so a failed query leaves window and page unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryTable {
    window: QueryWindow,
    page: u32,
    page_size: u32,
}

impl HistoryTable {
    /// Create a cursor positioned on page 1 of `window`.
    #[must_use]
    pub fn new(window: QueryWindow, page_size: u32) -> Self {
        Self {
            window,
            page: 1,
            page_size: page_size.max(1),
        }
    }

    /// Current window.
    #[must_use]
    pub const fn window(&self) -> QueryWindow {
        self.window
    }

    /// Current page (1-indexed).
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Switch to a new window and load its first page.
    ///
    /// # Errors
    ///
    /// Returns the query error; the cursor is left unchanged.
    pub async fn select_window(
        &mut self,
        service: &HistoryQueryService,
        window: QueryWindow,
    ) -> Result<HistoryPage, QueryError> {
        let page = service.fetch_page(window, 1, self.page_size).await?;
        self.window = window;
        self.page = 1;
        Ok(page)
    }

    /// Load another page of the current window.
    ///
    /// # Errors
    ///
    /// Returns the query error; the cursor is left unchanged.
    pub async fn select_page(
        &mut self,
        service: &HistoryQueryService,
        page: u32,
    ) -> Result<HistoryPage, QueryError> {
        let result = service.fetch_page(self.window, page, self.page_size).await?;
        self.page = page;
        Ok(result)
    }

    /// Reload the current page.
    ///
    /// # Errors
    ///
    /// Returns the query error.
    pub async fn refresh(&self, service: &HistoryQueryService) -> Result<HistoryPage, QueryError> {
        service
            .fetch_page(self.window, self.page, self.page_size)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{HistoryResponse, MockHistoryStore, PageRequest, Pagination};
    use crate::domain::reading::ReadingStatus;
    use chrono::{NaiveDate, TimeZone};

    fn record(hour: u32, temperature: f64, co_level: f64) -> HistoryRecord {
        HistoryRecord {
            recorded_at: Utc.with_ymd_and_hms(2024, 5, 17, hour, 0, 0).unwrap(),
            temperature,
            humidity: 50.0,
            co_level,
            device_id: None,
        }
    }

    fn service(store: MockHistoryStore) -> HistoryQueryService {
        HistoryQueryService::new(Arc::new(store), HistoryQueryConfig::default())
    }

    #[tokio::test]
    async fn series_is_sorted_ascending() {
        let mut store = MockHistoryStore::new();
        store.expect_query().returning(|_| {
            Ok(HistoryResponse {
                records: vec![record(3, 20.0, 1.0), record(2, 36.0, 1.0), record(1, 20.0, 60.0)],
                pagination: None,
            })
        });

        let series = service(store).fetch_series(None, Utc::now()).await.unwrap();

        let hours: Vec<_> = series.iter().map(|r| r.timestamp()).collect();
        let mut sorted = hours.clone();
        sorted.sort();
        assert_eq!(hours, sorted);
        assert_eq!(series[0].status(), ReadingStatus::Danger);
        assert_eq!(series[1].status(), ReadingStatus::Warn);
        assert_eq!(series[2].status(), ReadingStatus::Ok);
    }

    #[tokio::test]
    async fn series_requests_limit_without_page() {
        let mut store = MockHistoryStore::new();
        store
            .expect_query()
            .withf(|req| {
                req.limit == Some(DEFAULT_SERIES_LIMIT)
                    && req.page.is_none()
                    && req.window.start.is_none()
            })
            .times(1)
            .returning(|_| Ok(HistoryResponse::default()));

        let now = Utc::now();
        let series = service(store).fetch_range(TimeRange::All, now).await.unwrap();
        assert!(series.is_empty());
    }

    #[tokio::test]
    async fn page_defaults_when_pagination_missing() {
        let mut store = MockHistoryStore::new();
        store.expect_query().returning(|_| {
            Ok(HistoryResponse {
                records: vec![record(5, 20.0, 1.0)],
                pagination: None,
            })
        });

        let window = QueryWindow::for_day(NaiveDate::from_ymd_opt(2024, 5, 17).unwrap());
        let page = service(store).fetch_page(window, 1, 20).await.unwrap();
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.total_records, 0);
    }

    #[tokio::test]
    async fn page_zero_is_rejected_without_request() {
        let store = MockHistoryStore::new();
        let window = QueryWindow::new(None, Utc::now());
        let err = service(store).fetch_page(window, 0, 20).await.unwrap_err();
        assert_eq!(err, QueryError::InvalidPage(0));
    }

    #[tokio::test]
    async fn new_window_resets_page_to_one() {
        let day1 = QueryWindow::for_day(NaiveDate::from_ymd_opt(2024, 5, 17).unwrap());
        let day2 = QueryWindow::for_day(NaiveDate::from_ymd_opt(2024, 5, 18).unwrap());

        let mut store = MockHistoryStore::new();
        store
            .expect_query()
            .withf(move |req| req.window == day1 && req.page.is_some_and(|p| p.page == 3))
            .times(1)
            .returning(|_| Ok(HistoryResponse::default()));
        store
            .expect_query()
            .withf(move |req| {
                req.window == day2
                    && req.page == Some(PageRequest {
                        page: 1,
                        per_page: 20,
                    })
            })
            .times(1)
            .returning(|_| {
                Ok(HistoryResponse {
                    records: vec![],
                    pagination: Some(Pagination {
                        pages: 5,
                        total: 100,
                    }),
                })
            });
        let service = service(store);

        let mut table = HistoryTable::new(day1, 20);
        table.select_page(&service, 3).await.unwrap();
        assert_eq!(table.page(), 3);

        let page = table.select_window(&service, day2).await.unwrap();
        assert_eq!(table.page(), 1);
        assert_eq!(table.window(), day2);
        assert_eq!(page.total_pages, 5);
        assert_eq!(page.total_records, 100);
    }

    #[tokio::test]
    async fn failed_window_change_leaves_cursor_unchanged() {
        let mut store = MockHistoryStore::new();
        store
            .expect_query()
            .withf(|req| req.page.is_some_and(|p| p.page == 2))
            .returning(|_| Ok(HistoryResponse::default()));
        store
            .expect_query()
            .returning(|_| Err(QueryError::Unsuccessful));
        let service = service(store);

        let day1 = QueryWindow::for_day(NaiveDate::from_ymd_opt(2024, 5, 17).unwrap());
        let day2 = QueryWindow::for_day(NaiveDate::from_ymd_opt(2024, 5, 18).unwrap());

        let mut table = HistoryTable::new(day1, 20);
        table.select_page(&service, 2).await.unwrap();

        let err = table.select_window(&service, day2).await.unwrap_err();
        assert_eq!(err, QueryError::Unsuccessful);
        assert_eq!(table.window(), day1);
        assert_eq!(table.page(), 2);
    }

    #[tokio::test]
    async fn latest_is_classified() {
        let mut store = MockHistoryStore::new();
        store
            .expect_latest()
            .returning(|| Ok(Some(record(9, 40.0, 10.0))));

        let latest = service(store).fetch_latest().await.unwrap().unwrap();
        assert_eq!(latest.status(), ReadingStatus::Warn);
        assert_eq!(latest.device_id(), "unknown");
    }
}
