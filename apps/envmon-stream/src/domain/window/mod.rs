//! Historical Query Windows
//!
//! Named time ranges used by chart views and explicit windows used by
//! paginated tables.

use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

/// Default number of rows per table page.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Upper bound on points requested for an unpaginated chart series.
pub const DEFAULT_SERIES_LIMIT: u32 = 50_000;

// =============================================================================
// Named Ranges
// =============================================================================

/// Named lookback window relative to "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TimeRange {
    /// Last 24 hours.
    #[default]
    Last24Hours,
    /// Last 7 days.
    Last7Days,
    /// Last 30 days.
    Last30Days,
    /// No lower bound.
    All,
}

impl TimeRange {
    /// Parse a range label (`24H`, `7D`, `1M`, `ALL`), case-insensitively.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_uppercase().as_str() {
            "24H" => Some(Self::Last24Hours),
            "7D" => Some(Self::Last7Days),
            "1M" => Some(Self::Last30Days),
            "ALL" => Some(Self::All),
            _ => None,
        }
    }

    /// Short label for this range.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Last24Hours => "24H",
            Self::Last7Days => "7D",
            Self::Last30Days => "1M",
            Self::All => "ALL",
        }
    }

    /// Lookback duration, `None` for [`TimeRange::All`].
    #[must_use]
    pub fn lookback(&self) -> Option<Duration> {
        match self {
            Self::Last24Hours => Some(Duration::hours(24)),
            Self::Last7Days => Some(Duration::days(7)),
            Self::Last30Days => Some(Duration::days(30)),
            Self::All => None,
        }
    }

    /// Resolve to `(start, end)` bounds ending at `now`.
    #[must_use]
    pub fn bounds(&self, now: DateTime<Utc>) -> (Option<DateTime<Utc>>, DateTime<Utc>) {
        (self.lookback().map(|d| now - d), now)
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Query Window
// =============================================================================

/// Explicit time window for a historical query.
///
/// `start` is absent for unbounded queries; the lower bound is then omitted
/// from the request entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryWindow {
    /// Inclusive lower bound.
    pub start: Option<DateTime<Utc>>,
    /// Inclusive upper bound.
    pub end: DateTime<Utc>,
}

impl QueryWindow {
    /// Create a window.
    #[must_use]
    pub const fn new(start: Option<DateTime<Utc>>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Window for a named range ending at `now`.
    #[must_use]
    pub fn from_range(range: TimeRange, now: DateTime<Utc>) -> Self {
        let (start, end) = range.bounds(now);
        Self { start, end }
    }

    /// Whole calendar day in UTC, `00:00:00` through `23:59:59`.
    #[must_use]
    pub fn for_day(date: NaiveDate) -> Self {
        let start = date.and_time(NaiveTime::MIN).and_utc();
        let end = start + Duration::days(1) - Duration::seconds(1);
        Self {
            start: Some(start),
            end,
        }
    }
}
