#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::items_after_statements
    )
)]

//! Environmental Monitor Stream Client
//!
//! Consumes the server-sent sensor stream of an environmental monitoring
//! backend, classifies each reading, and keeps a bounded live history.
//! Historical queries and actuator commands run as independent
//! request/response paths beside the stream.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: readings, classification, history buffer, query windows
//!   - `reading`: `Reading`, `ReadingStatus`, anomaly forecasts and alerts
//!   - `history`: bounded ring buffer of recent readings
//!   - `window`: named time ranges and explicit query windows
//!
//! - **Application**: use cases and port definitions
//!   - `ports`: credentials, event source, history store, actuator
//!   - `services`: historical queries, actuator gateway
//!
//! - **Infrastructure**: adapters and external integrations
//!   - `stream`: SSE framing, payload decoding, sessions, live state
//!   - `http`: reqwest adapters for the sensor API
//!   - `config`: environment configuration
//!   - `health`: health, readiness, metrics, and live snapshot endpoint
//!
//! # Data Flow
//!
//! ```text
//! GET /stream ──► Utf8Decoder ──► SseFrameParser ──► FrameDecoder
//!                                                        │
//!                                  classify + HistoryBuffer
//!                                                        │
//!                                                        ▼
//!                                   LiveState ──► /live, /health
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Core sensor types with no I/O.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::history::{HISTORY_CAPACITY, HistoryBuffer};
pub use domain::reading::{
    AnomalyAlert, AnomalyForecast, Measurements, Reading, ReadingStatus, classify,
};
pub use domain::window::{QueryWindow, TimeRange};

// Application services
pub use application::services::{
    ActuatorGateway, HistoryPage, HistoryQueryConfig, HistoryQueryService, HistoryTable,
};

// Infrastructure config
pub use infrastructure::config::{ConfigError, Credentials, MonitorConfig};

// Stream
pub use infrastructure::stream::{
    LiveSnapshot, LiveState, ReconnectConfig, ReconnectPolicy, SessionConfig, SessionOutcome,
    SessionState, StreamSession, Supervisor,
};

// HTTP adapters
pub use infrastructure::http::{
    ApiClient, HttpActuatorPort, HttpEventSource, HttpHistoryStore, StaticTokenProvider,
};

// Health server
pub use infrastructure::health::{HealthServer, HealthServerError, HealthServerState};

// Metrics
pub use infrastructure::metrics::init_metrics;

// Telemetry
pub use infrastructure::telemetry::{TelemetryConfig, TelemetryGuard, init as init_telemetry};
