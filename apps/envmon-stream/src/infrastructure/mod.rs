//! Infrastructure Layer - Adapters and external integrations.
//!
//! This layer contains the concrete implementations of the port interfaces
//! defined in the application layer.

/// Configuration loading.
pub mod config;

/// Health check HTTP endpoint.
pub mod health;

/// reqwest adapters for the sensor API.
pub mod http;

/// Prometheus metrics instrumentation.
pub mod metrics;

/// Stream session, SSE framing, and live state.
pub mod stream;

/// Logging and OpenTelemetry tracing.
pub mod telemetry;
