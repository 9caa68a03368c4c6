//! Domain Layer - Core monitoring types and business rules.
//!
//! This layer contains the sensor reading model, the classification rules,
//! the live history buffer, and historical query windows. Nothing here
//! performs I/O.

/// Readings, classification thresholds, and anomaly forecasts.
pub mod reading;

/// Bounded live history buffer.
pub mod history;

/// Named and explicit time windows for historical queries.
pub mod window;
