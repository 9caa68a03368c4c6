//! Application Layer - Use cases and port definitions.
//!
//! This layer contains the application services and port interfaces
//! that define how the domain interacts with external systems.

/// Port interfaces for external systems (event stream, store, control).
pub mod ports;

/// Application services for historical queries and actuator control.
pub mod services;
