//! Sensor API Adapters
//!
//! reqwest-based implementations of the driven ports.

pub mod actuator;
pub mod api_types;
pub mod auth;
pub mod client;
pub mod event_source;
pub mod history_store;

pub use actuator::HttpActuatorPort;
pub use auth::StaticTokenProvider;
pub use client::{ApiClient, HttpClientError};
pub use event_source::HttpEventSource;
pub use history_store::HttpHistoryStore;
