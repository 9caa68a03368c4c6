//! Configuration Module
//!
//! Configuration loading for the stream client.

mod settings;

pub use settings::{
    ApiSettings, ConfigError, Credentials, MonitorConfig, QuerySettings, ServerSettings,
    StreamSettings,
};
