//! Application Services
//!
//! Services that orchestrate domain logic and coordinate between ports.
//!
//! - `HistoryQueryService`: Chart series and paginated tables
//! - `ActuatorGateway`: Optimistic actuator switching with rollback

mod actuator_gateway;
mod history_query;

pub use actuator_gateway::{ActuatorGateway, DEFAULT_ACTUATORS};
pub use history_query::{HistoryPage, HistoryQueryConfig, HistoryQueryService, HistoryTable};
