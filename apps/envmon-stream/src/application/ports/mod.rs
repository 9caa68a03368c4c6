//! Port Interfaces
//!
//! Defines the interfaces (ports) for external systems following
//! the Hexagonal Architecture pattern. These are the contracts that
//! infrastructure adapters must implement.
//!
//! ## Driven Ports (Outbound)
//!
//! - `CredentialProvider`: bearer tokens from the identity provider
//! - `EventSource`: the remote telemetry event stream
//! - `HistoryStore`: the queryable historical store
//! - `ActuatorPort`: the device control endpoint

mod actuator_port;
mod credentials_port;
mod event_source_port;
mod history_store_port;

pub use actuator_port::{ActuatorPort, CommandError, ControlCommand, SwitchAction};
pub use credentials_port::{AuthError, BearerToken, CredentialProvider};
pub use event_source_port::{ByteStream, EventSource, OpenError, TransportError};
pub use history_store_port::{
    HistoryRecord, HistoryRequest, HistoryResponse, HistoryStore, PageRequest, Pagination,
    QueryError,
};

#[cfg(test)]
pub use actuator_port::MockActuatorPort;
#[cfg(test)]
pub use credentials_port::MockCredentialProvider;
#[cfg(test)]
pub use history_store_port::MockHistoryStore;
