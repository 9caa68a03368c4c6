//! Telemetry Stream
//!
//! Consumer for the server-sent sensor stream.
//!
//! - `sse`: byte and line framing of the event-stream body
//! - `payload`: frame JSON to classified readings
//! - `session`: one connection lifetime as an explicit state machine
//! - `live`: observable state sessions publish into
//! - `reconnect`: backoff between sessions
//! - `supervisor`: replaces finished sessions until cancelled

pub mod live;
pub mod payload;
pub mod reconnect;
pub mod session;
pub mod sse;
pub mod supervisor;

pub use live::{LiveSnapshot, LiveState};
pub use payload::{DecodedFrame, FrameDecoder, ProtocolError, SensorFrame};
pub use reconnect::{ReconnectConfig, ReconnectDecision, ReconnectPolicy};
pub use session::{
    DEFAULT_STALL_TIMEOUT, SessionConfig, SessionOutcome, SessionState, StreamSession,
};
pub use sse::{SseFrameParser, Utf8Decoder, parse_frames};
pub use supervisor::Supervisor;
