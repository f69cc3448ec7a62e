//! wsbridge-core: Shared library for the wsbridge gateway.
//!
//! Provides the error taxonomy and the relay protocol surface shared between
//! the gateway and any backend-side tooling: the header carrying a session's
//! reply address, the out-of-band command header, and the JSON shape of
//! reply acknowledgements.

pub mod error;
pub mod protocol;

// Re-export commonly used items at crate root.
pub use error::{BridgeError, BridgeResult};
pub use protocol::{
    SessionResponse, COMMAND_HEADER, REPLY_CHANNEL_HEADER, TERMINATE_SESSION_COMMAND,
};
