//! Relay protocol surface shared with the backend.
//!
//! The gateway attaches [`REPLY_CHANNEL_HEADER`] to every forwarded request
//! so the backend knows where to POST asynchronous replies. A reply POST may
//! carry [`COMMAND_HEADER`] set to [`TERMINATE_SESSION_COMMAND`] to close the
//! target session after (or instead of) delivering the payload.

use serde::{Deserialize, Serialize};

/// Header on forwarded requests carrying the session's reply URL.
pub const REPLY_CHANNEL_HEADER: &str = "x-wsbridge-reply-channel";

/// Header on reply requests carrying an out-of-band gateway command.
pub const COMMAND_HEADER: &str = "x-wsbridge-command";

/// [`COMMAND_HEADER`] value instructing the gateway to close the session.
pub const TERMINATE_SESSION_COMMAND: &str = "terminate-session";

/// JSON body of reply-endpoint acknowledgements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SessionResponse {
    /// Successful acknowledgement, no diagnostic message.
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    /// Reply targeted an unknown or already-removed session.
    pub fn not_found() -> Self {
        Self {
            success: false,
            message: Some("NOT_FOUND".to_string()),
        }
    }
}
