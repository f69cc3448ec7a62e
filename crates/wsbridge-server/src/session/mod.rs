//! Session lifecycle and relay logic.
//!
//! A session owns the connection handle for one WebSocket client and mediates
//! both relay directions: client frames are forwarded to the backend with the
//! session's reply address attached, and backend replies are written back as
//! frames. Lifecycle: `Open` → `Closing` → `Closed`, never out of `Closed`.

pub mod registry;

use crate::backend::BackendClient;
use crate::transport::WsConnection;
use axum::body::Bytes;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use wsbridge_core::{BridgeError, BridgeResult};

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Open,
    Closing,
    Closed,
}

/// One live WebSocket connection and its relay state.
pub struct Session {
    /// Unique session identifier, immutable for the session's lifetime.
    id: String,
    /// URL the backend POSTs to for asynchronous replies.
    reply_address: String,
    /// The owned connection handle.
    connection: WsConnection,
    /// Shared backend client; outlives any one session.
    backend: Arc<BackendClient>,
    /// Lifecycle state.
    state: Mutex<SessionState>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("reply_address", &self.reply_address)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(
        id: String,
        reply_address: String,
        connection: WsConnection,
        backend: Arc<BackendClient>,
    ) -> Self {
        Self {
            id,
            reply_address,
            connection,
            backend,
            state: Mutex::new(SessionState::Open),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn reply_address(&self) -> &str {
        &self.reply_address
    }

    pub async fn state(&self) -> SessionState {
        *self.state.lock().await
    }

    /// Run the inbound relay loop for the life of the connection.
    ///
    /// Each frame is forwarded to the backend synchronously, so a slow
    /// backend throttles this session's reads without affecting others.
    /// Forward failures are logged and non-fatal: the connection stays usable
    /// for subsequent frames. Returns once the client disconnects, the read
    /// errors, or the session is closed; the caller is expected to remove the
    /// session from the registry afterwards.
    pub async fn run(&self) {
        loop {
            match self.connection.read_frame().await {
                Ok(Some(payload)) => {
                    debug!(session_id = %self.id, bytes = payload.len(), "frame received");
                    if let Err(e) = self.backend.forward(payload, &self.reply_address).await {
                        warn!(session_id = %self.id, error = %e, "backend forward failed");
                    }
                }
                Ok(None) => {
                    debug!(session_id = %self.id, "connection closed");
                    break;
                }
                Err(e) => {
                    warn!(session_id = %self.id, error = %e, "connection read failed");
                    break;
                }
            }
        }
        let _ = self.close().await;
    }

    /// Deliver a backend-originated payload to the client.
    ///
    /// Fails if the session is no longer open or the write itself fails; the
    /// failure is the caller's to report and never tears the session down.
    pub async fn send(&self, payload: Bytes) -> BridgeResult<()> {
        {
            let state = self.state.lock().await;
            if *state != SessionState::Open {
                return Err(BridgeError::SessionClosed(self.id.clone()));
            }
        }
        self.connection.write_frame(payload).await
    }

    /// Close the session. Idempotent and safe to call concurrently with the
    /// relay loop's own closure path; at most one physical close occurs.
    pub async fn close(&self) -> BridgeResult<()> {
        {
            let mut state = self.state.lock().await;
            if *state == SessionState::Closed {
                return Ok(());
            }
            *state = SessionState::Closing;
        }
        self.connection.close().await;
        let mut state = self.state.lock().await;
        if *state != SessionState::Closed {
            *state = SessionState::Closed;
            info!(session_id = %self.id, "session closed");
        }
        Ok(())
    }
}
