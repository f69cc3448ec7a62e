//! Core server: routes WebSocket upgrades and backend reply traffic.
//!
//! Owns the session registry and the shared backend client. Each upgraded
//! connection becomes a session whose relay loop runs in the connection task;
//! the reply route looks sessions up by identifier and pushes payloads (or a
//! termination command) back into them.

use crate::backend::BackendClient;
use crate::config::ServerConfig;
use crate::session::registry::SessionRegistry;
use crate::session::Session;
use crate::transport::WsConnection;
use axum::body::Bytes;
use axum::extract::ws::{WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use wsbridge_core::{
    BridgeResult, SessionResponse, COMMAND_HEADER, TERMINATE_SESSION_COMMAND,
};

/// Shared state accessible from axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Session registry, the single source of truth for reply routing.
    registry: Arc<SessionRegistry>,
    /// Backend client shared by all sessions.
    backend: Arc<BackendClient>,
    /// Prefix of the reply route, used when deriving reply addresses.
    reply_path_prefix: String,
}

/// The wsbridge gateway instance.
pub struct BridgeServer {
    config: ServerConfig,
    registry: Arc<SessionRegistry>,
    backend: Arc<BackendClient>,
}

impl BridgeServer {
    /// Create a new gateway instance.
    pub fn new(config: ServerConfig) -> Self {
        let backend = Arc::new(BackendClient::new(config.backend_url.clone()));
        Self {
            config,
            registry: Arc::new(SessionRegistry::new()),
            backend,
        }
    }

    /// Build the axum router with all routes.
    pub fn router(&self) -> Router {
        let state = AppState {
            registry: self.registry.clone(),
            backend: self.backend.clone(),
            reply_path_prefix: self.config.reply_path_prefix.clone(),
        };

        let reply_route = format!("{}/{{id}}", self.config.reply_path_prefix);
        Router::new()
            .route(&self.config.ws_path, get(ws_handler))
            .route(&reply_route, post(reply_handler))
            .route("/health", get(health_handler))
            .with_state(state)
    }

    /// Bind the listener and serve until the future is dropped.
    pub async fn run(self) -> BridgeResult<()> {
        let listener = tokio::net::TcpListener::bind(&self.config.listen_addr).await?;
        info!(addr = %self.config.listen_addr, "gateway listening");
        info!(path = %self.config.ws_path, "websocket upgrade path");
        info!(url = %self.backend.url(), "backend action: POST");

        axum::serve(listener, self.router()).await?;
        Ok(())
    }
}

/// GET <ws_path> — upgrade to WebSocket and start a session.
async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let session_id = generate_session_id();
    let reply_address = reply_address(&headers, &state.reply_path_prefix, &session_id);
    ws.on_upgrade(move |socket| handle_socket(socket, session_id, reply_address, state))
}

/// Serve one upgraded connection: register the session, run its relay loop,
/// and remove it from the registry when the loop exits — whatever the cause.
async fn handle_socket(
    socket: WebSocket,
    session_id: String,
    reply_address: String,
    state: AppState,
) {
    let connection = WsConnection::new(socket);
    let session = Arc::new(Session::new(
        session_id.clone(),
        reply_address,
        connection,
        state.backend.clone(),
    ));

    if let Err(e) = state.registry.register(session.clone()).await {
        error!(session_id = %session_id, error = %e, "session registration failed");
        let _ = session.close().await;
        return;
    }
    info!(
        session_id = %session_id,
        reply_address = %session.reply_address(),
        "session created"
    );

    session.run().await;

    state.registry.remove(&session_id).await;
    info!(session_id = %session_id, "session ended");
}

/// POST <reply_path_prefix>/{id} — deliver a backend reply into a session.
async fn reply_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<SessionResponse>) {
    let session = match state.registry.lookup(&id).await {
        Ok(session) => session,
        Err(_) => {
            debug!(session_id = %id, "reply for unknown session");
            return (StatusCode::NOT_FOUND, Json(SessionResponse::not_found()));
        }
    };

    if !body.is_empty() {
        if let Err(e) = session.send(body).await {
            // Best-effort delivery: the backend still gets an ack.
            warn!(session_id = %id, error = %e, "reply delivery failed");
        }
    }

    let terminate = headers
        .get(COMMAND_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == TERMINATE_SESSION_COMMAND);
    if terminate {
        info!(session_id = %id, "terminating session on backend command");
        // Remove before closing so no lookup can reach a closing session.
        state.registry.remove(&id).await;
        if let Err(e) = session.close().await {
            warn!(session_id = %id, error = %e, "session close failed");
        }
    }

    (StatusCode::OK, Json(SessionResponse::ok()))
}

/// GET /health — liveness plus open-session count.
async fn health_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "sessions": state.registry.count().await,
    }))
}

/// Reply address for a session: scheme and host come from the upgrade
/// request itself, the path from static configuration.
fn reply_address(headers: &HeaderMap, reply_path_prefix: &str, session_id: &str) -> String {
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    format!("{scheme}://{host}{reply_path_prefix}/{session_id}")
}

/// Generate a random session ID (hex-encoded, 16 bytes = 32 hex chars).
fn generate_session_id() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let bytes: Vec<u8> = (0..16).map(|_| rng.gen()).collect();
    hex::encode(bytes)
}
