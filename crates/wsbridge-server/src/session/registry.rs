//! Concurrency-safe session registry.
//!
//! Single source of truth for routing reply traffic: a session is present
//! here exactly while it is open or closing. Insertion happens once at
//! creation; removal happens once when the relay loop exits (the termination
//! path removes eagerly, which the loop-exit removal then observes as a
//! no-op).

use super::Session;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use wsbridge_core::{BridgeError, BridgeResult};

/// Identifier → session mapping shared by all connection and reply flows.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Insert a newly created session.
    ///
    /// A duplicate identifier indicates an id-generation defect and is
    /// rejected rather than overwriting the live session.
    pub async fn register(&self, session: Arc<Session>) -> BridgeResult<()> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(session.id()) {
            return Err(BridgeError::DuplicateSession(session.id().to_string()));
        }
        info!(session_id = %session.id(), "session registered");
        sessions.insert(session.id().to_string(), session);
        Ok(())
    }

    /// Look up a session by identifier. Never blocks on session-internal I/O.
    pub async fn lookup(&self, id: &str) -> BridgeResult<Arc<Session>> {
        let sessions = self.sessions.read().await;
        sessions
            .get(id)
            .cloned()
            .ok_or_else(|| BridgeError::SessionNotFound(id.to_string()))
    }

    /// Remove a session if present. Idempotent, never errors.
    pub async fn remove(&self, id: &str) -> bool {
        let mut sessions = self.sessions.write().await;
        if sessions.remove(id).is_some() {
            info!(session_id = %id, "session removed");
            true
        } else {
            debug!(session_id = %id, "session already removed");
            false
        }
    }

    /// Number of registered sessions.
    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendClient;
    use crate::transport::WsConnection;

    // Registry tests only need sessions with distinct ids; the connection is
    // never read from, so a handle is not required for these paths.
    fn dummy_session(id: &str) -> Arc<Session> {
        let backend = Arc::new(BackendClient::new("http://127.0.0.1:9".to_string()));
        Arc::new(Session::new(
            id.to_string(),
            format!("http://127.0.0.1:0/reply/{id}"),
            WsConnection::new_detached(),
            backend,
        ))
    }

    #[tokio::test]
    async fn register_then_lookup() {
        let registry = SessionRegistry::new();
        registry.register(dummy_session("a1")).await.unwrap();

        let found = registry.lookup("a1").await.unwrap();
        assert_eq!(found.id(), "a1");
        assert_eq!(registry.count().await, 1);
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected() {
        let registry = SessionRegistry::new();
        registry.register(dummy_session("a1")).await.unwrap();

        let err = registry.register(dummy_session("a1")).await.unwrap_err();
        assert!(matches!(err, BridgeError::DuplicateSession(_)));
        assert_eq!(registry.count().await, 1);
    }

    #[tokio::test]
    async fn lookup_unknown_id_fails() {
        let registry = SessionRegistry::new();
        let err = registry.lookup("missing").await.unwrap_err();
        assert!(matches!(err, BridgeError::SessionNotFound(_)));
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let registry = SessionRegistry::new();
        registry.register(dummy_session("a1")).await.unwrap();

        assert!(registry.remove("a1").await);
        assert!(!registry.remove("a1").await);
        assert!(registry.lookup("a1").await.is_err());
        assert_eq!(registry.count().await, 0);
    }
}
