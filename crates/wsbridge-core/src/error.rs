use thiserror::Error;

/// Errors produced by the wsbridge relay layer.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("session closed: {0}")]
    SessionClosed(String),

    #[error("write failed: {0}")]
    WriteFailed(String),

    #[error("forward failed: {0}")]
    ForwardFailed(String),

    #[error("duplicate session id: {0}")]
    DuplicateSession(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type BridgeResult<T> = Result<T, BridgeError>;
