//! Connection handle over an upgraded WebSocket.
//!
//! Wraps the raw socket in a handle that serializes writes, treats text and
//! binary frames uniformly as opaque bytes, and supports an idempotent close
//! that unblocks a pending read. Closing the handle is the single mechanism
//! that cancels a session's relay loop.

use axum::body::Bytes;
use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, Notify};
use wsbridge_core::{BridgeError, BridgeResult};

/// A handle to one upgraded WebSocket connection.
///
/// The read half is only ever driven by the session's relay loop; the write
/// half is shared with concurrent reply handlers and guarded by a mutex so
/// frame boundaries stay intact. `close` takes the write half, so at most one
/// physical close occurs no matter how many callers race it.
pub struct WsConnection {
    reader: Mutex<Option<SplitStream<WebSocket>>>,
    writer: Mutex<Option<SplitSink<WebSocket, Message>>>,
    closed: AtomicBool,
    close_signal: Notify,
}

impl WsConnection {
    pub fn new(socket: WebSocket) -> Self {
        let (writer, reader) = socket.split();
        Self {
            reader: Mutex::new(Some(reader)),
            writer: Mutex::new(Some(writer)),
            closed: AtomicBool::new(false),
            close_signal: Notify::new(),
        }
    }

    /// Handle with no underlying socket, for session/registry tests.
    #[cfg(test)]
    pub(crate) fn new_detached() -> Self {
        Self {
            reader: Mutex::new(None),
            writer: Mutex::new(None),
            closed: AtomicBool::new(false),
            close_signal: Notify::new(),
        }
    }

    /// Read the next data frame.
    ///
    /// Returns `Ok(None)` when the client closed the connection, the stream
    /// ended, or the handle was closed locally. Ping/pong frames are skipped.
    pub async fn read_frame(&self) -> BridgeResult<Option<Bytes>> {
        let mut reader = self.reader.lock().await;
        let Some(stream) = reader.as_mut() else {
            return Ok(None);
        };
        loop {
            if self.closed.load(Ordering::Acquire) {
                return Ok(None);
            }
            let next = tokio::select! {
                _ = self.close_signal.notified() => return Ok(None),
                next = stream.next() => next,
            };
            match next {
                Some(Ok(Message::Binary(data))) => return Ok(Some(data)),
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(Bytes::copy_from_slice(text.as_bytes())))
                }
                Some(Ok(Message::Close(_))) => return Ok(None),
                Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => continue,
                Some(Err(e)) => {
                    return Err(BridgeError::Transport(format!("WS recv failed: {e}")))
                }
                None => return Ok(None),
            }
        }
    }

    /// Write one binary frame.
    pub async fn write_frame(&self, payload: Bytes) -> BridgeResult<()> {
        let mut writer = self.writer.lock().await;
        match writer.as_mut() {
            Some(sink) => sink
                .send(Message::Binary(payload))
                .await
                .map_err(|e| BridgeError::WriteFailed(format!("WS send failed: {e}"))),
            None => Err(BridgeError::WriteFailed("connection closed".to_string())),
        }
    }

    /// Close the connection. Idempotent; unblocks any pending `read_frame`.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        // Single reader, so a stored-permit notify cannot be lost.
        self.close_signal.notify_one();
        let mut writer = self.writer.lock().await;
        if let Some(mut sink) = writer.take() {
            let _ = sink.close().await;
        }
    }
}
