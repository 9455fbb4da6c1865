//! Registered user and its connection write half
//!
//! A `User` pairs a login identity with shared ownership of the
//! connection's write half. Clones refer to the same underlying writer,
//! so the worker, the router, and the registry all write through one
//! mutex and frames from concurrent senders never interleave.

use std::sync::Arc;

use chrono::{DateTime, Local};
use tokio::io::AsyncWrite;
use tokio::sync::Mutex;

use crate::codec;
use crate::error::ChatError;
use crate::message::ServerMessage;
use crate::types::ConnId;

/// Shared, serialized write half of one connection
pub type PeerWriter = Arc<Mutex<Box<dyn AsyncWrite + Send + Unpin>>>;

/// Wrap a connection's write half for shared use
pub fn peer_writer<W>(writer: W) -> PeerWriter
where
    W: AsyncWrite + Send + Unpin + 'static,
{
    Arc::new(Mutex::new(Box::new(writer)))
}

/// A logged-in user bound to one live connection
#[derive(Clone)]
pub struct User {
    /// Registry key of the underlying connection
    pub conn_id: ConnId,
    /// Login name; not unique across connections
    pub username: String,
    /// Write half shared with the connection's worker
    pub writer: PeerWriter,
    /// Registration time
    pub joined_at: DateTime<Local>,
}

impl User {
    /// Create a user for a freshly registered connection
    pub fn new(conn_id: ConnId, username: String, writer: PeerWriter) -> Self {
        Self {
            conn_id,
            username,
            writer,
            joined_at: Local::now(),
        }
    }

    /// Encode and write one message frame to this user's connection
    pub async fn send(&self, msg: &ServerMessage) -> Result<(), ChatError> {
        let bytes = codec::encode(msg)?;
        self.send_bytes(&bytes).await?;
        Ok(())
    }

    /// Write pre-encoded frame bytes to this user's connection
    ///
    /// The writer lock is held across the whole frame.
    pub async fn send_bytes(&self, bytes: &[u8]) -> std::io::Result<()> {
        let mut writer = self.writer.lock().await;
        codec::write_frame(&mut *writer, bytes).await
    }
}
