//! Message routing and broadcast delivery
//!
//! Delivery encodes a message once, snapshots the registry, then writes
//! outside the lock. A write failure never aborts a delivery pass; dead
//! connections are reported back to the caller for teardown.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::codec;
use crate::message::ServerMessage;
use crate::registry::Registry;
use crate::types::ConnId;
use crate::user::User;

/// Delivery front end over the registry
#[derive(Clone)]
pub struct Router {
    registry: Arc<Registry>,
}

impl Router {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Send a message to every registered user except `excluding`
    ///
    /// Returns the connections whose writes failed so the caller can
    /// tear them down through the normal disconnect path.
    pub async fn broadcast(&self, msg: &ServerMessage, excluding: Option<ConnId>) -> Vec<ConnId> {
        let bytes = match codec::encode(msg) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to encode broadcast: {}", e);
                return Vec::new();
            }
        };

        let peers = self.registry.peers(excluding).await;
        let mut dead = Vec::new();
        for peer in &peers {
            if let Err(e) = peer.send_bytes(&bytes).await {
                debug!("Write to '{}' failed during broadcast: {}", peer.username, e);
                dead.push(peer.conn_id);
            }
        }
        dead
    }

    /// Deliver a message to the first reachable user with this name
    ///
    /// Matches are tried in join order; a failed write moves on to the
    /// next same-named user. Returns false when nobody took the message.
    pub async fn send_to_user(&self, username: &str, msg: &ServerMessage) -> bool {
        let bytes = match codec::encode(msg) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to encode message for '{}': {}", username, e);
                return false;
            }
        };

        for user in self.registry.find_all_by_username(username).await {
            if user.send_bytes(&bytes).await.is_ok() {
                return true;
            }
        }
        false
    }

    /// Best-effort direct write to one connection
    ///
    /// Failures are swallowed here; the connection's own worker notices
    /// a broken peer through its read loop.
    pub async fn send_to_conn(&self, user: &User, msg: &ServerMessage) {
        let _ = user.send(msg).await;
    }
}
