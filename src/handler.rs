//! Per-connection protocol worker
//!
//! Each accepted socket gets one worker task. The worker reads the
//! login frame, registers the user, then loops decoding client frames
//! and dispatching them until EOF or a transport error. Teardown is
//! queue-driven so that a `user_left` broadcast which exposes further
//! dead connections evicts them in the same pass instead of recursing.

use std::net::SocketAddr;

use tokio::io::AsyncRead;
use tracing::{debug, info, warn};

use crate::codec;
use crate::error::ChatError;
use crate::message::{ClientMessage, Login, ServerMessage};
use crate::server::ChatServer;
use crate::time::now_ts;
use crate::types::ConnId;
use crate::user::{PeerWriter, User};

/// Drive a single client connection to completion
///
/// A transport error during the login read aborts before anything is
/// registered. After registration every exit path funnels through
/// `teardown`, which announces the departure exactly once.
pub async fn handle_connection<R>(
    mut reader: R,
    writer: PeerWriter,
    peer_addr: SocketAddr,
    server: ChatServer,
) -> Result<(), ChatError>
where
    R: AsyncRead + Unpin + Send,
{
    let conn_id = ConnId::new();
    debug!("Connection {} from {}", conn_id, peer_addr);

    // Login phase: a missing or undecodable login still gets a seat,
    // under a name derived from the peer port.
    let username = match codec::read_frame(&mut reader).await? {
        Some(frame) => match codec::decode::<Login>(&frame) {
            Ok(login) => login.username,
            Err(e) => {
                warn!("Invalid login from {}: {}", peer_addr, e);
                fallback_username(peer_addr)
            }
        },
        None => fallback_username(peer_addr),
    };

    let me = server.registry.add(conn_id, username, writer).await;
    let online = server.registry.count().await;

    let welcome = ServerMessage::System {
        message: format!("Welcome to the chat, {}!", me.username),
        online_users: online,
        timestamp: now_ts(),
    };
    server.router.send_to_conn(&me, &welcome).await;

    let joined = ServerMessage::UserJoined {
        username: me.username.clone(),
        message: format!("{} joined the chat", me.username),
        online_users: online,
        timestamp: now_ts(),
    };
    let dead = server.router.broadcast(&joined, Some(me.conn_id)).await;
    teardown_peers(&server, dead).await;
    info!("{} joined the chat ({} online)", me.username, online);

    loop {
        match codec::read_frame(&mut reader).await {
            Ok(Some(frame)) => match codec::decode::<ClientMessage>(&frame) {
                Ok(msg) => dispatch(&server, &me, msg).await,
                Err(e) => warn!("Unparseable frame from {}: {}", me.username, e),
            },
            Ok(None) => break,
            Err(e) => {
                debug!("Read error from {}: {}", me.username, e);
                break;
            }
        }
    }

    teardown(&server, me.conn_id).await;
    Ok(())
}

/// Route one decoded client message
async fn dispatch(server: &ChatServer, me: &User, msg: ClientMessage) {
    match msg {
        ClientMessage::Message { message } => {
            let text = message.trim();
            if text.is_empty() {
                return;
            }
            let chat = ServerMessage::Message {
                username: me.username.clone(),
                message: text.to_string(),
                timestamp: now_ts(),
            };
            let dead = server.router.broadcast(&chat, Some(me.conn_id)).await;
            teardown_peers(server, dead).await;
            info!("{}: {}", me.username, text);
        }
        ClientMessage::Private {
            target_username,
            message,
        } => {
            let text = message.trim();
            if target_username.is_empty() || text.is_empty() {
                return;
            }
            if target_username == me.username {
                let reply = ServerMessage::Error {
                    message: "Cannot send a private message to yourself".to_string(),
                    timestamp: now_ts(),
                };
                server.router.send_to_conn(me, &reply).await;
                return;
            }
            let private = ServerMessage::Private {
                from_username: me.username.clone(),
                message: text.to_string(),
                timestamp: now_ts(),
            };
            if server.router.send_to_user(&target_username, &private).await {
                info!("Private message from {} to {}", me.username, target_username);
            } else {
                let reply = ServerMessage::Error {
                    message: format!("User {} not found", target_username),
                    timestamp: now_ts(),
                };
                server.router.send_to_conn(me, &reply).await;
            }
        }
        ClientMessage::Users => {
            let list = ServerMessage::UsersList {
                users: server.registry.usernames().await,
                timestamp: now_ts(),
            };
            server.router.send_to_conn(me, &list).await;
        }
        ClientMessage::SessionRequest { target_username } => {
            if target_username.is_empty() {
                return;
            }
            server.negotiator.request_session(me, &target_username).await;
        }
        ClientMessage::SessionResponse {
            target_username,
            accepted,
        } => {
            if target_username.is_empty() {
                return;
            }
            server
                .negotiator
                .respond_session(me, &target_username, accepted)
                .await;
        }
    }
}

fn fallback_username(peer_addr: SocketAddr) -> String {
    format!("User_{}", peer_addr.port())
}

/// Remove one connection and announce its departure
async fn teardown(server: &ChatServer, conn_id: ConnId) {
    teardown_peers(server, vec![conn_id]).await;
}

/// Evict a batch of dead connections, folding in any new casualties
/// surfaced by the departure broadcasts themselves
async fn teardown_peers(server: &ChatServer, mut pending: Vec<ConnId>) {
    while let Some(conn_id) = pending.pop() {
        let Some(user) = server.registry.remove(conn_id).await else {
            continue;
        };
        let online = server.registry.count().await;
        let notice = ServerMessage::UserLeft {
            username: user.username.clone(),
            message: format!("{} left the chat", user.username),
            online_users: online,
            timestamp: now_ts(),
        };
        pending.extend(server.router.broadcast(&notice, None).await);
        info!("{} left the chat ({} online)", user.username, online);
    }
}
