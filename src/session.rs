//! Private session negotiation
//!
//! The server relays session requests and responses between users and
//! keeps no per-pair state; each client remembers its own pending
//! request and active partner. A response therefore always produces the
//! symmetric accepted/rejected notice, paired request or not.

use tracing::info;

use crate::message::ServerMessage;
use crate::router::Router;
use crate::time::now_ts;
use crate::user::User;

/// Relay for the request → accept/reject exchange
#[derive(Clone)]
pub struct SessionNegotiator {
    router: Router,
}

impl SessionNegotiator {
    pub fn new(router: Router) -> Self {
        Self { router }
    }

    /// Forward a session request from `from` to the named target
    ///
    /// A self-target or an unreachable target yields a single `error`
    /// reply to the requester and nothing else.
    pub async fn request_session(&self, from: &User, target_username: &str) {
        if from.username == target_username {
            let reply = ServerMessage::Error {
                message: "Cannot start a private session with yourself".to_string(),
                timestamp: now_ts(),
            };
            self.router.send_to_conn(from, &reply).await;
            return;
        }

        let request = ServerMessage::SessionRequest {
            from_username: from.username.clone(),
            message: format!("{} wants to start a private session with you", from.username),
            timestamp: now_ts(),
        };

        if self.router.send_to_user(target_username, &request).await {
            info!(
                "{} requested a private session with {}",
                from.username, target_username
            );
        } else {
            let reply = ServerMessage::Error {
                message: format!("User {} not found", target_username),
                timestamp: now_ts(),
            };
            self.router.send_to_conn(from, &reply).await;
        }
    }

    /// Deliver the symmetric outcome notice for a session response
    ///
    /// The notice is built once so both parties see identical fields:
    /// `from_username` is the responder, `to_username` the user the
    /// response names. An absent target is skipped silently.
    pub async fn respond_session(&self, responder: &User, target_username: &str, accepted: bool) {
        let notice = if accepted {
            ServerMessage::SessionAccepted {
                from_username: responder.username.clone(),
                to_username: target_username.to_string(),
                message: format!(
                    "Private session between {} and {} established",
                    responder.username, target_username
                ),
                timestamp: now_ts(),
            }
        } else {
            ServerMessage::SessionRejected {
                from_username: responder.username.clone(),
                to_username: target_username.to_string(),
                message: format!(
                    "Private session between {} and {} declined",
                    responder.username, target_username
                ),
                timestamp: now_ts(),
            }
        };

        let _ = self.router.send_to_user(target_username, &notice).await;
        self.router.send_to_conn(responder, &notice).await;

        if accepted {
            info!(
                "{} accepted a private session with {}",
                responder.username, target_username
            );
        } else {
            info!(
                "{} declined a private session with {}",
                responder.username, target_username
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;
    use crate::registry::Registry;
    use crate::types::ConnId;
    use crate::user::peer_writer;
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, DuplexStream};

    struct Fixture {
        registry: Arc<Registry>,
        negotiator: SessionNegotiator,
    }

    impl Fixture {
        fn new() -> Self {
            let registry = Arc::new(Registry::new());
            let router = Router::new(registry.clone());
            Self {
                registry,
                negotiator: SessionNegotiator::new(router),
            }
        }

        async fn join(&self, name: &str) -> (User, DuplexStream) {
            let (ours, theirs) = tokio::io::duplex(1024);
            let user = self
                .registry
                .add(ConnId::new(), name.to_string(), peer_writer(theirs))
                .await;
            (user, ours)
        }
    }

    async fn read_message(stream: &mut DuplexStream) -> ServerMessage {
        let mut buf = vec![0u8; 1024];
        let n = stream.read(&mut buf).await.unwrap();
        codec::decode(&buf[..n]).unwrap()
    }

    #[tokio::test]
    async fn test_request_reaches_target() {
        let fx = Fixture::new();
        let (alice, _alice_rx) = fx.join("Alice").await;
        let (_bob, mut bob_rx) = fx.join("Bob").await;

        fx.negotiator.request_session(&alice, "Bob").await;

        match read_message(&mut bob_rx).await {
            ServerMessage::SessionRequest { from_username, message, .. } => {
                assert_eq!(from_username, "Alice");
                assert_eq!(message, "Alice wants to start a private session with you");
            }
            _ => panic!("Wrong variant"),
        }
    }

    #[tokio::test]
    async fn test_self_request_yields_one_error_and_no_request() {
        let fx = Fixture::new();
        let (alice, mut alice_rx) = fx.join("Alice").await;
        let (bob, mut bob_rx) = fx.join("Bob").await;

        fx.negotiator.request_session(&alice, "Alice").await;

        match read_message(&mut alice_rx).await {
            ServerMessage::Error { message, .. } => {
                assert_eq!(message, "Cannot start a private session with yourself");
            }
            _ => panic!("Wrong variant"),
        }

        // nobody else heard about it
        fx.negotiator.router.send_to_conn(&bob, &ServerMessage::Error {
            message: "sentinel".to_string(),
            timestamp: now_ts(),
        }).await;
        match read_message(&mut bob_rx).await {
            ServerMessage::Error { message, .. } => assert_eq!(message, "sentinel"),
            _ => panic!("Wrong variant"),
        }
    }

    #[tokio::test]
    async fn test_request_to_absent_user_errors_requester() {
        let fx = Fixture::new();
        let (alice, mut alice_rx) = fx.join("Alice").await;

        fx.negotiator.request_session(&alice, "Zed").await;

        match read_message(&mut alice_rx).await {
            ServerMessage::Error { message, .. } => assert_eq!(message, "User Zed not found"),
            _ => panic!("Wrong variant"),
        }
    }

    #[tokio::test]
    async fn test_accept_notifies_both_with_identical_fields() {
        let fx = Fixture::new();
        let (_alice, mut alice_rx) = fx.join("Alice").await;
        let (bob, mut bob_rx) = fx.join("Bob").await;

        // no request was ever issued; the notice goes out regardless
        fx.negotiator.respond_session(&bob, "Alice", true).await;

        let to_alice = read_message(&mut alice_rx).await;
        let to_bob = read_message(&mut bob_rx).await;
        for notice in [&to_alice, &to_bob] {
            match notice {
                ServerMessage::SessionAccepted {
                    from_username,
                    to_username,
                    message,
                    ..
                } => {
                    assert_eq!(from_username, "Bob");
                    assert_eq!(to_username, "Alice");
                    assert_eq!(message, "Private session between Bob and Alice established");
                }
                _ => panic!("Wrong variant"),
            }
        }
    }

    #[tokio::test]
    async fn test_decline_notifies_both() {
        let fx = Fixture::new();
        let (_alice, mut alice_rx) = fx.join("Alice").await;
        let (bob, mut bob_rx) = fx.join("Bob").await;

        fx.negotiator.respond_session(&bob, "Alice", false).await;

        for rx in [&mut alice_rx, &mut bob_rx] {
            match read_message(rx).await {
                ServerMessage::SessionRejected { from_username, to_username, message, .. } => {
                    assert_eq!(from_username, "Bob");
                    assert_eq!(to_username, "Alice");
                    assert_eq!(message, "Private session between Bob and Alice declined");
                }
                _ => panic!("Wrong variant"),
            }
        }
    }

    #[tokio::test]
    async fn test_response_to_absent_target_notifies_responder_only() {
        let fx = Fixture::new();
        let (bob, mut bob_rx) = fx.join("Bob").await;

        fx.negotiator.respond_session(&bob, "Ghost", true).await;

        match read_message(&mut bob_rx).await {
            ServerMessage::SessionAccepted { from_username, to_username, .. } => {
                assert_eq!(from_username, "Bob");
                assert_eq!(to_username, "Ghost");
            }
            _ => panic!("Wrong variant"),
        }

        // no error frame follows the notice
        fx.negotiator.router.send_to_conn(&bob, &ServerMessage::Error {
            message: "sentinel".to_string(),
            timestamp: now_ts(),
        }).await;
        match read_message(&mut bob_rx).await {
            ServerMessage::Error { message, .. } => assert_eq!(message, "sentinel"),
            _ => panic!("Wrong variant"),
        }
    }
}
