//! Multi-user TCP Chat Library
//!
//! A chat server and terminal client built on tokio, speaking a small
//! JSON protocol over raw TCP where one read carries one message.
//!
//! # Features
//! - Login with a fallback identity for broken clients
//! - Shared-room broadcast chat
//! - One-off private messages by username
//! - Private session negotiation (request, accept or decline)
//! - Online user listing in join order
//! - Join and leave announcements with live user counts
//!
//! # Architecture
//! Shared state behind a single async mutex:
//! - `Registry` holds the join-ordered user list; locks are never held
//!   across network writes
//! - `Router` snapshots the registry, writes outside the lock, and
//!   reports dead connections back to the caller for eviction
//! - `SessionNegotiator` relays session requests and responses without
//!   keeping any per-pair state; membership lives in the clients
//! - Each accepted socket runs one `handle_connection` worker task
//!
//! # Example
//! ```ignore
//! use tcp_chat::ChatServer;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() {
//!     let listener = TcpListener::bind("127.0.0.1:8083").await.unwrap();
//!     ChatServer::new().run(listener).await;
//! }
//! ```

pub mod client;
pub mod codec;
pub mod error;
pub mod handler;
pub mod message;
pub mod registry;
pub mod router;
pub mod server;
pub mod session;
pub mod time;
pub mod types;
pub mod user;

// Re-export main types for convenience
pub use error::{ChatError, DecodeError};
pub use handler::handle_connection;
pub use message::{ClientMessage, Login, ServerMessage};
pub use registry::Registry;
pub use router::Router;
pub use server::ChatServer;
pub use session::SessionNegotiator;
pub use types::ConnId;
pub use user::{peer_writer, PeerWriter, User};
