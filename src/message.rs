//! Message protocol definitions
//!
//! JSON-based bidirectional message protocol using Serde's tagged enums
//! for type-safe serialization/deserialization. The two directions share
//! tag names but not field sets, so each direction gets its own enum.
//! The login frame predates the tagged scheme and stays a bare object.

use serde::{Deserialize, Serialize};

/// Login frame, the first payload every client sends (no `type` tag)
#[derive(Debug, Serialize, Deserialize)]
pub struct Login {
    pub username: String,
}

/// Client → Server message
///
/// All messages from client to server. Uses tagged enum with snake_case naming.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Broadcast chat text
    Message { message: String },
    /// One-shot private message to a named user
    Private {
        target_username: String,
        message: String,
    },
    /// Ask for the list of online usernames
    Users,
    /// Ask a named user for a private session
    SessionRequest { target_username: String },
    /// Answer a private session request (a missing flag counts as a decline)
    SessionResponse {
        target_username: String,
        #[serde(default)]
        accepted: bool,
    },
}

/// Server → Client message
///
/// All messages from server to client. Every variant carries the send
/// time in wire form; notice variants also carry a ready-made text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Chat text relayed to the other users
    Message {
        username: String,
        message: String,
        timestamp: String,
    },
    /// Private message delivered to its addressee
    Private {
        from_username: String,
        message: String,
        timestamp: String,
    },
    /// Direct notice to one user (the welcome line)
    System {
        message: String,
        online_users: usize,
        timestamp: String,
    },
    /// Someone registered; sent to everyone else
    UserJoined {
        username: String,
        message: String,
        online_users: usize,
        timestamp: String,
    },
    /// Someone disconnected; sent to everyone remaining
    UserLeft {
        username: String,
        message: String,
        online_users: usize,
        timestamp: String,
    },
    /// Reply to a `users` query
    UsersList {
        users: Vec<String>,
        timestamp: String,
    },
    /// A private session request relayed to its target
    SessionRequest {
        from_username: String,
        message: String,
        timestamp: String,
    },
    /// Session response outcome, sent identically to both parties
    SessionAccepted {
        from_username: String,
        to_username: String,
        message: String,
        timestamp: String,
    },
    /// Session decline outcome, sent identically to both parties
    SessionRejected {
        from_username: String,
        to_username: String,
        message: String,
        timestamp: String,
    },
    /// Error reply to the user whose request failed
    Error { message: String, timestamp: String },
}
