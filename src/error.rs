//! Error types for the chat service
//!
//! Defines application-level errors and frame decode errors.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Application-level errors
///
/// Covers fatal errors (connection setup and teardown, local terminal
/// failures). Business errors never surface here; they travel to the
/// offending client as `error` frames instead.
#[derive(Debug, Error)]
pub enum ChatError {
    /// IO error (fatal for the affected connection)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error while building an outbound frame
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Inbound frame could not be decoded
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Terminal line editor failure (client side)
    #[error("Readline error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),
}

/// Frame decode errors
///
/// Raised when an inbound frame cannot be parsed as a protocol message.
/// Never fatal: workers log the frame and keep reading.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Frame is not valid JSON or does not match any message shape
    #[error("Invalid frame: {0}")]
    InvalidFrame(#[from] serde_json::Error),
}
