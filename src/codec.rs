//! Wire framing and the message codec
//!
//! One read or write call carries exactly one JSON message; there is no
//! delimiter or length prefix. Inbound reads are capped at 1024 bytes,
//! so an oversized frame truncates and two frames sent back-to-back can
//! coalesce into one unparseable read. Everything above this module sees
//! whole messages or a `DecodeError`.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::DecodeError;

/// Inbound read quota per frame, in bytes
pub const MAX_FRAME: usize = 1024;

/// Encode a message into its wire bytes
pub fn encode<M: Serialize>(msg: &M) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec(msg)
}

/// Decode one frame's bytes into a message
pub fn decode<M: DeserializeOwned>(frame: &[u8]) -> Result<M, DecodeError> {
    Ok(serde_json::from_slice(frame)?)
}

/// Read one frame from the connection
///
/// Returns `None` on a clean end of stream.
pub async fn read_frame<R>(reader: &mut R) -> std::io::Result<Option<Vec<u8>>>
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; MAX_FRAME];
    let n = reader.read(&mut buf).await?;
    if n == 0 {
        return Ok(None);
    }
    buf.truncate(n);
    Ok(Some(buf))
}

/// Write one frame's bytes to the connection
pub async fn write_frame<W>(writer: &mut W, bytes: &[u8]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(bytes).await?;
    writer.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::ClientMessage;

    #[tokio::test]
    async fn test_one_write_is_one_frame() {
        let (mut tx, mut rx) = tokio::io::duplex(256);
        write_frame(&mut tx, br#"{"type":"users"}"#).await.unwrap();
        let frame = read_frame(&mut rx).await.unwrap().unwrap();
        assert_eq!(frame, br#"{"type":"users"}"#);
    }

    #[tokio::test]
    async fn test_read_frame_none_on_eof() {
        let (tx, mut rx) = tokio::io::duplex(256);
        drop(tx);
        assert!(read_frame(&mut rx).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_oversized_frame_truncates_and_fails_decode() {
        let (mut tx, mut rx) = tokio::io::duplex(4096);
        let msg = ClientMessage::Message {
            message: "x".repeat(2 * MAX_FRAME),
        };
        write_frame(&mut tx, &encode(&msg).unwrap()).await.unwrap();

        let frame = read_frame(&mut rx).await.unwrap().unwrap();
        assert_eq!(frame.len(), MAX_FRAME);
        assert!(decode::<ClientMessage>(&frame).is_err());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode::<ClientMessage>(b"definitely not json").is_err());
    }

    #[test]
    fn test_decode_reads_encoded_frame() {
        let msg = ClientMessage::Private {
            target_username: "Bob".to_string(),
            message: "psst".to_string(),
        };
        let bytes = encode(&msg).unwrap();
        match decode::<ClientMessage>(&bytes).unwrap() {
            ClientMessage::Private {
                target_username,
                message,
            } => {
                assert_eq!(target_username, "Bob");
                assert_eq!(message, "psst");
            }
            _ => panic!("Wrong variant"),
        }
    }
}
