//! Length-prefixed framing for the authority connection.
//!
//! ```text
//! +-------------------+--------------------+
//! | length (4 bytes)  |   payload          |
//! | u32 little-endian |   (length bytes)   |
//! +-------------------+--------------------+
//! ```
//!
//! The length excludes the prefix itself. A zero-length frame is a valid
//! keepalive and carries no event.

use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Default payload ceiling. Session events are tiny; anything larger is a
/// misbehaving peer.
pub const DEFAULT_MAX_PAYLOAD: u32 = 64 * 1024;

/// Configuration for the framing layer.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum allowed payload size in bytes.
    pub max_payload_size: u32,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
        }
    }
}

/// Errors that can occur during framing operations.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The payload size exceeds the configured maximum.
    #[error("payload size {size} exceeds maximum {max}")]
    PayloadTooLarge {
        /// The actual payload size.
        size: usize,
        /// The configured maximum.
        max: u32,
    },

    /// The peer closed the connection before a complete frame was received.
    #[error("connection closed")]
    ConnectionClosed,

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn eof_as_closed(e: std::io::Error) -> FrameError {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        FrameError::ConnectionClosed
    } else {
        FrameError::Io(e)
    }
}

/// Read one frame and return its payload.
///
/// Not cancel-safe: dropping the future mid-frame loses the partial frame.
pub async fn read_frame<R: AsyncReadExt + Unpin>(
    reader: &mut R,
    config: &FrameConfig,
) -> Result<Vec<u8>, FrameError> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf).await.map_err(eof_as_closed)?;

    let payload_len = u32::from_le_bytes(len_buf);
    if payload_len > config.max_payload_size {
        return Err(FrameError::PayloadTooLarge {
            size: payload_len as usize,
            max: config.max_payload_size,
        });
    }

    let mut payload = vec![0u8; payload_len as usize];
    if payload_len > 0 {
        reader.read_exact(&mut payload).await.map_err(eof_as_closed)?;
    }
    Ok(payload)
}

/// Write one frame and flush it.
pub async fn write_frame<W: AsyncWriteExt + Unpin>(
    writer: &mut W,
    payload: &[u8],
    config: &FrameConfig,
) -> Result<(), FrameError> {
    let len = u32::try_from(payload.len())
        .ok()
        .filter(|len| *len <= config.max_payload_size)
        .ok_or(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: config.max_payload_size,
        })?;

    writer.write_all(&len.to_le_bytes()).await?;
    if !payload.is_empty() {
        writer.write_all(payload).await?;
    }
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{ClientFrame, OutboundEvent, SessionId, decode_frame, encode_frame};
    use tokio::io::duplex;

    #[tokio::test]
    async fn test_encoded_event_crosses_a_frame() {
        let (mut client, mut server) = duplex(1024);
        let config = FrameConfig::default();
        let frame = ClientFrame::Event(OutboundEvent::JoinGame {
            session_id: SessionId::new("G1"),
            identity: Some("alice@example.com".to_string()),
        });

        write_frame(&mut client, &encode_frame(&frame).unwrap(), &config)
            .await
            .unwrap();
        let payload = read_frame(&mut server, &config).await.unwrap();
        let decoded: ClientFrame = decode_frame(&payload).unwrap();
        assert_eq!(decoded, frame);
    }

    #[tokio::test]
    async fn test_back_to_back_frames_stay_separate() {
        let (mut client, mut server) = duplex(1024);
        let config = FrameConfig::default();

        write_frame(&mut client, b"aaa", &config).await.unwrap();
        write_frame(&mut client, b"bbbb", &config).await.unwrap();

        assert_eq!(read_frame(&mut server, &config).await.unwrap(), b"aaa");
        assert_eq!(read_frame(&mut server, &config).await.unwrap(), b"bbbb");
    }

    #[tokio::test]
    async fn test_partial_reads_reassemble() {
        // Tiny duplex buffer forces the payload across several reads.
        let (mut client, mut server) = duplex(8);
        let config = FrameConfig::default();
        let payload = b"a payload longer than the duplex buffer";

        let write_config = config.clone();
        let writer = tokio::spawn(async move {
            write_frame(&mut client, payload, &write_config)
                .await
                .unwrap();
        });

        let received = read_frame(&mut server, &config).await.unwrap();
        writer.await.unwrap();
        assert_eq!(received, payload);
    }

    #[tokio::test]
    async fn test_oversized_prefix_rejected_on_read() {
        let (mut client, mut server) = duplex(64);
        let config = FrameConfig {
            max_payload_size: 16,
        };

        client.write_all(&1024u32.to_le_bytes()).await.unwrap();
        client.flush().await.unwrap();

        let result = read_frame(&mut server, &config).await;
        assert!(matches!(
            result,
            Err(FrameError::PayloadTooLarge { size: 1024, max: 16 })
        ));
    }

    #[tokio::test]
    async fn test_oversized_payload_rejected_on_write() {
        let (mut client, _server) = duplex(64);
        let config = FrameConfig {
            max_payload_size: 16,
        };

        let result = write_frame(&mut client, &[0u8; 17], &config).await;
        assert!(matches!(result, Err(FrameError::PayloadTooLarge { .. })));
    }

    #[tokio::test]
    async fn test_zero_length_frame_is_keepalive() {
        let (mut client, mut server) = duplex(64);
        let config = FrameConfig::default();

        write_frame(&mut client, &[], &config).await.unwrap();
        assert!(read_frame(&mut server, &config).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_close_mid_payload_reports_closed() {
        let (mut client, mut server) = duplex(64);
        let config = FrameConfig::default();

        client.write_all(&10u32.to_le_bytes()).await.unwrap();
        client.write_all(b"abc").await.unwrap();
        drop(client);

        let result = read_frame(&mut server, &config).await;
        assert!(matches!(result, Err(FrameError::ConnectionClosed)));
    }

    #[tokio::test]
    async fn test_close_before_prefix_reports_closed() {
        let (client, mut server) = duplex(64);
        drop(client);

        let result = read_frame(&mut server, &FrameConfig::default()).await;
        assert!(matches!(result, Err(FrameError::ConnectionClosed)));
    }
}
