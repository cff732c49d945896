use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::timeout;
use tracing::debug;

use super::envelope::Envelope;
use crate::error::{GuardError, Result};
use crate::message::Message;

/// Per-connection state, owned by the connection task
///
/// # Limits
/// - one frame per connection
/// - frame body capped at `max_payload_size`
/// - each read bounded by `read_timeout`
pub struct ListenerSession {
    remote_addr: SocketAddr,
    raw: Vec<u8>,
    max_payload_size: usize,
    read_timeout: Duration,
}

impl ListenerSession {
    pub fn new(remote_addr: SocketAddr, max_payload_size: usize, read_timeout: Duration) -> Self {
        Self {
            remote_addr,
            raw: Vec::new(),
            max_payload_size,
            read_timeout,
        }
    }

    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }

    /// Read one frame and decode it into a network message
    pub async fn handle<S: AsyncRead + Unpin>(mut self, mut stream: S) -> Result<Message> {
        self.read_frame(&mut stream).await?;

        let message = Envelope::decode(&self.raw)?.into_message();
        debug!(
            "Decoded {} byte message from {} ({})",
            self.raw.len(),
            self.remote_addr,
            message.origin()
        );

        Ok(message)
    }

    async fn read_frame<S: AsyncRead + Unpin>(&mut self, stream: &mut S) -> Result<()> {
        let len = timeout(self.read_timeout, stream.read_u32())
            .await
            .map_err(|_| GuardError::Decode("timed out waiting for frame".to_string()))?
            .map_err(|e| GuardError::Decode(format!("missing length prefix: {}", e)))?
            as usize;

        if len == 0 {
            return Err(GuardError::Decode("empty frame".to_string()));
        }

        if len > self.max_payload_size {
            return Err(GuardError::Decode(format!(
                "frame of {} bytes exceeds limit of {}",
                len, self.max_payload_size
            )));
        }

        self.raw = vec![0; len];
        timeout(self.read_timeout, stream.read_exact(&mut self.raw))
            .await
            .map_err(|_| GuardError::Decode("timed out reading frame body".to_string()))?
            .map_err(|e| GuardError::Decode(format!("truncated frame: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Source;

    fn session(max: usize) -> ListenerSession {
        ListenerSession::new(
            "127.0.0.1:40000".parse().unwrap(),
            max,
            Duration::from_secs(1),
        )
    }

    #[tokio::test]
    async fn test_handle_valid_frame() {
        let frame = Envelope::new(Some("alice".to_string()), "hello")
            .encode_frame()
            .unwrap();

        let message = session(1024).handle(frame.as_slice()).await.unwrap();
        assert_eq!(message.text(), "hello");
        assert_eq!(message.sender(), Some("alice"));
        assert_eq!(message.source(), Source::Network);
    }

    #[tokio::test]
    async fn test_oversized_frame_rejected() {
        let frame = Envelope::new(None, "x".repeat(100)).encode_frame().unwrap();
        let result = session(16).handle(frame.as_slice()).await;
        assert!(matches!(result, Err(GuardError::Decode(msg)) if msg.contains("exceeds limit")));
    }

    #[tokio::test]
    async fn test_truncated_frame_rejected() {
        let mut frame = Envelope::new(None, "hello").encode_frame().unwrap();
        frame.truncate(frame.len() - 3);

        let result = session(1024).handle(frame.as_slice()).await;
        assert!(matches!(result, Err(GuardError::Decode(msg)) if msg.contains("truncated")));
    }

    #[tokio::test]
    async fn test_missing_prefix_rejected() {
        let result = session(1024).handle(&[0u8, 1][..]).await;
        assert!(matches!(result, Err(GuardError::Decode(_))));
    }

    #[tokio::test]
    async fn test_zero_length_rejected() {
        let result = session(1024).handle(&[0u8, 0, 0, 0][..]).await;
        assert!(matches!(result, Err(GuardError::Decode(msg)) if msg == "empty frame"));
    }

    #[tokio::test]
    async fn test_idle_connection_times_out() {
        let (_client, server) = tokio::io::duplex(64);
        let session = ListenerSession::new(
            "127.0.0.1:40000".parse().unwrap(),
            1024,
            Duration::from_millis(50),
        );

        let result = session.handle(server).await;
        assert!(matches!(result, Err(GuardError::Decode(msg)) if msg.contains("timed out")));
    }
}
