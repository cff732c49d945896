use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{debug, info};

use super::envelope::Envelope;
use crate::error::{GuardError, Result};

/// Client for the listener wire format
///
/// Delivery is best-effort: the listener sends no acknowledgement.
pub struct MessageClient {
    addr: String,
}

impl MessageClient {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }

    /// Send one message over a fresh connection
    pub async fn send(&self, sender: Option<&str>, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Err(GuardError::EmptyMessage);
        }

        let frame = Envelope::new(sender.map(str::to_string), text).encode_frame()?;
        self.send_raw(&frame).await?;

        info!("Message sent to {}", self.addr);
        Ok(())
    }

    /// Write bytes as-is and close the connection
    pub async fn send_raw(&self, bytes: &[u8]) -> Result<()> {
        let mut stream = TcpStream::connect(&self.addr)
            .await
            .map_err(|e| GuardError::Send {
                addr: self.addr.clone(),
                reason: e.to_string(),
            })?;

        stream.write_all(bytes).await?;
        stream.flush().await?;
        stream.shutdown().await?;

        debug!("Wrote {} bytes to {}", bytes.len(), self.addr);
        Ok(())
    }
}
