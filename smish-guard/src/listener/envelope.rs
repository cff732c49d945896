//! Wire format
//!
//! One frame per connection: a 4-byte big-endian body length followed by a
//! UTF-8 JSON body `{"sender": "...", "message": "..."}`. `sender` may be
//! omitted.

use serde::{Deserialize, Serialize};

use crate::error::{GuardError, Result};
use crate::message::Message;

/// Size of the length prefix in bytes
pub const LENGTH_PREFIX_LEN: usize = 4;

/// Decoded network payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    pub message: String,
}

impl Envelope {
    pub fn new(sender: Option<String>, message: impl Into<String>) -> Self {
        Self {
            sender,
            message: message.into(),
        }
    }

    /// Parse a frame body
    pub fn decode(body: &[u8]) -> Result<Self> {
        let envelope: Self = serde_json::from_slice(body)
            .map_err(|e| GuardError::Decode(format!("invalid envelope: {}", e)))?;

        if envelope.message.trim().is_empty() {
            return Err(GuardError::Decode("envelope has no message text".to_string()));
        }

        Ok(envelope)
    }

    /// Serialize as a complete frame, length prefix included
    pub fn encode_frame(&self) -> Result<Vec<u8>> {
        let body = serde_json::to_vec(self)?;
        let len = u32::try_from(body.len())
            .map_err(|_| GuardError::Decode(format!("body of {} bytes is too large", body.len())))?;

        let mut frame = Vec::with_capacity(LENGTH_PREFIX_LEN + body.len());
        frame.extend_from_slice(&len.to_be_bytes());
        frame.extend_from_slice(&body);
        Ok(frame)
    }

    pub fn into_message(self) -> Message {
        Message::network(self.sender, self.message)
    }
}
