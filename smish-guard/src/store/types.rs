//! Log entry data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::classifier::Label;
use crate::message::{Message, Source};

/// A classified message as recorded in the log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Unique ID
    pub id: Uuid,
    /// Message text (empty for some system notices)
    pub message: String,
    /// Final label
    pub label: Label,
    /// Evidence lines, e.g. `URLs: http://bit.ly/x`
    pub warnings: Vec<String>,
    /// Origin of the message, `None` for system notices
    pub source: Option<Source>,
    /// Sender reported by the network peer
    pub sender: Option<String>,
    /// Timestamp
    pub created_at: DateTime<Utc>,
}

impl LogEntry {
    pub fn new(message: impl Into<String>, label: Label, warnings: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            message: message.into(),
            label,
            warnings,
            source: None,
            sender: None,
            created_at: Utc::now(),
        }
    }

    /// Entry for a classified message
    pub fn for_message(message: &Message, label: Label, warnings: Vec<String>) -> Self {
        Self {
            source: Some(message.source()),
            sender: message.sender().map(str::to_string),
            ..Self::new(message.text(), label, warnings)
        }
    }

    /// Informational system entry
    pub fn notice(text: impl Into<String>) -> Self {
        Self::new(text, Label::Info, Vec::new())
    }

    /// Dedup identity used at the export boundary
    pub fn identity(&self) -> (&str, &Label) {
        (&self.message, &self.label)
    }
}
