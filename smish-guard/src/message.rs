//! Incoming messages

use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder shown in an empty input box; never classified
pub const INPUT_PLACEHOLDER: &str = "Type here...";

/// Where a message came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    /// Typed by the operator
    ManualInput,
    /// Received by the network listener
    Network,
    /// Extracted from an image
    Ocr,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ManualInput => f.write_str("Manual Input"),
            Self::Network => f.write_str("Network"),
            Self::Ocr => f.write_str("OCR"),
        }
    }
}

/// A message to classify; immutable once created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    text: String,
    source: Source,
    sender: Option<String>,
}

impl Message {
    pub fn new(text: impl Into<String>, source: Source, sender: Option<String>) -> Self {
        Self {
            text: text.into(),
            source,
            sender,
        }
    }

    pub fn manual(text: impl Into<String>) -> Self {
        Self::new(text, Source::ManualInput, None)
    }

    pub fn network(sender: Option<String>, text: impl Into<String>) -> Self {
        Self::new(text, Source::Network, sender)
    }

    pub fn ocr(text: impl Into<String>) -> Self {
        Self::new(text, Source::Ocr, None)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn source(&self) -> Source {
        self.source
    }

    pub fn sender(&self) -> Option<&str> {
        self.sender.as_deref()
    }

    /// Sender for display, falling back to the source name
    pub fn origin(&self) -> String {
        match &self.sender {
            Some(sender) => sender.clone(),
            None => self.source.to_string(),
        }
    }

    /// Whether there is anything to classify
    ///
    /// The input placeholder only counts as empty for typed messages.
    pub fn has_content(&self) -> bool {
        let text = self.text.trim();
        if text.is_empty() {
            return false;
        }
        self.source != Source::ManualInput || text != INPUT_PLACEHOLDER
    }
}
