//! Indicator detection
//!
//! Extracts URLs, email addresses, phone numbers and domains from message
//! text and bundles them as [`Evidence`] for the log.

pub mod patterns;

pub use patterns::{detect_domains, detect_emails, detect_phone_numbers, detect_urls};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of extracted indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceKind {
    Url,
    Email,
    Phone,
    Domain,
}

impl EvidenceKind {
    /// Fixed extraction and rendering order
    pub const ALL: [EvidenceKind; 4] = [Self::Url, Self::Email, Self::Phone, Self::Domain];

    fn detect(self, text: &str) -> Vec<String> {
        match self {
            Self::Url => detect_urls(text),
            Self::Email => detect_emails(text),
            Self::Phone => detect_phone_numbers(text),
            Self::Domain => detect_domains(text),
        }
    }

    /// Plural heading used in warning lines
    pub fn heading(self) -> &'static str {
        match self {
            Self::Url => "URLs",
            Self::Email => "Emails",
            Self::Phone => "Phones",
            Self::Domain => "Domains",
        }
    }
}

/// Matches of one kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub kind: EvidenceKind,
    pub matches: Vec<String>,
}

impl fmt::Display for EvidenceItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.heading(), self.matches.join(", "))
    }
}

/// Indicators found in a message, non-empty kinds only
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    items: Vec<EvidenceItem>,
}

impl Evidence {
    /// Run every detector over the original text
    pub fn extract(text: &str) -> Self {
        let items = EvidenceKind::ALL
            .iter()
            .filter_map(|&kind| {
                let matches = kind.detect(text);
                (!matches.is_empty()).then_some(EvidenceItem { kind, matches })
            })
            .collect();

        Self { items }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[EvidenceItem] {
        &self.items
    }

    /// Matches for one kind, empty if none were found
    pub fn matches(&self, kind: EvidenceKind) -> &[String] {
        self.items
            .iter()
            .find(|item| item.kind == kind)
            .map(|item| item.matches.as_slice())
            .unwrap_or(&[])
    }

    /// One human-readable line per kind, e.g. `URLs: http://bit.ly/x`
    pub fn warnings(&self) -> Vec<String> {
        self.items.iter().map(ToString::to_string).collect()
    }
}
