//! Classification labels and verdicts

use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic label attached to a message
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Label {
    /// Legitimate message ("ham")
    Legit,
    /// Unsolicited bulk message
    Spam,
    /// SMS-borne phishing attempt
    Smishing,
    /// Classification failed for this message
    Error,
    /// System notice recorded in the log
    Info,
    /// Pass-through rendering of an unmapped model output
    Other(String),
}

impl Label {
    /// Labels an operator may choose when overriding a verdict
    pub const VERDICTS: [Label; 3] = [Label::Legit, Label::Spam, Label::Smishing];

    /// Map a raw model class code
    ///
    /// `0` is ham, `1` is smishing, `2` is spam; any other code is kept as
    /// its decimal rendering.
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Self::Legit,
            1 => Self::Smishing,
            2 => Self::Spam,
            other => Self::from_raw(&other.to_string()),
        }
    }

    /// Map a raw string label, case-insensitively
    pub fn from_raw(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "ham" | "legit" => Self::Legit,
            "spam" => Self::Spam,
            "smishing" => Self::Smishing,
            "error" => Self::Error,
            "info" => Self::Info,
            _ => Self::Other(capitalize(raw.trim())),
        }
    }

    pub fn is_legit(&self) -> bool {
        matches!(self, Self::Legit)
    }

    /// Whether an operator may pick this label as a verdict
    pub fn is_verdict(&self) -> bool {
        matches!(self, Self::Legit | Self::Spam | Self::Smishing)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Legit => f.write_str("Legit"),
            Self::Spam => f.write_str("Spam"),
            Self::Smishing => f.write_str("Smishing"),
            Self::Error => f.write_str("Error"),
            Self::Info => f.write_str("Info"),
            Self::Other(raw) => f.write_str(raw),
        }
    }
}

impl From<Label> for String {
    fn from(label: Label) -> Self {
        label.to_string()
    }
}

impl From<String> for Label {
    fn from(raw: String) -> Self {
        Self::from_raw(&raw)
    }
}

/// First character upper-cased, the rest lower-cased
fn capitalize(raw: &str) -> String {
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Classification outcome for one message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub label: Label,
    /// Probability of the predicted class, when the model reports one
    pub confidence: Option<f64>,
}

impl Verdict {
    pub fn new(label: Label, confidence: Option<f64>) -> Self {
        Self { label, confidence }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.confidence {
            Some(p) => write!(f, "{} ({:.0}%)", self.label, p * 100.0),
            None => write!(f, "{}", self.label),
        }
    }
}

/// Raw output of a model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub code: i64,
    pub confidence: Option<f64>,
}
