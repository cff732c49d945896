//! Classification pipeline
//!
//! ```text
//! Message ─► normalize ─► Classifier ─┬─► LogStore
//!    │                                │
//!    └──► detectors ─► Evidence       └─► VerificationGate (manual input,
//!                                          not legit) ─► LogStore
//! ```

use crate::classifier::{Classifier, Label, Verdict};
use crate::detect::Evidence;
use crate::error::{GuardError, Result};
use crate::message::Message;
use crate::store::{LogEntry, LogStore};
use crate::text::normalize;
use crate::verification::{Decision, PendingVerification, Ticket, VerificationGate};
use tracing::{debug, info, warn};

/// What happened to a submitted message
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Final verdict recorded
    Logged(LogEntry),
    /// Parked until the operator decides
    PendingVerification(PendingVerification),
}

/// Normalize, detect, classify, gate and log
///
/// Not thread-safe by intent: a single owner (the runtime task) drives it.
pub struct Pipeline {
    classifier: Classifier,
    store: LogStore,
    gate: VerificationGate,
}

impl Pipeline {
    pub fn new(classifier: Classifier, store: LogStore) -> Self {
        Self {
            classifier,
            store,
            gate: VerificationGate::new(),
        }
    }

    pub fn store(&self) -> &LogStore {
        &self.store
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn gate(&self) -> &VerificationGate {
        &self.gate
    }

    /// Run one message through the pipeline
    ///
    /// # Errors
    /// - [`GuardError::EmptyMessage`] for blank or placeholder text
    /// - [`GuardError::ModelUnavailable`] when no model is loaded
    ///
    /// A failure inside the classifier is not an error here: it is logged as
    /// an `Error` entry so later messages keep flowing.
    pub async fn submit(&mut self, message: Message) -> Result<Outcome> {
        if !message.has_content() {
            return Err(GuardError::EmptyMessage);
        }
        if !self.classifier.is_available() {
            return Err(GuardError::ModelUnavailable);
        }

        let evidence = Evidence::extract(message.text());
        let normalized = normalize(message.text());
        debug!("Normalized {} chars to {} chars", message.text().len(), normalized.len());

        let verdict = match self.classifier.classify(&normalized) {
            Ok(verdict) => verdict,
            Err(GuardError::ModelUnavailable) => return Err(GuardError::ModelUnavailable),
            Err(e) => {
                warn!("Prediction failed for message from {}: {}", message.origin(), e);
                let entry = LogEntry {
                    source: Some(message.source()),
                    sender: message.sender().map(str::to_string),
                    ..LogEntry::new(
                        format!("Prediction failed for message from {}: {}", message.origin(), e),
                        Label::Error,
                        Vec::new(),
                    )
                };
                self.store.append(entry.clone()).await;
                return Ok(Outcome::Logged(entry));
            }
        };

        if VerificationGate::requires_review(&message, &verdict) {
            let pending = self.gate.open(message, verdict, evidence);
            info!(
                "Message held for verification #{} ({})",
                pending.ticket, pending.verdict
            );
            return Ok(Outcome::PendingVerification(pending));
        }

        Ok(Outcome::Logged(self.commit(&message, &verdict, &evidence).await))
    }

    /// Apply the operator's decision to a parked message and log it
    pub async fn resolve(&mut self, ticket: Ticket, decision: Decision) -> Result<LogEntry> {
        let (pending, verdict) = self.gate.confirm(ticket, decision)?;
        Ok(self.commit(&pending.message, &verdict, &pending.evidence).await)
    }

    /// Record an informational entry
    pub async fn record_notice(&self, text: impl Into<String>) -> LogEntry {
        let entry = LogEntry::notice(text);
        self.store.append(entry.clone()).await;
        entry
    }

    async fn commit(&self, message: &Message, verdict: &Verdict, evidence: &Evidence) -> LogEntry {
        let entry = LogEntry::for_message(message, verdict.label.clone(), evidence.warnings());
        self.store.append(entry.clone()).await;

        info!(
            "{} message from {} classified as {}",
            message.source(),
            message.origin(),
            verdict
        );
        entry
    }
}
