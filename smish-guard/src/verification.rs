//! Human verification of suspicious verdicts
//!
//! Messages the operator typed in themselves get a second look when the
//! model flags them. Instead of blocking on a modal prompt, a flagged message
//! is parked as a [`PendingVerification`] and the pipeline keeps running; the
//! operator's [`Decision`] later releases it.

use crate::classifier::{Label, Verdict};
use crate::detect::Evidence;
use crate::error::{GuardError, Result};
use crate::message::{Message, Source};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Identifies one parked message
pub type Ticket = u64;

/// Operator decision on an automated verdict
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Keep the automated verdict
    Accept,
    /// Replace the label with one of [`Label::VERDICTS`]
    Override(Label),
}

impl Decision {
    /// Parse operator input: empty or `y`/`yes` accepts, a label name overrides
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() || matches!(trimmed.to_lowercase().as_str(), "y" | "yes" | "accept") {
            return Ok(Self::Accept);
        }

        let label = Label::from_raw(trimmed);
        if !label.is_verdict() {
            return Err(GuardError::Verification(format!(
                "'{}' is not one of Legit, Spam, Smishing",
                trimmed
            )));
        }

        Ok(Self::Override(label))
    }
}

/// A message awaiting an operator decision
#[derive(Debug, Clone, Serialize)]
pub struct PendingVerification {
    pub ticket: Ticket,
    pub message: Message,
    pub verdict: Verdict,
    pub evidence: Evidence,
}

/// Verification gate holding parked messages
#[derive(Debug, Default)]
pub struct VerificationGate {
    pending: BTreeMap<Ticket, PendingVerification>,
    next_ticket: Ticket,
}

impl VerificationGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Review applies only to manual input the model did not consider legit
    pub fn requires_review(message: &Message, verdict: &Verdict) -> bool {
        message.source() == Source::ManualInput && !verdict.label.is_legit()
    }

    /// Park a message until [`confirm`](Self::confirm) is called for its ticket
    pub fn open(
        &mut self,
        message: Message,
        verdict: Verdict,
        evidence: Evidence,
    ) -> PendingVerification {
        self.next_ticket += 1;
        let pending = PendingVerification {
            ticket: self.next_ticket,
            message,
            verdict,
            evidence,
        };

        debug!("Verification #{} opened ({})", pending.ticket, pending.verdict);
        self.pending.insert(pending.ticket, pending.clone());
        pending
    }

    /// Release a parked message with the operator's decision applied
    pub fn confirm(
        &mut self,
        ticket: Ticket,
        decision: Decision,
    ) -> Result<(PendingVerification, Verdict)> {
        if let Decision::Override(label) = &decision {
            if !label.is_verdict() {
                return Err(GuardError::Verification(format!(
                    "cannot override to '{}'",
                    label
                )));
            }
        }

        let pending = self
            .pending
            .remove(&ticket)
            .ok_or_else(|| GuardError::Verification(format!("no pending verification #{}", ticket)))?;

        let verdict = match decision {
            Decision::Accept => pending.verdict.clone(),
            Decision::Override(label) if label == pending.verdict.label => pending.verdict.clone(),
            Decision::Override(label) => Verdict::new(label, None),
        };

        debug!("Verification #{} resolved as {}", ticket, verdict);
        Ok((pending, verdict))
    }

    /// Parked messages, oldest first
    pub fn pending(&self) -> impl Iterator<Item = &PendingVerification> {
        self.pending.values()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
