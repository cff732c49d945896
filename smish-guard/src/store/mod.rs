//! Log store
//!
//! One shared, ordered record of classified messages. Every consumer (live
//! display, export, pipeline) holds a clone of the same [`LogStore`] handle
//! and reads snapshots, so a removal is observed by all of them at once.
//!
//! Live appends keep duplicates; `(message, label)` deduplication applies
//! only to [`LogStore::export_snapshot`].

pub mod types;

pub use types::LogEntry;

use crate::classifier::Label;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct LogStore {
    entries: Arc<RwLock<Vec<LogEntry>>>,
}

impl LogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an entry, returning its ID
    pub async fn append(&self, entry: LogEntry) -> Uuid {
        let id = entry.id;
        self.entries.write().await.push(entry);
        id
    }

    /// Remove an entry from every view
    pub async fn remove(&self, id: Uuid) -> Option<LogEntry> {
        let mut entries = self.entries.write().await;
        let index = entries.iter().position(|e| e.id == id)?;
        Some(entries.remove(index))
    }

    pub async fn get(&self, id: Uuid) -> Option<LogEntry> {
        self.entries.read().await.iter().find(|e| e.id == id).cloned()
    }

    /// Ordered snapshot, optionally limited to one label
    pub async fn list(&self, filter: Option<&Label>) -> Vec<LogEntry> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|e| filter.map_or(true, |label| &e.label == label))
            .cloned()
            .collect()
    }

    /// Snapshot for saving: entries with a message, first of each `(message, label)`
    pub async fn export_snapshot(&self) -> Vec<LogEntry> {
        let entries = self.entries.read().await;
        let mut seen = HashSet::new();

        entries
            .iter()
            .filter(|e| !e.message.is_empty())
            .filter(|&e| seen.insert(e.identity()))
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
