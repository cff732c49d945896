//! Flat text export of the log
//!
//! One block per entry:
//!
//! ```text
//! [Smishing] Win a FREE prize! Click http://bit.ly/x now
//!     URLs: http://bit.ly/x
//!     Domains: bit.ly
//! ```

use crate::error::Result;
use crate::store::{LogEntry, LogStore};
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::info;

/// Shown in place of an empty message
const EMPTY_MESSAGE: &str = "System message";

/// Indentation of warning lines
const WARNING_INDENT: &str = "    ";

/// Render one entry as a text block
pub fn render_block(entry: &LogEntry) -> String {
    let message = if entry.message.is_empty() {
        EMPTY_MESSAGE
    } else {
        entry.message.as_str()
    };

    let mut block = format!("[{}] {}\n", entry.label, message);
    for warning in &entry.warnings {
        block.push_str(WARNING_INDENT);
        block.push_str(warning);
        block.push('\n');
    }

    block
}

/// Write the deduplicated log, returning the number of blocks written
///
/// Nothing is written when there is nothing to save.
pub async fn export_all(store: &LogStore, path: &Path) -> Result<usize> {
    let entries = store.export_snapshot().await;
    if entries.is_empty() {
        return Ok(0);
    }

    let content: String = entries.iter().map(render_block).collect();
    tokio::fs::write(path, content).await?;

    info!("Saved {} log entries to {}", entries.len(), path.display());
    Ok(entries.len())
}

/// Write a single entry, replacing the file
pub async fn save_entry(entry: &LogEntry, path: &Path) -> Result<()> {
    tokio::fs::write(path, render_block(entry)).await?;
    info!("Log saved to {}", path.display());
    Ok(())
}

/// Append a single entry to a combined log, followed by a blank line
pub async fn append_entry(entry: &LogEntry, path: &Path) -> Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;

    let mut block = render_block(entry);
    block.push('\n');
    file.write_all(block.as_bytes()).await?;
    file.flush().await?;

    info!("Appended to {}", path.display());
    Ok(())
}
