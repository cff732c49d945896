//! smish-guard: SMS spam and smishing classification pipeline
//!
//! Messages arrive from three sources (typed by the operator, extracted from
//! an image, or received over TCP), are normalized, classified by a
//! pre-trained text model and recorded in an in-memory log that can be
//! exported to text files.
//!
//! # Features
//!
//! - **Classification**: TF-IDF vectorizer and linear model loaded from JSON artifacts
//! - **Evidence**: URLs, emails, phone numbers and domains found in the raw text
//! - **Verification**: operator review of automated verdicts on typed messages
//! - **Network intake**: length-prefixed JSON frames, one message per connection
//!
//! # Example
//!
//! ```no_run
//! use smish_guard::classifier::Classifier;
//! use smish_guard::config::Config;
//! use smish_guard::message::Message;
//! use smish_guard::runtime::Runtime;
//! use smish_guard::store::LogStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let classifier = Classifier::load(&config.model);
//!
//!     let (runtime, handle, _events) = Runtime::spawn(&config, classifier, LogStore::new());
//!     handle.start_network().await?;
//!     handle.submit(Message::manual("Your parcel is waiting: http://bit.ly/x")).await?;
//!
//!     handle.shutdown().await?;
//!     runtime.await?;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration management
//! - [`error`]: Error types and handling
//! - [`text`]: Text normalization
//! - [`detect`]: Evidence detectors
//! - [`classifier`]: Vectorizer/model boundary and label mapping
//! - [`verification`]: Operator review of verdicts
//! - [`listener`]: TCP intake and client
//! - [`store`]: In-memory classification log
//! - [`export`]: Text export of log entries
//! - [`pipeline`]: Intake → classify → verify → record
//! - [`runtime`]: Task owning the pipeline and listener
//! - [`console`]: Line-oriented operator front-end

pub mod classifier;
pub mod config;
pub mod console;
pub mod detect;
pub mod error;
pub mod export;
pub mod listener;
pub mod message;
pub mod pipeline;
pub mod runtime;
pub mod store;
pub mod text;
pub mod verification;

// Re-export commonly used types
pub use classifier::{Classifier, Label, Verdict};
pub use config::Config;
pub use error::{GuardError, Result};
pub use message::{Message, Source};
pub use pipeline::{Outcome, Pipeline};
pub use runtime::{Event, Runtime, RuntimeHandle};
pub use store::{LogEntry, LogStore};
