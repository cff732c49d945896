use thiserror::Error;

#[derive(Error, Debug)]
pub enum GuardError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Model not loaded: classification is unavailable until restart")]
    ModelUnavailable,

    #[error("Failed to bind listener on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Classification error: {0}")]
    Classification(String),

    #[error("Verification error: {0}")]
    Verification(String),

    #[error("Message text is empty")]
    EmptyMessage,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Send to {addr} failed: {reason}")]
    Send { addr: String, reason: String },

    #[error("Pipeline runtime has shut down")]
    RuntimeClosed,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GuardError>;
