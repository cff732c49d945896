use crate::error::{GuardError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable prefix, e.g. `SMISH_GUARD__LISTENER__LISTEN_ADDR`
const ENV_PREFIX: &str = "SMISH_GUARD";

/// Default intake port for network messages
pub const DEFAULT_PORT: u16 = 5050;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub listener: ListenerConfig,
    pub model: ModelConfig,
    pub export: ExportConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ListenerConfig {
    pub listen_addr: String,
    /// Largest accepted frame body in bytes
    pub max_payload_size: usize,
    /// Capacity of the hand-off queue into the pipeline
    pub queue_capacity: usize,
    /// Idle connections are dropped after this many seconds
    pub read_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelConfig {
    pub model_path: String,
    pub vectorizer_path: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExportConfig {
    pub combined_log_path: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| GuardError::Config(e.to_string()))?;

        toml::from_str(&content).map_err(|e| GuardError::Config(e.to_string()))
    }

    /// Layer defaults, an optional TOML file and `SMISH_GUARD__*` variables
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = config::Config::try_from(&Self::default())
            .map_err(|e| GuardError::Config(e.to_string()))?;

        let mut builder = config::Config::builder().add_source(defaults);
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }

        builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .and_then(|settings| settings.try_deserialize())
            .map_err(|e| GuardError::Config(e.to_string()))
    }

    pub fn default() -> Self {
        Self {
            listener: ListenerConfig {
                listen_addr: format!("0.0.0.0:{}", DEFAULT_PORT),
                max_payload_size: 64 * 1024, // 64KB
                queue_capacity: 64,
                read_timeout_secs: 30,
            },
            model: ModelConfig {
                model_path: "sms_model.json".to_string(),
                vectorizer_path: "tfidf_vectorizer.json".to_string(),
            },
            export: ExportConfig {
                combined_log_path: "combined_logs.txt".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}
