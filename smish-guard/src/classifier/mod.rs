//! Message classifier
//!
//! Wraps a loaded vectorizer and model behind the [`Vectorizer`] and
//! [`Model`] traits and maps raw class codes to semantic [`Label`]s.
//!
//! A classifier without artifacts is a persistent condition: it is reported
//! once when loading and every request fails with
//! [`GuardError::ModelUnavailable`] until restart.

pub mod linear;
pub mod model;
pub mod tfidf;
pub mod types;

pub use linear::LinearModel;
pub use model::{Model, Vectorizer};
pub use tfidf::TfidfVectorizer;
pub use types::{Label, Prediction, Verdict};

use crate::config::ModelConfig;
use crate::error::{GuardError, Result};
use std::path::Path;
use tracing::{debug, info, warn};

struct Engine {
    vectorizer: Box<dyn Vectorizer>,
    model: Box<dyn Model>,
}

/// Text classifier
pub struct Classifier {
    engine: Option<Engine>,
}

impl Classifier {
    /// Create a classifier from loaded artifacts
    pub fn new(vectorizer: impl Vectorizer + 'static, model: impl Model + 'static) -> Self {
        Self {
            engine: Some(Engine {
                vectorizer: Box::new(vectorizer),
                model: Box::new(model),
            }),
        }
    }

    /// A classifier with nothing loaded
    pub fn unavailable() -> Self {
        Self { engine: None }
    }

    /// Load both artifacts from disk
    pub fn from_files(model_path: &Path, vectorizer_path: &Path) -> Result<Self> {
        let vectorizer = TfidfVectorizer::from_file(vectorizer_path)?;
        let model = LinearModel::from_file(model_path)?;

        if let Some(width) = model.width() {
            if width != vectorizer.width() {
                return Err(GuardError::Config(format!(
                    "model expects {} features but vectorizer produces {}",
                    width,
                    vectorizer.width()
                )));
            }
        }

        Ok(Self::new(vectorizer, model))
    }

    /// Load the configured artifacts, degrading to unavailable on any failure
    pub fn load(config: &ModelConfig) -> Self {
        let model_path = Path::new(&config.model_path);
        let vectorizer_path = Path::new(&config.vectorizer_path);

        if !model_path.exists() || !vectorizer_path.exists() {
            warn!(
                "Model artifacts not found ({}, {}); classification disabled",
                config.model_path, config.vectorizer_path
            );
            return Self::unavailable();
        }

        match Self::from_files(model_path, vectorizer_path) {
            Ok(classifier) => {
                info!("Model loaded from {}", config.model_path);
                classifier
            }
            Err(e) => {
                warn!("Failed to load model bundle: {}; classification disabled", e);
                Self::unavailable()
            }
        }
    }

    pub fn is_available(&self) -> bool {
        self.engine.is_some()
    }

    /// Classify already-normalized text
    pub fn classify(&self, normalized_text: &str) -> Result<Verdict> {
        let engine = self.engine.as_ref().ok_or(GuardError::ModelUnavailable)?;

        let features = engine
            .vectorizer
            .transform(normalized_text)
            .map_err(into_classification)?;
        let prediction = engine.model.predict(&features).map_err(into_classification)?;

        let verdict = Verdict::new(Label::from_code(prediction.code), prediction.confidence);
        debug!("Raw class {} -> {}", prediction.code, verdict);

        Ok(verdict)
    }
}

/// Any failure inside vectorize/predict is a per-message classification error
fn into_classification(err: GuardError) -> GuardError {
    match err {
        GuardError::Classification(_) => err,
        other => GuardError::Classification(other.to_string()),
    }
}
