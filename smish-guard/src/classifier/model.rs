//! Model boundary
//!
//! The classifier consumes two artifacts: a vectorizer turning normalized
//! text into a fixed-width feature vector, and a model mapping that vector
//! to a class code.

use super::types::Prediction;
use crate::error::Result;

/// Text to numeric features
#[cfg_attr(test, mockall::automock)]
pub trait Vectorizer: Send + Sync {
    /// Vectorize normalized text; the result is always `width()` long
    fn transform(&self, text: &str) -> Result<Vec<f64>>;

    /// Number of features produced
    fn width(&self) -> usize;
}

/// Numeric features to a class code
#[cfg_attr(test, mockall::automock)]
pub trait Model: Send + Sync {
    fn predict(&self, features: &[f64]) -> Result<Prediction>;

    /// Number of features expected, if fixed
    fn width(&self) -> Option<usize>;
}
