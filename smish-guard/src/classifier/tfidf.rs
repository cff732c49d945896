//! TF-IDF vectorizer loaded from a JSON artifact

use once_cell::sync::Lazy;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use super::model::Vectorizer;
use crate::error::{GuardError, Result};

static ENGLISH_STEMMER: Lazy<Stemmer> = Lazy::new(|| Stemmer::create(Algorithm::English));

/// TF-IDF vectorizer
///
/// Artifact layout:
///
/// ```json
/// { "vocabulary": {"free": 0, "prize": 1}, "idf": [1.9, 2.3],
///   "ngram_range": [1, 2], "sublinear_tf": false, "stem": false }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    #[serde(default = "default_ngram_range")]
    ngram_range: (usize, usize),
    #[serde(default)]
    sublinear_tf: bool,
    #[serde(default)]
    stem: bool,
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

impl TfidfVectorizer {
    /// Build a unigram vectorizer from its vocabulary and idf weights
    pub fn new(vocabulary: HashMap<String, usize>, idf: Vec<f64>) -> Result<Self> {
        let vectorizer = Self {
            vocabulary,
            idf,
            ngram_range: default_ngram_range(),
            sublinear_tf: false,
            stem: false,
        };
        vectorizer.validate()?;
        Ok(vectorizer)
    }

    pub fn with_ngram_range(mut self, min: usize, max: usize) -> Result<Self> {
        self.ngram_range = (min, max);
        self.validate()?;
        Ok(self)
    }

    pub fn with_sublinear_tf(mut self, enabled: bool) -> Self {
        self.sublinear_tf = enabled;
        self
    }

    pub fn with_stemming(mut self, enabled: bool) -> Self {
        self.stem = enabled;
        self
    }

    /// Load and validate a vectorizer artifact
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let vectorizer: Self = serde_json::from_str(&content)?;
        vectorizer.validate()?;
        Ok(vectorizer)
    }

    fn validate(&self) -> Result<()> {
        if self.vocabulary.len() != self.idf.len() {
            return Err(GuardError::Config(format!(
                "vectorizer vocabulary has {} terms but {} idf weights",
                self.vocabulary.len(),
                self.idf.len()
            )));
        }

        if let Some((term, &index)) = self.vocabulary.iter().find(|&(_, &i)| i >= self.idf.len()) {
            return Err(GuardError::Config(format!(
                "vectorizer term '{}' has out-of-range index {}",
                term, index
            )));
        }

        let (min, max) = self.ngram_range;
        if min == 0 || min > max {
            return Err(GuardError::Config(format!(
                "invalid ngram range ({}, {})",
                min, max
            )));
        }

        Ok(())
    }

    /// Split normalized text into single-word tokens of two or more characters
    fn tokenize(&self, text: &str) -> Vec<String> {
        let words = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.chars().count() >= 2);

        if self.stem {
            words.map(|w| ENGLISH_STEMMER.stem(w).into_owned()).collect()
        } else {
            words.map(str::to_string).collect()
        }
    }

    fn ngrams(&self, tokens: &[String]) -> Vec<String> {
        let (min, max) = self.ngram_range;
        let mut grams = Vec::new();

        for n in min..=max {
            if n > tokens.len() {
                break;
            }
            grams.extend(tokens.windows(n).map(|w| w.join(" ")));
        }

        grams
    }
}

impl Vectorizer for TfidfVectorizer {
    fn transform(&self, text: &str) -> Result<Vec<f64>> {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for gram in self.ngrams(&self.tokenize(text)) {
            if let Some(&index) = self.vocabulary.get(&gram) {
                *counts.entry(index).or_insert(0.0) += 1.0;
            }
        }

        let mut features = vec![0.0; self.idf.len()];
        for (index, count) in counts {
            let tf = if self.sublinear_tf { 1.0 + count.ln() } else { count };
            features[index] = tf * self.idf[index];
        }

        // L2 normalization
        let norm = features.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for value in &mut features {
                *value /= norm;
            }
        }

        Ok(features)
    }

    fn width(&self) -> usize {
        self.idf.len()
    }
}
