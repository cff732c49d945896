//! Linear model loaded from a JSON artifact

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::model::Model;
use super::types::Prediction;
use crate::error::{GuardError, Result};

/// Linear classifier (logistic regression / linear SVM weights)
///
/// Binary models carry one coefficient row and two classes; multi-class
/// models carry one row per class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearModel {
    classes: Vec<i64>,
    coef: Vec<Vec<f64>>,
    intercept: Vec<f64>,
}

impl LinearModel {
    pub fn new(classes: Vec<i64>, coef: Vec<Vec<f64>>, intercept: Vec<f64>) -> Result<Self> {
        let model = Self {
            classes,
            coef,
            intercept,
        };
        model.validate()?;
        Ok(model)
    }

    /// Load and validate a model artifact
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let model: Self = serde_json::from_str(&content)?;
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> Result<()> {
        if self.coef.is_empty() || self.coef.len() != self.intercept.len() {
            return Err(GuardError::Config(format!(
                "model has {} coefficient rows but {} intercepts",
                self.coef.len(),
                self.intercept.len()
            )));
        }

        let width = self.coef[0].len();
        if self.coef.iter().any(|row| row.len() != width) {
            return Err(GuardError::Config(
                "model coefficient rows differ in width".to_string(),
            ));
        }

        let binary = self.coef.len() == 1 && self.classes.len() == 2;
        if !binary && self.coef.len() != self.classes.len() {
            return Err(GuardError::Config(format!(
                "model has {} classes but {} coefficient rows",
                self.classes.len(),
                self.coef.len()
            )));
        }

        Ok(())
    }

    fn decision(&self, row: usize, features: &[f64]) -> f64 {
        self.coef[row]
            .iter()
            .zip(features)
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.intercept[row]
    }
}

impl Model for LinearModel {
    fn predict(&self, features: &[f64]) -> Result<Prediction> {
        let width = self.coef[0].len();
        if features.len() != width {
            return Err(GuardError::Classification(format!(
                "expected {} features, got {}",
                width,
                features.len()
            )));
        }

        if self.coef.len() == 1 && self.classes.len() == 2 {
            let score = self.decision(0, features);
            let p_positive = 1.0 / (1.0 + (-score).exp());
            let (code, confidence) = if score > 0.0 {
                (self.classes[1], p_positive)
            } else {
                (self.classes[0], 1.0 - p_positive)
            };
            return Ok(Prediction {
                code,
                confidence: Some(confidence),
            });
        }

        let scores: Vec<f64> = (0..self.coef.len())
            .map(|row| self.decision(row, features))
            .collect();

        let (best, best_score) = scores
            .iter()
            .copied()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |acc, (i, s)| if s > acc.1 { (i, s) } else { acc });

        // Softmax, shifted by the max for stability
        let total: f64 = scores.iter().map(|s| (s - best_score).exp()).sum();

        Ok(Prediction {
            code: self.classes[best],
            confidence: Some(1.0 / total),
        })
    }

    fn width(&self) -> Option<usize> {
        Some(self.coef[0].len())
    }
}
