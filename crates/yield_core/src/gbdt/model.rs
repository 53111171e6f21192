//! GBDT regression model
//!
//! Fixed-point ensemble with named inputs:
//! - features are quantized to `round(x * scale)` before traversal
//! - score = bias + sum(leaf * tree_weight / scale)
//! - prediction = score / post_scale
//!
//! Serialized as canonical JSON and identified by the BLAKE3 hash of that
//! JSON.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use super::tree::Tree;
use crate::serde_canon::{hash_canonical_hex, to_canonical_json, CanonicalError};

/// GBDT model errors
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Model validation failed: {0}")]
    ValidationFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Canonical serialization error: {0}")]
    CanonicalError(#[from] CanonicalError),

    #[error("Invalid model format: {0}")]
    InvalidFormat(String),

    #[error("Model hash mismatch: expected {expected}, computed {actual}")]
    HashMismatch { expected: String, actual: String },

    #[error("Inference failed: {0}")]
    Inference(String),
}

/// Default fixed-point scale (1e6)
pub const SCALE: i64 = 1_000_000;

/// Only supported artifact version
pub const MODEL_VERSION: i32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Model {
    pub version: i32,

    /// Fixed-point scale of features, thresholds, leaves and weights
    pub scale: i64,

    /// Divisor turning the integer score into the predicted value
    pub post_scale: i64,

    /// Bias term (fixed-point)
    pub bias: i64,

    pub trees: Vec<Tree>,

    /// Input names in the order the model consumes them
    pub feature_names: Vec<String>,
}

impl Model {
    pub fn new(trees: Vec<Tree>, bias: i64, feature_names: Vec<String>) -> Self {
        Self::with_scale(trees, bias, feature_names, SCALE, SCALE)
    }

    pub fn with_scale(
        trees: Vec<Tree>,
        bias: i64,
        feature_names: Vec<String>,
        scale: i64,
        post_scale: i64,
    ) -> Self {
        Self {
            version: MODEL_VERSION,
            scale,
            post_scale,
            bias,
            trees,
            feature_names,
        }
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.version != MODEL_VERSION {
            return Err(ModelError::ValidationFailed(format!(
                "Unsupported model version: {}",
                self.version
            )));
        }
        if self.scale <= 0 {
            return Err(ModelError::ValidationFailed(format!(
                "Invalid scale: {}",
                self.scale
            )));
        }
        if self.post_scale <= 0 {
            return Err(ModelError::ValidationFailed(format!(
                "Invalid post_scale: {}",
                self.post_scale
            )));
        }
        if self.feature_names.is_empty() {
            return Err(ModelError::ValidationFailed(
                "Model has no feature names".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for name in &self.feature_names {
            if name.is_empty() {
                return Err(ModelError::ValidationFailed(
                    "Empty feature name".to_string(),
                ));
            }
            if !seen.insert(name.as_str()) {
                return Err(ModelError::ValidationFailed(format!(
                    "Duplicate feature name: {name}"
                )));
            }
        }

        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.feature_names.len()).map_err(|e| {
                ModelError::ValidationFailed(format!("Tree {i} validation failed: {e}"))
            })?;
        }
        Ok(())
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn num_features(&self) -> usize {
        self.feature_names.len()
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    /// Integer score for already-quantized features
    pub fn score(&self, features: &[i64]) -> Result<i64, ModelError> {
        if features.len() != self.feature_names.len() {
            return Err(ModelError::Inference(format!(
                "expected {} features, got {}",
                self.feature_names.len(),
                features.len()
            )));
        }

        let mut sum = i128::from(self.bias);
        for (i, tree) in self.trees.iter().enumerate() {
            let leaf = tree
                .evaluate(features)
                .ok_or_else(|| ModelError::Inference(format!("tree {i} has no reachable leaf")))?;
            sum += i128::from(leaf) * i128::from(tree.weight) / i128::from(self.scale);
        }
        i64::try_from(sum).map_err(|_| ModelError::Inference("score overflow".to_string()))
    }

    /// Quantize one raw input to the model scale
    pub fn quantize(&self, value: f64) -> Result<i64, ModelError> {
        let scaled = (value * self.scale as f64).round();
        if !scaled.is_finite() || scaled.abs() >= i64::MAX as f64 {
            return Err(ModelError::Inference(format!(
                "feature value {value} cannot be represented at scale {}",
                self.scale
            )));
        }
        Ok(scaled as i64)
    }

    /// Predict from raw feature values ordered as `feature_names`
    pub fn predict(&self, values: &[f64]) -> Result<f64, ModelError> {
        let quantized = values
            .iter()
            .map(|v| self.quantize(*v))
            .collect::<Result<Vec<_>, _>>()?;
        let score = self.score(&quantized)?;
        Ok(score as f64 / self.post_scale as f64)
    }

    /// Serialize model to canonical JSON (sorted keys, no whitespace)
    pub fn to_canonical_json(&self) -> Result<String, ModelError> {
        Ok(to_canonical_json(self)?)
    }

    /// BLAKE3 of the canonical JSON, hex encoded
    pub fn hash_hex(&self) -> Result<String, ModelError> {
        Ok(hash_canonical_hex(self)?)
    }

    /// Compare against an expected hex hash, ignoring case and surrounding space
    pub fn verify_hash(&self, expected: &str) -> Result<String, ModelError> {
        let actual = self.hash_hex()?;
        let expected = expected.trim();
        if !actual.eq_ignore_ascii_case(expected) {
            return Err(ModelError::HashMismatch {
                expected: expected.to_string(),
                actual,
            });
        }
        Ok(actual)
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<(), ModelError> {
        fs::write(path, self.to_canonical_json()?)?;
        Ok(())
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let model: Model = serde_json::from_str(&json)?;
        model.validate()?;
        info!(
            path = %path.display(),
            trees = model.num_trees(),
            features = model.num_features(),
            "GBDT model loaded"
        );
        Ok(model)
    }

    /// Load and, when `expected_hash` is given, verify the artifact hash
    pub fn load_verified<P: AsRef<Path>>(
        path: P,
        expected_hash: Option<&str>,
    ) -> Result<Self, ModelError> {
        let model = Self::load_json(path)?;
        if let Some(expected) = expected_hash {
            let hash = model.verify_hash(expected)?;
            info!(hash = %hash, "Model hash verified");
        }
        Ok(model)
    }
}
