//! The persisted model: role priors plus feature weights.

use crate::extractor::{Candidate, Role};
use crate::features::FeatureVector;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Version of the on-disk model layout.
pub const SCHEMA_VERSION: u32 = 1;

/// A trained scoring model.
///
/// Immutable once training has finished; the only artifact shared between
/// a training run and a prediction run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    /// Layout version, checked on load.
    pub schema_version: u32,
    /// Signature of the extractor the model was trained with.
    pub feature_signature: String,
    /// Bias per decision role (`new`, `link`).
    pub priors: BTreeMap<String, f64>,
    /// Weight per feature identifier; absent features weigh 0.
    pub weights: BTreeMap<String, f64>,
}

impl Model {
    /// A zero model for the given feature signature.
    #[must_use]
    pub fn new(feature_signature: impl Into<String>) -> Self {
        let priors = [Role::NewEntity, Role::Link]
            .iter()
            .map(|r| (r.as_str().to_string(), 0.0))
            .collect();
        Self {
            schema_version: SCHEMA_VERSION,
            feature_signature: feature_signature.into(),
            priors,
            weights: BTreeMap::new(),
        }
    }

    /// Prior of a role.
    #[must_use]
    pub fn prior(&self, role: Role) -> f64 {
        self.priors.get(role.as_str()).copied().unwrap_or(0.0)
    }

    /// Weight of a feature.
    #[must_use]
    pub fn weight(&self, id: &str) -> f64 {
        self.weights.get(id).copied().unwrap_or(0.0)
    }

    /// Dot product of the weights with a feature vector.
    #[must_use]
    pub fn dot(&self, features: &FeatureVector) -> f64 {
        features.iter().map(|(id, v)| self.weight(id) * v).sum()
    }

    /// Model score of a candidate: prior of its role plus the dot product.
    #[must_use]
    pub fn score(&self, candidate: &Candidate) -> f64 {
        self.prior(candidate.role()) + self.dot(&candidate.features)
    }

    /// Fail unless the model matches this schema version and `signature`.
    pub fn check_compatible(&self, signature: &str) -> Result<()> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(Error::model_mismatch(format!(
                "model schema version {} (expected {})",
                self.schema_version, SCHEMA_VERSION
            )));
        }
        if self.feature_signature != signature {
            return Err(Error::model_mismatch(format!(
                "model trained with '{}', extractor uses '{}'",
                self.feature_signature, signature
            )));
        }
        Ok(())
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse from JSON, rejecting unknown schema versions.
    pub fn from_json(json: &str) -> Result<Self> {
        let model: Model = serde_json::from_str(json)?;
        if model.schema_version != SCHEMA_VERSION {
            return Err(Error::model_mismatch(format!(
                "unsupported model schema version {}",
                model.schema_version
            )));
        }
        Ok(model)
    }

    /// Write the model to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Read a model from `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anaphor_core::Antecedent;

    #[test]
    fn test_score_adds_prior_and_weights() {
        let mut model = Model::new("sig");
        model.priors.insert("link".into(), 0.5);
        model.weights.insert("exact_match".into(), 2.0);
        model.weights.insert("overlap".into(), -1.0);

        let mut features = FeatureVector::new();
        features.push("exact_match", 1.0);
        features.push("overlap", 0.25);
        features.push("unseen", 3.0);
        let candidate = Candidate {
            antecedent: Antecedent::Mention(anaphor_core::MentionId(0)),
            features,
            cost: 0.0,
        };
        assert!((model.score(&candidate) - 2.25).abs() < 1e-12);
    }

    #[test]
    fn test_json_round_trip_is_lossless() {
        let mut model = Model::new("mention=[];pairwise=[exact_match]");
        model.priors.insert("new".into(), -0.1 + 0.2);
        model.weights.insert("a".into(), 1.0 / 3.0);
        model.weights.insert("b".into(), -7.123456789012345e-9);
        let back = Model::from_json(&model.to_json().unwrap()).unwrap();
        assert_eq!(back, model);
    }

    #[test]
    fn test_signature_mismatch() {
        let model = Model::new("a");
        assert!(model.check_compatible("a").is_ok());
        assert!(matches!(model.check_compatible("b"), Err(Error::ModelMismatch(_))));
    }

    #[test]
    fn test_rejects_unknown_schema_version() {
        let mut model = Model::new("a");
        model.schema_version = 99;
        let json = serde_json::to_string(&model).unwrap();
        assert!(matches!(Model::from_json(&json), Err(Error::ModelMismatch(_))));
    }
}
