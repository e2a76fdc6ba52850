//! Experiment configuration, loaded from TOML.
//!
//! ```toml
//! clusterer = "best_first"
//!
//! [features]
//! mention = ["type", "gender"]
//! pairwise = ["exact_match", "head_match", "sentence_distance"]
//!
//! [extractor]
//! conjoin_mention_features = true
//! max_antecedents = 50
//!
//! [cost]
//! function = "cost_based_on_consistency"
//! false_new = 1.0
//! false_link = 2.0
//! wrong_link = 2.0
//!
//! [perceptron]
//! name = "mention_ranking"
//! n_iter = 5
//! seed = 23
//! ```
//!
//! Every section and field is optional; missing values take their defaults.

use crate::cost::CostConfig;
use crate::extractor::ExtractorOptions;
use crate::factory::Factory;
use crate::perceptron::TrainingOptions;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Feature lists, evaluated in the given order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Mention feature names.
    pub mention: Vec<String>,
    /// Pairwise feature names.
    pub pairwise: Vec<String>,
}

impl Default for FeatureConfig {
    /// Surface features only, so the defaults work without mention attributes.
    fn default() -> Self {
        Self {
            mention: vec!["length".into()],
            pairwise: vec![
                "exact_match".into(),
                "head_match".into(),
                "token_overlap".into(),
                "sentence_distance".into(),
            ],
        }
    }
}

/// `[cost]` section: the training cost function and its magnitudes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostSection {
    /// Cost function name.
    pub function: String,
    /// See [`CostConfig::false_new`].
    pub false_new: f64,
    /// See [`CostConfig::false_link`].
    pub false_link: f64,
    /// See [`CostConfig::wrong_link`].
    pub wrong_link: f64,
}

impl Default for CostSection {
    fn default() -> Self {
        let magnitudes = CostConfig::default();
        Self {
            function: "cost_based_on_consistency".into(),
            false_new: magnitudes.false_new,
            false_link: magnitudes.false_link,
            wrong_link: magnitudes.wrong_link,
        }
    }
}

impl CostSection {
    /// The cost magnitudes.
    #[must_use]
    pub fn magnitudes(&self) -> CostConfig {
        CostConfig {
            false_new: self.false_new,
            false_link: self.false_link,
            wrong_link: self.wrong_link,
        }
    }
}

/// `[perceptron]` section: learner name and training options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerceptronSection {
    /// Perceptron name.
    pub name: String,
    /// Number of passes over the data.
    pub n_iter: usize,
    /// Weight of the cost term during training.
    pub cost_scaling: f64,
    /// Shuffling seed.
    pub seed: u32,
    /// Update step size.
    pub learning_rate: f64,
    /// Average the weights over all updates.
    pub averaged: bool,
}

impl Default for PerceptronSection {
    fn default() -> Self {
        let options = TrainingOptions::default();
        Self {
            name: "mention_ranking".into(),
            n_iter: options.n_iter,
            cost_scaling: options.cost_scaling,
            seed: options.seed,
            learning_rate: options.learning_rate,
            averaged: options.averaged,
        }
    }
}

impl PerceptronSection {
    /// The training options.
    #[must_use]
    pub fn options(&self) -> TrainingOptions {
        TrainingOptions {
            n_iter: self.n_iter,
            cost_scaling: self.cost_scaling,
            seed: self.seed,
            learning_rate: self.learning_rate,
            averaged: self.averaged,
        }
    }
}

/// Full configuration of a learn/predict run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Clusterer name.
    pub clusterer: String,
    /// Feature lists.
    pub features: FeatureConfig,
    /// Extraction options.
    pub extractor: ExtractorOptions,
    /// Training cost.
    pub cost: CostSection,
    /// Learner.
    pub perceptron: PerceptronSection,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            clusterer: "best_first".into(),
            features: FeatureConfig::default(),
            extractor: ExtractorOptions::default(),
            cost: CostSection::default(),
            perceptron: PerceptronSection::default(),
        }
    }
}

impl ExperimentConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Read a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }

    /// Write as TOML to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Check every option and resolve every name.
    pub fn validate(&self) -> Result<()> {
        Factory::build(self).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_empty_document_gives_defaults() {
        let config = ExperimentConfig::from_toml_str("").unwrap();
        assert_eq!(config, ExperimentConfig::default());
        assert_eq!(config.perceptron.options(), TrainingOptions::default());
        assert_eq!(config.cost.magnitudes(), CostConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_sections() {
        let config = ExperimentConfig::from_toml_str(
            r#"
            clusterer = "closest_first"

            [features]
            mention = ["type"]

            [extractor]
            max_antecedents = 10

            [perceptron]
            n_iter = 3
            seed = 7
            "#,
        )
        .unwrap();
        assert_eq!(config.clusterer, "closest_first");
        assert_eq!(config.features.mention, vec!["type"]);
        assert_eq!(config.features.pairwise, FeatureConfig::default().pairwise);
        assert_eq!(config.extractor.max_antecedents, Some(10));
        assert!(config.extractor.conjoin_mention_features);
        assert_eq!(config.perceptron.n_iter, 3);
        assert_eq!(config.perceptron.seed, 7);
        assert_eq!(config.perceptron.cost_scaling, 1.0);
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = ExperimentConfig::default();
        config.extractor.max_antecedents = Some(5);
        config.perceptron.learning_rate = 0.5;
        let back = ExperimentConfig::from_toml_str(&config.to_toml().unwrap()).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let err = ExperimentConfig::from_toml_str("[perceptron]\nn_iter = \"five\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_validate_rejects_unknown_names() {
        let mut config = ExperimentConfig::default();
        config.features.pairwise.push("telepathy".into());
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = ExperimentConfig::default();
        config.clusterer = "random".into();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_inverted_costs() {
        let mut config = ExperimentConfig::default();
        config.cost.false_new = 3.0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_costs() {
        let config = ExperimentConfig::from_toml_str("[cost]\nwrong_link = 0.0").unwrap();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_largest_seed_round_trips() {
        let mut config = ExperimentConfig::default();
        config.perceptron.seed = u32::MAX;
        let back = ExperimentConfig::from_toml_str(&config.to_toml().unwrap()).unwrap();
        assert_eq!(back.perceptron.seed, u32::MAX);
        assert_eq!(back.perceptron.options().seed, u32::MAX);
    }

    #[test]
    fn test_out_of_range_seed_is_config_error() {
        let err = ExperimentConfig::from_toml_str("[perceptron]\nseed = 4294967296").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
