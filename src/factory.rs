//! Name-based construction of pipeline components.
//!
//! Configuration refers to features, cost functions, perceptrons and
//! clusterers by name. Names are matched case-insensitively; unknown names
//! are configuration errors, raised before any corpus is touched.

use crate::config::ExperimentConfig;
use crate::cost::{ConsistencyCost, CostConfig, CostFunction, NullCost};
use crate::experiment::Experiment;
use crate::extractor::InstanceExtractor;
use crate::features::{
    builtin_mention, builtin_pairwise, MentionFeature, PairwiseFeature, BUILTIN_MENTION,
    BUILTIN_PAIRWISE,
};
use crate::perceptron::{LatentRankingPerceptron, Perceptron};
use crate::{Error, Result};
use anaphor_cluster::{BestFirst, ClosestFirst, Clusterer};
use std::sync::Arc;

/// Factory for pipeline components.
pub struct Factory;

impl Factory {
    /// A built-in mention feature.
    pub fn mention_feature(name: &str) -> Result<Arc<dyn MentionFeature>> {
        builtin_mention(&name.to_lowercase()).ok_or_else(|| {
            Error::config(format!(
                "unknown mention feature '{}'. Available: {}",
                name,
                BUILTIN_MENTION.join(", ")
            ))
        })
    }

    /// A built-in pairwise feature.
    pub fn pairwise_feature(name: &str) -> Result<Arc<dyn PairwiseFeature>> {
        builtin_pairwise(&name.to_lowercase()).ok_or_else(|| {
            Error::config(format!(
                "unknown pairwise feature '{}'. Available: {}",
                name,
                BUILTIN_PAIRWISE.join(", ")
            ))
        })
    }

    /// A cost function.
    ///
    /// - `cost_based_on_consistency` / `consistency`
    /// - `null`
    pub fn cost_function(name: &str, config: &CostConfig) -> Result<Box<dyn CostFunction>> {
        match name.to_lowercase().as_str() {
            "cost_based_on_consistency" | "consistency" => {
                config.validate()?;
                Ok(Box::new(ConsistencyCost::new(config.clone())))
            }
            "null" => Ok(Box::new(NullCost)),
            _ => Err(Error::config(format!(
                "unknown cost function '{}'. Available: cost_based_on_consistency, null",
                name
            ))),
        }
    }

    /// A perceptron.
    ///
    /// - `mention_ranking` / `ranking`
    pub fn perceptron(name: &str) -> Result<Box<dyn Perceptron>> {
        match name.to_lowercase().as_str() {
            "mention_ranking" | "ranking" => Ok(Box::new(LatentRankingPerceptron::new())),
            _ => Err(Error::config(format!(
                "unknown perceptron '{}'. Available: mention_ranking",
                name
            ))),
        }
    }

    /// A clusterer.
    ///
    /// - `best_first` / `best`
    /// - `closest_first` / `closest`
    pub fn clusterer(name: &str) -> Result<Box<dyn Clusterer>> {
        match name.to_lowercase().as_str() {
            "best_first" | "best" => Ok(Box::new(BestFirst::new())),
            "closest_first" | "closest" => Ok(Box::new(ClosestFirst::new())),
            _ => Err(Error::config(format!(
                "unknown clusterer '{}'. Available: best_first, closest_first",
                name
            ))),
        }
    }

    /// Resolve a full configuration into a ready [`Experiment`].
    pub fn build(config: &ExperimentConfig) -> Result<Experiment> {
        let mention = config
            .features
            .mention
            .iter()
            .map(|n| Self::mention_feature(n))
            .collect::<Result<Vec<_>>>()?;
        let pairwise = config
            .features
            .pairwise
            .iter()
            .map(|n| Self::pairwise_feature(n))
            .collect::<Result<Vec<_>>>()?;
        let extractor = InstanceExtractor::new(mention, pairwise, config.extractor.clone())?;

        let magnitudes = config.cost.magnitudes();
        magnitudes.validate()?;
        let cost = Self::cost_function(&config.cost.function, &magnitudes)?;

        let options = config.perceptron.options();
        options.validate()?;
        let perceptron = Self::perceptron(&config.perceptron.name)?;
        let clusterer = Self::clusterer(&config.clusterer)?;

        log::debug!(
            "built experiment: {} / {} / {} / {}",
            extractor.signature(),
            cost.name(),
            perceptron.name(),
            clusterer.name()
        );
        Ok(Experiment::new(extractor, cost, perceptron, clusterer, options))
    }
}
