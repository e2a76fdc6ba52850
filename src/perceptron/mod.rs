//! Structured perceptron learning over antecedent decisions.
//!
//! Training is mistake-driven and latent: only gold cluster membership is
//! observed, so the target for each instance is the best-scoring candidate
//! among those with the lowest achievable cost.
//!
//! - [`Perceptron`]: the training/decoding contract
//! - [`LatentRankingPerceptron`]: mention ranking with cost-augmented inference
//! - [`TrainingSession`]: owns the mutable weights while training runs
//! - [`Model`]: the immutable result

mod model;
mod ranking;

pub use model::{Model, SCHEMA_VERSION};
pub use ranking::{EpochReport, LatentRankingPerceptron, TrainingSession};

use crate::extractor::Instance;
use crate::{Error, Result};
use anaphor_core::MentionScores;
use serde::{Deserialize, Serialize};

/// Training options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingOptions {
    /// Number of passes over the data.
    pub n_iter: usize,
    /// Weight of the cost term during cost-augmented inference.
    pub cost_scaling: f64,
    /// Seed for shuffling instance order. 32 bits, so every value fits a
    /// TOML integer.
    pub seed: u32,
    /// Step size of each update.
    pub learning_rate: f64,
    /// Return averaged rather than final weights.
    pub averaged: bool,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        Self {
            n_iter: 5,
            cost_scaling: 1.0,
            seed: 23,
            learning_rate: 1.0,
            averaged: true,
        }
    }
}

impl TrainingOptions {
    /// Reject options that cannot train.
    pub fn validate(&self) -> Result<()> {
        if self.n_iter == 0 {
            return Err(Error::config("n_iter must be at least 1"));
        }
        if !self.cost_scaling.is_finite() || self.cost_scaling < 0.0 {
            return Err(Error::config(format!(
                "cost_scaling must be a non-negative number, got {}",
                self.cost_scaling
            )));
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(Error::config(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        Ok(())
    }
}

/// Learns a [`Model`] from instances and scores instances with it.
pub trait Perceptron: Send + Sync {
    /// Registry name.
    fn name(&self) -> &'static str;

    /// Train on per-document instance batches.
    ///
    /// `feature_signature` is recorded in the returned model.
    fn fit(
        &self,
        batches: &[Vec<Instance>],
        options: &TrainingOptions,
        feature_signature: &str,
    ) -> Result<Model>;

    /// Score every candidate of an instance without any cost term.
    fn decode(&self, model: &Model, instance: &Instance) -> MentionScores;
}
