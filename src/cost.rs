//! Mistake costs for cost-augmented training.
//!
//! A cost function scores how bad it would be to pick a candidate, relative
//! to the gold clusters. Costs are non-negative and at least one candidate of
//! every instance costs 0. At prediction time the [`NullCost`] is used.

use crate::{Error, Result};
use anaphor_core::Mention;
use serde::{Deserialize, Serialize};

/// What a cost function may look at for one candidate.
#[derive(Debug, Clone, Copy)]
pub struct CostContext<'a> {
    /// The mention being resolved.
    pub anaphor: &'a Mention,
    /// The candidate antecedent, or `None` for the new-entity candidate.
    pub antecedent: Option<&'a Mention>,
    /// Whether any candidate antecedent shares the anaphor's gold cluster.
    pub has_gold_antecedent: bool,
}

impl CostContext<'_> {
    /// Whether choosing this candidate agrees with the gold clusters.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        match self.antecedent {
            None => !self.has_gold_antecedent,
            Some(antecedent) => self.anaphor.is_coreferent_with(antecedent),
        }
    }
}

/// Assigns a mistake cost to a candidate decision.
pub trait CostFunction: Send + Sync {
    /// Registry name.
    fn name(&self) -> &'static str;

    /// Cost of choosing the candidate described by `ctx`.
    fn cost(&self, ctx: &CostContext<'_>) -> f64;
}

/// Cost magnitudes for the three kinds of mistakes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostConfig {
    /// Starting a new entity although a gold antecedent exists.
    pub false_new: f64,
    /// Linking a mention that should start a new entity.
    pub false_link: f64,
    /// Linking to the wrong cluster although a gold antecedent exists.
    pub wrong_link: f64,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            false_new: 1.0,
            false_link: 2.0,
            wrong_link: 2.0,
        }
    }
}

impl CostConfig {
    /// Check magnitudes: finite, strictly positive, and false links costlier than false new.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("false_new", self.false_new),
            ("false_link", self.false_link),
            ("wrong_link", self.wrong_link),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::config(format!(
                    "cost.{} must be a positive number, got {}",
                    name, value
                )));
            }
        }
        if self.false_link <= self.false_new {
            return Err(Error::config(format!(
                "cost.false_link ({}) must exceed cost.false_new ({})",
                self.false_link, self.false_new
            )));
        }
        Ok(())
    }
}

/// Zero for decisions consistent with the gold clusters, a configured
/// penalty otherwise.
#[derive(Debug, Clone, Default)]
pub struct ConsistencyCost {
    config: CostConfig,
}

impl ConsistencyCost {
    /// Create with the given magnitudes.
    #[must_use]
    pub fn new(config: CostConfig) -> Self {
        Self { config }
    }

    /// The configured magnitudes.
    #[must_use]
    pub fn config(&self) -> &CostConfig {
        &self.config
    }
}

impl CostFunction for ConsistencyCost {
    fn name(&self) -> &'static str {
        "cost_based_on_consistency"
    }

    fn cost(&self, ctx: &CostContext<'_>) -> f64 {
        if ctx.is_consistent() {
            0.0
        } else if ctx.antecedent.is_none() {
            self.config.false_new
        } else if ctx.has_gold_antecedent {
            self.config.wrong_link
        } else {
            self.config.false_link
        }
    }
}

/// Zero everywhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCost;

impl CostFunction for NullCost {
    fn name(&self) -> &'static str {
        "null"
    }

    fn cost(&self, _ctx: &CostContext<'_>) -> f64 {
        0.0
    }
}
