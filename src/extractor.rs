//! Instance extraction: one decision point per mention.
//!
//! For every system mention, in document order, the extractor builds an
//! [`Instance`] whose candidates are the synthetic new-entity candidate
//! followed by the preceding mentions, nearest first. Each candidate carries
//! its feature vector and its mistake cost under the injected cost function.
//!
//! # Feature layout
//!
//! For a link candidate `(anaphor, antecedent)`:
//!
//! 1. `ana_<f>` for each mention feature of the anaphor
//! 2. `ante_<f>` for each mention feature of the antecedent
//! 3. `ana_<f>^ante_<f>` per feature position (when `conjoin_mention_features`)
//! 4. pairwise features, in configuration order
//! 5. the first mention feature of anaphor, antecedent and their conjunction
//!    crossed with every other entry (when `type_combinations`)
//!
//! The new-entity candidate carries `new^ana_<f>` for each anaphor feature,
//! so anaphor properties can bias the decision to start an entity.

use crate::cost::{CostContext, CostFunction};
use crate::features::{FeatureVector, MentionFeature, PairwiseFeature};
use crate::{Error, Result};
use anaphor_core::{Antecedent, Corpus, Document, Mention, MentionId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

// =============================================================================
// Instances
// =============================================================================

/// The kind of decision a candidate represents; each role has its own prior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Start a new entity.
    NewEntity,
    /// Link to an earlier mention.
    Link,
}

impl Role {
    /// Role of a candidate antecedent.
    #[must_use]
    pub fn of(antecedent: &Antecedent) -> Self {
        if antecedent.is_new_entity() {
            Role::NewEntity
        } else {
            Role::Link
        }
    }

    /// Key under which the role's prior is stored.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::NewEntity => "new",
            Role::Link => "link",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One candidate antecedent of an instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// The candidate antecedent.
    pub antecedent: Antecedent,
    /// Features of the decision.
    pub features: FeatureVector,
    /// Mistake cost of choosing this candidate (0 at prediction time).
    pub cost: f64,
}

impl Candidate {
    /// Role of this candidate.
    #[must_use]
    pub fn role(&self) -> Role {
        Role::of(&self.antecedent)
    }
}

/// A decision point: one mention and its candidate antecedents.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    /// Owning document id.
    pub document: Arc<str>,
    /// The mention being resolved.
    pub mention: MentionId,
    /// New entity first, then preceding mentions nearest first.
    pub candidates: Vec<Candidate>,
}

impl Instance {
    /// Lowest cost over all candidates.
    #[must_use]
    pub fn min_cost(&self) -> f64 {
        self.candidates
            .iter()
            .map(|c| c.cost)
            .fold(f64::INFINITY, f64::min)
    }
}

// =============================================================================
// Extractor
// =============================================================================

/// Extraction options beyond the feature lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorOptions {
    /// Add `ana_x^ante_x` conjunctions of mention features.
    pub conjoin_mention_features: bool,
    /// Cross the first mention feature with every other entry.
    pub type_combinations: bool,
    /// Only consider this many preceding mentions (all when `None`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_antecedents: Option<usize>,
}

impl Default for ExtractorOptions {
    fn default() -> Self {
        Self {
            conjoin_mention_features: true,
            type_combinations: false,
            max_antecedents: None,
        }
    }
}

/// Builds instances and feature vectors from documents.
#[derive(Clone)]
pub struct InstanceExtractor {
    mention_features: Vec<Arc<dyn MentionFeature>>,
    pairwise_features: Vec<Arc<dyn PairwiseFeature>>,
    options: ExtractorOptions,
}

type EncodedFeatures = Vec<Option<(String, f64)>>;

impl InstanceExtractor {
    /// Create an extractor. Feature lists are evaluated in the given order.
    pub fn new(
        mention_features: Vec<Arc<dyn MentionFeature>>,
        pairwise_features: Vec<Arc<dyn PairwiseFeature>>,
        options: ExtractorOptions,
    ) -> Result<Self> {
        let mut seen = std::collections::HashSet::new();
        for name in mention_features
            .iter()
            .map(|f| f.name())
            .chain(pairwise_features.iter().map(|f| f.name()))
        {
            if name.is_empty() || name.contains(['^', '=', ';', ',']) {
                return Err(Error::config(format!("invalid feature name '{}'", name)));
            }
            if !seen.insert(name.to_string()) {
                return Err(Error::config(format!("feature '{}' listed twice", name)));
            }
        }
        if options.max_antecedents == Some(0) {
            return Err(Error::config("max_antecedents must be at least 1"));
        }
        Ok(Self {
            mention_features,
            pairwise_features,
            options,
        })
    }

    /// Extraction options.
    #[must_use]
    pub fn options(&self) -> &ExtractorOptions {
        &self.options
    }

    /// Deterministic description of the feature space.
    ///
    /// Two extractors with equal signatures produce identical feature
    /// identifiers for identical input.
    #[must_use]
    pub fn signature(&self) -> String {
        let mention: Vec<&str> = self.mention_features.iter().map(|f| f.name()).collect();
        let pairwise: Vec<&str> = self.pairwise_features.iter().map(|f| f.name()).collect();
        format!(
            "mention=[{}];pairwise=[{}];conjoin={};combinations={}",
            mention.join(","),
            pairwise.join(","),
            self.options.conjoin_mention_features,
            self.options.type_combinations,
        )
    }

    /// Extract one instance per system mention of `document`.
    pub fn extract(&self, document: &Document, cost: &dyn CostFunction) -> Result<Vec<Instance>> {
        let doc_id: Arc<str> = Arc::from(document.id.as_str());
        let mentions = &document.system_mentions;

        let cache = mentions
            .iter()
            .map(|m| self.mention_features_of(m))
            .collect::<Result<Vec<_>>>()
            .map_err(|e| with_context(e, &document.id))?;

        let mut instances = Vec::with_capacity(mentions.len());
        for (i, anaphor) in mentions.iter().enumerate() {
            let window = self.options.max_antecedents.unwrap_or(i).min(i);
            let antecedents: Vec<usize> = (i - window..i).rev().collect();

            let has_gold_antecedent = antecedents
                .iter()
                .any(|&j| anaphor.is_coreferent_with(&mentions[j]));

            let mut candidates = Vec::with_capacity(antecedents.len() + 1);
            candidates.push(Candidate {
                antecedent: Antecedent::NewEntity,
                features: self.new_entity_features(&cache[i]),
                cost: checked_cost(cost, &CostContext {
                    anaphor,
                    antecedent: None,
                    has_gold_antecedent,
                })?,
            });

            for &j in &antecedents {
                let antecedent = &mentions[j];
                let features = self
                    .link_features(anaphor, antecedent, &cache[i], &cache[j])
                    .map_err(|e| with_context(e, &document.id))?;
                candidates.push(Candidate {
                    antecedent: Antecedent::Mention(MentionId(j)),
                    features,
                    cost: checked_cost(cost, &CostContext {
                        anaphor,
                        antecedent: Some(antecedent),
                        has_gold_antecedent,
                    })?,
                });
            }

            let instance = Instance {
                document: Arc::clone(&doc_id),
                mention: MentionId(i),
                candidates,
            };
            if instance.min_cost() != 0.0 {
                return Err(Error::config(format!(
                    "cost function '{}' leaves {}/{} without a zero-cost candidate",
                    cost.name(),
                    document.id,
                    instance.mention
                )));
            }
            instances.push(instance);
        }

        log::debug!(
            "{}: {} instances, {} candidates",
            document.id,
            instances.len(),
            instances.iter().map(|i| i.candidates.len()).sum::<usize>()
        );
        Ok(instances)
    }

    /// Extract instances for every document, in corpus order.
    ///
    /// Documents are extracted in parallel. If several documents fail, which
    /// error is returned is unspecified.
    pub fn extract_corpus(
        &self,
        corpus: &Corpus,
        cost: &dyn CostFunction,
    ) -> Result<Vec<Vec<Instance>>> {
        use rayon::prelude::*;

        corpus
            .documents
            .par_iter()
            .map(|doc| self.extract(doc, cost))
            .collect()
    }

    fn mention_features_of(&self, mention: &Mention) -> Result<EncodedFeatures> {
        self.mention_features
            .iter()
            .map(|f| match f.compute(mention)? {
                Some(value) => value.encode(f.name()),
                None => Ok(None),
            })
            .collect()
    }

    fn new_entity_features(&self, anaphor: &EncodedFeatures) -> FeatureVector {
        let mut fv = FeatureVector::new();
        for (id, v) in anaphor.iter().flatten() {
            fv.push(format!("new^ana_{}", id), *v);
        }
        fv
    }

    fn link_features(
        &self,
        anaphor: &Mention,
        antecedent: &Mention,
        ana: &EncodedFeatures,
        ante: &EncodedFeatures,
    ) -> Result<FeatureVector> {
        let mut entries: Vec<(String, f64)> = Vec::new();
        let mut anchors: Vec<usize> = Vec::new();

        let first_ana = ana.first().and_then(Option::as_ref);
        let first_ante = ante.first().and_then(Option::as_ref);

        for (k, (id, v)) in ana.iter().flatten().enumerate() {
            if k == 0 && first_ana.is_some() {
                anchors.push(entries.len());
            }
            entries.push((format!("ana_{}", id), *v));
        }
        for (k, (id, v)) in ante.iter().flatten().enumerate() {
            if k == 0 && first_ante.is_some() {
                anchors.push(entries.len());
            }
            entries.push((format!("ante_{}", id), *v));
        }
        if self.options.conjoin_mention_features {
            for (pos, (a, b)) in ana.iter().zip(ante).enumerate() {
                if let (Some((ida, va)), Some((idb, vb))) = (a, b) {
                    if pos == 0 {
                        anchors.push(entries.len());
                    }
                    entries.push((format!("ana_{}^ante_{}", ida, idb), va * vb));
                }
            }
        }
        for feature in &self.pairwise_features {
            if let Some(value) = feature.compute(anaphor, antecedent)? {
                if let Some(entry) = value.encode(feature.name())? {
                    entries.push(entry);
                }
            }
        }
        if self.options.type_combinations {
            let mut combined = Vec::new();
            for &a in &anchors {
                for (j, (id, v)) in entries.iter().enumerate() {
                    if !anchors.contains(&j) {
                        combined.push((format!("{}^{}", entries[a].0, id), entries[a].1 * v));
                    }
                }
            }
            entries.extend(combined);
        }

        let mut fv = FeatureVector::new();
        for (id, v) in entries {
            fv.push(id, v);
        }
        Ok(fv)
    }
}

impl fmt::Debug for InstanceExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceExtractor")
            .field("signature", &self.signature())
            .finish()
    }
}

fn checked_cost(cost: &dyn CostFunction, ctx: &CostContext<'_>) -> Result<f64> {
    let value = cost.cost(ctx);
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(Error::config(format!(
            "cost function '{}' returned {} for {}",
            cost.name(),
            value,
            ctx.anaphor
        )))
    }
}

fn with_context(err: Error, document: &str) -> Error {
    match err {
        Error::Data(msg) => Error::Data(format!("document '{}': {}", document, msg)),
        Error::Config(msg) => Error::Config(format!("document '{}': {}", document, msg)),
        other => other,
    }
}
