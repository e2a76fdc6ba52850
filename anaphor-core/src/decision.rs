//! Antecedent decisions and the mappings built from them.
//!
//! The decoder produces one [`MentionScores`] per mention; a clusterer turns a
//! document's worth of them into an [`AntecedentMapping`] and an
//! [`EntityMapping`].

use crate::{Error, MentionId, MentionKey, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// =============================================================================
// Antecedent
// =============================================================================

/// A candidate antecedent: an earlier mention, or the start of a new entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Antecedent {
    /// The mention starts a new entity.
    NewEntity,
    /// The mention links to this earlier mention.
    Mention(MentionId),
}

impl Antecedent {
    /// Check if this is the synthetic new-entity candidate.
    #[must_use]
    pub fn is_new_entity(&self) -> bool {
        matches!(self, Antecedent::NewEntity)
    }

    /// The linked mention, if any.
    #[must_use]
    pub fn mention(&self) -> Option<MentionId> {
        match self {
            Antecedent::NewEntity => None,
            Antecedent::Mention(id) => Some(*id),
        }
    }

    /// Tie-break rank relative to `anaphor`, lower wins.
    ///
    /// Preceding mentions rank by distance. The new entity stands before the
    /// first mention of the document, so it ranks behind every antecedent.
    /// Mentions that do not precede `anaphor` rank last.
    fn tie_rank(&self, anaphor: MentionId) -> usize {
        match self {
            Antecedent::NewEntity => usize::MAX - 1,
            Antecedent::Mention(id) if id.index() < anaphor.index() => {
                anaphor.index() - id.index()
            }
            Antecedent::Mention(_) => usize::MAX,
        }
    }
}

impl fmt::Display for Antecedent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Antecedent::NewEntity => f.write_str("-"),
            Antecedent::Mention(id) => write!(f, "{}", id),
        }
    }
}

// =============================================================================
// Scores
// =============================================================================

/// A candidate antecedent with its model score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    /// The candidate.
    pub antecedent: Antecedent,
    /// Model score (higher is better).
    pub score: f64,
}

impl ScoredCandidate {
    /// Create a scored candidate.
    #[must_use]
    pub fn new(antecedent: Antecedent, score: f64) -> Self {
        Self { antecedent, score }
    }
}

/// All scored candidates for one mention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MentionScores {
    /// The mention being resolved.
    pub mention: MentionId,
    /// Scored candidates, in extraction order.
    pub candidates: Vec<ScoredCandidate>,
}

impl MentionScores {
    /// Create scores for a mention.
    #[must_use]
    pub fn new(mention: MentionId, candidates: Vec<ScoredCandidate>) -> Self {
        Self {
            mention,
            candidates,
        }
    }

    /// Index of the best candidate.
    ///
    /// Highest score wins. Equal scores prefer the antecedent nearest to the
    /// mention, then the new-entity candidate, then the lower candidate index.
    /// Returns `None` only when there are no candidates.
    #[must_use]
    pub fn best_index(&self) -> Option<usize> {
        let anaphor = self.mention;
        let mut best: Option<usize> = None;
        for (i, cand) in self.candidates.iter().enumerate() {
            best = match best {
                None => Some(i),
                Some(b) => {
                    let current = &self.candidates[b];
                    // `==` so that 0.0 and -0.0 tie
                    let better = if cand.score == current.score {
                        cand.antecedent.tie_rank(anaphor) < current.antecedent.tie_rank(anaphor)
                    } else {
                        cand.score > current.score
                    };
                    if better {
                        Some(i)
                    } else {
                        Some(b)
                    }
                }
            };
        }
        best
    }

    /// The best antecedent; a mention without candidates starts a new entity.
    #[must_use]
    pub fn best(&self) -> Antecedent {
        self.best_index()
            .map(|i| self.candidates[i].antecedent)
            .unwrap_or(Antecedent::NewEntity)
    }

    /// Score of the new-entity candidate, if present.
    #[must_use]
    pub fn new_entity_score(&self) -> Option<f64> {
        self.candidates
            .iter()
            .find(|c| c.antecedent.is_new_entity())
            .map(|c| c.score)
    }
}

// =============================================================================
// Mappings
// =============================================================================

/// Identifier of a predicted entity: the document plus a per-document index.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId {
    /// Owning document.
    pub document: String,
    /// Index within the document, numbered by first mention.
    pub index: usize,
}

impl EntityId {
    /// Create an entity id.
    #[must_use]
    pub fn new(document: impl Into<String>, index: usize) -> Self {
        Self {
            document: document.into(),
            index,
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.document, self.index)
    }
}

/// The chosen antecedent of every mention.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AntecedentMapping {
    decisions: BTreeMap<MentionKey, Antecedent>,
}

impl AntecedentMapping {
    /// Create an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a decision.
    pub fn insert(&mut self, key: MentionKey, antecedent: Antecedent) {
        self.decisions.insert(key, antecedent);
    }

    /// The decision for a mention.
    #[must_use]
    pub fn get(&self, key: &MentionKey) -> Option<Antecedent> {
        self.decisions.get(key).copied()
    }

    /// Iterate in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&MentionKey, &Antecedent)> {
        self.decisions.iter()
    }

    /// Number of decisions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    /// Check if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }

    /// Merge another mapping; keys must not overlap.
    pub fn extend(&mut self, other: AntecedentMapping) -> Result<()> {
        for (key, antecedent) in other.decisions {
            if self.decisions.insert(key.clone(), antecedent).is_some() {
                return Err(Error::invalid_input(format!(
                    "duplicate antecedent decision for {}",
                    key
                )));
            }
        }
        Ok(())
    }
}

/// The entity of every mention; a partition of the mentions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMapping {
    entities: BTreeMap<MentionKey, EntityId>,
}

impl EntityMapping {
    /// Create an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a mention to an entity.
    pub fn insert(&mut self, key: MentionKey, entity: EntityId) {
        self.entities.insert(key, entity);
    }

    /// The entity of a mention.
    #[must_use]
    pub fn get(&self, key: &MentionKey) -> Option<&EntityId> {
        self.entities.get(key)
    }

    /// Iterate in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&MentionKey, &EntityId)> {
        self.entities.iter()
    }

    /// Number of mentions covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Check if two mentions share an entity.
    #[must_use]
    pub fn same_entity(&self, a: &MentionKey, b: &MentionKey) -> bool {
        match (self.entities.get(a), self.entities.get(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }

    /// Group mentions by entity. Members are in mention order.
    #[must_use]
    pub fn clusters(&self) -> BTreeMap<EntityId, Vec<MentionKey>> {
        let mut clusters: BTreeMap<EntityId, Vec<MentionKey>> = BTreeMap::new();
        for (key, entity) in &self.entities {
            clusters.entry(entity.clone()).or_default().push(key.clone());
        }
        clusters
    }

    /// Merge another mapping; keys must not overlap.
    pub fn extend(&mut self, other: EntityMapping) -> Result<()> {
        for (key, entity) in other.entities {
            if self.entities.insert(key.clone(), entity).is_some() {
                return Err(Error::invalid_input(format!(
                    "mention {} assigned to two entities",
                    key
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cand(antecedent: Antecedent, score: f64) -> ScoredCandidate {
        ScoredCandidate::new(antecedent, score)
    }

    #[test]
    fn test_best_picks_highest_score() {
        let scores = MentionScores::new(MentionId(3), vec![
            cand(Antecedent::NewEntity, 0.5),
            cand(Antecedent::Mention(MentionId(2)), 0.1),
            cand(Antecedent::Mention(MentionId(0)), 2.0),
        ]);
        assert_eq!(scores.best(), Antecedent::Mention(MentionId(0)));
        assert_eq!(scores.best_index(), Some(2));
    }

    #[test]
    fn test_tie_prefers_nearest_antecedent() {
        // candidates deliberately listed farthest-first
        let scores = MentionScores::new(MentionId(5), vec![
            cand(Antecedent::NewEntity, -1.0),
            cand(Antecedent::Mention(MentionId(1)), 1.0),
            cand(Antecedent::Mention(MentionId(4)), 1.0),
            cand(Antecedent::Mention(MentionId(3)), 1.0),
        ]);
        assert_eq!(scores.best(), Antecedent::Mention(MentionId(4)));
    }

    #[test]
    fn test_tie_with_new_entity_prefers_antecedent() {
        let scores = MentionScores::new(MentionId(1), vec![
            cand(Antecedent::NewEntity, 0.0),
            cand(Antecedent::Mention(MentionId(0)), 0.0),
        ]);
        assert_eq!(scores.best(), Antecedent::Mention(MentionId(0)));

        // even the farthest antecedent beats starting a new entity
        let scores = MentionScores::new(MentionId(9), vec![
            cand(Antecedent::NewEntity, 1.0),
            cand(Antecedent::Mention(MentionId(0)), 1.0),
        ]);
        assert_eq!(scores.best(), Antecedent::Mention(MentionId(0)));
    }

    #[test]
    fn test_tie_ranks_forward_candidates_last() {
        let scores = MentionScores::new(MentionId(1), vec![
            cand(Antecedent::Mention(MentionId(2)), 0.0),
            cand(Antecedent::Mention(MentionId(1)), 0.0),
            cand(Antecedent::NewEntity, 0.0),
        ]);
        assert_eq!(scores.best(), Antecedent::NewEntity);
    }

    #[test]
    fn test_no_candidates_is_new_entity() {
        let scores = MentionScores::new(MentionId(0), vec![]);
        assert_eq!(scores.best_index(), None);
        assert_eq!(scores.best(), Antecedent::NewEntity);
    }

    #[test]
    fn test_entity_mapping_extend_rejects_overlap() {
        let key = MentionKey::new("d", MentionId(0));
        let mut a = EntityMapping::new();
        a.insert(key.clone(), EntityId::new("d", 0));
        let mut b = EntityMapping::new();
        b.insert(key, EntityId::new("d", 1));
        assert!(a.extend(b).is_err());
    }

    #[test]
    fn test_clusters_group_members() {
        let mut mapping = EntityMapping::new();
        for (m, e) in [(0, 0), (1, 1), (2, 0)] {
            mapping.insert(MentionKey::new("d", MentionId(m)), EntityId::new("d", e));
        }
        let clusters = mapping.clusters();
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[&EntityId::new("d", 0)].len(), 2);
        assert!(mapping.same_entity(
            &MentionKey::new("d", MentionId(0)),
            &MentionKey::new("d", MentionId(2))
        ));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn best_has_maximal_score(scores in prop::collection::vec(-4i32..4, 1..10)) {
            let n = scores.len();
            let candidates: Vec<ScoredCandidate> = scores
                .iter()
                .enumerate()
                .map(|(k, &s)| {
                    let antecedent = if k == 0 {
                        Antecedent::NewEntity
                    } else {
                        Antecedent::Mention(MentionId(n - k))
                    };
                    ScoredCandidate::new(antecedent, f64::from(s))
                })
                .collect();
            let ms = MentionScores::new(MentionId(n), candidates);
            let best = ms.best_index().unwrap();
            let max = scores.iter().max().copied().unwrap();
            prop_assert_eq!(scores[best], max);
            // antecedents are nearest first; the new entity (index 0) only wins alone
            let expected = scores
                .iter()
                .skip(1)
                .position(|&s| s == max)
                .map_or(0, |p| p + 1);
            prop_assert_eq!(best, expected);
        }
    }
}
