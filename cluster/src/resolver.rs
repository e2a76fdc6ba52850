//! Antecedent selection and transitive closure into entities.

use anaphor_core::{
    Antecedent, AntecedentMapping, EntityId, EntityMapping, Error, MentionId, MentionKey,
    MentionScores, Result,
};
use std::collections::HashMap;

// =============================================================================
// Disjoint set
// =============================================================================

/// Union-find over `0..n` with path compression and union by rank.
///
/// Ties in rank attach the later element to the earlier one, so the
/// representative of a fresh pair is always its first member.
#[derive(Debug, Clone)]
pub struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSet {
    /// Create `n` singleton sets.
    #[must_use]
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    /// Check if there are no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Representative of `i`'s set.
    pub fn find(&mut self, i: usize) -> usize {
        let mut root = i;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut node = i;
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }
        root
    }

    /// Merge the sets of `i` and `j`. Returns false if already merged.
    pub fn union(&mut self, i: usize, j: usize) -> bool {
        let (a, b) = (self.find(i), self.find(j));
        if a == b {
            return false;
        }
        let (keep, attach) = match self.rank[a].cmp(&self.rank[b]) {
            std::cmp::Ordering::Less => (b, a),
            std::cmp::Ordering::Greater => (a, b),
            std::cmp::Ordering::Equal => {
                let (keep, attach) = if a < b { (a, b) } else { (b, a) };
                self.rank[keep] += 1;
                (keep, attach)
            }
        };
        self.parent[attach] = keep;
        true
    }

    /// Check if `i` and `j` are in the same set.
    pub fn connected(&mut self, i: usize, j: usize) -> bool {
        self.find(i) == self.find(j)
    }
}

// =============================================================================
// Clusterer
// =============================================================================

/// Turns per-mention antecedent scores into a partition of mentions.
///
/// Implementors only choose an antecedent per mention; `cluster` takes the
/// transitive closure, so every variant yields a partition in which each
/// mention shares an entity with its chosen antecedent.
pub trait Clusterer: Send + Sync {
    /// Registry name of this clusterer.
    fn name(&self) -> &'static str;

    /// Pick the antecedent for one mention.
    fn choose(&self, scores: &MentionScores) -> Antecedent;

    /// Cluster one document.
    ///
    /// `scores` must hold one entry per system mention, in document order.
    /// Entities are numbered by their first mention.
    fn cluster(
        &self,
        document: &str,
        scores: &[MentionScores],
    ) -> Result<(EntityMapping, AntecedentMapping)> {
        let mut sets = DisjointSet::new(scores.len());
        let mut antecedents = AntecedentMapping::new();

        for (i, mention_scores) in scores.iter().enumerate() {
            if mention_scores.mention != MentionId(i) {
                return Err(Error::invalid_input(format!(
                    "document '{}': scores for {} found at position {}",
                    document, mention_scores.mention, i
                )));
            }
            let choice = self.choose(mention_scores);
            if let Antecedent::Mention(ante) = choice {
                if ante.index() >= i {
                    return Err(Error::invalid_input(format!(
                        "document '{}': antecedent {} does not precede m{}",
                        document, ante, i
                    )));
                }
                sets.union(ante.index(), i);
            }
            antecedents.insert(MentionKey::new(document, MentionId(i)), choice);
        }

        let mut numbering: HashMap<usize, usize> = HashMap::new();
        let mut entities = EntityMapping::new();
        for i in 0..scores.len() {
            let root = sets.find(i);
            let next = numbering.len();
            let index = *numbering.entry(root).or_insert(next);
            entities.insert(
                MentionKey::new(document, MentionId(i)),
                EntityId::new(document, index),
            );
        }

        log::debug!(
            "[{}] {}: {} mentions in {} entities",
            self.name(),
            document,
            scores.len(),
            numbering.len()
        );

        Ok((entities, antecedents))
    }
}

/// Link each mention to its highest-scoring candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct BestFirst;

impl BestFirst {
    /// Create a best-first clusterer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Clusterer for BestFirst {
    fn name(&self) -> &'static str {
        "best_first"
    }

    fn choose(&self, scores: &MentionScores) -> Antecedent {
        scores.best()
    }
}

/// Link each mention to the nearest candidate that beats starting a new entity.
///
/// A candidate qualifies when its score is strictly greater than the
/// new-entity score; without a new-entity candidate the threshold is 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClosestFirst;

impl ClosestFirst {
    /// Create a closest-first clusterer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Clusterer for ClosestFirst {
    fn name(&self) -> &'static str {
        "closest_first"
    }

    fn choose(&self, scores: &MentionScores) -> Antecedent {
        let threshold = scores.new_entity_score().unwrap_or(0.0);
        scores
            .candidates
            .iter()
            .filter(|c| c.score > threshold)
            .filter_map(|c| c.antecedent.mention())
            .max()
            .map(Antecedent::Mention)
            .unwrap_or(Antecedent::NewEntity)
    }
}
