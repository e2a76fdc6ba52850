//! Documents and corpora.
//!
//! A document owns two parallel mention sets: the gold `annotated_mentions`
//! and the detected `system_mentions`. Only system mentions take part in
//! training and prediction; gold mentions are read, never mutated.

use crate::{Error, Mention, MentionId, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;

/// A document: tokenized sentences plus gold and system mentions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier within the corpus.
    pub id: String,
    /// Tokens, grouped by sentence.
    #[serde(default)]
    pub sentences: Vec<Vec<String>>,
    /// Gold mentions.
    #[serde(default)]
    pub annotated_mentions: Vec<Mention>,
    /// Detected mentions, in document order.
    #[serde(default)]
    pub system_mentions: Vec<Mention>,
}

impl Document {
    /// Create an empty document.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            sentences: Vec::new(),
            annotated_mentions: Vec::new(),
            system_mentions: Vec::new(),
        }
    }

    /// Set the tokenized sentences.
    #[must_use]
    pub fn with_sentences(mut self, sentences: Vec<Vec<String>>) -> Self {
        self.sentences = sentences;
        self
    }

    /// Set the gold mentions.
    #[must_use]
    pub fn with_annotated_mentions(mut self, mentions: Vec<Mention>) -> Self {
        self.annotated_mentions = mentions;
        self
    }

    /// Set the system mentions.
    #[must_use]
    pub fn with_system_mentions(mut self, mentions: Vec<Mention>) -> Self {
        self.system_mentions = mentions;
        self
    }

    /// Use the gold mentions as system mentions (training on gold boundaries).
    #[must_use]
    pub fn with_gold_as_system(mut self) -> Self {
        self.system_mentions = self.annotated_mentions.clone();
        self
    }

    /// Get a system mention by id.
    pub fn mention(&self, id: MentionId) -> Result<&Mention> {
        self.system_mentions.get(id.index()).ok_or_else(|| {
            Error::invalid_input(format!(
                "document '{}' has no mention {} ({} system mentions)",
                self.id,
                id,
                self.system_mentions.len()
            ))
        })
    }

    /// Ids of all system mentions, in document order.
    pub fn mention_ids(&self) -> impl Iterator<Item = MentionId> {
        (0..self.system_mentions.len()).map(MentionId)
    }

    /// Number of tokens over all sentences.
    #[must_use]
    pub fn token_count(&self) -> usize {
        self.sentences.iter().map(Vec::len).sum()
    }

    /// Copy gold cluster ids onto system mentions with a matching span.
    ///
    /// System mentions without an exact gold match get `None`. Returns the
    /// number of system mentions that received a gold id.
    pub fn project_gold_ids(&mut self) -> usize {
        let gold: HashMap<_, _> = self
            .annotated_mentions
            .iter()
            .filter_map(|m| m.annotated_set_id.as_ref().map(|id| (m.span, id.clone())))
            .collect();

        let mut matched = 0;
        for mention in &mut self.system_mentions {
            mention.annotated_set_id = gold.get(&mention.span).cloned();
            if mention.annotated_set_id.is_some() {
                matched += 1;
            }
        }
        matched
    }

    /// Check structural invariants.
    ///
    /// - system mentions are sorted by span and unique
    /// - spans are non-empty and, when sentences are present, inside the token range
    pub fn validate(&self) -> Result<()> {
        let tokens = self.token_count();
        for (i, mention) in self.system_mentions.iter().enumerate() {
            if mention.span.is_empty() {
                return Err(Error::data(format!(
                    "document '{}': mention {} has an empty span",
                    self.id, i
                )));
            }
            if !self.sentences.is_empty() && mention.span.end > tokens {
                return Err(Error::data(format!(
                    "document '{}': mention {} {} exceeds {} tokens",
                    self.id, i, mention.span, tokens
                )));
            }
            if i > 0 && !self.system_mentions[i - 1].precedes(mention) {
                return Err(Error::data(format!(
                    "document '{}': system mentions not in document order at {}",
                    self.id, i
                )));
            }
        }
        Ok(())
    }
}

// =============================================================================
// Corpus
// =============================================================================

/// An ordered sequence of documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Corpus {
    /// Documents in corpus order.
    pub documents: Vec<Document>,
}

impl Corpus {
    /// Create a corpus from documents.
    #[must_use]
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    /// Parse a corpus from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a corpus from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Number of documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Check if the corpus has no documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Iterate over documents in corpus order.
    pub fn iter(&self) -> std::slice::Iter<'_, Document> {
        self.documents.iter()
    }

    /// Total number of system mentions.
    #[must_use]
    pub fn mention_count(&self) -> usize {
        self.documents.iter().map(|d| d.system_mentions.len()).sum()
    }

    /// Validate every document and require unique document ids.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for doc in &self.documents {
            if !seen.insert(doc.id.as_str()) {
                return Err(Error::data(format!("duplicate document id '{}'", doc.id)));
            }
            doc.validate()?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Corpus {
    type Item = &'a Document;
    type IntoIter = std::slice::Iter<'a, Document>;

    fn into_iter(self) -> Self::IntoIter {
        self.documents.iter()
    }
}

// =============================================================================
// MentionKey
// =============================================================================

/// Corpus-wide identity of a system mention.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MentionKey {
    /// Owning document id.
    pub document: String,
    /// Position in the document's system mentions.
    pub mention: MentionId,
}

impl MentionKey {
    /// Create a key.
    #[must_use]
    pub fn new(document: impl Into<String>, mention: MentionId) -> Self {
        Self {
            document: document.into(),
            mention,
        }
    }
}

impl fmt::Display for MentionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.document, self.mention)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> Document {
        Document::new("d1")
            .with_sentences(vec![vec!["John".into(), "slept".into(), ".".into()], vec![
                "He".into(),
                "snored".into(),
            ]])
            .with_annotated_mentions(vec![
                Mention::new(0, 1, 0, ["John"]).with_set_id("A"),
                Mention::new(3, 4, 1, ["He"]).with_set_id("A"),
            ])
            .with_system_mentions(vec![
                Mention::new(0, 1, 0, ["John"]),
                Mention::new(1, 2, 0, ["slept"]),
                Mention::new(3, 4, 1, ["He"]),
            ])
    }

    #[test]
    fn test_project_gold_ids() {
        let mut d = doc();
        assert_eq!(d.project_gold_ids(), 2);
        assert_eq!(d.system_mentions[0].annotated_set_id.as_deref(), Some("A"));
        assert_eq!(d.system_mentions[1].annotated_set_id, None);
        assert_eq!(d.system_mentions[2].annotated_set_id.as_deref(), Some("A"));
    }

    #[test]
    fn test_validate_rejects_unordered_mentions() {
        let mut d = doc();
        d.system_mentions.swap(0, 2);
        assert!(matches!(d.validate(), Err(Error::Data(_))));
    }

    #[test]
    fn test_validate_rejects_out_of_range_span() {
        let d = doc().with_system_mentions(vec![Mention::new(4, 9, 1, ["x"])]);
        assert!(d.validate().is_err());
    }

    #[test]
    fn test_corpus_rejects_duplicate_ids() {
        let corpus = Corpus::new(vec![doc(), doc()]);
        let err = corpus.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_corpus_json_round_trip() {
        let corpus = Corpus::new(vec![doc()]);
        let json = corpus.to_json().unwrap();
        assert_eq!(Corpus::from_json(&json).unwrap(), corpus);
    }

    #[test]
    fn test_mention_lookup() {
        let d = doc();
        assert_eq!(d.mention(MentionId(2)).unwrap().text(), "He");
        assert!(d.mention(MentionId(3)).is_err());
        assert_eq!(d.mention_ids().count(), 3);
    }
}
