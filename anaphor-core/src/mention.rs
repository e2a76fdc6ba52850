//! Mentions: text spans that may corefer with other spans.
//!
//! A mention carries the handful of fields every component needs (span,
//! sentence, tokens, head) plus an open attribute map for everything the
//! feature functions read (gender, number, semantic class, ...).
//!
//! # Example
//!
//! ```rust
//! use anaphor_core::{Attribute, Mention};
//!
//! // "John went to the store. He bought milk."
//! let john = Mention::new(0, 1, 0, ["John"]).with_attribute("type", "NAM");
//! let he = Mention::new(6, 7, 1, ["He"]).with_attribute("type", "PRO");
//!
//! assert_eq!(john.text(), "John");
//! assert_eq!(he.text_attribute("type").unwrap(), "PRO");
//! assert!(john.precedes(&he));
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// =============================================================================
// Span
// =============================================================================

/// Token offsets of a mention within its document (end exclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Span {
    /// First token (inclusive).
    pub start: usize,
    /// One past the last token.
    pub end: usize,
}

impl Span {
    /// Create a span.
    #[must_use]
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Number of tokens covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Check if the span covers no tokens.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check if `other` lies completely inside this span.
    #[must_use]
    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}-{})", self.start, self.end)
    }
}

// =============================================================================
// Attribute
// =============================================================================

/// Value of a mention attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Attribute {
    /// Boolean flag.
    Flag(bool),
    /// Integer value.
    Integer(i64),
    /// Real value.
    Float(f64),
    /// Categorical string value.
    Text(String),
    /// Sequence of strings (e.g. the tokens of a modifier list).
    List(Vec<String>),
}

impl Attribute {
    /// Borrow the value as a string if it is textual.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Attribute::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Read the value as a number if it is numeric.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Attribute::Integer(i) => Some(*i as f64),
            Attribute::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attribute::Flag(b) => write!(f, "{}", b),
            Attribute::Integer(i) => write!(f, "{}", i),
            Attribute::Float(x) => write!(f, "{}", x),
            Attribute::Text(s) => f.write_str(s),
            Attribute::List(items) => f.write_str(&items.join("_")),
        }
    }
}

impl From<&str> for Attribute {
    fn from(s: &str) -> Self {
        Attribute::Text(s.to_string())
    }
}

impl From<String> for Attribute {
    fn from(s: String) -> Self {
        Attribute::Text(s)
    }
}

impl From<bool> for Attribute {
    fn from(b: bool) -> Self {
        Attribute::Flag(b)
    }
}

impl From<i64> for Attribute {
    fn from(i: i64) -> Self {
        Attribute::Integer(i)
    }
}

impl From<f64> for Attribute {
    fn from(x: f64) -> Self {
        Attribute::Float(x)
    }
}

// =============================================================================
// Mention
// =============================================================================

/// Position of a mention in its document's `system_mentions`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MentionId(pub usize);

impl MentionId {
    /// The raw index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for MentionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m{}", self.0)
    }
}

/// A contiguous text span referring to an entity.
///
/// Mentions are immutable once a document has been handed to the extractor.
/// `annotated_set_id` is the gold cluster id when one is known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mention {
    /// Token offsets within the document.
    pub span: Span,
    /// Index of the sentence containing the mention.
    pub sentence: usize,
    /// Surface tokens of the span.
    pub tokens: Vec<String>,
    /// Head word, if known.
    #[serde(default)]
    pub head: Option<String>,
    /// Linguistic attributes read by feature functions.
    #[serde(default)]
    pub attributes: BTreeMap<String, Attribute>,
    /// Gold cluster id.
    #[serde(default)]
    pub annotated_set_id: Option<String>,
}

impl Mention {
    /// Create a mention with no attributes and no gold cluster.
    #[must_use]
    pub fn new<I, S>(start: usize, end: usize, sentence: usize, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            span: Span::new(start, end),
            sentence,
            tokens: tokens.into_iter().map(Into::into).collect(),
            head: None,
            attributes: BTreeMap::new(),
            annotated_set_id: None,
        }
    }

    /// Set the head word.
    #[must_use]
    pub fn with_head(mut self, head: impl Into<String>) -> Self {
        self.head = Some(head.into());
        self
    }

    /// Add an attribute.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Attribute>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Set the gold cluster id.
    #[must_use]
    pub fn with_set_id(mut self, set_id: impl Into<String>) -> Self {
        self.annotated_set_id = Some(set_id.into());
        self
    }

    /// Surface text (tokens joined by spaces).
    #[must_use]
    pub fn text(&self) -> String {
        self.tokens.join(" ")
    }

    /// Head word, falling back to the last token.
    #[must_use]
    pub fn head_or_last_token(&self) -> &str {
        self.head
            .as_deref()
            .or_else(|| self.tokens.last().map(String::as_str))
            .unwrap_or("")
    }

    /// Look up an attribute, failing with a data error when it is missing.
    pub fn attribute(&self, name: &str) -> Result<&Attribute> {
        self.attributes
            .get(name)
            .ok_or_else(|| Error::data(format!("mention {} lacks attribute '{}'", self.span, name)))
    }

    /// Look up a textual attribute.
    pub fn text_attribute(&self, name: &str) -> Result<&str> {
        self.attribute(name)?.as_text().ok_or_else(|| {
            Error::data(format!(
                "attribute '{}' of mention {} is not textual",
                name, self.span
            ))
        })
    }

    /// Check if this mention starts before `other` in the document.
    #[must_use]
    pub fn precedes(&self, other: &Mention) -> bool {
        (self.span.start, self.span.end) < (other.span.start, other.span.end)
    }

    /// Check if this mention and `other` share a gold cluster.
    ///
    /// Mentions without a gold cluster are never coreferent with anything.
    #[must_use]
    pub fn is_coreferent_with(&self, other: &Mention) -> bool {
        match (&self.annotated_set_id, &other.annotated_set_id) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Mention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" {}", self.text(), self.span)
    }
}
