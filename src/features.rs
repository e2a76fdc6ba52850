//! Feature functions over mentions and mention pairs.
//!
//! Feature functions are opaque to the learner: each one maps a mention (or an
//! anaphor/antecedent pair) to an optional [`FeatureValue`], which is encoded
//! into `(identifier, value)` entries of a [`FeatureVector`].
//!
//! | Value | Encoded as |
//! |-------|------------|
//! | `Categorical(v)` | `name=v` with value 1 |
//! | `Flag(true)` | `name` with value 1 |
//! | `Flag(false)` / `None` | nothing |
//! | `Numeric(x)` | `name` with value `x` |
//!
//! # Example
//!
//! ```rust
//! use anaphor::features::{builtin_pairwise, PairwiseFeature};
//! use anaphor_core::Mention;
//!
//! let exact = builtin_pairwise("exact_match").unwrap();
//! let a = Mention::new(0, 1, 0, ["Obama"]);
//! let b = Mention::new(9, 10, 1, ["obama"]);
//! assert!(exact.compute(&b, &a).unwrap().is_some());
//! ```

use crate::{Error, Result};
use anaphor_core::Mention;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

// =============================================================================
// Values and vectors
// =============================================================================

/// Output of a feature function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FeatureValue {
    /// Categorical value; one indicator feature per category.
    Categorical(String),
    /// Real-valued feature.
    Numeric(f64),
    /// Binary indicator.
    Flag(bool),
}

impl FeatureValue {
    /// Encode under `name`, or `None` if the feature is inactive.
    pub fn encode(&self, name: &str) -> Result<Option<(String, f64)>> {
        match self {
            FeatureValue::Categorical(v) => Ok(Some((format!("{}={}", name, v), 1.0))),
            FeatureValue::Flag(true) => Ok(Some((name.to_string(), 1.0))),
            FeatureValue::Flag(false) => Ok(None),
            FeatureValue::Numeric(x) if x.is_finite() => Ok(Some((name.to_string(), *x))),
            FeatureValue::Numeric(x) => Err(Error::data(format!(
                "feature '{}' produced non-finite value {}",
                name, x
            ))),
        }
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Categorical(v) => f.write_str(v),
            FeatureValue::Numeric(x) => write!(f, "{}", x),
            FeatureValue::Flag(b) => write!(f, "{}", b),
        }
    }
}

/// Sparse feature vector: identifiers with values, in extraction order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    entries: Vec<(String, f64)>,
}

impl FeatureVector {
    /// Create an empty vector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn push(&mut self, id: impl Into<String>, value: f64) {
        self.entries.push((id.into(), value));
    }

    /// Entries in insertion order.
    #[must_use]
    pub fn entries(&self) -> &[(String, f64)] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(id, v)| (id.as_str(), *v))
    }
}

// =============================================================================
// Traits
// =============================================================================

/// A feature of a single mention.
pub trait MentionFeature: Send + Sync {
    /// Feature name; used as the identifier prefix.
    fn name(&self) -> &str;

    /// Compute the feature. Missing attributes are data errors.
    fn compute(&self, mention: &Mention) -> Result<Option<FeatureValue>>;
}

/// A feature of an (anaphor, antecedent) pair.
pub trait PairwiseFeature: Send + Sync {
    /// Feature name; used as the identifier prefix.
    fn name(&self) -> &str;

    /// Compute the feature for `antecedent` as a candidate of `anaphor`.
    fn compute(&self, anaphor: &Mention, antecedent: &Mention) -> Result<Option<FeatureValue>>;
}

// =============================================================================
// Mention features
// =============================================================================

/// Categorical feature read straight from a mention attribute.
#[derive(Debug, Clone)]
pub struct AttributeFeature {
    name: String,
    attribute: String,
}

impl AttributeFeature {
    /// Expose `attribute` as a categorical feature called `name`.
    #[must_use]
    pub fn new(name: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attribute: attribute.into(),
        }
    }
}

impl MentionFeature for AttributeFeature {
    fn name(&self) -> &str {
        &self.name
    }

    fn compute(&self, mention: &Mention) -> Result<Option<FeatureValue>> {
        let value = mention.attribute(&self.attribute)?;
        Ok(Some(FeatureValue::Categorical(value.to_string())))
    }
}

/// Mention feature backed by a plain function.
#[derive(Clone, Copy)]
pub struct FnMentionFeature {
    name: &'static str,
    f: fn(&Mention) -> Result<Option<FeatureValue>>,
}

impl FnMentionFeature {
    /// Wrap a function.
    #[must_use]
    pub const fn new(name: &'static str, f: fn(&Mention) -> Result<Option<FeatureValue>>) -> Self {
        Self { name, f }
    }
}

impl MentionFeature for FnMentionFeature {
    fn name(&self) -> &str {
        self.name
    }

    fn compute(&self, mention: &Mention) -> Result<Option<FeatureValue>> {
        (self.f)(mention)
    }
}

impl fmt::Debug for FnMentionFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnMentionFeature").field("name", &self.name).finish()
    }
}

fn head(mention: &Mention) -> Result<Option<FeatureValue>> {
    let head = mention.head_or_last_token();
    if head.is_empty() {
        return Err(Error::data(format!("mention {} has no tokens", mention)));
    }
    Ok(Some(FeatureValue::Categorical(head.to_lowercase())))
}

fn length(mention: &Mention) -> Result<Option<FeatureValue>> {
    Ok(Some(FeatureValue::Categorical(bucket(mention.tokens.len()))))
}

fn first_token(mention: &Mention) -> Result<Option<FeatureValue>> {
    Ok(mention
        .tokens
        .first()
        .map(|t| FeatureValue::Categorical(t.to_lowercase())))
}

/// Resolve a built-in mention feature by name.
///
/// Attribute-backed features: `type`, `fine_type`, `gender`, `number`,
/// `semantic_class`, `grammatical_function`. Surface features: `head`,
/// `length`, `first_token`.
pub fn builtin_mention(name: &str) -> Option<Arc<dyn MentionFeature>> {
    let feature: Arc<dyn MentionFeature> = match name {
        "type" | "fine_type" | "gender" | "number" | "semantic_class"
        | "grammatical_function" => Arc::new(AttributeFeature::new(name, name)),
        "head" => Arc::new(FnMentionFeature::new("head", head)),
        "length" => Arc::new(FnMentionFeature::new("length", length)),
        "first_token" => Arc::new(FnMentionFeature::new("first_token", first_token)),
        _ => return None,
    };
    Some(feature)
}

// =============================================================================
// Pairwise features
// =============================================================================

/// Pairwise feature backed by a plain function.
#[derive(Clone, Copy)]
pub struct FnPairwiseFeature {
    name: &'static str,
    f: fn(&Mention, &Mention) -> Result<Option<FeatureValue>>,
}

impl FnPairwiseFeature {
    /// Wrap a function taking `(anaphor, antecedent)`.
    #[must_use]
    pub const fn new(
        name: &'static str,
        f: fn(&Mention, &Mention) -> Result<Option<FeatureValue>>,
    ) -> Self {
        Self { name, f }
    }
}

impl PairwiseFeature for FnPairwiseFeature {
    fn name(&self) -> &str {
        self.name
    }

    fn compute(&self, anaphor: &Mention, antecedent: &Mention) -> Result<Option<FeatureValue>> {
        (self.f)(anaphor, antecedent)
    }
}

impl fmt::Debug for FnPairwiseFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnPairwiseFeature").field("name", &self.name).finish()
    }
}

fn exact_match(anaphor: &Mention, antecedent: &Mention) -> Result<Option<FeatureValue>> {
    let same = anaphor.tokens.len() == antecedent.tokens.len()
        && anaphor
            .tokens
            .iter()
            .zip(&antecedent.tokens)
            .all(|(a, b)| a.to_lowercase() == b.to_lowercase());
    Ok(Some(FeatureValue::Flag(same)))
}

fn head_match(anaphor: &Mention, antecedent: &Mention) -> Result<Option<FeatureValue>> {
    let (a, b) = (anaphor.head_or_last_token(), antecedent.head_or_last_token());
    Ok(Some(FeatureValue::Flag(!a.is_empty() && a.to_lowercase() == b.to_lowercase())))
}

fn token_overlap(anaphor: &Mention, antecedent: &Mention) -> Result<Option<FeatureValue>> {
    let a: HashSet<String> = anaphor.tokens.iter().map(|t| t.to_lowercase()).collect();
    let b: HashSet<String> = antecedent.tokens.iter().map(|t| t.to_lowercase()).collect();
    let union = a.union(&b).count();
    if union == 0 {
        return Ok(None);
    }
    let jaccard = a.intersection(&b).count() as f64 / union as f64;
    Ok((jaccard > 0.0).then_some(FeatureValue::Numeric(jaccard)))
}

fn sentence_distance(anaphor: &Mention, antecedent: &Mention) -> Result<Option<FeatureValue>> {
    let d = anaphor.sentence.abs_diff(antecedent.sentence);
    Ok(Some(FeatureValue::Categorical(bucket(d))))
}

fn token_distance(anaphor: &Mention, antecedent: &Mention) -> Result<Option<FeatureValue>> {
    let d = anaphor.span.start.saturating_sub(antecedent.span.end);
    Ok(Some(FeatureValue::Categorical(bucket(d))))
}

fn attribute_agreement(
    attribute: &str,
    anaphor: &Mention,
    antecedent: &Mention,
) -> Result<Option<FeatureValue>> {
    let a = anaphor.attribute(attribute)?;
    let b = antecedent.attribute(attribute)?;
    Ok(Some(FeatureValue::Flag(a == b)))
}

fn same_gender(anaphor: &Mention, antecedent: &Mention) -> Result<Option<FeatureValue>> {
    attribute_agreement("gender", anaphor, antecedent)
}

fn same_number(anaphor: &Mention, antecedent: &Mention) -> Result<Option<FeatureValue>> {
    attribute_agreement("number", anaphor, antecedent)
}

fn embedding(anaphor: &Mention, antecedent: &Mention) -> Result<Option<FeatureValue>> {
    Ok(Some(FeatureValue::Flag(
        antecedent.span.contains(&anaphor.span) || anaphor.span.contains(&antecedent.span),
    )))
}

fn alias(anaphor: &Mention, antecedent: &Mention) -> Result<Option<FeatureValue>> {
    let is_acronym_of = |short: &Mention, long: &Mention| {
        if short.tokens.len() != 1 || long.tokens.len() < 2 {
            return false;
        }
        let initials: String = long
            .tokens
            .iter()
            .filter_map(|t| t.chars().next())
            .filter(|c| c.is_uppercase())
            .collect();
        initials.len() >= 2 && initials == short.tokens[0].replace('.', "")
    };
    Ok(Some(FeatureValue::Flag(
        is_acronym_of(anaphor, antecedent) || is_acronym_of(antecedent, anaphor),
    )))
}

/// Resolve a built-in pairwise feature by name.
///
/// `exact_match`, `head_match`, `token_overlap`, `sentence_distance`,
/// `token_distance`, `same_gender`, `same_number`, `embedding`, `alias`.
pub fn builtin_pairwise(name: &str) -> Option<Arc<dyn PairwiseFeature>> {
    let f: fn(&Mention, &Mention) -> Result<Option<FeatureValue>> = match name {
        "exact_match" => exact_match,
        "head_match" => head_match,
        "token_overlap" => token_overlap,
        "sentence_distance" => sentence_distance,
        "token_distance" => token_distance,
        "same_gender" => same_gender,
        "same_number" => same_number,
        "embedding" => embedding,
        "alias" => alias,
        _ => return None,
    };
    let name = BUILTIN_PAIRWISE.iter().copied().find(|n| *n == name)?;
    Some(Arc::new(FnPairwiseFeature::new(name, f)))
}

/// Names accepted by [`builtin_mention`].
pub const BUILTIN_MENTION: &[&str] = &[
    "type",
    "fine_type",
    "gender",
    "number",
    "semantic_class",
    "grammatical_function",
    "head",
    "length",
    "first_token",
];

/// Names accepted by [`builtin_pairwise`].
pub const BUILTIN_PAIRWISE: &[&str] = &[
    "exact_match",
    "head_match",
    "token_overlap",
    "sentence_distance",
    "token_distance",
    "same_gender",
    "same_number",
    "embedding",
    "alias",
];

/// Coarse distance buckets: exact up to 4, then powers of two.
fn bucket(n: usize) -> String {
    match n {
        0..=4 => n.to_string(),
        5..=7 => "5-7".to_string(),
        8..=15 => "8-15".to_string(),
        16..=31 => "16-31".to_string(),
        _ => "32+".to_string(),
    }
}
