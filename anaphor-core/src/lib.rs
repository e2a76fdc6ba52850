//! # anaphor-core
//!
//! Core types for the anaphor workspace: the data model shared by the
//! extractor, the perceptron and the clusterers.
//!
//! This crate provides:
//! - **Mentions**: `Mention`, `MentionId`, `Span`, `Attribute`
//! - **Documents**: `Document`, `Corpus`, `MentionKey`
//! - **Decisions**: `Antecedent`, `ScoredCandidate`, `MentionScores`,
//!   `AntecedentMapping`, `EntityMapping`
//!
//! Mentions are identified by their position in a document's system mentions
//! and never reordered, so every mapping can be reported back against the
//! original mention list.

#![warn(missing_docs)]

pub mod decision;
pub mod document;
pub mod error;
pub mod mention;

pub use decision::{
    Antecedent, AntecedentMapping, EntityId, EntityMapping, MentionScores, ScoredCandidate,
};
pub use document::{Corpus, Document, MentionKey};
pub use error::{Error, Result};
pub use mention::{Attribute, Mention, MentionId, Span};
