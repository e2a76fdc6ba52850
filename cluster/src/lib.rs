//! # anaphor-cluster
//!
//! Turns per-mention antecedent scores into entities.
//!
//! A [`Clusterer`] picks one antecedent per mention and takes the transitive
//! closure with a [`DisjointSet`], so the result is always a partition in
//! which every mention shares an entity with its antecedent.
//!
//! # Example
//!
//! ```
//! use anaphor_cluster::{BestFirst, Clusterer};
//! use anaphor_core::{Antecedent, MentionId, MentionKey, MentionScores, ScoredCandidate};
//!
//! let scores = vec![
//!     MentionScores::new(MentionId(0), vec![ScoredCandidate::new(Antecedent::NewEntity, 0.0)]),
//!     MentionScores::new(
//!         MentionId(1),
//!         vec![
//!             ScoredCandidate::new(Antecedent::NewEntity, 0.0),
//!             ScoredCandidate::new(Antecedent::Mention(MentionId(0)), 1.5),
//!         ],
//!     ),
//! ];
//!
//! let (entities, _antecedents) = BestFirst.cluster("doc", &scores).unwrap();
//! assert!(entities.same_entity(
//!     &MentionKey::new("doc", MentionId(0)),
//!     &MentionKey::new("doc", MentionId(1)),
//! ));
//! ```

#![warn(missing_docs)]

pub mod resolver;

pub use resolver::{BestFirst, ClosestFirst, Clusterer, DisjointSet};
