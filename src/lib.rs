//! # anaphor
//!
//! Coreference resolution with a latent structured perceptron.
//!
//! - **Extraction**: one instance per mention, with the new-entity candidate
//!   and every preceding mention as candidate antecedents
//! - **Training**: mention ranking with cost-augmented inference and weight
//!   averaging
//! - **Clustering**: best-first or closest-first antecedent choice, closed
//!   transitively into entities
//!
//! ## Quick Start
//!
//! ```rust
//! use anaphor::{Corpus, Document, ExperimentConfig, Factory, Mention};
//!
//! let config = ExperimentConfig::from_toml_str(
//!     r#"
//!     [features]
//!     mention = []
//!     pairwise = ["exact_match", "sentence_distance"]
//!     "#,
//! )?;
//! let experiment = Factory::build(&config)?;
//!
//! let train = Corpus::new(vec![Document::new("d1").with_system_mentions(vec![
//!     Mention::new(0, 1, 0, ["Mary"]).with_set_id("1"),
//!     Mention::new(4, 5, 1, ["Mary"]).with_set_id("1"),
//! ])]);
//! let model = experiment.learn(&train)?;
//!
//! let test = Corpus::new(vec![Document::new("d2").with_system_mentions(vec![
//!     Mention::new(0, 1, 0, ["Paul"]),
//!     Mention::new(3, 4, 0, ["Paul"]),
//! ])]);
//! let prediction = experiment.predict(&test, &model)?;
//! assert_eq!(prediction.entities.clusters().len(), 1);
//! # Ok::<(), anaphor::Error>(())
//! ```
//!
//! ## Configuration
//!
//! Components are named in an [`ExperimentConfig`] (TOML) and resolved by the
//! [`Factory`]. The trained [`Model`] records the extractor's feature
//! signature; predicting with an extractor configured differently fails with
//! [`Error::ModelMismatch`].
//!
//! ## Logging
//!
//! Uses the `log` facade: one `info` line per training epoch, per-document
//! counts at `debug`. No logger is installed by the library.

#![warn(missing_docs)]

pub mod config;
pub mod cost;
pub mod error;
pub mod experiment;
pub mod extractor;
pub mod factory;
pub mod features;
pub mod perceptron;

/// Common imports.
pub mod prelude {
    pub use crate::config::ExperimentConfig;
    pub use crate::cost::{ConsistencyCost, CostConfig, CostFunction, NullCost};
    pub use crate::experiment::{learn, predict, Experiment, Prediction};
    pub use crate::extractor::{ExtractorOptions, Instance, InstanceExtractor};
    pub use crate::factory::Factory;
    pub use crate::perceptron::{LatentRankingPerceptron, Model, Perceptron, TrainingOptions};
    pub use crate::{Error, Result};
    pub use anaphor_cluster::{BestFirst, ClosestFirst, Clusterer};
    pub use anaphor_core::{Corpus, Document, Mention, MentionId, MentionKey};
}

pub use config::ExperimentConfig;
pub use cost::{ConsistencyCost, CostConfig, CostContext, CostFunction, NullCost};
pub use error::{Error, Result};
pub use experiment::{learn, predict, Experiment, Prediction};
pub use extractor::{Candidate, ExtractorOptions, Instance, InstanceExtractor, Role};
pub use factory::Factory;
pub use features::{FeatureValue, FeatureVector, MentionFeature, PairwiseFeature};
pub use perceptron::{
    EpochReport, LatentRankingPerceptron, Model, Perceptron, TrainingOptions, TrainingSession,
};

pub use anaphor_cluster::{BestFirst, ClosestFirst, Clusterer, DisjointSet};
pub use anaphor_core::{
    Antecedent, AntecedentMapping, Attribute, Corpus, Document, EntityId, EntityMapping, Mention,
    MentionId, MentionKey, MentionScores, ScoredCandidate, Span,
};
