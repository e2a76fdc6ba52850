//! The learn/predict driver.
//!
//! `learn` extracts cost-annotated instances document by document, in corpus
//! order, and hands the batches to the perceptron. `predict` extracts
//! instances without costs, scores them with the model, clusters each
//! document and accumulates the corpus-wide mappings.

use crate::cost::{CostFunction, NullCost};
use crate::extractor::InstanceExtractor;
use crate::perceptron::{Model, Perceptron, TrainingOptions};
use crate::Result;
use anaphor_cluster::Clusterer;
use anaphor_core::{AntecedentMapping, Corpus, EntityMapping, MentionScores};
use std::fmt;

/// Output of [`predict`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Prediction {
    /// Entity of every system mention.
    pub entities: EntityMapping,
    /// Chosen antecedent of every system mention.
    pub antecedents: AntecedentMapping,
}

/// Train a model on `corpus`.
pub fn learn(
    corpus: &Corpus,
    extractor: &InstanceExtractor,
    cost: &dyn CostFunction,
    perceptron: &dyn Perceptron,
    options: &TrainingOptions,
) -> Result<Model> {
    options.validate()?;
    corpus.validate()?;
    if corpus.is_empty() {
        log::warn!("Training corpus is empty");
    }

    let batches = extractor.extract_corpus(corpus, cost)?;
    let instances: usize = batches.iter().map(Vec::len).sum();
    log::info!(
        "Extracted {} instances from {} documents",
        instances,
        corpus.len()
    );

    perceptron.fit(&batches, options, &extractor.signature())
}

/// Resolve the mentions of `corpus` with a trained model.
pub fn predict(
    corpus: &Corpus,
    extractor: &InstanceExtractor,
    perceptron: &dyn Perceptron,
    model: &Model,
    clusterer: &dyn Clusterer,
) -> Result<Prediction> {
    model.check_compatible(&extractor.signature())?;
    corpus.validate()?;
    if corpus.is_empty() {
        log::warn!("Prediction corpus is empty");
    }

    let mut prediction = Prediction::default();
    for document in corpus {
        let instances = extractor.extract(document, &NullCost)?;
        let scores: Vec<MentionScores> = instances
            .iter()
            .map(|instance| perceptron.decode(model, instance))
            .collect();
        let (entities, antecedents) = clusterer.cluster(&document.id, &scores)?;
        prediction.entities.extend(entities)?;
        prediction.antecedents.extend(antecedents)?;
    }
    Ok(prediction)
}

/// A fully resolved pipeline.
pub struct Experiment {
    /// Builds instances from documents.
    pub extractor: InstanceExtractor,
    /// Training cost.
    pub cost: Box<dyn CostFunction>,
    /// Learner and decoder.
    pub perceptron: Box<dyn Perceptron>,
    /// Turns scores into entities.
    pub clusterer: Box<dyn Clusterer>,
    /// Training options.
    pub options: TrainingOptions,
}

impl Experiment {
    /// Assemble an experiment from its parts.
    #[must_use]
    pub fn new(
        extractor: InstanceExtractor,
        cost: Box<dyn CostFunction>,
        perceptron: Box<dyn Perceptron>,
        clusterer: Box<dyn Clusterer>,
        options: TrainingOptions,
    ) -> Self {
        Self {
            extractor,
            cost,
            perceptron,
            clusterer,
            options,
        }
    }

    /// Train a model on `corpus`.
    pub fn learn(&self, corpus: &Corpus) -> Result<Model> {
        learn(
            corpus,
            &self.extractor,
            self.cost.as_ref(),
            self.perceptron.as_ref(),
            &self.options,
        )
    }

    /// Resolve `corpus` with `model`.
    pub fn predict(&self, corpus: &Corpus, model: &Model) -> Result<Prediction> {
        predict(
            corpus,
            &self.extractor,
            self.perceptron.as_ref(),
            model,
            self.clusterer.as_ref(),
        )
    }
}

impl fmt::Debug for Experiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Experiment")
            .field("extractor", &self.extractor)
            .field("cost", &self.cost.name())
            .field("perceptron", &self.perceptron.name())
            .field("clusterer", &self.clusterer.name())
            .field("options", &self.options)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExperimentConfig;
    use crate::factory::Factory;
    use crate::Error;
    use anaphor_core::{Antecedent, Document, Mention, MentionId, MentionKey};

    fn experiment() -> Experiment {
        let config = ExperimentConfig::from_toml_str(
            r#"
            [features]
            mention = []
            pairwise = ["exact_match"]
            "#,
        )
        .unwrap();
        Factory::build(&config).unwrap()
    }

    fn doc(id: &str, tokens: &[(&str, &str)]) -> Document {
        let mentions = tokens
            .iter()
            .enumerate()
            .map(|(i, &(token, set))| Mention::new(2 * i, 2 * i + 1, 0, [token]).with_set_id(set))
            .collect();
        Document::new(id).with_system_mentions(mentions)
    }

    #[test]
    fn test_learn_then_predict_links_repeated_names() {
        let train = Corpus::new(vec![
            doc("a", &[("Mary", "1"), ("Mary", "1")]),
            doc("b", &[("Bill", "1"), ("Anna", "2")]),
            doc("d", &[("Joe", "1"), ("Joe", "1")]),
        ]);
        let experiment = experiment();
        let model = experiment.learn(&train).unwrap();
        assert!(model.weight("exact_match") > 0.0);

        let test = Corpus::new(vec![doc("c", &[("Paul", "x"), ("Paul", "x")])]);
        let prediction = experiment.predict(&test, &model).unwrap();
        let k0 = MentionKey::new("c", MentionId(0));
        let k1 = MentionKey::new("c", MentionId(1));
        assert_eq!(prediction.antecedents.get(&k0), Some(Antecedent::NewEntity));
        assert_eq!(
            prediction.antecedents.get(&k1),
            Some(Antecedent::Mention(MentionId(0)))
        );
        assert!(prediction.entities.same_entity(&k0, &k1));
    }

    #[test]
    fn test_predict_rejects_foreign_model() {
        let experiment = experiment();
        let model = Model::new("mention=[type];pairwise=[];conjoin=true;combinations=false");
        let err = experiment.predict(&Corpus::default(), &model).unwrap_err();
        assert!(matches!(err, Error::ModelMismatch(_)));
    }

    #[test]
    fn test_empty_corpus() {
        let experiment = experiment();
        let model = experiment.learn(&Corpus::default()).unwrap();
        let prediction = experiment.predict(&Corpus::default(), &model).unwrap();
        assert!(prediction.entities.is_empty());
        assert!(prediction.antecedents.is_empty());
    }

    #[test]
    fn test_duplicate_documents_are_rejected() {
        let corpus = Corpus::new(vec![doc("a", &[("x", "1")]), doc("a", &[("y", "1")])]);
        assert!(matches!(experiment().learn(&corpus), Err(Error::Data(_))));
    }
}
