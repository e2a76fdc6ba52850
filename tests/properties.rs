//! Property-based tests for extraction, training and clustering invariants.

use anaphor::prelude::*;
use anaphor::{Antecedent, MentionScores, ScoredCandidate};
use proptest::prelude::*;

const NAMES: &[&str] = &["Ann", "Ben", "Cy", "Dee"];

/// A document of one-token mentions; `None` gold ids are mentions outside
/// every gold cluster.
fn build_doc(id: usize, mentions: &[(usize, Option<usize>)]) -> Document {
    let system = mentions
        .iter()
        .enumerate()
        .map(|(i, &(name, gold))| {
            let m = Mention::new(3 * i, 3 * i + 1, i / 3, [NAMES[name]]);
            match gold {
                Some(g) => m.with_set_id(format!("e{}", g)),
                None => m,
            }
        })
        .collect();
    Document::new(format!("doc{}", id)).with_system_mentions(system)
}

fn doc_strategy() -> impl Strategy<Value = Vec<(usize, Option<usize>)>> {
    prop::collection::vec((0..NAMES.len(), prop::option::weighted(0.8, 0..3usize)), 0..8)
}

fn corpus_strategy() -> impl Strategy<Value = Corpus> {
    prop::collection::vec(doc_strategy(), 0..4).prop_map(|docs| {
        Corpus::new(
            docs.iter()
                .enumerate()
                .map(|(i, mentions)| build_doc(i, mentions))
                .collect(),
        )
    })
}

fn experiment(clusterer: &str, max_antecedents: Option<usize>) -> Experiment {
    let mut config = ExperimentConfig::default();
    config.clusterer = clusterer.into();
    config.extractor.max_antecedents = max_antecedents;
    config.perceptron.n_iter = 2;
    Factory::build(&config).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn consistency_cost_always_leaves_a_free_candidate(
        mentions in doc_strategy(),
        window in prop::option::of(1..4usize),
    ) {
        let doc = build_doc(0, &mentions);
        let experiment = experiment("best_first", window);
        let cost = ConsistencyCost::new(CostConfig::default());
        let instances = experiment.extractor.extract(&doc, &cost).unwrap();

        prop_assert_eq!(instances.len(), mentions.len());
        for instance in &instances {
            prop_assert_eq!(instance.min_cost(), 0.0);
            prop_assert!(instance.candidates.iter().all(|c| c.cost >= 0.0));
            prop_assert!(instance.candidates[0].antecedent.is_new_entity());
            if let Some(w) = window {
                prop_assert!(instance.candidates.len() <= w + 1);
            }
        }
    }

    #[test]
    fn predictions_form_a_partition(
        train in corpus_strategy(),
        test in corpus_strategy(),
        closest in any::<bool>(),
    ) {
        let experiment = experiment(if closest { "closest_first" } else { "best_first" }, None);
        let model = experiment.learn(&train).unwrap();
        let prediction = experiment.predict(&test, &model).unwrap();

        prop_assert_eq!(prediction.entities.len(), test.mention_count());
        prop_assert_eq!(prediction.antecedents.len(), test.mention_count());

        for doc in &test {
            let mut next_entity = 0;
            for id in doc.mention_ids() {
                let key = MentionKey::new(doc.id.clone(), id);
                let entity = prediction.entities.get(&key).unwrap();
                prop_assert_eq!(&entity.document, &doc.id);
                // entities are numbered by first mention
                prop_assert!(entity.index <= next_entity);
                if entity.index == next_entity {
                    next_entity += 1;
                }

                match prediction.antecedents.get(&key).unwrap() {
                    Antecedent::NewEntity => {}
                    Antecedent::Mention(ante) => {
                        prop_assert!(ante.index() < id.index());
                        let ante_key = MentionKey::new(doc.id.clone(), ante);
                        prop_assert!(prediction.entities.same_entity(&key, &ante_key));
                    }
                }
            }
            if let Some(first) = doc.mention_ids().next() {
                let key = MentionKey::new(doc.id.clone(), first);
                prop_assert_eq!(prediction.antecedents.get(&key), Some(Antecedent::NewEntity));
            }
        }
    }

    #[test]
    fn training_and_prediction_are_reproducible(train in corpus_strategy()) {
        let experiment = experiment("best_first", None);
        let a = experiment.learn(&train).unwrap();
        let b = experiment.learn(&train).unwrap();
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(
            experiment.predict(&train, &a).unwrap(),
            experiment.predict(&train, &b).unwrap()
        );
    }

    #[test]
    fn ties_resolve_to_nearest_antecedent(
        n in 1..6usize,
        score in -5.0..5.0f64,
        with_new in any::<bool>(),
    ) {
        let mut candidates = Vec::new();
        if with_new {
            candidates.push(ScoredCandidate::new(Antecedent::NewEntity, score));
        }
        // farthest first, so the nearest antecedent is not at index 0
        for j in 0..n {
            candidates.push(ScoredCandidate::new(Antecedent::Mention(MentionId(j)), score));
        }
        let scores = MentionScores::new(MentionId(n), candidates);
        prop_assert_eq!(scores.best(), Antecedent::Mention(MentionId(n - 1)));
    }
}
