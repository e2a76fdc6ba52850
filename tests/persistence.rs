//! Model, configuration and corpus round-trips through the filesystem.

use anaphor::prelude::*;
use anaphor::perceptron::SCHEMA_VERSION;
use tempfile::tempdir;

fn corpus() -> Corpus {
    Corpus::new(vec![Document::new("d").with_system_mentions(vec![
        Mention::new(0, 2, 0, ["Ada", "Lovelace"]).with_set_id("ada"),
        Mention::new(5, 7, 0, ["Ada", "Lovelace"]).with_set_id("ada"),
        Mention::new(9, 10, 1, ["Babbage"]).with_set_id("cb"),
    ])])
}

fn experiment() -> Experiment {
    let config = ExperimentConfig::from_toml_str(
        r#"
        [features]
        mention = ["length"]
        pairwise = ["exact_match", "token_overlap", "sentence_distance"]
        "#,
    )
    .unwrap();
    Factory::build(&config).unwrap()
}

#[test]
fn saved_model_predicts_identically() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("model.json");

    let experiment = experiment();
    let model = experiment.learn(&corpus()).unwrap();
    model.save(&path).unwrap();
    let loaded = Model::load(&path).unwrap();

    assert_eq!(loaded, model);
    assert_eq!(loaded.schema_version, SCHEMA_VERSION);
    assert_eq!(
        experiment.predict(&corpus(), &loaded).unwrap(),
        experiment.predict(&corpus(), &model).unwrap()
    );
}

#[test]
fn model_json_is_readable() {
    let model = experiment().learn(&corpus()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&model.to_json().unwrap()).unwrap();
    assert!(value["priors"]["new"].is_number());
    assert!(value["priors"]["link"].is_number());
    assert!(value["weights"].is_object());
    assert_eq!(
        value["feature_signature"],
        "mention=[length];pairwise=[exact_match,token_overlap,sentence_distance];conjoin=true;combinations=false"
    );
}

#[test]
fn corrupt_model_file_is_a_serialization_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("model.json");
    std::fs::write(&path, "{ \"priors\": ").unwrap();
    assert!(matches!(Model::load(&path), Err(Error::Serialization(_))));
}

#[test]
fn missing_model_file_is_an_io_error() {
    let dir = tempdir().unwrap();
    assert!(matches!(
        Model::load(dir.path().join("absent.json")),
        Err(Error::Io(_))
    ));
}

#[test]
fn config_file_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("experiment.toml");

    let mut config = ExperimentConfig::default();
    config.clusterer = "closest_first".into();
    config.features.mention = vec!["type".into(), "gender".into()];
    config.extractor.max_antecedents = Some(20);
    config.perceptron.seed = 99;
    config.save(&path).unwrap();

    let loaded = ExperimentConfig::load(&path).unwrap();
    assert_eq!(loaded, config);
    assert!(loaded.validate().is_ok());
}

#[test]
fn corpus_json_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("corpus.json");
    std::fs::write(&path, corpus().to_json().unwrap()).unwrap();

    let loaded = Corpus::load(&path).unwrap();
    assert_eq!(loaded, corpus());
    assert_eq!(loaded.mention_count(), 3);
}
