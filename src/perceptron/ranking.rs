//! Latent mention-ranking perceptron with cost-augmented inference and
//! parameter averaging.
//!
//! Per instance:
//!
//! 1. score every candidate as `prior(role) + w·φ + cost_scaling * cost`
//! 2. the prediction is the argmax of that score
//! 3. the target is the argmax among candidates of minimal cost
//! 4. if the prediction is not of minimal cost, add `η·φ(target)` and
//!    subtract `η·φ(prediction)`, moving the role priors the same way
//!
//! Averaging keeps, per parameter, the sum of `counter * delta` over all
//! updates; the averaged parameter is `w - sum / counter`, which equals the
//! mean of the parameter over all processed instances.

use super::{Model, Perceptron, TrainingOptions};
use crate::extractor::{Candidate, Instance, Role};
use crate::Result;
use anaphor_core::{MentionScores, ScoredCandidate};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::{BTreeMap, HashMap};

/// Outcome of one pass over the training data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpochReport {
    /// 1-based epoch number.
    pub epoch: usize,
    /// Instances whose prediction triggered an update.
    pub incorrect: usize,
    /// Instances processed.
    pub instances: usize,
}

/// Mutable training state.
///
/// Weights only exist inside the session; [`TrainingSession::finish`]
/// consumes it and hands out the immutable [`Model`].
#[derive(Debug)]
pub struct TrainingSession {
    options: TrainingOptions,
    feature_signature: String,
    priors: [f64; 2],
    weights: HashMap<String, f64>,
    cached_priors: [f64; 2],
    cached_weights: HashMap<String, f64>,
    counter: u64,
    rng: StdRng,
    reports: Vec<EpochReport>,
}

fn role_index(role: Role) -> usize {
    match role {
        Role::NewEntity => 0,
        Role::Link => 1,
    }
}

impl TrainingSession {
    /// Start a session; fails on invalid options.
    pub fn new(options: TrainingOptions, feature_signature: impl Into<String>) -> Result<Self> {
        options.validate()?;
        let rng = StdRng::seed_from_u64(u64::from(options.seed));
        Ok(Self {
            options,
            feature_signature: feature_signature.into(),
            priors: [0.0; 2],
            weights: HashMap::new(),
            cached_priors: [0.0; 2],
            cached_weights: HashMap::new(),
            counter: 0,
            rng,
            reports: Vec::new(),
        })
    }

    /// Run `n_iter` epochs over `instances`, reshuffling before each one.
    pub fn train(&mut self, instances: &[&Instance]) {
        let mut order: Vec<usize> = (0..instances.len()).collect();
        for _ in 0..self.options.n_iter {
            order.shuffle(&mut self.rng);

            let mut incorrect = 0;
            for &i in &order {
                if self.step(instances[i]) {
                    incorrect += 1;
                }
            }

            let report = EpochReport {
                epoch: self.reports.len() + 1,
                incorrect,
                instances: instances.len(),
            };
            log::info!("Finished epoch {}", report.epoch);
            log::info!(
                "\tIncorrect predictions: {}/{}",
                report.incorrect,
                report.instances
            );
            self.reports.push(report);
        }
    }

    /// Process one instance. Returns true if the weights were updated.
    pub fn step(&mut self, instance: &Instance) -> bool {
        let updated = match self.argmax(instance) {
            Some((predicted, target)) => {
                let min_cost = instance.min_cost();
                if instance.candidates[predicted].cost > min_cost {
                    let step = self.options.learning_rate;
                    self.update(&instance.candidates[target], step);
                    self.update(&instance.candidates[predicted], -step);
                    true
                } else {
                    false
                }
            }
            None => false,
        };
        self.counter += 1;
        updated
    }

    /// Per-epoch reports so far.
    #[must_use]
    pub fn reports(&self) -> &[EpochReport] {
        &self.reports
    }

    /// Cost-augmented score of a candidate under the current weights.
    #[must_use]
    pub fn score(&self, candidate: &Candidate) -> f64 {
        let dot: f64 = candidate
            .features
            .iter()
            .map(|(id, v)| self.weights.get(id).copied().unwrap_or(0.0) * v)
            .sum();
        self.priors[role_index(candidate.role())] + dot + self.options.cost_scaling * candidate.cost
    }

    /// Indices of the predicted and the target candidate.
    fn argmax(&self, instance: &Instance) -> Option<(usize, usize)> {
        let scored: Vec<ScoredCandidate> = instance
            .candidates
            .iter()
            .map(|c| ScoredCandidate::new(c.antecedent, self.score(c)))
            .collect();
        let predicted = MentionScores::new(instance.mention, scored.clone()).best_index()?;

        let min_cost = instance.min_cost();
        let admissible: Vec<usize> = (0..scored.len())
            .filter(|&i| instance.candidates[i].cost <= min_cost)
            .collect();
        let target = MentionScores::new(
            instance.mention,
            admissible.iter().map(|&i| scored[i]).collect(),
        )
        .best_index()?;

        Some((predicted, admissible[target]))
    }

    fn update(&mut self, candidate: &Candidate, step: f64) {
        let counter = self.counter as f64;
        let role = role_index(candidate.role());
        self.priors[role] += step;
        self.cached_priors[role] += counter * step;
        for (id, v) in candidate.features.iter() {
            let delta = step * v;
            *self.weights.entry(id.to_string()).or_insert(0.0) += delta;
            *self.cached_weights.entry(id.to_string()).or_insert(0.0) += counter * delta;
        }
    }

    /// Finish training and return the model.
    #[must_use]
    pub fn finish(self) -> Model {
        let averaging = self.options.averaged && self.counter > 0;
        let counter = self.counter as f64;
        let average = |value: f64, cached: f64| {
            if averaging {
                value - cached / counter
            } else {
                value
            }
        };

        let mut model = Model::new(self.feature_signature);
        for role in [Role::NewEntity, Role::Link] {
            let i = role_index(role);
            model.priors.insert(
                role.as_str().to_string(),
                average(self.priors[i], self.cached_priors[i]),
            );
        }
        model.weights = self
            .weights
            .iter()
            .map(|(id, &w)| {
                let cached = self.cached_weights.get(id).copied().unwrap_or(0.0);
                (id.clone(), average(w, cached))
            })
            .filter(|(_, w)| *w != 0.0)
            .collect::<BTreeMap<_, _>>();
        model
    }
}

/// Mention-ranking perceptron: each mention picks one antecedent or starts a
/// new entity.
#[derive(Debug, Clone, Copy, Default)]
pub struct LatentRankingPerceptron;

impl LatentRankingPerceptron {
    /// Create the perceptron.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Perceptron for LatentRankingPerceptron {
    fn name(&self) -> &'static str {
        "mention_ranking"
    }

    fn fit(
        &self,
        batches: &[Vec<Instance>],
        options: &TrainingOptions,
        feature_signature: &str,
    ) -> Result<Model> {
        let mut session = TrainingSession::new(options.clone(), feature_signature)?;
        let instances: Vec<&Instance> = batches.iter().flatten().collect();
        if instances.is_empty() {
            log::warn!("No training instances; returning a zero model");
        }
        session.train(&instances);
        Ok(session.finish())
    }

    fn decode(&self, model: &Model, instance: &Instance) -> MentionScores {
        MentionScores::new(
            instance.mention,
            instance
                .candidates
                .iter()
                .map(|c| ScoredCandidate::new(c.antecedent, model.score(c)))
                .collect(),
        )
    }
}
