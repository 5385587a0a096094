use ahash::{AHashMap, AHashSet};
use std::time::Instant;
use tracing::{debug, info};

use super::{Classifier, ClassifierError, Prediction, TrainingExample};
use crate::progress::{CancelToken, Outcome, PercentGauge, Phase, ProgressReporter};
use crate::text::normalize;

/// Multinomial naive Bayes over normalized tokens with add-one smoothing.
#[derive(Debug, Default)]
pub struct NaiveBayes {
    model: Option<Model>,
}

#[derive(Debug, Default)]
struct Model {
    /// Labels in first-seen order; ties in prediction go to the earlier label.
    labels: Vec<String>,
    documents: Vec<u32>,
    term_counts: Vec<AHashMap<String, u32>>,
    term_totals: Vec<u64>,
    vocabulary: AHashSet<String>,
}

impl NaiveBayes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn labels(&self) -> &[String] {
        self.model
            .as_ref()
            .map(|m| m.labels.as_slice())
            .unwrap_or(&[])
    }
}

impl Model {
    fn label_index(&mut self, label: &str) -> usize {
        if let Some(i) = self.labels.iter().position(|l| l == label) {
            return i;
        }
        self.labels.push(label.to_string());
        self.documents.push(0);
        self.term_counts.push(AHashMap::new());
        self.term_totals.push(0);
        self.labels.len() - 1
    }

    fn add(&mut self, example: &TrainingExample) {
        let i = self.label_index(&example.label);
        self.documents[i] += 1;
        for token in normalize(&example.text) {
            *self.term_counts[i].entry(token.clone()).or_insert(0) += 1;
            self.term_totals[i] += 1;
            self.vocabulary.insert(token);
        }
    }

    fn log_posteriors(&self, tokens: &[String]) -> Vec<f64> {
        let total_docs: u32 = self.documents.iter().sum();
        let vocabulary = self.vocabulary.len() as f64;

        (0..self.labels.len())
            .map(|i| {
                let prior = (self.documents[i] as f64 / total_docs as f64).ln();
                let denominator = self.term_totals[i] as f64 + vocabulary;
                tokens
                    .iter()
                    .filter(|t| self.vocabulary.contains(t.as_str()))
                    .map(|t| {
                        let count = self.term_counts[i].get(t.as_str()).copied().unwrap_or(0);
                        ((count as f64 + 1.0) / denominator).ln()
                    })
                    .sum::<f64>()
                    + prior
            })
            .collect()
    }
}

impl Classifier for NaiveBayes {
    fn train(
        &mut self,
        examples: &[TrainingExample],
        reporter: &dyn ProgressReporter,
        cancel: &CancelToken,
    ) -> Result<Outcome<()>, ClassifierError> {
        if examples.is_empty() {
            return Err(ClassifierError::EmptyTrainingSet);
        }

        let start = Instant::now();
        reporter.on_phase_start(Phase::Train);
        let gauge = PercentGauge::new(reporter, Phase::Train);
        gauge.start();

        let mut model = Model::default();
        for (i, example) in examples.iter().enumerate() {
            if cancel.is_cancelled() {
                info!("Training cancelled after {} of {} examples", i, examples.len());
                reporter.on_phase_cancelled(Phase::Train);
                return Ok(Outcome::Cancelled);
            }
            model.add(example);
            gauge.report_fraction(i + 1, examples.len(), 0, 100);
        }

        info!(
            "Classifier trained with {} examples over {} labels ({} terms)",
            examples.len(),
            model.labels.len(),
            model.vocabulary.len()
        );
        self.model = Some(model);
        reporter.on_phase_complete(Phase::Train, start.elapsed().as_secs_f64());
        Ok(Outcome::Completed(()))
    }

    fn predict(&self, text: &str) -> Result<Prediction, ClassifierError> {
        let model = self.model.as_ref().ok_or(ClassifierError::NotTrained)?;
        let tokens = normalize(text);
        let scores = model.log_posteriors(&tokens);

        let mut best = 0;
        for (i, score) in scores.iter().enumerate() {
            if *score > scores[best] {
                best = i;
            }
        }

        // Softmax of the winner, shifted by the max for numerical stability.
        let max = scores[best];
        let norm: f64 = scores.iter().map(|s| (s - max).exp()).sum();
        let confidence = 1.0 / norm;
        if !confidence.is_finite() {
            return Err(ClassifierError::Failed(format!(
                "non-finite confidence for '{}'",
                text
            )));
        }

        debug!(
            "Predicted '{}' with confidence {:.3}",
            model.labels[best], confidence
        );
        Ok(Prediction {
            label: model.labels[best].clone(),
            confidence,
        })
    }

    fn is_trained(&self) -> bool {
        self.model.is_some()
    }
}
