//! The classifier contract and the built-in naive Bayes implementation.

pub mod naive_bayes;
pub mod training;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::progress::{CancelToken, Outcome, ProgressReporter};

pub use naive_bayes::NaiveBayes;
pub use training::{build_training_set, load_extra_examples};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassifierError {
    #[error("model is not trained")]
    NotTrained,

    #[error("no training examples")]
    EmptyTrainingSet,

    #[error("classifier failure: {0}")]
    Failed(String),
}

/// A labelled piece of text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingExample {
    pub text: String,
    pub label: String,
}

impl TrainingExample {
    pub fn new(text: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            label: label.into(),
        }
    }
}

/// A predicted label with confidence in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    pub confidence: f64,
}

/// Text classifier used by model-based scoring.
///
/// `train` checks `cancel` between steps. A cancelled or failed training run leaves any
/// previously trained model in place.
pub trait Classifier: Send {
    fn train(
        &mut self,
        examples: &[TrainingExample],
        reporter: &dyn ProgressReporter,
        cancel: &CancelToken,
    ) -> Result<Outcome<()>, ClassifierError>;

    fn predict(&self, text: &str) -> Result<Prediction, ClassifierError>;

    fn is_trained(&self) -> bool;
}
