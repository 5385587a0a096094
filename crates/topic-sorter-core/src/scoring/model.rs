use tracing::debug;

use super::ScoreResult;
use crate::classifier::Classifier;

/// Ask the classifier about the joined terms plus any extracted document text.
///
/// Never fails: a classifier error becomes a `General`/0 vote carrying the error text.
pub fn score_model_based<S: AsRef<str>>(terms: &[S], text: &str, classifier: &dyn Classifier) -> ScoreResult {
    let mut combined = terms
        .iter()
        .map(|t| t.as_ref())
        .collect::<Vec<_>>()
        .join(" ");
    if !text.trim().is_empty() {
        combined.push(' ');
        combined.push_str(text);
    }

    match classifier.predict(&combined) {
        Ok(prediction) => {
            let score = prediction.confidence * 100.0;
            ScoreResult::new(
                prediction.label.clone(),
                score,
                vec![format!(
                    "Model-based: predicted destination '{}' with confidence {:.2}",
                    prediction.label, prediction.confidence
                )],
            )
        }
        Err(err) => {
            debug!("Model-based scoring unavailable: {}", err);
            ScoreResult::general(vec![format!("Model-based: error during prediction: {}", err)])
        }
    }
}
