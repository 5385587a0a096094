//! The three scoring strategies and the arbiter that picks between them.

pub mod arbiter;
pub mod hybrid;
pub mod model;
pub mod rule;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use arbiter::{arbitrate, ArbitrationOutcome, MethodWeights};
pub use hybrid::{score_hybrid, score_hybrid_from};
pub use model::score_model_based;
pub use rule::score_rule_based;

/// Destination used when no strategy finds anything better.
pub const GENERAL_DESTINATION: &str = "General";

/// Which strategy produced a vote. Declaration order is the tie-break priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Rule,
    Hybrid,
    Model,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::Rule => "rule",
            Strategy::Hybrid => "hybrid",
            Strategy::Model => "model",
        };
        f.write_str(name)
    }
}

/// One strategy's vote for a cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub destination: String,
    #[serde(rename = "score")]
    pub raw_score: f64,
    #[serde(rename = "steps")]
    pub rationale: Vec<String>,
}

impl ScoreResult {
    pub fn new(destination: impl Into<String>, raw_score: f64, rationale: Vec<String>) -> Self {
        Self {
            destination: destination.into(),
            raw_score,
            rationale,
        }
    }

    /// The `General`/0 vote.
    pub fn general(rationale: Vec<String>) -> Self {
        Self::new(GENERAL_DESTINATION, 0.0, rationale)
    }
}
