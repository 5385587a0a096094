//! The per-run audit trail written once at the end of a sort.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::associations::store::write_pretty_json;
use crate::error::Error;
use crate::scoring::{ScoreResult, Strategy};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunLog {
    #[serde(rename = "Sorted", default)]
    pub sorted: Vec<SortedEntry>,
    #[serde(rename = "Unsorted", default)]
    pub unsorted: Vec<UnsortedEntry>,
    #[serde(rename = "Duplicates", default)]
    pub duplicates: Vec<DuplicateEntry>,
    #[serde(rename = "Errors", default)]
    pub errors: Vec<ErrorEntry>,
    #[serde(rename = "Predictions", default)]
    pub predictions: Vec<PredictionEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortedEntry {
    pub file: String,
    pub source: String,
    pub destination: String,
    pub method: Strategy,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnsortedEntry {
    pub file: String,
    pub source: String,
    pub reason: String,
    #[serde(rename = "predicted destination")]
    pub predicted_destination: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateEntry {
    pub file: String,
    pub source: String,
    pub duplicate_of: String,
}

/// One failure, keyed by its kind (`move_error`, `hash_error`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorEntry {
    Move { move_error: String, file: String },
    Hash { hash_error: String, file: String },
    Extract { extract_error: String, file: String },
    Destination { destination_error: String, file: String },
    Source { source_error: String, path: String },
}

impl ErrorEntry {
    pub fn message(&self) -> &str {
        match self {
            ErrorEntry::Move { move_error: m, .. }
            | ErrorEntry::Hash { hash_error: m, .. }
            | ErrorEntry::Extract { extract_error: m, .. }
            | ErrorEntry::Destination { destination_error: m, .. }
            | ErrorEntry::Source { source_error: m, .. } => m,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyVotes {
    #[serde(rename = "rule-based")]
    pub rule_based: ScoreResult,
    pub hybrid: ScoreResult,
    #[serde(rename = "ai")]
    pub model: ScoreResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionEntry {
    pub file: String,
    /// Fingerprint of the cluster key the file was scored under.
    pub cluster: String,
    pub chosen: Strategy,
    pub predictions: StrategyVotes,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write(&self, path: &Path) -> Result<(), Error> {
        write_pretty_json(self, path)
    }
}

pub(crate) fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
