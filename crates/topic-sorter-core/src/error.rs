use thiserror::Error;

use crate::classifier::ClassifierError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("Classifier error: {0}")]
    Classifier(#[from] ClassifierError),

    #[error("No destination directory configured")]
    NoDestination,

    #[error("Invalid destination '{0}'")]
    InvalidDestination(String),

    #[error("{0}")]
    Other(String),
}
