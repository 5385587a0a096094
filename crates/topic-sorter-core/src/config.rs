use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::scoring::arbiter::MethodWeights;

pub const DEFAULT_SCORE_THRESHOLD: f64 = 40.0;
pub const DEFAULT_HYBRID_BONUS: f64 = 5.0;
pub const DEFAULT_MAX_SYNONYMS: usize = 5;

/// How the enrichment pass treats an existing associations file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateMode {
    #[default]
    Full,
    Incremental,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub source_dirs: Vec<String>,
    pub dest_heads: Vec<String>,
    pub ignore_patterns: Vec<String>,
    pub score_threshold: f64,
    pub method_strengths: MethodWeights,
    pub hybrid_bonus: f64,
    pub guidebook_file: String,
    pub associations_file: String,
    pub association_update_mode: UpdateMode,
    pub retain_old_associations: bool,
    pub training_examples_file: Option<String>,
    pub run_log_file: String,
    pub extract_text: bool,
    pub max_synonyms: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            source_dirs: Vec::new(),
            dest_heads: Vec::new(),
            ignore_patterns: Vec::new(),
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            method_strengths: MethodWeights::default(),
            hybrid_bonus: DEFAULT_HYBRID_BONUS,
            guidebook_file: "syllabus.json".to_string(),
            associations_file: "associations.json".to_string(),
            association_update_mode: UpdateMode::Full,
            retain_old_associations: true,
            training_examples_file: None,
            run_log_file: "file_sorting_log.json".to_string(),
            extract_text: true,
            max_synonyms: DEFAULT_MAX_SYNONYMS,
        }
    }
}

impl AppConfig {
    /// The first destination head; sorted files land underneath it.
    pub fn destination_root(&self) -> Option<PathBuf> {
        self.dest_heads.first().map(PathBuf::from)
    }

    /// Source roots with nested duplicates removed.
    pub fn source_roots(&self) -> Vec<PathBuf> {
        non_overlapping_directories(self.source_dirs.clone())
            .into_iter()
            .map(PathBuf::from)
            .collect()
    }
}

/// Load `Config.*` from the working directory if present, then `TOPIC_SORTER__*` overrides.
pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    load_configuration_from(None)
}

pub fn load_configuration_from(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let file_source = match path {
        Some(path) => ConfigFile::from(path).required(true),
        None => ConfigFile::with_name("Config").required(false),
    };

    let builder = Config::builder()
        .add_source(file_source)
        .add_source(Environment::with_prefix("TOPIC_SORTER").separator("__"))
        .build()?;
    builder.try_deserialize::<AppConfig>()
}

/// Remove directories that are subdirectories of other directories in the list.
pub fn non_overlapping_directories(dirs: Vec<String>) -> Vec<String> {
    let mut result: Vec<String> = Vec::new();

    for dir in dirs {
        let dir_path = Path::new(&dir);
        if result.iter().any(|kept| dir_path.starts_with(kept)) {
            continue;
        }
        result.retain(|kept| !Path::new(kept).starts_with(dir_path));
        result.push(dir);
    }

    result
}
