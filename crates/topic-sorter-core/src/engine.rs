use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

use crate::associations::{self, AssociationTree, EnrichOptions, Guidebook, SynonymSource};
use crate::classifier::{self, Classifier, NaiveBayes};
use crate::cluster::{cluster_files, Cluster, FileEntry};
use crate::config::AppConfig;
use crate::error::Error;
use crate::extract::{DocumentExtractor, NoExtraction, TextExtractor};
use crate::hasher::{digest_files, ContentDigest, DuplicateCache, DuplicateCheck};
use crate::history::OperationHistory;
use crate::progress::{CancelToken, Outcome, PercentGauge, Phase, ProgressReporter};
use crate::runlog::{
    path_string, DuplicateEntry, ErrorEntry, PredictionEntry, RunLog, SortedEntry, StrategyVotes,
    UnsortedEntry,
};
use crate::scanner;
use crate::scoring::{
    arbitrate, score_hybrid_from, score_model_based, score_rule_based, ArbitrationOutcome,
    ScoreResult,
};
use crate::text::normalize;

pub struct SortEngine {
    config: AppConfig,
    associations: AssociationTree,
    classifier: Box<dyn Classifier>,
    extractor: Box<dyn TextExtractor>,
    history: OperationHistory,
}

#[derive(Debug)]
pub struct SortReport {
    pub log: RunLog,
    pub files_found: usize,
    pub clusters: usize,
    pub duration: Duration,
    pub log_path: PathBuf,
}

/// All three votes for one cluster and the arbiter's pick.
#[derive(Debug, Clone)]
pub struct Votes {
    pub rule: ScoreResult,
    pub hybrid: ScoreResult,
    pub model: ScoreResult,
    pub outcome: ArbitrationOutcome,
}

/// Dry-run result for a single filename.
#[derive(Debug, Clone)]
pub struct Explanation {
    pub filename: String,
    pub terms: Vec<String>,
    pub votes: Votes,
    pub would_sort: bool,
}

impl SortEngine {
    pub fn new(config: AppConfig) -> Self {
        let extractor: Box<dyn TextExtractor> = if config.extract_text {
            Box::new(DocumentExtractor::default())
        } else {
            Box::new(NoExtraction)
        };
        Self {
            config,
            associations: AssociationTree::new(),
            classifier: Box::new(NaiveBayes::new()),
            extractor,
            history: OperationHistory::new(),
        }
    }

    pub fn with_associations(mut self, associations: AssociationTree) -> Self {
        self.associations = associations;
        self
    }

    pub fn with_classifier(mut self, classifier: Box<dyn Classifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_extractor(mut self, extractor: Box<dyn TextExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn associations(&self) -> &AssociationTree {
        &self.associations
    }

    pub fn history(&self) -> &OperationHistory {
        &self.history
    }

    pub fn classifier_trained(&self) -> bool {
        self.classifier.is_trained()
    }

    /// Replace the in-memory associations with the configured file's contents.
    pub fn load_associations(&mut self) -> &AssociationTree {
        self.associations = associations::load(Path::new(&self.config.associations_file));
        &self.associations
    }

    /// Rebuild the associations file from the destination tree and adopt the result.
    pub fn refresh_associations(
        &mut self,
        synonyms: &dyn SynonymSource,
        reporter: &dyn ProgressReporter,
        cancel: &CancelToken,
    ) -> Result<Outcome<usize>, Error> {
        let dest_root = self.config.destination_root().ok_or(Error::NoDestination)?;
        let guidebook = Guidebook::load(Path::new(&self.config.guidebook_file));
        let outcome = associations::generate_associations(
            &dest_root,
            Path::new(&self.config.associations_file),
            &guidebook,
            synonyms,
            &EnrichOptions::from_config(&self.config),
            reporter,
            cancel,
        )?;
        Ok(outcome.map(|tree| {
            let folders = tree.total_folders();
            self.associations = tree;
            folders
        }))
    }

    /// Train the classifier on the guidebook, the loaded associations and any extra examples.
    ///
    /// Returns the number of examples used.
    pub fn train_classifier(
        &mut self,
        reporter: &dyn ProgressReporter,
        cancel: &CancelToken,
    ) -> Result<Outcome<usize>, Error> {
        let guidebook = Guidebook::load(Path::new(&self.config.guidebook_file));
        let extra = self
            .config
            .training_examples_file
            .as_deref()
            .map(|file| classifier::load_extra_examples(Path::new(file)))
            .unwrap_or_default();
        let examples = classifier::build_training_set(&guidebook, &self.associations, extra);
        info!("Training classifier on {} examples", examples.len());

        let outcome = self.classifier.train(&examples, reporter, cancel)?;
        if outcome.is_cancelled() {
            info!("Training cancelled; previous model kept");
        }
        Ok(outcome.map(|()| examples.len()))
    }

    /// Walk the sources, then sort everything found.
    pub fn sort(
        &mut self,
        reporter: &dyn ProgressReporter,
        cancel: &CancelToken,
    ) -> Result<Outcome<SortReport>, Error> {
        let dest_root = self.config.destination_root().ok_or(Error::NoDestination)?;
        let roots = self.config.source_roots();
        info!("Processing source directories: {:?}", roots);

        let walk_start = Instant::now();
        reporter.on_phase_start(Phase::Walk);
        let walk = match scanner::collect_files(&roots, &self.config.ignore_patterns, reporter, cancel) {
            Outcome::Completed(walk) => walk,
            Outcome::Cancelled => {
                info!("Sort cancelled during directory walk; nothing moved");
                reporter.on_phase_cancelled(Phase::Walk);
                return Ok(Outcome::Cancelled);
            }
        };
        reporter.on_phase_complete(Phase::Walk, walk_start.elapsed().as_secs_f64());
        info!(
            "Found {} files in {:.2}s",
            walk.files.len(),
            walk_start.elapsed().as_secs_f64()
        );

        let mut log = RunLog::new();
        for (root, reason) in &walk.unreadable_roots {
            log.errors.push(ErrorEntry::Source {
                source_error: reason.clone(),
                path: path_string(root),
            });
        }
        self.run(walk.files, &dest_root, log, reporter, cancel)
    }

    /// Sort an explicit list of files, skipping the walk.
    pub fn sort_files(
        &mut self,
        files: Vec<FileEntry>,
        reporter: &dyn ProgressReporter,
        cancel: &CancelToken,
    ) -> Result<Outcome<SortReport>, Error> {
        let dest_root = self.config.destination_root().ok_or(Error::NoDestination)?;
        self.run(files, &dest_root, RunLog::new(), reporter, cancel)
    }

    fn run(
        &mut self,
        files: Vec<FileEntry>,
        dest_root: &Path,
        mut log: RunLog,
        reporter: &dyn ProgressReporter,
        cancel: &CancelToken,
    ) -> Result<Outcome<SortReport>, Error> {
        let start = Instant::now();
        let files_found = files.len();
        let clusters = cluster_files(files);
        info!(
            "Sorting {} files in {} clusters into {}",
            clusters.file_count(),
            clusters.len(),
            dest_root.display()
        );

        reporter.on_phase_start(Phase::Sort);
        let gauge = PercentGauge::new(reporter, Phase::Sort);
        gauge.start();

        let cache = DuplicateCache::new();
        let total = clusters.len();
        let mut cancelled = false;
        for (i, cluster) in clusters.iter().enumerate() {
            if cancel.is_cancelled() {
                info!("Sort cancelled after {} of {} clusters", i, total);
                cancelled = true;
                break;
            }

            let votes = self.score_cluster(cluster, &mut log);
            debug!(
                "Cluster [{}] ({} files) -> '{}' via {} (raw {:.2})",
                cluster.key,
                cluster.len(),
                votes.outcome.destination,
                votes.outcome.winning_strategy,
                votes.outcome.score
            );
            self.place_cluster(cluster, &votes.outcome, dest_root, &cache, &mut log);
            gauge.report_fraction(i + 1, total, 0, 100);
        }

        let log_path = PathBuf::from(&self.config.run_log_file);
        log.write(&log_path)?;
        info!(
            "Run log written to {}: {} sorted, {} unsorted, {} duplicates, {} errors",
            log_path.display(),
            log.sorted.len(),
            log.unsorted.len(),
            log.duplicates.len(),
            log.errors.len()
        );

        if cancelled {
            reporter.on_phase_cancelled(Phase::Sort);
            return Ok(Outcome::Cancelled);
        }
        reporter.on_phase_complete(Phase::Sort, start.elapsed().as_secs_f64());
        Ok(Outcome::Completed(SortReport {
            log,
            files_found,
            clusters: total,
            duration: start.elapsed(),
            log_path,
        }))
    }

    fn vote(&self, terms: &[String], text: &str) -> Votes {
        let rule = score_rule_based(terms, &self.associations);
        let hybrid = score_hybrid_from(&rule, self.config.hybrid_bonus);
        let model = score_model_based(terms, text, self.classifier.as_ref());
        let outcome = arbitrate(&rule, &hybrid, &model, &self.config.method_strengths);
        Votes {
            rule,
            hybrid,
            model,
            outcome,
        }
    }

    fn score_cluster(&self, cluster: &Cluster, log: &mut RunLog) -> Votes {
        let terms = cluster.terms();
        let text = self.extract_cluster_text(cluster, log);
        let votes = self.vote(&terms, &text);

        let fingerprint = cluster.key.fingerprint();
        for member in &cluster.members {
            log.predictions.push(PredictionEntry {
                file: path_string(member.path()),
                cluster: fingerprint.clone(),
                chosen: votes.outcome.winning_strategy,
                predictions: StrategyVotes {
                    rule_based: votes.rule.clone(),
                    hybrid: votes.hybrid.clone(),
                    model: votes.model.clone(),
                },
            });
        }
        votes
    }

    fn extract_cluster_text(&self, cluster: &Cluster, log: &mut RunLog) -> String {
        let mut parts = Vec::new();
        for member in &cluster.members {
            match self.extractor.extract(member.path()) {
                Ok(text) if !text.trim().is_empty() => parts.push(text),
                Ok(_) => {}
                Err(err) => {
                    error!("Could not extract text from {}: {}", member.path().display(), err);
                    log.errors.push(ErrorEntry::Extract {
                        extract_error: err.to_string(),
                        file: path_string(member.path()),
                    });
                }
            }
        }
        parts.join(" ")
    }

    fn place_cluster(
        &mut self,
        cluster: &Cluster,
        outcome: &ArbitrationOutcome,
        dest_root: &Path,
        cache: &DuplicateCache,
        log: &mut RunLog,
    ) {
        let paths: Vec<&Path> = cluster.members.iter().map(FileEntry::path).collect();
        let digests = digest_files(&paths);
        let resolved_dir = destination_dir(dest_root, &outcome.destination);

        for member in &cluster.members {
            let source = member.path();
            let digest = digests.remove(source).map(|(_, result)| result);
            if let DuplicateCheck::Duplicate { original } = check_duplicate(cache, source, digest, log) {
                debug!("{} duplicates {}", source.display(), original.display());
                log.duplicates.push(DuplicateEntry {
                    file: member.filename.clone(),
                    source: path_string(source),
                    duplicate_of: path_string(&original),
                });
                continue;
            }

            if outcome.score < self.config.score_threshold {
                let predicted = match &resolved_dir {
                    Ok(dir) => dir.join(member.file_name()),
                    Err(_) => dest_root.join(&outcome.destination).join(member.file_name()),
                };
                debug!(
                    "Skipped '{}' due to low score {:.2}; predicted destination '{}'",
                    member.filename,
                    outcome.score,
                    predicted.display()
                );
                log.unsorted.push(UnsortedEntry {
                    file: member.filename.clone(),
                    source: path_string(source),
                    reason: format!("Low score: {:.2}", outcome.score),
                    predicted_destination: path_string(&predicted),
                });
                continue;
            }

            let target_dir = match &resolved_dir {
                Ok(dir) => dir,
                Err(err) => {
                    error!("Not moving {}: {}", source.display(), err);
                    log.errors.push(ErrorEntry::Destination {
                        destination_error: err.to_string(),
                        file: path_string(source),
                    });
                    continue;
                }
            };
            let target = target_dir.join(member.file_name());
            let moved = fs::create_dir_all(target_dir).and_then(|()| move_file(source, &target));
            match moved {
                Ok(()) => {
                    info!("Moved {} -> {}", source.display(), target.display());
                    self.history.record_move(source.to_path_buf(), target.clone());
                    log.sorted.push(SortedEntry {
                        file: member.filename.clone(),
                        source: path_string(source),
                        destination: path_string(&target),
                        method: outcome.winning_strategy,
                        detail: format!(
                            "Matched via {}: {}",
                            outcome.winning_strategy,
                            outcome.rationale.join("; ")
                        ),
                    });
                }
                Err(err) => {
                    error!("Failed to move {}: {}", source.display(), err);
                    log.errors.push(ErrorEntry::Move {
                        move_error: err.to_string(),
                        file: path_string(source),
                    });
                }
            }
        }
    }

    /// Score a bare filename without touching the filesystem.
    pub fn explain(&self, filename: &str) -> Explanation {
        let terms = normalize(filename);
        let votes = self.vote(&terms, "");
        let would_sort = votes.outcome.score >= self.config.score_threshold;
        Explanation {
            filename: filename.to_string(),
            terms,
            votes,
            would_sort,
        }
    }
}

/// Dedup check for one file. A file that could not be hashed counts as original.
fn check_duplicate(
    cache: &DuplicateCache,
    path: &Path,
    digest: Option<io::Result<ContentDigest>>,
    log: &mut RunLog,
) -> DuplicateCheck {
    let digest = match digest {
        Some(result) => result,
        None => crate::hasher::digest_file(path),
    };
    match digest {
        Ok(digest) => cache.check_digest(path, digest),
        Err(err) => {
            error!("Error hashing {}: {}", path.display(), err);
            log.errors.push(ErrorEntry::Hash {
                hash_error: err.to_string(),
                file: path_string(path),
            });
            DuplicateCheck::Original
        }
    }
}

/// Resolve a destination label such as `Math` or `Math/General` below `dest_root`.
///
/// Every `/`-separated component must be a plain folder name.
pub fn destination_dir(dest_root: &Path, label: &str) -> Result<PathBuf, Error> {
    let mut dir = dest_root.to_path_buf();
    for part in label.split('/') {
        let mut components = Path::new(part).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) => dir.push(name),
            _ => return Err(Error::InvalidDestination(label.to_string())),
        }
    }
    Ok(dir)
}

/// Move without ever replacing an existing file. Falls back to copy + remove when a
/// plain rename is not possible (different filesystems).
pub fn move_file(source: &Path, target: &Path) -> io::Result<()> {
    if target.exists() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("destination {} already exists", target.display()),
        ));
    }
    if let Err(rename_err) = fs::rename(source, target) {
        debug!(
            "Rename {} -> {} failed ({}); copying instead",
            source.display(),
            target.display(),
            rename_err
        );
        fs::copy(source, target)?;
        if let Err(remove_err) = fs::remove_file(source) {
            let _ = fs::remove_file(target);
            return Err(remove_err);
        }
    }
    Ok(())
}
