use std::collections::BTreeSet;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

use super::guidebook::Guidebook;
use super::store::{self, deep_merge};
use super::tree::{AssociationEntry, AssociationTree};
use crate::config::{AppConfig, UpdateMode};
use crate::error::Error;
use crate::progress::{CancelToken, Outcome, PercentGauge, Phase, ProgressReporter};
use crate::scanner::walk::{scan_folder_structure, FolderNode};
use crate::text::normalize;

/// Supplies extra keywords for a destination folder.
///
/// Implementations may be slow (a paraphrasing model, a thesaurus service). A failing
/// source costs that folder its synonyms, nothing more.
pub trait SynonymSource: Send + Sync {
    fn synonyms(&self, folder_name: &str, base_keywords: &[String]) -> Result<Vec<String>, Error>;
}

/// Adds nothing beyond the guidebook keywords.
pub struct NoSynonyms;

impl SynonymSource for NoSynonyms {
    fn synonyms(&self, _folder_name: &str, _base_keywords: &[String]) -> Result<Vec<String>, Error> {
        Ok(Vec::new())
    }
}

/// Uses the normalized words of the folder name itself, e.g. `Organic_Chemistry` →
/// `organic`, `chemistry`.
pub struct FolderNameTerms;

impl SynonymSource for FolderNameTerms {
    fn synonyms(&self, folder_name: &str, base_keywords: &[String]) -> Result<Vec<String>, Error> {
        Ok(normalize(folder_name)
            .into_iter()
            .filter(|term| !base_keywords.contains(term))
            .collect())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EnrichOptions {
    pub mode: UpdateMode,
    pub retain_old: bool,
    pub max_synonyms: usize,
}

impl EnrichOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            mode: config.association_update_mode,
            retain_old: config.retain_old_associations,
            max_synonyms: config.max_synonyms,
        }
    }
}

impl Default for EnrichOptions {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// Rebuild the associations file from the destination folder tree.
///
/// Returns the tree that was written. A cancelled pass leaves the file untouched.
pub fn generate_associations(
    dest_root: &Path,
    output_file: &Path,
    guidebook: &Guidebook,
    synonyms: &dyn SynonymSource,
    options: &EnrichOptions,
    reporter: &dyn ProgressReporter,
    cancel: &CancelToken,
) -> Result<Outcome<AssociationTree>, Error> {
    let start = Instant::now();
    reporter.on_phase_start(Phase::Enrich);
    let gauge = PercentGauge::new(reporter, Phase::Enrich);
    gauge.start();

    info!("Scanning destination folders under {}", dest_root.display());
    let folders = match scan_folder_structure(dest_root, cancel)? {
        Outcome::Completed(folders) => folders,
        Outcome::Cancelled => {
            info!("Association enrichment cancelled during folder scan");
            reporter.on_phase_cancelled(Phase::Enrich);
            return Ok(Outcome::Cancelled);
        }
    };
    gauge.report(50);

    let total = folders.iter().map(FolderNode::count).sum::<usize>();
    let mut enricher = Enricher {
        guidebook,
        synonyms,
        max_synonyms: options.max_synonyms,
        gauge: &gauge,
        cancel,
        done: 0,
        total,
    };
    let fresh = match enricher.build(&folders) {
        Outcome::Completed(tree) => tree,
        Outcome::Cancelled => {
            info!(
                "Association enrichment cancelled after {} of {} folders; nothing written",
                enricher.done, total
            );
            reporter.on_phase_cancelled(Phase::Enrich);
            return Ok(Outcome::Cancelled);
        }
    };

    let tree = match options.mode {
        UpdateMode::Incremental if options.retain_old && output_file.exists() => {
            match store::try_load(output_file) {
                Ok(old) => {
                    info!("Merging with existing associations in {}", output_file.display());
                    deep_merge(&old, &fresh)
                }
                Err(err) => {
                    warn!(
                        "Existing associations in {} unreadable ({}); rebuilding from scratch",
                        output_file.display(),
                        err
                    );
                    fresh
                }
            }
        }
        _ => fresh,
    };

    store::save(&tree, output_file)?;
    gauge.report(100);
    info!(
        "Associations written to {} ({} folders)",
        output_file.display(),
        tree.total_folders()
    );
    reporter.on_phase_complete(Phase::Enrich, start.elapsed().as_secs_f64());
    Ok(Outcome::Completed(tree))
}

struct Enricher<'a> {
    guidebook: &'a Guidebook,
    synonyms: &'a dyn SynonymSource,
    max_synonyms: usize,
    gauge: &'a PercentGauge<'a>,
    cancel: &'a CancelToken,
    done: usize,
    total: usize,
}

impl Enricher<'_> {
    fn build(&mut self, nodes: &[FolderNode]) -> Outcome<AssociationTree> {
        let mut tree = AssociationTree::new();
        for node in nodes {
            if self.cancel.is_cancelled() {
                return Outcome::Cancelled;
            }

            let keywords = self.keywords_for(&node.name);
            self.done += 1;
            self.gauge.report_fraction(self.done, self.total, 50, 100);

            let children = match self.build(&node.children) {
                Outcome::Completed(children) => children,
                Outcome::Cancelled => return Outcome::Cancelled,
            };
            let entry = AssociationEntry {
                name: node.name.clone(),
                path: node.path.to_string_lossy().into_owned(),
                children: Some(children),
                keywords,
            };
            tree.insert(node.name.clone(), entry);
        }
        Outcome::Completed(tree)
    }

    fn keywords_for(&self, folder_name: &str) -> BTreeSet<String> {
        let base = self.guidebook.keywords_for(folder_name);
        let extra = match self.synonyms.synonyms(folder_name, base) {
            Ok(extra) => extra,
            Err(err) => {
                warn!("Synonym lookup failed for '{}': {}", folder_name, err);
                Vec::new()
            }
        };
        base.iter()
            .cloned()
            .chain(extra.into_iter().take(self.max_synonyms))
            .collect()
    }
}
