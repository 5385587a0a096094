use glob::Pattern;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};
use walkdir::{DirEntry, WalkDir};

use crate::cluster::FileEntry;
use crate::progress::{CancelToken, Outcome, Phase, ProgressReporter};

/// How often the walk emits a status message.
const STATUS_EVERY: usize = 500;

/// Files found under the source roots, in lexicographic order per directory.
#[derive(Debug, Default)]
pub struct WalkReport {
    pub files: Vec<FileEntry>,
    /// Roots that could not be read at all, with the reason.
    pub unreadable_roots: Vec<(PathBuf, String)>,
}

fn compile_patterns(ignore_globs: &[String]) -> Vec<Pattern> {
    ignore_globs
        .iter()
        .filter_map(|glob| match Pattern::new(glob) {
            Ok(p) => Some(p),
            Err(e) => {
                error!("Invalid glob pattern '{}': {}", glob, e);
                None
            }
        })
        .collect()
}

fn is_ignored(entry: &DirEntry, patterns: &[Pattern]) -> bool {
    patterns
        .iter()
        .any(|pattern| pattern.matches_path(entry.path()))
}

fn absolute(root: &Path) -> PathBuf {
    fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf())
}

/// Walk every root and collect regular files. Symlinks are not followed.
///
/// A root that cannot be opened is reported once and skipped; the other roots proceed.
/// Errors on entries below a readable root are logged and the entry skipped.
pub fn collect_files(
    roots: &[PathBuf],
    ignore_globs: &[String],
    reporter: &dyn ProgressReporter,
    cancel: &CancelToken,
) -> Outcome<WalkReport> {
    let patterns = compile_patterns(ignore_globs);
    let mut report = WalkReport::default();

    for root in roots {
        if let Err(err) = fs::read_dir(root) {
            warn!("Skipping unreadable source {}: {}", root.display(), err);
            report.unreadable_roots.push((root.clone(), err.to_string()));
            continue;
        }

        let walker = WalkDir::new(absolute(root))
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !is_ignored(entry, &patterns));

        for entry in walker {
            if cancel.is_cancelled() {
                return Outcome::Cancelled;
            }

            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    error!("Error reading entry under {}: {}", root.display(), err);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            report.files.push(FileEntry::new(entry.into_path()));
            if report.files.len() % STATUS_EVERY == 0 {
                reporter.on_status(
                    Phase::Walk,
                    &format!("Scanning... {} files found", report.files.len()),
                );
            }
        }
        debug!("Walked {} ({} files so far)", root.display(), report.files.len());
    }

    Outcome::Completed(report)
}

/// A destination folder with its sub-folders, sorted by name.
#[derive(Debug, Clone, PartialEq)]
pub struct FolderNode {
    pub name: String,
    pub path: PathBuf,
    pub children: Vec<FolderNode>,
}

impl FolderNode {
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(FolderNode::count).sum::<usize>()
    }
}

/// Read the folder hierarchy under `root` (folders only).
///
/// Unreadable sub-folders are logged and treated as empty. An unreadable root is an error.
pub fn scan_folder_structure(root: &Path, cancel: &CancelToken) -> io::Result<Outcome<Vec<FolderNode>>> {
    fs::read_dir(root)?;
    Ok(scan_folders(root, cancel))
}

fn scan_folders(dir: &Path, cancel: &CancelToken) -> Outcome<Vec<FolderNode>> {
    let mut names: Vec<(String, PathBuf)> = match fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(err) => {
                    error!("Error reading entry in {}: {}", dir.display(), err);
                    None
                }
            })
            .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .map(|entry| (entry.file_name().to_string_lossy().into_owned(), entry.path()))
            .collect(),
        Err(err) => {
            error!("Error scanning directory {}: {}", dir.display(), err);
            Vec::new()
        }
    };
    names.sort();

    let mut nodes = Vec::with_capacity(names.len());
    for (name, path) in names {
        if cancel.is_cancelled() {
            return Outcome::Cancelled;
        }
        let children = match scan_folders(&path, cancel) {
            Outcome::Completed(children) => children,
            Outcome::Cancelled => return Outcome::Cancelled,
        };
        nodes.push(FolderNode {
            name,
            path,
            children,
        });
    }
    Outcome::Completed(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::SilentReporter;
    use tempfile::tempdir;

    fn names(report: &WalkReport) -> Vec<String> {
        report.files.iter().map(|f| f.filename.clone()).collect()
    }

    #[test]
    fn test_walk_is_lexicographic_and_recursive() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().join("src");
        fs::create_dir_all(root.join("b_dir")).unwrap();
        fs::write(root.join("c.txt"), "c").unwrap();
        fs::write(root.join("a.txt"), "a").unwrap();
        fs::write(root.join("b_dir").join("inner.txt"), "i").unwrap();

        let report = collect_files(&[root], &[], &SilentReporter, &CancelToken::new())
            .completed()
            .unwrap();
        assert_eq!(names(&report), vec!["a.txt", "inner.txt", "c.txt"]);
        assert!(report.files.iter().all(|f| f.path.is_absolute()));
    }

    #[test]
    fn test_walk_honours_ignore_patterns() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().join("src");
        fs::create_dir_all(root.join("skip_me")).unwrap();
        fs::write(root.join("keep.pdf"), "k").unwrap();
        fs::write(root.join("drop.tmp"), "d").unwrap();
        fs::write(root.join("skip_me").join("hidden.pdf"), "h").unwrap();

        let ignore = vec!["**/*.tmp".to_string(), "**/skip_me".to_string()];
        let report = collect_files(&[root], &ignore, &SilentReporter, &CancelToken::new())
            .completed()
            .unwrap();
        assert_eq!(names(&report), vec!["keep.pdf"]);
    }

    #[test]
    fn test_missing_root_is_reported_and_others_proceed() {
        let tmp = tempdir().unwrap();
        let good = tmp.path().join("good");
        fs::create_dir_all(&good).unwrap();
        fs::write(good.join("file.txt"), "x").unwrap();
        let missing = tmp.path().join("missing");

        let report = collect_files(
            &[missing.clone(), good],
            &[],
            &SilentReporter,
            &CancelToken::new(),
        )
        .completed()
        .unwrap();
        assert_eq!(report.files.len(), 1);
        assert_eq!(report.unreadable_roots.len(), 1);
        assert_eq!(report.unreadable_roots[0].0, missing);
    }

    #[test]
    fn test_cancelled_walk_returns_cancelled() {
        let tmp = tempdir().unwrap();
        fs::write(tmp.path().join("a.txt"), "a").unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();
        let outcome = collect_files(&[tmp.path().to_path_buf()], &[], &SilentReporter, &cancel);
        assert!(outcome.is_cancelled());
    }

    #[test]
    fn test_folder_structure_skips_files() {
        let tmp = tempdir().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("Math").join("Algebra")).unwrap();
        fs::create_dir_all(root.join("Chemistry")).unwrap();
        fs::write(root.join("loose.txt"), "x").unwrap();

        let nodes = scan_folder_structure(root, &CancelToken::new())
            .unwrap()
            .completed()
            .unwrap();
        let top: Vec<&str> = nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(top, vec!["Chemistry", "Math"]);
        assert_eq!(nodes[1].children[0].name, "Algebra");
        assert_eq!(nodes.iter().map(FolderNode::count).sum::<usize>(), 3);
    }
}
