use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::{tempdir, TempDir};

use topic_sorter_core::associations::{AssociationEntry, AssociationTree, NoSynonyms};
use topic_sorter_core::progress::Phase;
use topic_sorter_core::runlog::{ErrorEntry, RunLog};
use topic_sorter_core::scoring::Strategy;
use topic_sorter_core::{AppConfig, CancelToken, Outcome, ProgressReporter, SilentReporter, SortEngine};

/// Layout:
///   src/      the files to sort
///   dest/     destination head
///   *.json    guidebook, associations and run log
struct Fixture {
    _tmp: TempDir,
    root: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let tmp = tempdir().unwrap();
        let root = fs::canonicalize(tmp.path()).unwrap();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::create_dir_all(root.join("dest")).unwrap();
        Self { _tmp: tmp, root }
    }

    fn src(&self) -> PathBuf {
        self.root.join("src")
    }

    fn dest(&self) -> PathBuf {
        self.root.join("dest")
    }

    fn write_source(&self, name: &str, content: &str) -> PathBuf {
        let path = self.src().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn config(&self, threshold: f64) -> AppConfig {
        AppConfig {
            source_dirs: vec![self.src().to_string_lossy().into_owned()],
            dest_heads: vec![self.dest().to_string_lossy().into_owned()],
            score_threshold: threshold,
            guidebook_file: self.root.join("syllabus.json").to_string_lossy().into_owned(),
            associations_file: self.root.join("associations.json").to_string_lossy().into_owned(),
            run_log_file: self.root.join("file_sorting_log.json").to_string_lossy().into_owned(),
            extract_text: false,
            ..AppConfig::default()
        }
    }

    fn read_log(&self) -> RunLog {
        let text = fs::read_to_string(self.root.join("file_sorting_log.json")).unwrap();
        serde_json::from_str(&text).unwrap()
    }
}

fn math_associations() -> AssociationTree {
    let mut tree = AssociationTree::new();
    tree.insert("Math", AssociationEntry::new("Math").with_keywords(["algebra", "notes"]));
    tree
}

/// Case and separator variants of one topic; they share a cluster key.
const ALGEBRA_NOTES: [&str; 3] = ["algebra_notes_1.pdf", "Algebra-Notes-2.pdf", "ALGEBRA_notes_3.pdf"];

fn write_algebra_notes(fixture: &Fixture) {
    for (i, name) in ALGEBRA_NOTES.iter().enumerate() {
        fixture.write_source(name, &format!("notes body {i}"));
    }
}

fn sort(engine: &mut SortEngine) -> Outcome<topic_sorter_core::SortReport> {
    engine.sort(&SilentReporter, &CancelToken::new()).unwrap()
}

#[test]
fn test_three_file_cluster_is_moved_together() {
    let fixture = Fixture::new();
    write_algebra_notes(&fixture);

    let mut engine = SortEngine::new(fixture.config(25.0)).with_associations(math_associations());
    let report = sort(&mut engine).completed().unwrap();

    assert_eq!(report.files_found, 3);
    assert_eq!(report.clusters, 1);
    assert_eq!(report.log.sorted.len(), 3);
    for name in ALGEBRA_NOTES {
        assert!(fixture.dest().join("Math").join(name).exists());
        assert!(!fixture.src().join(name).exists());
    }
    assert!(report.log.sorted.iter().all(|s| s.method == Strategy::Hybrid));
    assert_eq!(engine.history().len(), 3);

    let predictions = &report.log.predictions;
    assert_eq!(predictions.len(), 3);
    assert!(predictions.iter().all(|p| p.cluster == predictions[0].cluster));
    assert_eq!(predictions[0].predictions.rule_based.raw_score, 25.0);
    assert_eq!(predictions[0].predictions.hybrid.raw_score, 30.0);
    assert_eq!(predictions[0].predictions.model.destination, "General");

    assert_eq!(fixture.read_log(), report.log);
}

#[test]
fn test_low_raw_score_leaves_cluster_unsorted() {
    let fixture = Fixture::new();
    write_algebra_notes(&fixture);

    let mut engine = SortEngine::new(fixture.config(40.0)).with_associations(math_associations());
    let report = sort(&mut engine).completed().unwrap();

    assert!(report.log.sorted.is_empty());
    assert_eq!(report.log.unsorted.len(), 3);
    assert!(report
        .log
        .unsorted
        .iter()
        .all(|u| u.reason == "Low score: 30.00"));
    let first = report
        .log
        .unsorted
        .iter()
        .find(|u| u.file == "algebra_notes_1.pdf")
        .unwrap();
    assert_eq!(
        PathBuf::from(&first.predicted_destination),
        fixture.dest().join("Math").join("algebra_notes_1.pdf")
    );
    assert!(fixture.src().join("algebra_notes_1.pdf").exists());
    assert!(!fixture.dest().join("Math").exists());
}

#[test]
fn test_unknown_singleton_goes_to_general_unsorted() {
    let fixture = Fixture::new();
    fixture.write_source("poetry_sonnets.txt", "shall i compare thee");
    let mut config = fixture.config(40.0);
    config
        .source_dirs
        .push(fixture.root.join("missing").to_string_lossy().into_owned());

    let mut engine = SortEngine::new(config).with_associations(math_associations());
    let report = sort(&mut engine).completed().unwrap();

    assert_eq!(report.log.unsorted.len(), 1);
    assert_eq!(report.log.unsorted[0].reason, "Low score: 5.00");
    assert!(report.log.unsorted[0]
        .predicted_destination
        .ends_with("poetry_sonnets.txt"));
    assert!(Path::new(&report.log.unsorted[0].predicted_destination)
        .starts_with(fixture.dest().join("General")));

    assert_eq!(report.log.errors.len(), 1);
    assert!(matches!(report.log.errors[0], ErrorEntry::Source { .. }));
}

#[test]
fn test_pairs_are_dropped_from_the_run() {
    let fixture = Fixture::new();
    fixture.write_source("biology_cells_1.txt", "a");
    fixture.write_source("biology_cells_2.txt", "b");

    let mut engine = SortEngine::new(fixture.config(0.0)).with_associations(math_associations());
    let report = sort(&mut engine).completed().unwrap();

    assert_eq!(report.files_found, 2);
    assert_eq!(report.clusters, 0);
    assert!(report.log.predictions.is_empty());
    assert!(fixture.src().join("biology_cells_1.txt").exists());
}

#[test]
fn test_duplicates_are_never_moved() {
    let fixture = Fixture::new();
    let first = fixture.write_source("algebra_notes_1.pdf", "same bytes");
    fixture.write_source("algebra_notes_2.pdf", "other bytes");
    let third = fixture.write_source("algebra_notes_3.pdf", "same bytes");

    let mut engine = SortEngine::new(fixture.config(25.0)).with_associations(math_associations());
    let report = sort(&mut engine).completed().unwrap();

    assert_eq!(report.log.sorted.len(), 2);
    assert_eq!(report.log.duplicates.len(), 1);
    let duplicate = &report.log.duplicates[0];
    assert_eq!(PathBuf::from(&duplicate.source), third);
    assert_eq!(PathBuf::from(&duplicate.duplicate_of), first);
    assert!(third.exists());
    assert!(!fixture.dest().join("Math").join("algebra_notes_3.pdf").exists());
}

#[test]
fn test_existing_destination_file_is_an_error_not_an_overwrite() {
    let fixture = Fixture::new();
    write_algebra_notes(&fixture);
    let occupied = fixture.dest().join("Math").join("Algebra-Notes-2.pdf");
    fs::create_dir_all(occupied.parent().unwrap()).unwrap();
    fs::write(&occupied, "already here").unwrap();

    let mut engine = SortEngine::new(fixture.config(25.0)).with_associations(math_associations());
    let report = sort(&mut engine).completed().unwrap();

    assert_eq!(report.log.sorted.len(), 2);
    assert_eq!(report.log.errors.len(), 1);
    assert!(matches!(report.log.errors[0], ErrorEntry::Move { .. }));
    assert_eq!(fs::read_to_string(&occupied).unwrap(), "already here");
    assert!(fixture.src().join("Algebra-Notes-2.pdf").exists());
}

#[test]
fn test_unreadable_pdf_text_is_logged_and_file_still_sorted() {
    let fixture = Fixture::new();
    write_algebra_notes(&fixture);

    let config = AppConfig {
        extract_text: true,
        ..fixture.config(25.0)
    };
    let mut engine = SortEngine::new(config).with_associations(math_associations());
    let report = sort(&mut engine).completed().unwrap();

    assert_eq!(report.log.sorted.len(), 3);
    assert_eq!(report.log.errors.len(), 3);
    assert!(report
        .log
        .errors
        .iter()
        .all(|e| matches!(e, ErrorEntry::Extract { .. })));
}

#[test]
fn test_trained_model_label_creates_nested_folder() {
    let fixture = Fixture::new();
    fs::write(
        fixture.root.join("syllabus.json"),
        r#"{"Math": ["algebra", "geometry", "equations"]}"#,
    )
    .unwrap();
    fixture.write_source("equations_homework.pdf", "x");

    let mut engine = SortEngine::new(fixture.config(40.0));
    let examples = engine
        .train_classifier(&SilentReporter, &CancelToken::new())
        .unwrap()
        .completed()
        .unwrap();
    assert_eq!(examples, 1);
    assert!(engine.classifier_trained());

    let report = sort(&mut engine).completed().unwrap();
    assert_eq!(report.log.sorted.len(), 1);
    assert_eq!(report.log.sorted[0].method, Strategy::Model);
    assert!(fixture
        .dest()
        .join("Math")
        .join("General")
        .join("equations_homework.pdf")
        .exists());
}

#[test]
fn test_enrichment_feeds_rule_based_sorting() {
    let fixture = Fixture::new();
    fs::create_dir_all(fixture.dest().join("Math")).unwrap();
    fs::create_dir_all(fixture.dest().join("History")).unwrap();
    fs::write(
        fixture.root.join("syllabus.json"),
        r#"{"Math": ["algebra", "notes"], "History": ["rome"]}"#,
    )
    .unwrap();
    write_algebra_notes(&fixture);

    let mut engine = SortEngine::new(fixture.config(25.0));
    let folders = engine
        .refresh_associations(&NoSynonyms, &SilentReporter, &CancelToken::new())
        .unwrap()
        .completed()
        .unwrap();
    assert_eq!(folders, 2);
    assert!(fixture.root.join("associations.json").exists());

    let mut reloaded = SortEngine::new(fixture.config(25.0));
    assert_eq!(reloaded.load_associations().len(), 2);
    let report = sort(&mut reloaded).completed().unwrap();
    assert_eq!(report.log.sorted.len(), 3);
    assert!(fixture.dest().join("Math").join("ALGEBRA_notes_3.pdf").exists());
}

/// Cancels the run as soon as the first cluster has been processed.
struct CancelAfterFirstCluster {
    cancel: CancelToken,
    finished: Mutex<Vec<(Phase, bool)>>,
}

impl ProgressReporter for CancelAfterFirstCluster {
    fn on_progress(&self, phase: Phase, percent: u8) {
        if phase == Phase::Sort && percent > 0 {
            self.cancel.cancel();
        }
    }

    fn on_phase_complete(&self, phase: Phase, _duration_secs: f64) {
        self.finished.lock().unwrap().push((phase, true));
    }

    fn on_phase_cancelled(&self, phase: Phase) {
        self.finished.lock().unwrap().push((phase, false));
    }
}

#[test]
fn test_cancelled_sort_stops_between_clusters_and_keeps_log() {
    let fixture = Fixture::new();
    fixture.write_source("algebra_notes.pdf", "a");
    fixture.write_source("geometry_notes.pdf", "b");

    let cancel = CancelToken::new();
    let reporter = CancelAfterFirstCluster {
        cancel: cancel.clone(),
        finished: Mutex::new(Vec::new()),
    };
    let mut engine = SortEngine::new(fixture.config(25.0)).with_associations(math_associations());
    let outcome = engine.sort(&reporter, &cancel).unwrap();
    assert!(outcome.is_cancelled());
    assert_eq!(
        *reporter.finished.lock().unwrap(),
        vec![(Phase::Walk, true), (Phase::Sort, false)]
    );

    let log = fixture.read_log();
    assert_eq!(log.predictions.len(), 1);
    assert_eq!(log.sorted.len(), 1);
    assert!(fixture.dest().join("Math").join("algebra_notes.pdf").exists());
    assert!(fixture.src().join("geometry_notes.pdf").exists());
}

#[test]
fn test_cancel_before_start_touches_nothing() {
    let fixture = Fixture::new();
    write_algebra_notes(&fixture);
    let cancel = CancelToken::new();
    cancel.cancel();

    let mut engine = SortEngine::new(fixture.config(25.0)).with_associations(math_associations());
    assert!(engine.sort(&SilentReporter, &cancel).unwrap().is_cancelled());
    assert!(!fixture.root.join("file_sorting_log.json").exists());
    assert!(fixture.src().join("algebra_notes_1.pdf").exists());
}

#[test]
fn test_explain_is_a_dry_run() {
    let fixture = Fixture::new();
    let engine = SortEngine::new(fixture.config(25.0)).with_associations(math_associations());
    let explanation = engine.explain("Algebra_Notes_Ch 4.pdf");

    assert_eq!(explanation.terms, vec!["algebra", "notes", "pdf"]);
    assert_eq!(explanation.votes.rule.destination, "Math");
    assert!(explanation.would_sort);
    assert!(!fixture.root.join("file_sorting_log.json").exists());
}
