use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{info, warn};

use super::TrainingExample;
use crate::associations::{AssociationTree, Guidebook};
use crate::error::Error;

#[derive(Debug, Deserialize)]
struct ExamplesFile {
    #[serde(default)]
    examples: Vec<TrainingExample>,
}

/// Read `{"examples": [{"text", "label"}]}`. Missing or malformed files yield no examples.
pub fn load_extra_examples(path: &Path) -> Vec<TrainingExample> {
    if !path.exists() {
        warn!("Training examples file {} not found; skipping", path.display());
        return Vec::new();
    }
    match try_load_extra_examples(path) {
        Ok(examples) => {
            info!("Loaded {} extra training examples from {}", examples.len(), path.display());
            examples
        }
        Err(err) => {
            warn!("Could not read training examples {}: {}; skipping", path.display(), err);
            Vec::new()
        }
    }
}

fn try_load_extra_examples(path: &Path) -> Result<Vec<TrainingExample>, Error> {
    let file: ExamplesFile = serde_json::from_reader(BufReader::new(File::open(path)?))?;
    Ok(file
        .examples
        .into_iter()
        .filter(|e| !e.label.trim().is_empty())
        .collect())
}

/// Guidebook examples, then one example per association folder, then the extras.
///
/// Folder examples are labelled with the folder's path relative to the destination root
/// (`Math/Algebra`), so predictions map straight onto destination folders.
pub fn build_training_set(
    guidebook: &Guidebook,
    associations: &AssociationTree,
    extra: Vec<TrainingExample>,
) -> Vec<TrainingExample> {
    let mut examples = guidebook.training_examples();
    collect_folder_examples(associations, "", &mut examples);
    examples.extend(extra);
    examples
}

fn collect_folder_examples(tree: &AssociationTree, prefix: &str, out: &mut Vec<TrainingExample>) {
    for (folder, entry) in tree.iter() {
        let label = if prefix.is_empty() {
            folder.to_string()
        } else {
            format!("{prefix}/{folder}")
        };

        let mut text = folder.to_string();
        for keyword in &entry.keywords {
            text.push(' ');
            text.push_str(keyword);
        }
        out.push(TrainingExample::new(text, label.clone()));

        if let Some(children) = &entry.children {
            collect_folder_examples(children, &label, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::associations::AssociationEntry;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_folder_labels_follow_tree_paths() {
        let mut inner = AssociationTree::new();
        inner.insert("Algebra", AssociationEntry::new("Algebra").with_keywords(["equations"]));
        let mut tree = AssociationTree::new();
        tree.insert(
            "Math",
            AssociationEntry::new("Math")
                .with_keywords(["numbers"])
                .with_children(inner),
        );

        let guidebook = Guidebook::from_value(&json!({ "Art": ["painting"] }));
        let extra = vec![TrainingExample::new("sonnet verse", "Poetry")];
        let examples = build_training_set(&guidebook, &tree, extra);

        let pairs: Vec<(&str, &str)> = examples
            .iter()
            .map(|e| (e.text.as_str(), e.label.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("Art painting", "Art/General"),
                ("Math numbers", "Math"),
                ("Algebra equations", "Math/Algebra"),
                ("sonnet verse", "Poetry"),
            ]
        );
    }

    #[test]
    fn test_extra_examples_file() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("examples.json");
        fs::write(
            &path,
            r#"{"examples": [{"text": "cells dna", "label": "Biology"}, {"text": "x", "label": " "}]}"#,
        )
        .unwrap();
        let examples = load_extra_examples(&path);
        assert_eq!(examples, vec![TrainingExample::new("cells dna", "Biology")]);

        fs::write(&path, "nope").unwrap();
        assert!(load_extra_examples(&path).is_empty());
        assert!(load_extra_examples(&tmp.path().join("missing.json")).is_empty());
    }
}
