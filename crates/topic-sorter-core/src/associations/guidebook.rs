//! User-supplied seed knowledge: subjects, units and chapters with keywords.
//!
//! The JSON accepts several shapes per subject. They are resolved here, once, into
//! [`Guidebook`], so nothing downstream branches on the raw layout:
//!
//! ```json
//! {
//!   "Math": ["algebra", "geometry"],
//!   "Chemistry": {
//!     "keywords": ["chemical"],
//!     "Unit 1": ["atoms"],
//!     "Unit 2": { "Polymers": ["polymerization", "monomer"] }
//!   }
//! }
//! ```

use serde_json::{Map, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{info, warn};

use crate::classifier::TrainingExample;
use crate::error::Error;

/// Subject-level key holding the subject's own keyword list.
const KEYWORDS_KEY: &str = "keywords";

/// Training label suffix for examples not tied to a chapter.
pub const GENERAL_LABEL: &str = "General";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Guidebook {
    pub subjects: Vec<Subject>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Subject {
    pub name: String,
    pub keywords: Vec<String>,
    pub units: Vec<Unit>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Unit {
    pub name: String,
    pub keywords: Vec<String>,
    pub chapters: Vec<Chapter>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Chapter {
    pub name: String,
    pub keywords: Vec<String>,
}

impl Guidebook {
    /// Load from disk. Missing or malformed files yield an empty guidebook.
    pub fn load(path: &Path) -> Guidebook {
        if !path.exists() {
            warn!(
                "Guidebook file '{}' not found. Proceeding without it.",
                path.display()
            );
            return Guidebook::default();
        }
        match Self::try_load(path) {
            Ok(guidebook) => {
                info!(
                    "Guidebook loaded from {} ({} subjects)",
                    path.display(),
                    guidebook.subjects.len()
                );
                guidebook
            }
            Err(err) => {
                warn!(
                    "Could not read guidebook {}: {}. Proceeding without it.",
                    path.display(),
                    err
                );
                Guidebook::default()
            }
        }
    }

    pub fn try_load(path: &Path) -> Result<Guidebook, Error> {
        let value: Value = serde_json::from_reader(BufReader::new(File::open(path)?))?;
        Ok(Self::from_value(&value))
    }

    pub fn from_value(value: &Value) -> Guidebook {
        let Some(object) = value.as_object() else {
            warn!("Guidebook root is not an object; ignoring it");
            return Guidebook::default();
        };
        let subjects = object
            .iter()
            .filter_map(|(name, content)| parse_subject(name, content))
            .collect();
        Guidebook { subjects }
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }

    pub fn subject(&self, name: &str) -> Option<&Subject> {
        self.subjects.iter().find(|s| s.name == name)
    }

    /// Base keywords for a destination folder of the same name.
    pub fn keywords_for(&self, folder_name: &str) -> &[String] {
        self.subject(folder_name)
            .map(|s| s.keywords.as_slice())
            .unwrap_or(&[])
    }

    /// One example per subject keyword list, unit list and chapter.
    ///
    /// Chapters are labelled `subject/chapter`, everything else `subject/General`.
    pub fn training_examples(&self) -> Vec<TrainingExample> {
        let mut examples = Vec::new();
        for subject in &self.subjects {
            if !subject.keywords.is_empty() {
                examples.push(TrainingExample::new(
                    format!("{} {}", subject.name, subject.keywords.join(" ")),
                    format!("{}/{}", subject.name, GENERAL_LABEL),
                ));
            }
            for unit in &subject.units {
                if !unit.keywords.is_empty() {
                    examples.push(TrainingExample::new(
                        format!("{} {}", subject.name, unit.keywords.join(" ")),
                        format!("{}/{}", subject.name, GENERAL_LABEL),
                    ));
                }
                for chapter in &unit.chapters {
                    examples.push(TrainingExample::new(
                        format!(
                            "{} {} {}",
                            subject.name,
                            chapter.name,
                            chapter.keywords.join(" ")
                        ),
                        format!("{}/{}", subject.name, chapter.name),
                    ));
                }
            }
        }
        examples
    }
}

fn parse_subject(name: &str, content: &Value) -> Option<Subject> {
    match content {
        Value::Array(items) => Some(Subject {
            name: name.to_string(),
            keywords: string_list(name, items),
            units: Vec::new(),
        }),
        Value::Object(entries) => Some(parse_subject_object(name, entries)),
        _ => {
            warn!("Guidebook subject '{}' is neither a list nor an object; skipped", name);
            None
        }
    }
}

fn parse_subject_object(name: &str, entries: &Map<String, Value>) -> Subject {
    let mut subject = Subject {
        name: name.to_string(),
        ..Subject::default()
    };

    for (key, value) in entries {
        match value {
            Value::Array(items) if key == KEYWORDS_KEY => {
                subject.keywords = string_list(name, items);
            }
            Value::Array(items) => subject.units.push(Unit {
                name: key.clone(),
                keywords: string_list(key, items),
                chapters: Vec::new(),
            }),
            Value::Object(chapters) => subject.units.push(Unit {
                name: key.clone(),
                keywords: Vec::new(),
                chapters: chapters
                    .iter()
                    .filter_map(|(chapter, keywords)| match keywords {
                        Value::Array(items) => Some(Chapter {
                            name: chapter.clone(),
                            keywords: string_list(chapter, items),
                        }),
                        _ => {
                            warn!("Guidebook chapter '{}/{}' has no keyword list; skipped", name, chapter);
                            None
                        }
                    })
                    .collect(),
            }),
            _ => warn!("Guidebook entry '{}/{}' has an unknown shape; skipped", name, key),
        }
    }
    subject
}

fn string_list(owner: &str, items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| match item.as_str() {
            Some(s) => Some(s.to_string()),
            None => {
                warn!("Ignoring non-string keyword {} under '{}'", item, owner);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    fn sample() -> Guidebook {
        Guidebook::from_value(&json!({
            "Math": ["algebra", "geometry"],
            "Chemistry": {
                "keywords": ["chemical", 7],
                "Unit 1": ["atoms"],
                "Unit 2": { "Polymers": ["polymerization", "monomer"], "Broken": "nope" }
            },
            "Ignored": 42
        }))
    }

    #[test]
    fn test_shapes_resolve_to_one_structure() {
        let guidebook = sample();
        assert_eq!(guidebook.subjects.len(), 2);
        assert_eq!(guidebook.keywords_for("Math"), ["algebra", "geometry"]);
        assert_eq!(guidebook.keywords_for("Chemistry"), ["chemical"]);
        assert!(guidebook.keywords_for("Biology").is_empty());

        let chemistry = guidebook.subject("Chemistry").unwrap();
        assert_eq!(chemistry.units.len(), 2);
        assert_eq!(chemistry.units[0].keywords, vec!["atoms"]);
        assert_eq!(chemistry.units[1].chapters.len(), 1);
        assert_eq!(chemistry.units[1].chapters[0].name, "Polymers");
    }

    #[test]
    fn test_training_examples_labels() {
        let labels: Vec<String> = sample()
            .training_examples()
            .into_iter()
            .map(|e| e.label)
            .collect();
        assert!(labels.contains(&"Math/General".to_string()));
        assert!(labels.contains(&"Chemistry/General".to_string()));
        assert!(labels.contains(&"Chemistry/Polymers".to_string()));
        assert_eq!(labels.len(), 4);
    }

    #[test]
    fn test_missing_or_malformed_file_is_empty() {
        let tmp = tempdir().unwrap();
        assert!(Guidebook::load(&tmp.path().join("none.json")).is_empty());

        let broken = tmp.path().join("broken.json");
        fs::write(&broken, "[1, 2").unwrap();
        assert!(Guidebook::load(&broken).is_empty());

        let list = tmp.path().join("list.json");
        fs::write(&list, "[1, 2]").unwrap();
        assert!(Guidebook::load(&list).is_empty());
    }
}
