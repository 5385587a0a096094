use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;

/// One destination folder and the keywords that describe it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AssociationEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub path: String,
    /// `None` when the persisted object had no `children` key; deep merge depends on it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<AssociationTree>,
    #[serde(rename = "associations", default)]
    pub keywords: BTreeSet<String>,
}

impl AssociationEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords.extend(keywords.into_iter().map(Into::into));
        self
    }

    pub fn with_children(mut self, children: AssociationTree) -> Self {
        self.children = Some(children);
        self
    }

    pub fn child_count(&self) -> usize {
        self.children.as_ref().map_or(0, AssociationTree::len)
    }
}

/// Folder name → entry, kept in insertion order.
///
/// Order is observable: rule-based scoring breaks ties by first folder encountered,
/// and the JSON file is written back in the order it was read.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AssociationTree {
    entries: Vec<(String, AssociationEntry)>,
}

impl AssociationTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, folder: &str) -> Option<&AssociationEntry> {
        self.entries
            .iter()
            .find(|(name, _)| name == folder)
            .map(|(_, entry)| entry)
    }

    pub fn get_mut(&mut self, folder: &str) -> Option<&mut AssociationEntry> {
        self.entries
            .iter_mut()
            .find(|(name, _)| name == folder)
            .map(|(_, entry)| entry)
    }

    pub fn contains(&self, folder: &str) -> bool {
        self.get(folder).is_some()
    }

    /// Replace the entry in place if the folder exists, otherwise append it.
    pub fn insert(&mut self, folder: impl Into<String>, entry: AssociationEntry) {
        let folder = folder.into();
        match self.get_mut(&folder) {
            Some(existing) => *existing = entry,
            None => self.entries.push((folder, entry)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AssociationEntry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut AssociationEntry)> {
        self.entries
            .iter_mut()
            .map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Number of folders at every depth.
    pub fn total_folders(&self) -> usize {
        self.entries
            .iter()
            .map(|(_, entry)| 1 + entry.children.as_ref().map_or(0, AssociationTree::total_folders))
            .sum()
    }
}

impl FromIterator<(String, AssociationEntry)> for AssociationTree {
    fn from_iter<I: IntoIterator<Item = (String, AssociationEntry)>>(iter: I) -> Self {
        let mut tree = AssociationTree::new();
        for (folder, entry) in iter {
            tree.insert(folder, entry);
        }
        tree
    }
}

impl Serialize for AssociationTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (folder, entry) in &self.entries {
            map.serialize_entry(folder, entry)?;
        }
        map.end()
    }
}

struct TreeVisitor;

impl<'de> Visitor<'de> for TreeVisitor {
    type Value = AssociationTree;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map of folder name to association entry")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut tree = AssociationTree::new();
        while let Some((folder, entry)) = access.next_entry::<String, AssociationEntry>()? {
            tree.insert(folder, entry);
        }
        Ok(tree)
    }
}

impl<'de> Deserialize<'de> for AssociationTree {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(TreeVisitor)
    }
}
