use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{info, warn};

use super::tree::{AssociationEntry, AssociationTree};
use crate::error::Error;

/// Read the associations file. A missing or unreadable file yields an empty tree.
pub fn load(path: &Path) -> AssociationTree {
    if !path.exists() {
        warn!(
            "Associations file {} not found. Using empty associations.",
            path.display()
        );
        return AssociationTree::new();
    }
    match try_load(path) {
        Ok(tree) => {
            info!(
                "Associations loaded from {} ({} top-level folders)",
                path.display(),
                tree.len()
            );
            tree
        }
        Err(err) => {
            warn!(
                "Could not read associations from {}: {}. Using empty associations.",
                path.display(),
                err
            );
            AssociationTree::new()
        }
    }
}

/// Strict variant of [`load`] that surfaces IO and parse errors.
pub fn try_load(path: &Path) -> Result<AssociationTree, Error> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

/// Write the tree as 4-space indented JSON, creating parent folders as needed.
pub fn save(tree: &AssociationTree, path: &Path) -> Result<(), Error> {
    write_pretty_json(tree, path)
}

pub(crate) fn write_pretty_json<T: Serialize>(value: &T, path: &Path) -> Result<(), Error> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut writer = BufWriter::new(File::create(path)?);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
    value.serialize(&mut serializer)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Recursively merge `new` into `old`.
///
/// A folder present in both gets the union of both keyword sets. Its children are merged
/// recursively only when both sides carry a `children` object; otherwise the merged folder
/// takes `new`'s children (or none). Folders only in `new` are adopted verbatim, folders only
/// in `old` are kept.
pub fn deep_merge(old: &AssociationTree, new: &AssociationTree) -> AssociationTree {
    let mut merged = old.clone();
    for (folder, new_entry) in new.iter() {
        match merged.get_mut(folder) {
            Some(existing) => merge_entry(existing, new_entry),
            None => merged.insert(folder, new_entry.clone()),
        }
    }
    merged
}

fn merge_entry(existing: &mut AssociationEntry, new_entry: &AssociationEntry) {
    existing
        .keywords
        .extend(new_entry.keywords.iter().cloned());

    let children = match (existing.children.as_ref(), new_entry.children.as_ref()) {
        (Some(old_children), Some(new_children)) => deep_merge(old_children, new_children),
        (_, new_children) => new_children.cloned().unwrap_or_default(),
    };
    existing.children = Some(children);
}
