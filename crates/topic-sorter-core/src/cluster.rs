use ahash::AHashMap;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::hash::Hasher as _;
use std::path::{Path, PathBuf};
use twox_hash::XxHash64;

use crate::text::normalize;

/// Tokens of this length or shorter never contribute to a cluster key.
pub const MAX_SHORT_TOKEN_LEN: usize = 3;

/// Smallest multi-file group that is trusted. Pairs are dropped, singletons kept.
pub const MIN_GROUP_SIZE: usize = 3;

/// A file discovered during the walk.
///
/// `name` is the on-disk name, byte for byte, and is what destination paths are built
/// from. `filename` is its lossy UTF-8 rendering for tokenizing and logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: PathBuf,
    pub name: OsString,
    pub filename: String,
}

impl FileEntry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path.file_name().map(OsStr::to_os_string).unwrap_or_default();
        let filename = name.to_string_lossy().into_owned();
        Self {
            path,
            name,
            filename,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &OsStr {
        &self.name
    }

    /// Normalized tokens of the filename, short ones included.
    pub fn terms(&self) -> Vec<String> {
        normalize(&self.filename)
    }
}

/// Sorted, de-duplicated set of the meaningful tokens of a filename.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ClusterKey(Vec<String>);

impl ClusterKey {
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Self {
        let mut key: Vec<String> = tokens
            .iter()
            .map(|t| t.as_ref())
            .filter(|t| t.chars().count() > MAX_SHORT_TOKEN_LEN)
            .map(str::to_string)
            .collect();
        key.sort();
        key.dedup();
        Self(key)
    }

    pub fn from_filename(filename: &str) -> Self {
        Self::from_tokens(&normalize(filename))
    }

    pub fn tokens(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Stable 16-hex-digit fingerprint of the key, used to label clusters in logs.
    pub fn fingerprint(&self) -> String {
        let mut hasher = XxHash64::with_seed(0);
        for token in &self.0 {
            hasher.write(token.as_bytes());
            hasher.write_u8(0xff);
        }
        format!("{:016x}", hasher.finish())
    }
}

impl fmt::Display for ClusterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("<no key terms>")
        } else {
            f.write_str(&self.0.join(" "))
        }
    }
}

/// Files sharing a key; scored and moved as one unit.
#[derive(Debug, Clone)]
pub struct Cluster {
    pub key: ClusterKey,
    pub members: Vec<FileEntry>,
}

impl Cluster {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Every member's normalized tokens flattened into one multiset, in member order.
    pub fn terms(&self) -> Vec<String> {
        self.members.iter().flat_map(FileEntry::terms).collect()
    }
}

/// Retained clusters in first-seen order, addressable by key.
#[derive(Debug, Default)]
pub struct Clusters {
    clusters: Vec<Cluster>,
    index: AHashMap<ClusterKey, usize>,
}

impl Clusters {
    pub fn get(&self, key: &ClusterKey) -> Option<&Cluster> {
        self.index.get(key).map(|&i| &self.clusters[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cluster> {
        self.clusters.iter()
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    pub fn file_count(&self) -> usize {
        self.clusters.iter().map(Cluster::len).sum()
    }

    pub fn into_vec(self) -> Vec<Cluster> {
        self.clusters
    }
}

fn is_retained(size: usize) -> bool {
    size == 1 || size >= MIN_GROUP_SIZE
}

/// Group files by cluster key, keeping first-seen order, then drop pairs.
pub fn cluster_files<I>(files: I) -> Clusters
where
    I: IntoIterator<Item = FileEntry>,
{
    let mut groups: Vec<Cluster> = Vec::new();
    let mut positions: AHashMap<ClusterKey, usize> = AHashMap::new();

    for file in files {
        let key = ClusterKey::from_filename(&file.filename);
        match positions.get(&key) {
            Some(&i) => groups[i].members.push(file),
            None => {
                positions.insert(key.clone(), groups.len());
                groups.push(Cluster {
                    key,
                    members: vec![file],
                });
            }
        }
    }

    let clusters: Vec<Cluster> = groups
        .into_iter()
        .filter(|cluster| is_retained(cluster.len()))
        .collect();
    let index = clusters
        .iter()
        .enumerate()
        .map(|(i, cluster)| (cluster.key.clone(), i))
        .collect();

    Clusters { clusters, index }
}
