//! Filename normalization into lowercase tokens.

use regex::Regex;
use std::sync::LazyLock;

/// Runs of separators that become a single space.
static RE_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-_.\s]+").expect("Invalid regex"));

/// Chapter/lesson markers such as `ch 14`, `chapter2` or `ls`.
static RE_CHAPTER_NOISE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:ls|chapter|ch)\s*\d*\b").expect("Invalid regex"));

/// Turn a raw filename into ordered lowercase tokens with chapter noise removed.
///
/// The extension is not special: `notes.pdf` yields `["notes", "pdf"]`.
pub fn normalize(filename: &str) -> Vec<String> {
    let lowered = filename.to_lowercase();
    let spaced = RE_SEPARATORS.replace_all(&lowered, " ");
    let cleaned = RE_CHAPTER_NOISE.replace_all(spaced.trim(), "");
    cleaned.split_whitespace().map(str::to_string).collect()
}

pub fn normalize_to_string(filename: &str) -> String {
    normalize(filename).join(" ")
}
