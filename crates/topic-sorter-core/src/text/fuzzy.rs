//! Token similarity on a 0-100 scale and the coverage-weighted keyword score.

/// A term pair counts as a match only above this similarity.
pub const MATCH_THRESHOLD: u8 = 85;

/// Full-string edit-distance ratio, 0-100.
pub fn ratio(a: &str, b: &str) -> u8 {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    scale(strsim::normalized_levenshtein(a, b))
}

/// Best ratio between the shorter string and every equally long window of the longer one.
pub fn partial_ratio(a: &str, b: &str) -> u8 {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let (shorter, longer) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };
    let short_len = shorter.chars().count();
    let long_chars: Vec<char> = longer.chars().collect();
    if short_len == long_chars.len() {
        return ratio(shorter, longer);
    }

    let mut best = 0;
    for window in long_chars.windows(short_len) {
        let candidate: String = window.iter().collect();
        best = best.max(ratio(shorter, &candidate));
        if best == 100 {
            break;
        }
    }
    best
}

/// Larger of [`ratio`] and [`partial_ratio`]. Symmetric in its arguments.
pub fn similarity(a: &str, b: &str) -> u8 {
    ratio(a, b).max(partial_ratio(a, b))
}

fn scale(value: f64) -> u8 {
    (value * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Intermediate figures behind [`improved_score`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MatchStats {
    pub matches: usize,
    pub comparisons: usize,
    pub mean_similarity: f64,
}

impl MatchStats {
    /// Mean match strength scaled by the fraction of pairs that matched.
    pub fn score(&self) -> f64 {
        if self.matches == 0 || self.comparisons == 0 {
            return 0.0;
        }
        self.mean_similarity * (self.matches as f64 / self.comparisons as f64)
    }
}

pub fn match_stats<F, K>(file_terms: &[F], keyword_terms: &[K]) -> MatchStats
where
    F: AsRef<str>,
    K: AsRef<str>,
{
    let comparisons = file_terms.len() * keyword_terms.len();
    if comparisons == 0 {
        return MatchStats::default();
    }

    let mut matches = 0usize;
    let mut total = 0u64;
    for term in file_terms {
        for keyword in keyword_terms {
            let score = similarity(term.as_ref(), keyword.as_ref());
            if score > MATCH_THRESHOLD {
                matches += 1;
                total += u64::from(score);
            }
        }
    }

    let mean_similarity = if matches == 0 {
        0.0
    } else {
        total as f64 / matches as f64
    };
    MatchStats {
        matches,
        comparisons,
        mean_similarity,
    }
}

/// Score how well a bag of filename terms covers a folder's keywords.
///
/// Rewards both match strength and coverage: one perfect hit among hundreds of
/// keywords scores lower than broad agreement with a small keyword set.
pub fn improved_score<F, K>(file_terms: &[F], keyword_terms: &[K]) -> f64
where
    F: AsRef<str>,
    K: AsRef<str>,
{
    match_stats(file_terms, keyword_terms).score()
}
