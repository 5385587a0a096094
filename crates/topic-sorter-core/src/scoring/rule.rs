use tracing::debug;

use super::{ScoreResult, GENERAL_DESTINATION};
use crate::associations::AssociationTree;
use crate::text::match_stats;

/// Score `terms` against every top-level folder and keep the strictly best one.
///
/// Folders are visited in tree order, so the first of several equal scores wins.
/// Nothing above zero means `General` with score 0.
pub fn score_rule_based<S: AsRef<str>>(terms: &[S], associations: &AssociationTree) -> ScoreResult {
    let mut best_destination = GENERAL_DESTINATION;
    let mut best_score = 0.0;
    let mut rationale = Vec::with_capacity(associations.len());

    for (folder, entry) in associations.iter() {
        let keywords: Vec<&str> = entry.keywords.iter().map(String::as_str).collect();
        let stats = match_stats(terms, &keywords);
        let score = stats.score();
        rationale.push(format!(
            "Rule-based: folder '{}' score {:.2} ({} of {} term pairs matched, mean similarity {:.1}) using keywords {:?}",
            folder, score, stats.matches, stats.comparisons, stats.mean_similarity, keywords
        ));
        if score > best_score {
            best_score = score;
            best_destination = folder;
        }
    }

    debug!("Rule-based vote: '{}' ({:.2})", best_destination, best_score);
    ScoreResult::new(best_destination, best_score, rationale)
}
