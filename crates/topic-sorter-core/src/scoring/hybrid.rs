use super::rule::score_rule_based;
use super::ScoreResult;
use crate::associations::AssociationTree;

/// The rule-based vote with a flat bonus added; destination unchanged.
pub fn score_hybrid_from(rule: &ScoreResult, bonus: f64) -> ScoreResult {
    let score = rule.raw_score + bonus;
    let mut rationale = rule.rationale.clone();
    rationale.push(format!(
        "Hybrid: added bonus of {} to rule-based score, new score {:.2}",
        bonus, score
    ));
    ScoreResult::new(rule.destination.clone(), score, rationale)
}

pub fn score_hybrid<S: AsRef<str>>(terms: &[S], associations: &AssociationTree, bonus: f64) -> ScoreResult {
    score_hybrid_from(&score_rule_based(terms, associations), bonus)
}
