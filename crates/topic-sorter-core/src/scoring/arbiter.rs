use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ScoreResult, Strategy};

/// Relative trust in each strategy.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MethodWeights {
    #[serde(alias = "rule")]
    pub rule_based: f64,
    pub hybrid: f64,
    #[serde(alias = "ai")]
    pub ai_based: f64,
}

impl Default for MethodWeights {
    fn default() -> Self {
        Self {
            rule_based: 0.3,
            hybrid: 0.5,
            ai_based: 0.2,
        }
    }
}

impl MethodWeights {
    pub fn weight(&self, strategy: Strategy) -> f64 {
        match strategy {
            Strategy::Rule => self.rule_based,
            Strategy::Hybrid => self.hybrid,
            Strategy::Model => self.ai_based,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArbitrationOutcome {
    pub winning_strategy: Strategy,
    pub destination: String,
    /// The winner's unweighted score; this is what the threshold sees.
    pub score: f64,
    pub weighted_score: f64,
    pub rationale: Vec<String>,
}

/// Pick the vote with the greatest weighted score.
///
/// Exact ties keep the earlier strategy in the order rule, hybrid, model.
pub fn arbitrate(
    rule: &ScoreResult,
    hybrid: &ScoreResult,
    model: &ScoreResult,
    weights: &MethodWeights,
) -> ArbitrationOutcome {
    let votes = [
        (Strategy::Rule, rule),
        (Strategy::Hybrid, hybrid),
        (Strategy::Model, model),
    ];

    let mut winner = votes[0];
    let mut winner_weighted = rule.raw_score * weights.weight(Strategy::Rule);
    for &(strategy, vote) in &votes[1..] {
        let weighted = vote.raw_score * weights.weight(strategy);
        if weighted > winner_weighted {
            winner = (strategy, vote);
            winner_weighted = weighted;
        }
    }

    let (strategy, vote) = winner;
    debug!(
        "Arbitration: {} wins with '{}' (raw {:.2}, weighted {:.2})",
        strategy, vote.destination, vote.raw_score, winner_weighted
    );
    ArbitrationOutcome {
        winning_strategy: strategy,
        destination: vote.destination.clone(),
        score: vote.raw_score,
        weighted_score: winner_weighted,
        rationale: vote.rationale.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vote(destination: &str, score: f64) -> ScoreResult {
        ScoreResult::new(destination, score, vec![format!("{destination} {score}")])
    }

    #[test]
    fn test_hybrid_usually_wins_with_default_weights() {
        let outcome = arbitrate(
            &vote("Math", 25.0),
            &vote("Math", 30.0),
            &vote("Math/General", 60.0),
            &MethodWeights::default(),
        );
        assert_eq!(outcome.winning_strategy, Strategy::Hybrid);
        assert_eq!(outcome.score, 30.0);
        assert!((outcome.weighted_score - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_raw_score_is_reported_not_weighted() {
        let outcome = arbitrate(
            &vote("Math", 0.0),
            &vote("Math", 5.0),
            &vote("Chemistry", 90.0),
            &MethodWeights::default(),
        );
        assert_eq!(outcome.winning_strategy, Strategy::Model);
        assert_eq!(outcome.destination, "Chemistry");
        assert_eq!(outcome.score, 90.0);
        assert_eq!(outcome.rationale, vec!["Chemistry 90".to_string()]);
    }

    #[test]
    fn test_ties_follow_priority_order() {
        let equal = MethodWeights {
            rule_based: 1.0,
            hybrid: 1.0,
            ai_based: 1.0,
        };
        let outcome = arbitrate(&vote("A", 10.0), &vote("B", 10.0), &vote("C", 10.0), &equal);
        assert_eq!(outcome.winning_strategy, Strategy::Rule);

        let outcome = arbitrate(&vote("A", 5.0), &vote("B", 10.0), &vote("C", 10.0), &equal);
        assert_eq!(outcome.winning_strategy, Strategy::Hybrid);

        let all_zero = arbitrate(
            &vote("General", 0.0),
            &vote("General", 0.0),
            &vote("General", 0.0),
            &MethodWeights::default(),
        );
        assert_eq!(all_zero.winning_strategy, Strategy::Rule);
    }

    #[test]
    fn test_weights_deserialize_with_short_aliases() {
        let weights: MethodWeights = serde_json::from_str(r#"{"rule": 0.9, "ai": 0.1}"#).unwrap();
        assert_eq!(weights.rule_based, 0.9);
        assert_eq!(weights.hybrid, 0.5);
        assert_eq!(weights.ai_based, 0.1);
    }
}
