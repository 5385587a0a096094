pub mod fuzzy;
pub mod normalize;

pub use fuzzy::{improved_score, match_stats, similarity, MatchStats};
pub use normalize::{normalize, normalize_to_string};
