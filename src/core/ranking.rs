use crate::domain::model::ScoredMatch;

pub const DEFAULT_TOP_N: usize = 10;

/// Orders matches by score, highest first.
///
/// `matches` must be in directory order; the sort is stable so equal scores
/// keep that order and the ranking is reproducible for a given adapter output.
pub fn rank_matches(mut matches: Vec<ScoredMatch>) -> Vec<ScoredMatch> {
    matches.sort_by(|a, b| b.score.cmp(&a.score));
    matches
}
