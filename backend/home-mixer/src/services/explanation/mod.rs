use crate::models::{RankingExplanation, ScoredCandidate};

/// Assemble the per-item explanations for a final page. Pure read of the
/// score components the earlier stages recorded; skipping this stage can
/// never change the ranking.
///
/// Each explanation reconstructs the ordering score by construction:
/// `final_score == base_score + recency_boost + topic_boost - diversity_penalty`.
pub fn build_explanations(selected: &[ScoredCandidate]) -> Vec<RankingExplanation> {
    selected
        .iter()
        .enumerate()
        .map(|(i, item)| RankingExplanation {
            post_id: item.candidate.post.id.clone(),
            final_score: item.final_score,
            rank: i + 1,
            source: item.candidate.source,
            action_scores: item.action_scores.clone(),
            diversity_penalty: item.diversity_penalty,
            recency_boost: item.recency_boost,
            topic_boost: item.topic_boost,
        })
        .collect()
}
