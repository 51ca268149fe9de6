use crate::models::ScoredCandidate;
use crate::services::selection::compare_ranked;
use std::collections::HashMap;

/// Author diversity re-ranker - 多樣性重排
///
/// Walks the score-sorted list once and charges every repeat appearance
/// of an author a penalty that grows linearly with the repeat count, then
/// re-sorts. This bounds same-author clustering near the top without
/// forcing authors to be fully separated.
pub struct AuthorDiversityScorer {
    penalty_step: f32,
}

impl AuthorDiversityScorer {
    pub fn new(penalty_step: f32) -> Self {
        Self { penalty_step }
    }

    /// `strength` is the per-request diversity_strength slider.
    /// strength = 0.0: no penalty at all
    /// strength = 1.0: full `penalty_step` per repeat
    pub fn rerank(&self, mut scored: Vec<ScoredCandidate>, strength: f32) -> Vec<ScoredCandidate> {
        scored.sort_by(compare_ranked);

        let mut author_counts: HashMap<String, usize> = HashMap::new();
        for item in scored.iter_mut() {
            let count = author_counts
                .entry(item.candidate.post.author_id.clone())
                .or_insert(0);
            *count += 1;
            if *count >= 2 {
                // Scores are deliberately not floored at zero: the
                // explanation identity must reconstruct exactly.
                let penalty = strength * self.penalty_step * (*count - 1) as f32;
                item.diversity_penalty = penalty;
                item.final_score -= penalty;
            }
        }

        // Stable sort: ties keep their pre-penalty relative order up to
        // the shared tie-break rule.
        scored.sort_by(compare_ranked);
        scored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Candidate, Post, PostType, SourceTag};
    use chrono::{Duration, Utc};

    fn scored(id: &str, author: &str, score: f32, hours_ago: i64) -> ScoredCandidate {
        let post = Post {
            id: id.to_string(),
            author_id: author.to_string(),
            text: String::new(),
            post_type: PostType::Original,
            parent_id: None,
            quoted_id: None,
            topics: vec![],
            created_at: Utc::now() - Duration::hours(hours_ago),
            like_count: 0,
            repost_count: 0,
            reply_count: 0,
            quote_count: 0,
            view_count: 0,
        };
        ScoredCandidate {
            candidate: Candidate::new(post, SourceTag::InNetwork),
            action_scores: vec![],
            base_score: score,
            recency_boost: 0.0,
            topic_boost: 0.0,
            diversity_penalty: 0.0,
            final_score: score,
        }
    }

    fn max_consecutive_same_author(items: &[ScoredCandidate]) -> usize {
        let mut best = 0usize;
        let mut run = 0usize;
        let mut prev: Option<&str> = None;
        for item in items {
            let author = item.candidate.post.author_id.as_str();
            run = if prev == Some(author) { run + 1 } else { 1 };
            best = best.max(run);
            prev = Some(author);
        }
        best
    }

    #[test]
    fn test_zero_strength_changes_nothing() {
        let layer = AuthorDiversityScorer::new(0.15);
        let items = vec![
            scored("a1", "a", 0.9, 1),
            scored("a2", "a", 0.8, 2),
            scored("b1", "b", 0.7, 3),
        ];
        let reranked = layer.rerank(items, 0.0);

        let ids: Vec<_> = reranked.iter().map(|s| s.candidate.post.id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "a2", "b1"]);
        assert!(reranked.iter().all(|s| s.diversity_penalty == 0.0));
    }

    #[test]
    fn test_repeat_author_penalized_below_challenger() {
        let layer = AuthorDiversityScorer::new(0.15);
        let items = vec![
            scored("a1", "a", 0.9, 1),
            scored("a2", "a", 0.8, 2),
            scored("b1", "b", 0.75, 3),
        ];
        let reranked = layer.rerank(items, 1.0);

        // a2 pays 0.15 and drops to 0.65, below b1.
        let ids: Vec<_> = reranked.iter().map(|s| s.candidate.post.id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "b1", "a2"]);

        let a2 = reranked.iter().find(|s| s.candidate.post.id == "a2").unwrap();
        assert!((a2.diversity_penalty - 0.15).abs() < 1e-6);
        assert!((a2.final_score - 0.65).abs() < 1e-6);
    }

    #[test]
    fn test_penalty_grows_with_each_repeat() {
        let layer = AuthorDiversityScorer::new(0.1);
        let items = vec![
            scored("a1", "a", 0.9, 1),
            scored("a2", "a", 0.8, 2),
            scored("a3", "a", 0.7, 3),
        ];
        let reranked = layer.rerank(items, 1.0);

        let penalty = |id: &str| {
            reranked
                .iter()
                .find(|s| s.candidate.post.id == id)
                .unwrap()
                .diversity_penalty
        };
        assert_eq!(penalty("a1"), 0.0);
        assert!((penalty("a2") - 0.1).abs() < 1e-6);
        assert!((penalty("a3") - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_higher_strength_never_increases_author_clustering() {
        let layer = AuthorDiversityScorer::new(0.15);
        let items = || {
            vec![
                scored("a1", "a", 0.95, 1),
                scored("a2", "a", 0.90, 2),
                scored("a3", "a", 0.85, 3),
                scored("b1", "b", 0.80, 4),
                scored("b2", "b", 0.75, 5),
                scored("c1", "c", 0.70, 6),
            ]
        };

        let mut previous = usize::MAX;
        for strength in [0.0, 0.25, 0.5, 0.75, 1.0] {
            let reranked = layer.rerank(items(), strength);
            let clustering = max_consecutive_same_author(&reranked[..4.min(reranked.len())]);
            assert!(
                clustering <= previous,
                "clustering grew from {previous} to {clustering} at strength {strength}"
            );
            previous = clustering;
        }
    }
}
