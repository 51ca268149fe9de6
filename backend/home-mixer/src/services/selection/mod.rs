use crate::models::ScoredCandidate;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

/// The one ordering rule for the whole pipeline: final score descending,
/// then source priority (in-network first), then newer first, then post
/// id. Total and deterministic, so identical inputs always produce an
/// identical feed.
pub fn compare_ranked(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    b.final_score
        .partial_cmp(&a.final_score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| {
            a.candidate
                .source
                .priority()
                .cmp(&b.candidate.source.priority())
        })
        .then_with(|| b.candidate.post.created_at.cmp(&a.candidate.post.created_at))
        .then_with(|| a.candidate.post.id.cmp(&b.candidate.post.id))
}

/// Final page cut: truncate to the requested limit, then apply
/// post-selection filters. Drops never backfill from discarded
/// candidates, so a page may come back shorter than the limit.
pub struct Selector {
    max_per_author: usize,
}

impl Selector {
    pub fn new(max_per_author: usize) -> Self {
        Self { max_per_author }
    }

    pub fn select(&self, ranked: Vec<ScoredCandidate>, limit: usize) -> Vec<ScoredCandidate> {
        let mut page: Vec<ScoredCandidate> = ranked.into_iter().take(limit).collect();

        let before = page.len();
        let mut author_counts: HashMap<String, usize> = HashMap::new();
        page.retain(|item| {
            let count = author_counts
                .entry(item.candidate.post.author_id.clone())
                .or_insert(0);
            *count += 1;
            *count <= self.max_per_author
        });

        let dropped = before - page.len();
        if dropped > 0 {
            debug!(
                dropped,
                max_per_author = self.max_per_author,
                "post-selection author cap removed items"
            );
        }

        page
    }
}
