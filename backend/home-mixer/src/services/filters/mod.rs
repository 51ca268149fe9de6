use crate::models::{Candidate, PostType};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;
use tracing::debug;

/// Per-request inputs for the filter predicates, assembled once at request
/// start so filters themselves stay stateless.
pub struct FilterContext<'a> {
    pub viewer_id: &'a str,
    pub blocked_muted: &'a HashSet<String>,
    pub seen_post_ids: &'a HashSet<String>,
    pub now: DateTime<Utc>,
    pub max_age: Duration,
}

/// Pure eligibility predicate. Filters exclude, they never mutate scores.
pub trait CandidateFilter: Send + Sync {
    fn name(&self) -> &'static str;
    fn accept(&self, candidate: &Candidate, ctx: &FilterContext<'_>) -> bool;
}

/// The viewer's own posts never appear in their feed.
pub struct SelfAuthorFilter;

impl CandidateFilter for SelfAuthorFilter {
    fn name(&self) -> &'static str {
        "self_author"
    }

    fn accept(&self, candidate: &Candidate, ctx: &FilterContext<'_>) -> bool {
        candidate.post.author_id != ctx.viewer_id
    }
}

pub struct BlockedMutedFilter;

impl CandidateFilter for BlockedMutedFilter {
    fn name(&self) -> &'static str {
        "blocked_muted"
    }

    fn accept(&self, candidate: &Candidate, ctx: &FilterContext<'_>) -> bool {
        !ctx.blocked_muted.contains(&candidate.post.author_id)
    }
}

/// Posts already shown within the configured window.
pub struct SeenPostFilter;

impl CandidateFilter for SeenPostFilter {
    fn name(&self) -> &'static str {
        "previously_seen"
    }

    fn accept(&self, candidate: &Candidate, ctx: &FilterContext<'_>) -> bool {
        !ctx.seen_post_ids.contains(&candidate.post.id)
    }
}

pub struct MaxAgeFilter;

impl CandidateFilter for MaxAgeFilter {
    fn name(&self) -> &'static str {
        "max_age"
    }

    fn accept(&self, candidate: &Candidate, ctx: &FilterContext<'_>) -> bool {
        candidate.post.created_at >= ctx.now - ctx.max_age
    }
}

/// Replies and quotes must have their referent hydrated.
pub struct ReferenceResolvableFilter;

impl CandidateFilter for ReferenceResolvableFilter {
    fn name(&self) -> &'static str {
        "reference_resolvable"
    }

    fn accept(&self, candidate: &Candidate, _ctx: &FilterContext<'_>) -> bool {
        match candidate.post.post_type {
            PostType::Reply => candidate.parent_post.is_some(),
            PostType::Quote => candidate.quoted_post.is_some(),
            PostType::Original | PostType::Repost => true,
        }
    }
}

/// Ordered pre-scoring filter chain. Order never changes the surviving
/// set (predicates are pure), so the chain runs cheapest first.
pub struct FilterChain {
    filters: Vec<Box<dyn CandidateFilter>>,
}

impl FilterChain {
    pub fn new(filters: Vec<Box<dyn CandidateFilter>>) -> Self {
        Self { filters }
    }

    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(SelfAuthorFilter),
            Box::new(BlockedMutedFilter),
            Box::new(SeenPostFilter),
            Box::new(MaxAgeFilter),
            Box::new(ReferenceResolvableFilter),
        ])
    }

    pub fn apply(&self, candidates: Vec<Candidate>, ctx: &FilterContext<'_>) -> Vec<Candidate> {
        let mut remaining = candidates;
        for filter in &self.filters {
            let before = remaining.len();
            remaining.retain(|c| filter.accept(c, ctx));
            let dropped = before - remaining.len();
            if dropped > 0 {
                debug!(filter = filter.name(), dropped, "filter removed candidates");
            }
        }
        remaining
    }
}
