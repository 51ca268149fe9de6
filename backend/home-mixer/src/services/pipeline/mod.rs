use crate::config::Config;
use crate::models::{FeedItem, FeedResponse, User};
use crate::services::diversity::AuthorDiversityScorer;
use crate::services::explanation::build_explanations;
use crate::services::filters::{FilterChain, FilterContext};
use crate::services::hydration::Hydrator;
use crate::services::scoring::WeightedScorer;
use crate::services::selection::Selector;
use crate::services::sources::{
    CandidateSource, HeadlinesSource, InNetworkSource, OutOfNetworkSource, SourceContext,
    SourceLayer,
};
use crate::store::{FeedStore, PreferenceProvider};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// Only malformed requests surface to the caller; everything else in the
/// pipeline recovers locally. An empty feed is a valid outcome, not an
/// error.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("unknown user: {0}")]
    UnknownUser(String),

    #[error("limit must be positive, got {0}")]
    InvalidLimit(i64),

    #[error("store error: {0}")]
    Store(#[from] anyhow::Error),
}

#[derive(Debug, Clone)]
pub struct RankRequest {
    pub user_id: String,
    pub limit: i64,
    pub include_explanations: bool,
    pub following_only: bool,
}

/// Orchestrates the full For You pipeline:
/// sources → hydrate → filter → score → diversify → select → explain.
///
/// Each invocation is stateless and isolated; everything mutable lives in
/// request-scoped values, never in the mixer itself.
pub struct HomeMixer {
    store: Arc<dyn FeedStore>,
    preferences: Arc<dyn PreferenceProvider>,
    sources: SourceLayer,
    hydrator: Hydrator,
    filters: FilterChain,
    scorer: WeightedScorer,
    diversity: AuthorDiversityScorer,
    selector: Selector,
    config: Config,
}

impl HomeMixer {
    pub fn new(
        store: Arc<dyn FeedStore>,
        preferences: Arc<dyn PreferenceProvider>,
        config: Config,
    ) -> Self {
        let mut source_list: Vec<Box<dyn CandidateSource>> = vec![
            Box::new(InNetworkSource::new(store.clone())),
            Box::new(OutOfNetworkSource::new(store.clone())),
        ];
        if config.headlines.api_key.is_some() {
            source_list.push(Box::new(HeadlinesSource::new(config.headlines.clone())));
        }

        let sources = SourceLayer::new(
            source_list,
            std::time::Duration::from_millis(config.sources.timeout_ms),
        );
        let hydrator = Hydrator::new(
            store.clone(),
            std::time::Duration::from_millis(config.hydration.store_timeout_ms),
        );

        Self {
            store,
            preferences,
            sources,
            hydrator,
            filters: FilterChain::standard(),
            scorer: WeightedScorer::new(config.scoring.half_life_hours),
            diversity: AuthorDiversityScorer::new(config.diversity.penalty_step),
            selector: Selector::new(config.selection.max_per_author),
            config,
        }
    }

    pub async fn rank(&self, request: RankRequest) -> Result<FeedResponse, PipelineError> {
        self.rank_at(request, Utc::now()).await
    }

    /// `now` is captured once per request and threaded through every
    /// stage, so a fixed timestamp reproduces a byte-identical feed.
    pub async fn rank_at(
        &self,
        request: RankRequest,
        now: DateTime<Utc>,
    ) -> Result<FeedResponse, PipelineError> {
        if request.limit <= 0 {
            return Err(PipelineError::InvalidLimit(request.limit));
        }

        let request_id = Uuid::new_v4();
        let span = info_span!("rank", %request_id, user_id = %request.user_id);
        self.rank_inner(request, now).instrument(span).await
    }

    async fn rank_inner(
        &self,
        request: RankRequest,
        now: DateTime<Utc>,
    ) -> Result<FeedResponse, PipelineError> {
        let limit = (request.limit as usize).min(self.config.selection.max_limit);

        let user = self
            .store
            .get_user(&request.user_id)
            .await?
            .ok_or_else(|| PipelineError::UnknownUser(request.user_id.clone()))?;

        let prefs = self.preferences.get_preferences(&user.id).await.clamped();

        let following = self.read_set("following", self.store.get_following(&user.id)).await;
        let blocked_muted = self
            .read_set("blocked_muted", self.store.get_blocked_muted(&user.id))
            .await;
        let seen_post_ids = self
            .read_set(
                "seen_posts",
                self.store.get_seen_post_ids(
                    &user.id,
                    Duration::hours(self.config.filters.seen_window_hours),
                ),
            )
            .await;

        let ctx = self.source_context(user, following, prefs.clone(), now, request.following_only);

        // 1) Candidate sourcing (concurrent, merged in priority order)
        let (candidates, mut stats) = self.sources.gather(&ctx, request.following_only).await;

        // 2) Hydration (fail-soft per candidate)
        let hydrated = self.hydrator.hydrate(candidates).await;

        // 3) Pre-scoring filters
        let filter_ctx = FilterContext {
            viewer_id: &ctx.user.id,
            blocked_muted: &blocked_muted,
            seen_post_ids: &seen_post_ids,
            now,
            max_age: Duration::hours(self.config.filters.max_age_hours),
        };
        let filtered = self.filters.apply(hydrated, &filter_ctx);

        // 4) Multi-action scoring
        let scored = self.scorer.score_candidates(filtered, &prefs, now);

        // 5) Author diversity re-ranking
        let ranked = self.diversity.rerank(scored, prefs.diversity_strength);

        // 6) Selection
        let selected = self.selector.select(ranked, limit);
        stats.final_count = selected.len();

        info!(
            in_network = stats.in_network_count,
            out_of_network = stats.out_of_network_count,
            external = stats.external_count,
            total = stats.total_candidates,
            returned = stats.final_count,
            following_only = request.following_only,
            "feed ranked"
        );

        // 7) Explanations (optional, read-only)
        let explanations = request
            .include_explanations
            .then(|| build_explanations(&selected));

        let items = selected
            .into_iter()
            .enumerate()
            .map(|(i, item)| FeedItem {
                ranking_explanation: explanations.as_ref().map(|e| e[i].clone()),
                post: item.candidate.post,
                author: item.candidate.author,
                parent_post: item.candidate.parent_post,
                quoted_post: item.candidate.quoted_post,
            })
            .collect();

        Ok(FeedResponse {
            items,
            next_cursor: None,
            source_stats: stats,
        })
    }

    /// Per-request lookups that are allowed to fail soft: an empty set
    /// degrades the feed, it does not abort the request.
    async fn read_set(
        &self,
        what: &'static str,
        fut: impl std::future::Future<Output = anyhow::Result<HashSet<String>>>,
    ) -> HashSet<String> {
        match fut.await {
            Ok(set) => set,
            Err(e) => {
                warn!(lookup = what, error = %e, "store lookup failed, treating as empty");
                HashSet::new()
            }
        }
    }

    fn source_context(
        &self,
        user: User,
        following: HashSet<String>,
        prefs: crate::models::AlgorithmPreferences,
        now: DateTime<Utc>,
        following_only: bool,
    ) -> SourceContext {
        let budget = self.config.sources.candidate_budget;
        // Higher friends_vs_global reserves more of the budget for
        // in-network, between a quarter and three quarters.
        let in_share = 0.25 + 0.5 * prefs.friends_vs_global;
        let (in_network_quota, out_of_network_quota) = if following_only {
            (self.config.sources.following_only_limit, 0)
        } else {
            let in_quota = ((budget as f32) * in_share).round() as usize;
            (in_quota.min(budget), budget.saturating_sub(in_quota))
        };

        SourceContext {
            user,
            following,
            prefs,
            now,
            in_network_quota,
            out_of_network_quota,
            lookback: Duration::hours(self.config.sources.lookback_hours),
            per_author_cap: self.config.sources.per_author_cap,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AlgorithmPreferences;
    use crate::store::MemoryStore;

    fn mixer_with_empty_store() -> HomeMixer {
        let store = Arc::new(MemoryStore::new());
        HomeMixer::new(store.clone(), store, Config::default())
    }

    #[tokio::test]
    async fn test_non_positive_limit_rejected() {
        let mixer = mixer_with_empty_store();
        let err = mixer
            .rank(RankRequest {
                user_id: "u".to_string(),
                limit: 0,
                include_explanations: false,
                following_only: false,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidLimit(0)));
    }

    #[tokio::test]
    async fn test_unknown_user_rejected() {
        let mixer = mixer_with_empty_store();
        let err = mixer
            .rank(RankRequest {
                user_id: "nobody".to_string(),
                limit: 10,
                include_explanations: false,
                following_only: false,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::UnknownUser(id) if id == "nobody"));
    }

    #[test]
    fn test_budget_share_monotonic_in_friends_slider() {
        let mixer = mixer_with_empty_store();
        let user = User {
            id: "u".to_string(),
            handle: "u".to_string(),
            display_name: "U".to_string(),
            bio: String::new(),
            topics: vec![],
            following_ids: vec![],
            followers_count: 0,
            following_count: 0,
        };

        let quota_at = |friends_vs_global: f32| {
            let prefs = AlgorithmPreferences {
                friends_vs_global,
                ..Default::default()
            };
            mixer
                .source_context(user.clone(), HashSet::new(), prefs, Utc::now(), false)
                .in_network_quota
        };

        assert!(quota_at(0.0) < quota_at(0.5));
        assert!(quota_at(0.5) < quota_at(1.0));
    }

    #[test]
    fn test_following_only_zeroes_out_of_network_quota() {
        let mixer = mixer_with_empty_store();
        let user = User {
            id: "u".to_string(),
            handle: "u".to_string(),
            display_name: "U".to_string(),
            bio: String::new(),
            topics: vec![],
            following_ids: vec![],
            followers_count: 0,
            following_count: 0,
        };
        let ctx = mixer.source_context(
            user,
            HashSet::new(),
            AlgorithmPreferences::default(),
            Utc::now(),
            true,
        );
        assert_eq!(ctx.out_of_network_quota, 0);
        assert_eq!(ctx.in_network_quota, 300);
    }
}
