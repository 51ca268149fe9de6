use super::{CandidateSource, SourceContext};
use crate::models::{Candidate, Post, SourceTag};
use crate::store::FeedStore;
use crate::utils::normalize_score;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Out-of-network source: posts from authors the viewer does not follow.
///
/// Most of the quota is filled by topic-affinity and engagement ordering;
/// an exploration slice (sized by the `exploration` slider) is filled by
/// pure recency so the feed never collapses to the viewer's existing
/// topics.
pub struct OutOfNetworkSource {
    store: Arc<dyn FeedStore>,
}

impl OutOfNetworkSource {
    pub fn new(store: Arc<dyn FeedStore>) -> Self {
        Self { store }
    }

    /// Affinity ordering key: topic overlap with the viewer blended with
    /// normalized engagement.
    fn affinity(ctx: &SourceContext, post: &Post) -> f32 {
        let viewer_topics: HashSet<_> = ctx.user.topics.iter().collect();
        let overlap = if post.topics.is_empty() {
            0.0
        } else {
            let shared = post
                .topics
                .iter()
                .filter(|t| viewer_topics.contains(t))
                .count();
            shared as f32 / post.topics.len() as f32
        };

        let raw_engagement = post.like_count as f32
            + 2.0 * post.repost_count as f32
            + 1.5 * post.reply_count as f32;
        let engagement = normalize_score(raw_engagement, 0.0, 100.0);

        0.6 * overlap + 0.4 * engagement
    }
}

#[async_trait]
impl CandidateSource for OutOfNetworkSource {
    fn name(&self) -> &'static str {
        "out_of_network"
    }

    fn tag(&self) -> SourceTag {
        SourceTag::OutOfNetwork
    }

    async fn fetch(&self, ctx: &SourceContext) -> Result<Vec<Candidate>> {
        let pool = self
            .store
            .get_candidate_pool(&ctx.user.topics, ctx.lookback)
            .await
            .context("failed to fetch out-of-network candidate pool")?;

        let pool: Vec<Post> = pool
            .into_iter()
            .filter(|p| !ctx.following.contains(&p.author_id) && p.author_id != ctx.user.id)
            .collect();

        let quota = ctx.out_of_network_quota;
        let explore_share = 0.2 + 0.3 * ctx.prefs.exploration;
        let explore_quota = ((quota as f32) * explore_share).round() as usize;
        let affinity_quota = quota.saturating_sub(explore_quota);

        let mut by_affinity: Vec<(f32, Post)> = pool
            .iter()
            .map(|p| (Self::affinity(ctx, p), p.clone()))
            .collect();
        by_affinity.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.1.created_at.cmp(&a.1.created_at))
                .then_with(|| a.1.id.cmp(&b.1.id))
        });

        let mut picked: Vec<Post> = Vec::with_capacity(quota);
        let mut picked_ids: HashSet<String> = HashSet::new();
        for (_, post) in by_affinity.into_iter().take(affinity_quota) {
            picked_ids.insert(post.id.clone());
            picked.push(post);
        }

        // Exploration slice: newest first, whatever the topic. The pool is
        // already newest first, re-sort defensively for the same reason the
        // in-network source does.
        let mut by_recency = pool;
        by_recency.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        for post in by_recency {
            if picked.len() >= quota {
                break;
            }
            if picked_ids.insert(post.id.clone()) {
                picked.push(post);
            }
        }

        debug!(
            user_id = %ctx.user.id,
            picked = picked.len(),
            explore_quota,
            "out-of-network source selected candidates"
        );

        Ok(picked
            .into_iter()
            .map(|post| Candidate::new(post, SourceTag::OutOfNetwork))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AlgorithmPreferences, PostType, Topic, User};
    use crate::store::MemoryStore;
    use chrono::{Duration, Utc};

    fn post(id: &str, author: &str, topics: Vec<Topic>, likes: u32, minutes_ago: i64) -> Post {
        Post {
            id: id.to_string(),
            author_id: author.to_string(),
            text: String::new(),
            post_type: PostType::Original,
            parent_id: None,
            quoted_id: None,
            topics,
            created_at: Utc::now() - Duration::minutes(minutes_ago),
            like_count: likes,
            repost_count: 0,
            reply_count: 0,
            quote_count: 0,
            view_count: 0,
        }
    }

    fn ctx(quota: usize, exploration: f32) -> SourceContext {
        SourceContext {
            user: User {
                id: "viewer".to_string(),
                handle: "viewer".to_string(),
                display_name: "Viewer".to_string(),
                bio: String::new(),
                topics: vec![Topic::Tech],
                following_ids: vec!["friend".to_string()],
                followers_count: 0,
                following_count: 1,
            },
            following: ["friend".to_string()].into_iter().collect(),
            prefs: AlgorithmPreferences {
                exploration,
                ..Default::default()
            },
            now: Utc::now(),
            in_network_quota: 0,
            out_of_network_quota: quota,
            lookback: Duration::hours(168),
            per_author_cap: 20,
        }
    }

    #[tokio::test]
    async fn test_excludes_followees_and_self() {
        let store = Arc::new(MemoryStore::new());
        store.add_post(post("mine", "viewer", vec![], 0, 5));
        store.add_post(post("friends", "friend", vec![], 0, 5));
        store.add_post(post("strangers", "stranger", vec![], 0, 5));

        let source = OutOfNetworkSource::new(store);
        let candidates = source.fetch(&ctx(10, 0.0)).await.unwrap();

        let ids: Vec<_> = candidates.iter().map(|c| c.post.id.as_str()).collect();
        assert_eq!(ids, vec!["strangers"]);
    }

    #[tokio::test]
    async fn test_affinity_favors_topic_overlap() {
        let store = Arc::new(MemoryStore::new());
        store.add_post(post("on_topic", "a", vec![Topic::Tech], 0, 10));
        store.add_post(post("off_topic", "b", vec![Topic::Memes], 0, 5));

        let source = OutOfNetworkSource::new(store);
        // exploration 0 still reserves a 20% recency slice; quota 1 leaves
        // only the affinity pick.
        let candidates = source.fetch(&ctx(1, 0.0)).await.unwrap();

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].post.id, "on_topic");
    }

    #[tokio::test]
    async fn test_exploration_slice_admits_off_topic_posts() {
        let store = Arc::new(MemoryStore::new());
        for i in 0..4 {
            store.add_post(post(
                &format!("tech{i}"),
                "a",
                vec![Topic::Tech],
                50,
                30 + i,
            ));
        }
        store.add_post(post("fresh_memes", "b", vec![Topic::Memes], 0, 1));

        let source = OutOfNetworkSource::new(store);
        let candidates = source.fetch(&ctx(4, 1.0)).await.unwrap();

        assert!(candidates.iter().any(|c| c.post.id == "fresh_memes"));
    }

    #[tokio::test]
    async fn test_respects_quota() {
        let store = Arc::new(MemoryStore::new());
        for i in 0..20 {
            store.add_post(post(&format!("p{i}"), "a", vec![], 0, i));
        }

        let source = OutOfNetworkSource::new(store);
        let candidates = source.fetch(&ctx(5, 0.5)).await.unwrap();
        assert_eq!(candidates.len(), 5);
    }
}
