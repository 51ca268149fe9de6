use super::{FeedStore, PreferenceProvider};
use crate::models::{AlgorithmPreferences, EngagementCounts, Post, PostType, Topic, User};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::collections::HashSet;

/// In-memory implementation of the store interfaces, used by the demo
/// binary and the integration tests. Keeps a recent-by-author index so
/// in-network lookups do not scan the whole post table.
#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<String, User>,
    posts: DashMap<String, Post>,
    recent_by_author: DashMap<String, Vec<String>>,
    engagements: DashMap<String, EngagementCounts>,
    blocked_muted: DashMap<String, HashSet<String>>,
    seen: DashMap<String, Vec<(String, DateTime<Utc>)>>,
    preferences: DashMap<String, AlgorithmPreferences>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, user: User) {
        self.users.insert(user.id.clone(), user);
    }

    /// Insert a post and seed its live counters from the denormalized ones.
    pub fn add_post(&self, post: Post) {
        self.recent_by_author
            .entry(post.author_id.clone())
            .or_default()
            .push(post.id.clone());
        self.engagements
            .insert(post.id.clone(), EngagementCounts::from_post(&post));
        self.posts.insert(post.id.clone(), post);
    }

    pub fn set_engagement_counts(&self, post_id: &str, counts: EngagementCounts) {
        self.engagements.insert(post_id.to_string(), counts);
    }

    pub fn block(&self, user_id: &str, other_id: &str) {
        self.blocked_muted
            .entry(user_id.to_string())
            .or_default()
            .insert(other_id.to_string());
    }

    pub fn record_seen(&self, user_id: &str, post_id: &str, at: DateTime<Utc>) {
        self.seen
            .entry(user_id.to_string())
            .or_default()
            .push((post_id.to_string(), at));
    }

    pub fn set_preferences(&self, user_id: &str, prefs: AlgorithmPreferences) {
        self.preferences.insert(user_id.to_string(), prefs);
    }
}

#[async_trait]
impl FeedStore for MemoryStore {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        Ok(self.users.get(user_id).map(|u| u.clone()))
    }

    async fn get_following(&self, user_id: &str) -> Result<HashSet<String>> {
        Ok(self
            .users
            .get(user_id)
            .map(|u| u.following_ids.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn get_blocked_muted(&self, user_id: &str) -> Result<HashSet<String>> {
        Ok(self
            .blocked_muted
            .get(user_id)
            .map(|s| s.clone())
            .unwrap_or_default())
    }

    async fn get_recent_posts_by_authors(
        &self,
        author_ids: &HashSet<String>,
        window: Duration,
        per_author_cap: usize,
    ) -> Result<Vec<Post>> {
        let cutoff = Utc::now() - window;
        let mut out: Vec<Post> = Vec::new();
        for author_id in author_ids {
            let Some(post_ids) = self.recent_by_author.get(author_id) else {
                continue;
            };
            let mut taken = 0usize;
            for post_id in post_ids.iter().rev() {
                if taken >= per_author_cap {
                    break;
                }
                if let Some(post) = self.posts.get(post_id) {
                    if post.created_at >= cutoff {
                        out.push(post.clone());
                        taken += 1;
                    }
                }
            }
        }
        // Newest first; id breaks ties so output order never depends on
        // set iteration order.
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(out)
    }

    async fn get_candidate_pool(
        &self,
        _topic_affinities: &[Topic],
        window: Duration,
    ) -> Result<Vec<Post>> {
        let cutoff = Utc::now() - window;
        let mut out: Vec<Post> = self
            .posts
            .iter()
            .filter(|p| p.created_at >= cutoff && p.post_type == PostType::Original)
            .map(|p| p.clone())
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(out)
    }

    async fn get_post(&self, post_id: &str) -> Result<Option<Post>> {
        Ok(self.posts.get(post_id).map(|p| p.clone()))
    }

    async fn get_engagement_counts(&self, post_id: &str) -> Result<EngagementCounts> {
        Ok(self
            .engagements
            .get(post_id)
            .map(|c| *c)
            .unwrap_or_default())
    }

    async fn get_seen_post_ids(&self, user_id: &str, window: Duration) -> Result<HashSet<String>> {
        let cutoff = Utc::now() - window;
        Ok(self
            .seen
            .get(user_id)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|(_, at)| *at >= cutoff)
                    .map(|(post_id, _)| post_id.clone())
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[async_trait]
impl PreferenceProvider for MemoryStore {
    async fn get_preferences(&self, user_id: &str) -> AlgorithmPreferences {
        self.preferences
            .get(user_id)
            .map(|p| p.clone())
            .unwrap_or_default()
    }
}
