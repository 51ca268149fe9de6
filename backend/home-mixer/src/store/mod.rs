mod memory;

use crate::models::{AlgorithmPreferences, EngagementCounts, Post, Topic, User};
use anyhow::Result;
use async_trait::async_trait;
use chrono::Duration;
use std::collections::HashSet;

#[cfg(test)]
use mockall::automock;

pub use memory::MemoryStore;

/// Read-only view of the post/user/engagement store.
///
/// The pipeline never mutates through this interface; marking posts as
/// shown or persisting preferences is the store collaborator's concern,
/// invoked after the pipeline returns.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait FeedStore: Send + Sync {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>>;

    async fn get_following(&self, user_id: &str) -> Result<HashSet<String>>;

    async fn get_blocked_muted(&self, user_id: &str) -> Result<HashSet<String>>;

    /// Recent posts by the given authors, newest first, at most
    /// `per_author_cap` per author, none older than `window`.
    async fn get_recent_posts_by_authors(
        &self,
        author_ids: &HashSet<String>,
        window: Duration,
        per_author_cap: usize,
    ) -> Result<Vec<Post>>;

    /// Broad recent-post pool for out-of-network sourcing. Implementations
    /// may pre-rank by the viewer's affinities but must not filter down to
    /// only those topics.
    async fn get_candidate_pool(
        &self,
        topic_affinities: &[Topic],
        window: Duration,
    ) -> Result<Vec<Post>>;

    async fn get_post(&self, post_id: &str) -> Result<Option<Post>>;

    async fn get_engagement_counts(&self, post_id: &str) -> Result<EngagementCounts>;

    /// Posts shown to this user within `window`, for the previously-seen filter.
    async fn get_seen_post_ids(&self, user_id: &str, window: Duration) -> Result<HashSet<String>>;
}

/// Per-user ranking preferences. Never errors: unset users get the default
/// slider vector.
#[async_trait]
pub trait PreferenceProvider: Send + Sync {
    async fn get_preferences(&self, user_id: &str) -> AlgorithmPreferences;
}
