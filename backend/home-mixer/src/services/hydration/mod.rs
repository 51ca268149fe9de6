use crate::models::Candidate;
use crate::store::FeedStore;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::warn;

/// Attaches author, parent-post, quoted-post, and live engagement counts
/// to each candidate. A candidate whose author or referenced post cannot
/// be resolved is dropped rather than carried forward half-hydrated.
pub struct Hydrator {
    store: Arc<dyn FeedStore>,
    store_timeout: Duration,
}

impl Hydrator {
    pub fn new(store: Arc<dyn FeedStore>, store_timeout: Duration) -> Self {
        Self {
            store,
            store_timeout,
        }
    }

    pub async fn hydrate(&self, candidates: Vec<Candidate>) -> Vec<Candidate> {
        let mut out = Vec::with_capacity(candidates.len());
        for mut candidate in candidates {
            match self.hydrate_one(&mut candidate).await {
                Ok(true) => out.push(candidate),
                Ok(false) => {
                    warn!(
                        post_id = %candidate.post.id,
                        author_id = %candidate.post.author_id,
                        "dropping candidate with unresolvable references"
                    );
                }
                Err(e) => {
                    warn!(post_id = %candidate.post.id, error = %e, "hydration failed, dropping candidate");
                }
            }
        }
        out
    }

    /// Ok(false) means a reference was missing (not a store fault).
    async fn hydrate_one(&self, candidate: &mut Candidate) -> Result<bool> {
        if candidate.author.is_none() {
            let author = timeout(
                self.store_timeout,
                self.store.get_user(&candidate.post.author_id),
            )
            .await
            .context("author lookup timed out")??;
            match author {
                Some(author) => candidate.author = Some(author),
                None => return Ok(false),
            }
        }

        if let Some(parent_id) = candidate.post.parent_id.clone() {
            let parent = timeout(self.store_timeout, self.store.get_post(&parent_id))
                .await
                .context("parent post lookup timed out")??;
            match parent {
                Some(parent) => candidate.parent_post = Some(parent),
                None => return Ok(false),
            }
        }

        if let Some(quoted_id) = candidate.post.quoted_id.clone() {
            let quoted = timeout(self.store_timeout, self.store.get_post(&quoted_id))
                .await
                .context("quoted post lookup timed out")??;
            match quoted {
                Some(quoted) => candidate.quoted_post = Some(quoted),
                None => return Ok(false),
            }
        }

        candidate.engagement = timeout(
            self.store_timeout,
            self.store.get_engagement_counts(&candidate.post.id),
        )
        .await
        .context("engagement counts lookup timed out")??;

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EngagementCounts, Post, PostType, SourceTag, User};
    use crate::store::MockFeedStore;
    use chrono::Utc;

    fn post(id: &str, author: &str) -> Post {
        Post {
            id: id.to_string(),
            author_id: author.to_string(),
            text: String::new(),
            post_type: PostType::Original,
            parent_id: None,
            quoted_id: None,
            topics: vec![],
            created_at: Utc::now(),
            like_count: 3,
            repost_count: 0,
            reply_count: 0,
            quote_count: 0,
            view_count: 0,
        }
    }

    fn author(id: &str) -> User {
        User {
            id: id.to_string(),
            handle: id.to_string(),
            display_name: id.to_string(),
            bio: String::new(),
            topics: vec![],
            following_ids: vec![],
            followers_count: 0,
            following_count: 0,
        }
    }

    #[tokio::test]
    async fn test_hydrates_author_and_engagement() {
        let mut store = MockFeedStore::new();
        store
            .expect_get_user()
            .returning(|id| Ok(Some(author(id))));
        store.expect_get_engagement_counts().returning(|_| {
            Ok(EngagementCounts {
                like: 7,
                ..Default::default()
            })
        });

        let hydrator = Hydrator::new(Arc::new(store), Duration::from_millis(100));
        let hydrated = hydrator
            .hydrate(vec![Candidate::new(post("p1", "a"), SourceTag::InNetwork)])
            .await;

        assert_eq!(hydrated.len(), 1);
        assert_eq!(hydrated[0].author.as_ref().unwrap().id, "a");
        assert_eq!(hydrated[0].engagement.like, 7);
    }

    #[tokio::test]
    async fn test_drops_candidate_with_missing_author() {
        let mut store = MockFeedStore::new();
        store.expect_get_user().returning(|_| Ok(None));

        let hydrator = Hydrator::new(Arc::new(store), Duration::from_millis(100));
        let hydrated = hydrator
            .hydrate(vec![Candidate::new(post("p1", "ghost"), SourceTag::InNetwork)])
            .await;

        assert!(hydrated.is_empty());
    }

    #[tokio::test]
    async fn test_drops_reply_with_missing_parent() {
        let mut store = MockFeedStore::new();
        store
            .expect_get_user()
            .returning(|id| Ok(Some(author(id))));
        store.expect_get_post().returning(|_| Ok(None));

        let mut reply = post("r1", "a");
        reply.post_type = PostType::Reply;
        reply.parent_id = Some("gone".to_string());

        let hydrator = Hydrator::new(Arc::new(store), Duration::from_millis(100));
        let hydrated = hydrator
            .hydrate(vec![Candidate::new(reply, SourceTag::InNetwork)])
            .await;

        assert!(hydrated.is_empty());
    }

    #[tokio::test]
    async fn test_store_error_drops_only_that_candidate() {
        let mut store = MockFeedStore::new();
        store.expect_get_user().returning(|id| {
            if id == "bad" {
                anyhow::bail!("store exploded")
            } else {
                Ok(Some(author(id)))
            }
        });
        store
            .expect_get_engagement_counts()
            .returning(|_| Ok(EngagementCounts::default()));

        let hydrator = Hydrator::new(Arc::new(store), Duration::from_millis(100));
        let hydrated = hydrator
            .hydrate(vec![
                Candidate::new(post("p1", "bad"), SourceTag::InNetwork),
                Candidate::new(post("p2", "good"), SourceTag::InNetwork),
            ])
            .await;

        assert_eq!(hydrated.len(), 1);
        assert_eq!(hydrated[0].post.id, "p2");
    }

    #[tokio::test]
    async fn test_pre_hydrated_author_skips_store_lookup() {
        let mut store = MockFeedStore::new();
        // No get_user expectation: a lookup would panic the mock.
        store
            .expect_get_engagement_counts()
            .returning(|_| Ok(EngagementCounts::default()));

        let mut candidate = Candidate::new(post("h1", "headlines"), SourceTag::OutOfNetwork);
        candidate.author = Some(author("headlines"));

        let hydrator = Hydrator::new(Arc::new(store), Duration::from_millis(100));
        let hydrated = hydrator.hydrate(vec![candidate]).await;

        assert_eq!(hydrated.len(), 1);
    }
}
