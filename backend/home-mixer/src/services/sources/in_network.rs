use super::{CandidateSource, SourceContext};
use crate::models::{Candidate, SourceTag};
use crate::store::FeedStore;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// In-network source: recent posts from accounts the viewer follows.
/// The per-author cap keeps one prolific followee from saturating the
/// candidate set.
pub struct InNetworkSource {
    store: Arc<dyn FeedStore>,
}

impl InNetworkSource {
    pub fn new(store: Arc<dyn FeedStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CandidateSource for InNetworkSource {
    fn name(&self) -> &'static str {
        "in_network"
    }

    fn tag(&self) -> SourceTag {
        SourceTag::InNetwork
    }

    async fn fetch(&self, ctx: &SourceContext) -> Result<Vec<Candidate>> {
        if ctx.following.is_empty() {
            debug!(user_id = %ctx.user.id, "user follows nobody, in-network source is empty");
            return Ok(Vec::new());
        }

        let mut posts = self
            .store
            .get_recent_posts_by_authors(&ctx.following, ctx.lookback, ctx.per_author_cap)
            .await
            .context("failed to fetch recent posts for followed authors")?;

        // Store contract says newest first; enforce it anyway so the quota
        // cut is stable against store implementations that don't.
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        posts.truncate(ctx.in_network_quota);

        Ok(posts
            .into_iter()
            .map(|post| Candidate::new(post, SourceTag::InNetwork))
            .collect())
    }
}
