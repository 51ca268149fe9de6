mod headlines;
mod in_network;
mod out_of_network;

use crate::models::{AlgorithmPreferences, Candidate, SourceStats, SourceTag, User};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use futures::future::join_all;
use std::collections::HashSet;
use tracing::{debug, warn};

pub use headlines::HeadlinesSource;
pub use in_network::InNetworkSource;
pub use out_of_network::OutOfNetworkSource;

/// Per-request inputs shared by every candidate source.
#[derive(Debug, Clone)]
pub struct SourceContext {
    pub user: User,
    pub following: HashSet<String>,
    pub prefs: AlgorithmPreferences,
    pub now: DateTime<Utc>,
    pub in_network_quota: usize,
    pub out_of_network_quota: usize,
    pub lookback: Duration,
    pub per_author_cap: usize,
}

/// 候選來源特徵
#[async_trait]
pub trait CandidateSource: Send + Sync {
    fn name(&self) -> &'static str;
    fn tag(&self) -> SourceTag;

    /// Return candidates with no duplicate post ids within this source's
    /// own output.
    async fn fetch(&self, ctx: &SourceContext) -> Result<Vec<Candidate>>;
}

/// Source layer: fetches every source concurrently, merges in priority
/// order, and dedups by post id (first occurrence wins).
pub struct SourceLayer {
    sources: Vec<Box<dyn CandidateSource>>,
    timeout: std::time::Duration,
}

impl SourceLayer {
    /// `sources` must already be in merge-priority order: in-network,
    /// then out-of-network, then external.
    pub fn new(sources: Vec<Box<dyn CandidateSource>>, timeout: std::time::Duration) -> Self {
        Self { sources, timeout }
    }

    pub async fn gather(
        &self,
        ctx: &SourceContext,
        following_only: bool,
    ) -> (Vec<Candidate>, SourceStats) {
        let fetches = self
            .sources
            .iter()
            .filter(|s| !following_only || s.tag() == SourceTag::InNetwork)
            .map(|source| {
                let timeout = self.timeout;
                async move {
                    let result = tokio::time::timeout(timeout, source.fetch(ctx)).await;
                    (source.name(), result)
                }
            });

        let mut merged: Vec<Candidate> = Vec::new();
        let mut stats = SourceStats::default();

        // join_all preserves input order, so the merge stays in source
        // priority order regardless of which fetch finishes first.
        for (name, result) in join_all(fetches).await {
            let candidates = match result {
                Ok(Ok(candidates)) => candidates,
                Ok(Err(e)) => {
                    warn!(source = name, error = %e, "candidate source failed, contributing zero candidates");
                    Vec::new()
                }
                Err(_) => {
                    warn!(
                        source = name,
                        timeout_ms = self.timeout.as_millis() as u64,
                        "candidate source timed out, contributing zero candidates"
                    );
                    Vec::new()
                }
            };

            match name {
                "in_network" => stats.in_network_count = candidates.len(),
                "out_of_network" => stats.out_of_network_count = candidates.len(),
                _ => stats.external_count += candidates.len(),
            }
            merged.extend(candidates);
        }

        let mut seen: HashSet<String> = HashSet::new();
        merged.retain(|c| seen.insert(c.post.id.clone()));
        stats.total_candidates = merged.len();

        debug!(
            in_network = stats.in_network_count,
            out_of_network = stats.out_of_network_count,
            external = stats.external_count,
            total = stats.total_candidates,
            "source gather completed"
        );

        (merged, stats)
    }
}
