use super::{CandidateSource, SourceContext};
use crate::config::HeadlinesConfig;
use crate::models::{Candidate, Post, PostType, SourceTag, Topic, User};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tracing::debug;

pub const HEADLINES_AUTHOR_ID: &str = "headlines";

const MAX_TEXT_LEN: usize = 280;

/// Optional external source: injects top headlines as out-of-network
/// candidates with a synthesized author. Without an API key the source is
/// constructed disabled and contributes nothing.
pub struct HeadlinesSource {
    config: HeadlinesConfig,
    client: reqwest::Client,
}

impl HeadlinesSource {
    pub fn new(config: HeadlinesConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(config.timeout_ms))
            .build()
            .unwrap_or_default();
        Self { config, client }
    }

    fn topic_for_category(category: &str) -> Topic {
        match category {
            "business" => Topic::Finance,
            "entertainment" | "sports" => Topic::Culture,
            "science" | "technology" => Topic::Tech,
            "general" => Topic::News,
            _ => Topic::Other,
        }
    }

    fn synthesized_author(display_name: &str) -> User {
        User {
            id: HEADLINES_AUTHOR_ID.to_string(),
            handle: HEADLINES_AUTHOR_ID.to_string(),
            display_name: display_name.to_string(),
            bio: "Top headlines".to_string(),
            topics: vec![Topic::News],
            following_ids: vec![],
            followers_count: 0,
            following_count: 0,
        }
    }

    fn sanitize(text: &str) -> String {
        let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.chars().count() <= MAX_TEXT_LEN {
            return collapsed;
        }
        let truncated: String = collapsed.chars().take(MAX_TEXT_LEN - 3).collect();
        format!("{truncated}...")
    }
}

#[async_trait]
impl CandidateSource for HeadlinesSource {
    fn name(&self) -> &'static str {
        "headlines"
    }

    fn tag(&self) -> SourceTag {
        SourceTag::OutOfNetwork
    }

    async fn fetch(&self, ctx: &SourceContext) -> Result<Vec<Candidate>> {
        let Some(api_key) = &self.config.api_key else {
            return Ok(Vec::new());
        };

        let page_size = self.config.limit.min(100).to_string();
        let response = self
            .client
            .get(&self.config.endpoint)
            .query(&[
                ("apiKey", api_key.as_str()),
                ("pageSize", page_size.as_str()),
                ("country", self.config.country.as_str()),
                ("category", self.config.category.as_str()),
            ])
            .send()
            .await
            .context("headlines request failed")?
            .error_for_status()
            .context("headlines request returned an error status")?;

        let body: HeadlinesResponse = response
            .json()
            .await
            .context("failed to decode headlines response")?;

        let topic = Self::topic_for_category(&self.config.category);
        let mut out = Vec::new();
        for (i, article) in body.articles.into_iter().enumerate() {
            if out.len() >= self.config.limit {
                break;
            }
            let Some(title) = article.title.as_deref().map(str::trim).filter(|t| !t.is_empty())
            else {
                continue;
            };

            let text = match article.description.as_deref().map(str::trim) {
                Some(desc) if !desc.is_empty() => Self::sanitize(&format!("{title} {desc}")),
                _ => Self::sanitize(title),
            };

            let created_at = article
                .published_at
                .as_deref()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|| ctx.now - Duration::minutes(i as i64));

            let post = Post {
                id: format!("headline_{}_{}", created_at.timestamp(), i),
                author_id: HEADLINES_AUTHOR_ID.to_string(),
                text,
                post_type: PostType::Original,
                parent_id: None,
                quoted_id: None,
                topics: vec![topic],
                created_at,
                like_count: 0,
                repost_count: 0,
                reply_count: 0,
                quote_count: 0,
                view_count: 0,
            };

            let source_name = article
                .source
                .and_then(|s| s.name)
                .unwrap_or_else(|| "News".to_string());

            let mut candidate = Candidate::new(post, SourceTag::OutOfNetwork);
            candidate.author = Some(Self::synthesized_author(&source_name));
            out.push(candidate);
        }

        debug!(count = out.len(), "headlines source injected candidates");
        Ok(out)
    }
}

#[derive(Debug, Deserialize)]
struct HeadlinesResponse {
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct Article {
    title: Option<String>,
    description: Option<String>,
    source: Option<ArticleSource>,
    #[serde(rename = "publishedAt")]
    published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ArticleSource {
    name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AlgorithmPreferences;
    use std::collections::HashSet;

    #[test]
    fn test_sanitize_collapses_whitespace_and_truncates() {
        let messy = "breaking:   markets\n\nrally";
        assert_eq!(HeadlinesSource::sanitize(messy), "breaking: markets rally");

        let long = "a".repeat(400);
        let sanitized = HeadlinesSource::sanitize(&long);
        assert_eq!(sanitized.chars().count(), MAX_TEXT_LEN);
        assert!(sanitized.ends_with("..."));
    }

    #[test]
    fn test_category_topic_mapping() {
        assert_eq!(
            HeadlinesSource::topic_for_category("technology"),
            Topic::Tech
        );
        assert_eq!(
            HeadlinesSource::topic_for_category("business"),
            Topic::Finance
        );
        assert_eq!(HeadlinesSource::topic_for_category("weird"), Topic::Other);
    }

    #[tokio::test]
    async fn test_disabled_without_api_key() {
        let source = HeadlinesSource::new(HeadlinesConfig {
            api_key: None,
            endpoint: "https://example.invalid".to_string(),
            category: "general".to_string(),
            country: "us".to_string(),
            limit: 10,
            timeout_ms: 100,
        });

        let ctx = SourceContext {
            user: HeadlinesSource::synthesized_author("News"),
            following: HashSet::new(),
            prefs: AlgorithmPreferences::default(),
            now: Utc::now(),
            in_network_quota: 0,
            out_of_network_quota: 0,
            lookback: Duration::hours(1),
            per_author_cap: 1,
        };

        let candidates = source.fetch(&ctx).await.unwrap();
        assert!(candidates.is_empty());
    }
}
