use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topic {
    Tech,
    Politics,
    Culture,
    Memes,
    Finance,
    News,
    Other,
}

impl Topic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Tech => "tech",
            Topic::Politics => "politics",
            Topic::Culture => "culture",
            Topic::Memes => "memes",
            Topic::Finance => "finance",
            Topic::News => "news",
            Topic::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostType {
    Original,
    Reply,
    Repost,
    Quote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub author_id: String,
    pub text: String,
    pub post_type: PostType,
    pub parent_id: Option<String>,
    pub quoted_id: Option<String>,
    pub topics: Vec<Topic>,
    pub created_at: DateTime<Utc>,
    pub like_count: u32,
    pub repost_count: u32,
    pub reply_count: u32,
    pub quote_count: u32,
    pub view_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub handle: String,
    pub display_name: String,
    pub bio: String,
    pub topics: Vec<Topic>,
    pub following_ids: Vec<String>,
    pub followers_count: u32,
    pub following_count: u32,
}

/// Live per-post engagement counters read from the store.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EngagementCounts {
    pub like: u32,
    pub repost: u32,
    pub reply: u32,
    pub quote: u32,
    pub profile_click: u32,
    pub not_interested: u32,
}

impl EngagementCounts {
    /// Fall back to the denormalized counters carried on the post itself.
    pub fn from_post(post: &Post) -> Self {
        Self {
            like: post.like_count,
            repost: post.repost_count,
            reply: post.reply_count,
            quote: post.quote_count,
            profile_click: 0,
            not_interested: 0,
        }
    }
}

/// Engagement actions the scorer estimates a probability for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Like,
    Repost,
    Reply,
    Quote,
    Click,
    Share,
    FollowAuthor,
    NotInterested,
    BlockAuthor,
    MuteAuthor,
    Report,
}

impl Action {
    pub const POSITIVE: [Action; 7] = [
        Action::Like,
        Action::Repost,
        Action::Reply,
        Action::Quote,
        Action::Click,
        Action::Share,
        Action::FollowAuthor,
    ];

    pub const NEGATIVE: [Action; 4] = [
        Action::NotInterested,
        Action::BlockAuthor,
        Action::MuteAuthor,
        Action::Report,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Like => "like",
            Action::Repost => "repost",
            Action::Reply => "reply",
            Action::Quote => "quote",
            Action::Click => "click",
            Action::Share => "share",
            Action::FollowAuthor => "follow_author",
            Action::NotInterested => "not_interested",
            Action::BlockAuthor => "block_author",
            Action::MuteAuthor => "mute_author",
            Action::Report => "report",
        }
    }

    pub fn is_negative(&self) -> bool {
        matches!(
            self,
            Action::NotInterested | Action::BlockAuthor | Action::MuteAuthor | Action::Report
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTag {
    InNetwork,
    OutOfNetwork,
}

impl SourceTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceTag::InNetwork => "in_network",
            SourceTag::OutOfNetwork => "out_of_network",
        }
    }

    /// Merge/tie-break priority. Lower ranks first.
    pub fn priority(&self) -> u8 {
        match self {
            SourceTag::InNetwork => 0,
            SourceTag::OutOfNetwork => 1,
        }
    }
}

/// User-facing ranking sliders. Every field lives in [0, 1].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmPreferences {
    /// 0 = freshness dominates, 1 = popularity dominates.
    pub recency_vs_popularity: f32,
    /// Higher reserves a larger share of the candidate budget for in-network.
    pub friends_vs_global: f32,
    /// 0 = niche interest alignment, 1 = viral engagement.
    pub niche_vs_viral: f32,
    pub tech_weight: f32,
    pub politics_weight: f32,
    pub culture_weight: f32,
    pub memes_weight: f32,
    pub finance_weight: f32,
    /// 0 = allow author stacking, 1 = strong author diversity.
    pub diversity_strength: f32,
    /// Sizes the out-of-network slice picked regardless of topic overlap.
    pub exploration: f32,
    /// Scales the weight of not_interested / block / mute / report signals.
    pub negative_signal_strength: f32,
}

impl Default for AlgorithmPreferences {
    fn default() -> Self {
        Self {
            recency_vs_popularity: 0.3,
            friends_vs_global: 0.4,
            niche_vs_viral: 0.5,
            tech_weight: 0.2,
            politics_weight: 0.2,
            culture_weight: 0.2,
            memes_weight: 0.2,
            finance_weight: 0.2,
            diversity_strength: 0.6,
            exploration: 0.3,
            negative_signal_strength: 0.8,
        }
    }
}

impl AlgorithmPreferences {
    /// Out-of-range slider values are clamped, never rejected.
    pub fn clamped(mut self) -> Self {
        self.recency_vs_popularity = self.recency_vs_popularity.clamp(0.0, 1.0);
        self.friends_vs_global = self.friends_vs_global.clamp(0.0, 1.0);
        self.niche_vs_viral = self.niche_vs_viral.clamp(0.0, 1.0);
        self.tech_weight = self.tech_weight.clamp(0.0, 1.0);
        self.politics_weight = self.politics_weight.clamp(0.0, 1.0);
        self.culture_weight = self.culture_weight.clamp(0.0, 1.0);
        self.memes_weight = self.memes_weight.clamp(0.0, 1.0);
        self.finance_weight = self.finance_weight.clamp(0.0, 1.0);
        self.diversity_strength = self.diversity_strength.clamp(0.0, 1.0);
        self.exploration = self.exploration.clamp(0.0, 1.0);
        self.negative_signal_strength = self.negative_signal_strength.clamp(0.0, 1.0);
        self
    }

    /// Weight for one topic tag. Topics without a slider get a small flat weight.
    pub fn topic_weight(&self, topic: Topic) -> f32 {
        match topic {
            Topic::Tech => self.tech_weight,
            Topic::Politics => self.politics_weight,
            Topic::Culture => self.culture_weight,
            Topic::Memes => self.memes_weight,
            Topic::Finance => self.finance_weight,
            Topic::News | Topic::Other => 0.1,
        }
    }
}

/// A post under consideration for the feed, carried through every stage.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub post: Post,
    pub author: Option<User>,
    pub parent_post: Option<Post>,
    pub quoted_post: Option<Post>,
    pub source: SourceTag,
    pub engagement: EngagementCounts,
}

impl Candidate {
    pub fn new(post: Post, source: SourceTag) -> Self {
        Self {
            post,
            author: None,
            parent_post: None,
            quoted_post: None,
            source,
            engagement: EngagementCounts::default(),
        }
    }
}

/// One row of the per-candidate action breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionScore {
    pub action: Action,
    pub weight: f32,
    pub probability: f32,
    pub contribution: f32,
}

/// Candidate plus the score components every later stage reads.
///
/// Invariant: `final_score == base_score + recency_boost + topic_boost - diversity_penalty`.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    pub action_scores: Vec<ActionScore>,
    pub base_score: f32,
    pub recency_boost: f32,
    pub topic_boost: f32,
    pub diversity_penalty: f32,
    pub final_score: f32,
}

/// Why a post appeared at this rank. Lifetime = one response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingExplanation {
    pub post_id: String,
    pub final_score: f32,
    pub rank: usize,
    pub source: SourceTag,
    pub action_scores: Vec<ActionScore>,
    pub diversity_penalty: f32,
    pub recency_boost: f32,
    pub topic_boost: f32,
}

/// Per-source candidate counts for one request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceStats {
    pub in_network_count: usize,
    pub out_of_network_count: usize,
    pub external_count: usize,
    pub total_candidates: usize,
    pub final_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedItem {
    pub post: Post,
    pub author: Option<User>,
    pub parent_post: Option<Post>,
    pub quoted_post: Option<Post>,
    pub ranking_explanation: Option<RankingExplanation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedResponse {
    pub items: Vec<FeedItem>,
    pub next_cursor: Option<String>,
    pub source_stats: SourceStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preferences_clamped() {
        let prefs = AlgorithmPreferences {
            recency_vs_popularity: 1.7,
            friends_vs_global: -0.4,
            negative_signal_strength: 2.0,
            ..Default::default()
        }
        .clamped();

        assert_eq!(prefs.recency_vs_popularity, 1.0);
        assert_eq!(prefs.friends_vs_global, 0.0);
        assert_eq!(prefs.negative_signal_strength, 1.0);
        assert_eq!(prefs.niche_vs_viral, 0.5);
    }

    #[test]
    fn test_source_priority_ordering() {
        assert!(SourceTag::InNetwork.priority() < SourceTag::OutOfNetwork.priority());
    }

    #[test]
    fn test_action_partitions_cover_all_actions() {
        assert!(Action::POSITIVE.iter().all(|a| !a.is_negative()));
        assert!(Action::NEGATIVE.iter().all(|a| a.is_negative()));
        assert_eq!(Action::POSITIVE.len() + Action::NEGATIVE.len(), 11);
    }
}
