use crate::models::{
    Action, ActionScore, AlgorithmPreferences, Candidate, ScoredCandidate, SourceTag,
};
use crate::utils::exponential_decay;
use chrono::{DateTime, Utc};
use tracing::warn;

/// Additive weight of the recency boost at full freshness preference.
const RECENCY_BOOST_WEIGHT: f32 = 0.3;

/// Heuristic multi-action scorer. No learned model anywhere: every
/// probability is a pure function of engagement counters, post age, topic
/// overlap, and the viewer's preference sliders, so the resulting
/// breakdown is auditable row by row.
pub struct WeightedScorer {
    half_life_hours: f32,
}

impl WeightedScorer {
    pub fn new(half_life_hours: f32) -> Self {
        Self { half_life_hours }
    }

    /// Positive action weights; 調整這裡等於調整產品目標.
    fn positive_weight(action: Action) -> f32 {
        match action {
            Action::Like => 1.0,
            Action::Repost => 1.2,
            Action::Reply => 1.0,
            Action::Quote => 0.8,
            Action::Click => 0.6,
            Action::Share => 0.9,
            Action::FollowAuthor => 0.7,
            _ => 0.0,
        }
    }

    /// Base weights for down-ranking signals, before the
    /// `negative_signal_strength` slider scales them.
    fn negative_base_weight(action: Action) -> f32 {
        match action {
            Action::NotInterested => -1.5,
            Action::BlockAuthor => -2.0,
            Action::MuteAuthor => -1.8,
            Action::Report => -2.0,
            _ => 0.0,
        }
    }

    pub fn score_candidates(
        &self,
        candidates: Vec<Candidate>,
        prefs: &AlgorithmPreferences,
        now: DateTime<Utc>,
    ) -> Vec<ScoredCandidate> {
        let mut out = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let scored = self.score_one(candidate, prefs, now);
            if scored.final_score.is_finite() {
                out.push(scored);
            } else {
                // One bad record must not take down the whole response.
                warn!(post_id = %scored.candidate.post.id, "non-finite score, dropping candidate");
            }
        }
        out
    }

    fn score_one(
        &self,
        candidate: Candidate,
        prefs: &AlgorithmPreferences,
        now: DateTime<Utc>,
    ) -> ScoredCandidate {
        let age_hours = age_hours(now, candidate.post.created_at);
        let decay = exponential_decay(age_hours, self.half_life_hours);
        let prior = self.engagement_prior(&candidate, prefs, decay);

        let mut action_scores = Vec::with_capacity(Action::POSITIVE.len() + Action::NEGATIVE.len());
        let mut base_score = 0.0f32;

        for action in Action::POSITIVE {
            let weight = Self::positive_weight(action);
            let probability = self.positive_probability(action, &candidate, prior);
            let contribution = weight * probability;
            base_score += contribution;
            action_scores.push(ActionScore {
                action,
                weight,
                probability,
                contribution,
            });
        }

        for action in Action::NEGATIVE {
            let weight = Self::negative_base_weight(action) * prefs.negative_signal_strength;
            let probability = self.negative_probability(action, &candidate);
            let contribution = weight * probability;
            base_score += contribution;
            action_scores.push(ActionScore {
                action,
                weight,
                probability,
                contribution,
            });
        }

        let recency_boost = RECENCY_BOOST_WEIGHT * (1.0 - prefs.recency_vs_popularity) * decay;
        let topic_boost = self.topic_boost(&candidate, prefs);
        let final_score = base_score + recency_boost + topic_boost;

        ScoredCandidate {
            candidate,
            action_scores,
            base_score,
            recency_boost,
            topic_boost,
            diversity_penalty: 0.0,
            final_score,
        }
    }

    /// Shared engagement prior for the positive actions: a freshness /
    /// popularity blend, with the in-network prior folded in here so
    /// `base_score == sum(contribution)` stays exact.
    fn engagement_prior(
        &self,
        candidate: &Candidate,
        prefs: &AlgorithmPreferences,
        decay: f32,
    ) -> f32 {
        let e = &candidate.engagement;
        let raw = e.like as f32 + 2.0 * e.repost as f32 + 1.5 * e.reply as f32
            + 0.8 * e.quote as f32;
        let pop = (raw / 10.0).tanh() * 0.5 + 0.5;
        // Viral end of the dial doubles popularity influence relative to
        // the niche end.
        let pop_scaled = pop * (0.5 + 0.5 * prefs.niche_vs_viral);

        let mut prior = (1.0 - prefs.recency_vs_popularity) * decay
            + prefs.recency_vs_popularity * pop_scaled;

        if candidate.source == SourceTag::InNetwork {
            prior *= 1.0 + 0.25 * prefs.friends_vs_global;
        }

        prior.clamp(0.0, 1.0)
    }

    fn positive_probability(&self, action: Action, candidate: &Candidate, prior: f32) -> f32 {
        let e = &candidate.engagement;
        let action_factor = match action {
            Action::Like => 0.4 + 0.3 * (e.like as f32 / 20.0).min(1.0),
            Action::Repost => 0.2 + 0.2 * (e.repost as f32 / 10.0).min(1.0),
            Action::Reply => 0.25,
            Action::Quote => 0.15,
            Action::Click => 0.5,
            Action::Share => 0.2,
            Action::FollowAuthor => 0.1,
            _ => 0.0,
        };
        (prior * action_factor).clamp(0.0, 1.0)
    }

    /// Negative probabilities saturate on accumulated not_interested
    /// feedback; a candidate nobody has complained about keeps the small
    /// base rates.
    fn negative_probability(&self, action: Action, candidate: &Candidate) -> f32 {
        let saturation = (candidate.engagement.not_interested as f32 / 5.0).tanh();
        let probability = match action {
            Action::NotInterested => 0.05 + 0.45 * saturation,
            Action::BlockAuthor => 0.02 + 0.10 * saturation,
            Action::MuteAuthor => 0.03 + 0.12 * saturation,
            Action::Report => 0.01 + 0.05 * saturation,
            _ => 0.0,
        };
        probability.clamp(0.0, 1.0)
    }

    /// Mean topic-weight of the post's tags, scaled by the niche end of
    /// the niche/viral dial. Dividing by the tag count keeps heavily
    /// tagged posts from dominating the base score.
    fn topic_boost(&self, candidate: &Candidate, prefs: &AlgorithmPreferences) -> f32 {
        if candidate.post.topics.is_empty() {
            return 0.0;
        }
        let mean_weight = candidate
            .post
            .topics
            .iter()
            .map(|t| prefs.topic_weight(*t))
            .sum::<f32>()
            / candidate.post.topics.len() as f32;
        let coefficient = 0.1 + 0.2 * (1.0 - prefs.niche_vs_viral);
        coefficient * mean_weight
    }
}

pub fn age_hours(now: DateTime<Utc>, created_at: DateTime<Utc>) -> f32 {
    (now - created_at).num_seconds().max(0) as f32 / 3600.0
}
