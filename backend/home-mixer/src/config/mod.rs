use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub sources: SourcesConfig,
    pub hydration: HydrationConfig,
    pub filters: FiltersConfig,
    pub scoring: ScoringConfig,
    pub diversity: DiversityConfig,
    pub selection: SelectionConfig,
    pub headlines: HeadlinesConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourcesConfig {
    /// Total in-network + out-of-network candidate budget per request.
    pub candidate_budget: usize,
    pub per_author_cap: usize,
    pub lookback_hours: i64,
    pub timeout_ms: u64,
    /// In-network budget when the request bypasses out-of-network entirely.
    pub following_only_limit: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HydrationConfig {
    pub store_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FiltersConfig {
    pub max_age_hours: i64,
    /// Window over which previously shown posts stay excluded.
    pub seen_window_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    pub half_life_hours: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiversityConfig {
    /// Per-repeat penalty at full diversity_strength.
    pub penalty_step: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectionConfig {
    /// Hard same-author cap within one page, independent of the soft penalty.
    pub max_per_author: usize,
    pub max_limit: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HeadlinesConfig {
    /// Absent key disables the source entirely.
    pub api_key: Option<String>,
    pub endpoint: String,
    pub category: String,
    pub country: String,
    pub limit: usize,
    pub timeout_ms: u64,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Config {
            sources: SourcesConfig {
                candidate_budget: env::var("CANDIDATE_BUDGET")
                    .unwrap_or_else(|_| "350".to_string())
                    .parse()
                    .expect("CANDIDATE_BUDGET must be a valid usize"),
                per_author_cap: env::var("PER_AUTHOR_CAP")
                    .unwrap_or_else(|_| "20".to_string())
                    .parse()
                    .expect("PER_AUTHOR_CAP must be a valid usize"),
                lookback_hours: env::var("SOURCE_LOOKBACK_HOURS")
                    .unwrap_or_else(|_| "168".to_string())
                    .parse()
                    .expect("SOURCE_LOOKBACK_HOURS must be a valid i64"),
                timeout_ms: env::var("SOURCE_TIMEOUT_MS")
                    .unwrap_or_else(|_| "800".to_string())
                    .parse()
                    .expect("SOURCE_TIMEOUT_MS must be a valid u64"),
                following_only_limit: env::var("FOLLOWING_ONLY_LIMIT")
                    .unwrap_or_else(|_| "300".to_string())
                    .parse()
                    .expect("FOLLOWING_ONLY_LIMIT must be a valid usize"),
            },
            hydration: HydrationConfig {
                store_timeout_ms: env::var("STORE_TIMEOUT_MS")
                    .unwrap_or_else(|_| "400".to_string())
                    .parse()
                    .expect("STORE_TIMEOUT_MS must be a valid u64"),
            },
            filters: FiltersConfig {
                max_age_hours: env::var("MAX_AGE_HOURS")
                    .unwrap_or_else(|_| "168".to_string())
                    .parse()
                    .expect("MAX_AGE_HOURS must be a valid i64"),
                seen_window_hours: env::var("SEEN_WINDOW_HOURS")
                    .unwrap_or_else(|_| "48".to_string())
                    .parse()
                    .expect("SEEN_WINDOW_HOURS must be a valid i64"),
            },
            scoring: ScoringConfig {
                half_life_hours: env::var("DECAY_HALF_LIFE_HOURS")
                    .unwrap_or_else(|_| "24".to_string())
                    .parse()
                    .expect("DECAY_HALF_LIFE_HOURS must be a valid f32"),
            },
            diversity: DiversityConfig {
                penalty_step: env::var("DIVERSITY_PENALTY_STEP")
                    .unwrap_or_else(|_| "0.3".to_string())
                    .parse()
                    .expect("DIVERSITY_PENALTY_STEP must be a valid f32"),
            },
            selection: SelectionConfig {
                max_per_author: env::var("MAX_PER_AUTHOR")
                    .unwrap_or_else(|_| "3".to_string())
                    .parse()
                    .expect("MAX_PER_AUTHOR must be a valid usize"),
                max_limit: env::var("MAX_LIMIT")
                    .unwrap_or_else(|_| "100".to_string())
                    .parse()
                    .expect("MAX_LIMIT must be a valid usize"),
            },
            headlines: HeadlinesConfig {
                api_key: env::var("HEADLINES_API_KEY").ok().filter(|k| !k.is_empty()),
                endpoint: env::var("HEADLINES_ENDPOINT")
                    .unwrap_or_else(|_| "https://newsapi.org/v2/top-headlines".to_string()),
                category: env::var("HEADLINES_CATEGORY").unwrap_or_else(|_| "general".to_string()),
                country: env::var("HEADLINES_COUNTRY").unwrap_or_else(|_| "us".to_string()),
                limit: env::var("HEADLINES_LIMIT")
                    .unwrap_or_else(|_| "25".to_string())
                    .parse()
                    .expect("HEADLINES_LIMIT must be a valid usize"),
                timeout_ms: env::var("HEADLINES_TIMEOUT_MS")
                    .unwrap_or_else(|_| "10000".to_string())
                    .parse()
                    .expect("HEADLINES_TIMEOUT_MS must be a valid u64"),
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            sources: SourcesConfig {
                candidate_budget: 350,
                per_author_cap: 20,
                lookback_hours: 168,
                timeout_ms: 800,
                following_only_limit: 300,
            },
            hydration: HydrationConfig {
                store_timeout_ms: 400,
            },
            filters: FiltersConfig {
                max_age_hours: 168,
                seen_window_hours: 48,
            },
            scoring: ScoringConfig {
                half_life_hours: 24.0,
            },
            diversity: DiversityConfig { penalty_step: 0.3 },
            selection: SelectionConfig {
                max_per_author: 3,
                max_limit: 100,
            },
            headlines: HeadlinesConfig {
                api_key: None,
                endpoint: "https://newsapi.org/v2/top-headlines".to_string(),
                category: "general".to_string(),
                country: "us".to_string(),
                limit: 25,
                timeout_ms: 10000,
            },
        }
    }
}
