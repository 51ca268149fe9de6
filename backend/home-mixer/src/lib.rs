pub mod config;
pub mod models;
pub mod services;
pub mod store;
pub mod utils;

pub use config::Config;
pub use services::pipeline::{HomeMixer, PipelineError, RankRequest};
pub use services::{AuthorDiversityScorer, FilterChain, Hydrator, Selector, SourceLayer, WeightedScorer};
pub use store::{FeedStore, MemoryStore, PreferenceProvider};
