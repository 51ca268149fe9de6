use chrono::{Duration, Utc};
use home_mixer::models::{EngagementCounts, Post, PostType, Topic, User};
use home_mixer::store::MemoryStore;
use home_mixer::{Config, HomeMixer, RankRequest};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Developer harness: seeds a small in-memory store and prints one ranked
/// feed with explanations. The real store and API surface live in their
/// own services.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let config = Config::from_env();
    let store = Arc::new(seed_store());
    let mixer = HomeMixer::new(store.clone(), store, config);

    let response = mixer
        .rank(RankRequest {
            user_id: "alice".to_string(),
            limit: 10,
            include_explanations: true,
            following_only: false,
        })
        .await?;

    info!(items = response.items.len(), "feed ready");
    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(())
}

fn seed_store() -> MemoryStore {
    let store = MemoryStore::new();
    let now = Utc::now();

    store.add_user(user("alice", &["bob", "carol"], vec![Topic::Tech]));
    store.add_user(user("bob", &[], vec![Topic::Tech, Topic::Finance]));
    store.add_user(user("carol", &[], vec![Topic::Culture]));
    store.add_user(user("dave", &[], vec![Topic::Memes]));

    let posts = [
        ("bob_rust", "bob", "shipped the new parser in rust", vec![Topic::Tech], 1, 14),
        ("bob_markets", "bob", "rates commentary nobody asked for", vec![Topic::Finance], 3, 4),
        ("bob_keyboard", "bob", "keyboard review thread", vec![Topic::Tech], 5, 2),
        ("carol_gallery", "carol", "gallery opening recap", vec![Topic::Culture], 20, 9),
        ("dave_meme", "dave", "this meme is load bearing", vec![Topic::Memes], 2, 55),
        ("dave_hot_take", "dave", "cold take reheated", vec![Topic::Memes], 8, 3),
    ];

    for (id, author, text, topics, hours_ago, likes) in posts {
        store.add_post(Post {
            id: id.to_string(),
            author_id: author.to_string(),
            text: text.to_string(),
            post_type: PostType::Original,
            parent_id: None,
            quoted_id: None,
            topics,
            created_at: now - Duration::hours(hours_ago),
            like_count: likes,
            repost_count: likes / 3,
            reply_count: likes / 4,
            quote_count: 0,
            view_count: likes * 20,
        });
    }

    // One post the crowd keeps flagging.
    store.set_engagement_counts(
        "dave_hot_take",
        EngagementCounts {
            like: 8,
            repost: 2,
            reply: 2,
            quote: 0,
            profile_click: 1,
            not_interested: 25,
        },
    );

    store
}

fn user(id: &str, following: &[&str], topics: Vec<Topic>) -> User {
    User {
        id: id.to_string(),
        handle: id.to_string(),
        display_name: id.to_string(),
        bio: String::new(),
        topics,
        following_ids: following.iter().map(|s| s.to_string()).collect(),
        followers_count: 0,
        following_count: following.len() as u32,
    }
}
