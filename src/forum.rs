use crate::types::{ForumPost, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Hard cap on posts returned by one search, across all channels.
const MAX_SEARCH_RESULTS: usize = 10;

/// Generic category words that carry no search signal for this domain.
const CATEGORY_WORDS: &[&str] = &[
    "cream", "serum", "moisturizer", "cleanser", "toner", "essence", "lotion", "gel", "foam",
    "balm", "oil", "mask", "treatment", "the", "a", "an", "for", "with",
];

/// Trait for community review search backends.
#[async_trait]
pub trait ForumSearch: Send + Sync {
    /// Search the configured channels for posts about a product.
    ///
    /// Best-effort: an empty result is a valid outcome, never an error.
    async fn search(&self, product_name: &str, brand: &str) -> Vec<ForumPost>;
}

#[derive(Debug, Clone)]
pub struct ForumConfig {
    pub base_url: String,
    pub channels: Vec<String>,
    pub user_agent: String,
    pub timeout_seconds: u64,
}

impl Default for ForumConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.reddit.com".to_string(),
            channels: vec!["SkincareAddiction".to_string(), "AsianBeauty".to_string()],
            user_agent: "SkinSense/1.0".to_string(),
            timeout_seconds: 8,
        }
    }
}

/// Reddit-style public search client.
///
/// The public API rate-limits and intermittently blocks server-side callers,
/// so every channel query degrades silently to an empty list on failure and
/// no retries are attempted.
pub struct RedditSearchClient {
    client: Client,
    config: ForumConfig,
}

impl RedditSearchClient {
    pub fn new(config: ForumConfig) -> Self {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    async fn fetch_channel(&self, channel: &str, query: &str) -> Result<Vec<ForumPost>> {
        let mut url = Url::parse(&format!(
            "{}/r/{}/search.json",
            self.config.base_url, channel
        ))?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("limit", "100")
            .append_pair("restrict_sr", "1")
            .append_pair("sort", "relevance");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!("Forum search returned HTTP {} for r/{}", status, channel);
            return Ok(Vec::new());
        }

        let listing: SearchListing = response.json().await?;
        let now = Utc::now();
        let posts = listing
            .data
            .children
            .into_iter()
            .map(|child| child.data.into_post(&now))
            .collect::<Vec<_>>();

        debug!("r/{} returned {} posts for \"{}\"", channel, posts.len(), query);
        Ok(posts)
    }
}

#[async_trait]
impl ForumSearch for RedditSearchClient {
    async fn search(&self, product_name: &str, brand: &str) -> Vec<ForumPost> {
        let query = build_search_query(product_name, brand);
        debug!("Forum search query: \"{}\"", query);

        let fetches = self
            .config
            .channels
            .iter()
            .map(|channel| self.fetch_channel(channel, &query));

        let mut posts = Vec::new();
        for (channel, result) in self.config.channels.iter().zip(join_all(fetches).await) {
            match result {
                Ok(channel_posts) => posts.extend(channel_posts),
                Err(e) => warn!("Forum search failed for r/{}: {}", channel, e),
            }
        }

        if posts.is_empty() {
            info!("No forum results for {} {} (source may be rate limited)", brand, product_name);
            return posts;
        }

        posts.truncate(MAX_SEARCH_RESULTS);
        info!("Returning {} forum posts for {} {}", posts.len(), brand, product_name);
        posts
    }
}

/// Up to 3 significant keywords from the product name: category words,
/// short tokens and purely numeric/percentage tokens are dropped.
pub fn key_words(product_name: &str) -> Vec<String> {
    product_name
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|word| {
            word.len() > 2 && !CATEGORY_WORDS.contains(word) && !is_numeric_token(word)
        })
        .take(3)
        .map(|word| word.to_string())
        .collect()
}

fn is_numeric_token(word: &str) -> bool {
    let digits = word.strip_suffix('%').unwrap_or(word);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

/// Search query: brand plus significant product keywords.
pub fn build_search_query(product_name: &str, brand: &str) -> String {
    let keywords = key_words(product_name);
    if brand.is_empty() {
        if keywords.is_empty() {
            product_name.to_string()
        } else {
            keywords.join(" ")
        }
    } else {
        format!("{} {}", brand, keywords.join(" ")).trim().to_string()
    }
}

#[derive(Debug, Deserialize, Default)]
struct SearchListing {
    #[serde(default)]
    data: ListingData,
}

#[derive(Debug, Deserialize, Default)]
struct ListingData {
    #[serde(default)]
    children: Vec<ListingChild>,
}

#[derive(Debug, Deserialize)]
struct ListingChild {
    data: RawPost,
}

/// Raw post shape from the public search endpoint. Every field defaults, the
/// payload is untrusted.
#[derive(Debug, Deserialize, Default)]
struct RawPost {
    #[serde(default)]
    title: String,
    #[serde(default)]
    selftext: String,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    num_comments: i64,
    #[serde(default)]
    created_utc: f64,
    #[serde(default)]
    permalink: String,
    #[serde(default)]
    subreddit: String,
}

impl RawPost {
    fn into_post(self, now: &DateTime<Utc>) -> ForumPost {
        let created_at =
            DateTime::from_timestamp(self.created_utc as i64, 0).unwrap_or_else(Utc::now);
        let age_in_days = (*now - created_at).num_seconds() as f64 / 86_400.0;

        ForumPost {
            title: self.title,
            body: self.selftext,
            score: self.score,
            num_comments: self.num_comments,
            created_at,
            age_in_days,
            url: format!("https://reddit.com{}", self.permalink),
            subreddit: self.subreddit,
            match_score: 1.0,
            relevance_score: 0.0,
            comments: Vec::new(),
        }
    }
}
