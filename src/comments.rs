use crate::types::{PostComment, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// At most this many comments are attached to a post.
const MAX_COMMENTS: usize = 5;

/// Comments shorter than this carry too little signal to keep.
const MIN_COMMENT_LENGTH: usize = 50;

/// Minimum upvote score (exclusive) for a comment to be considered.
const MIN_COMMENT_SCORE: i64 = 3;

const SENTIMENT_WORDS: &[&str] = &["love", "hate", "tried", "works", "recommend", "skin", "using"];

/// Trait for fetching top comments of a forum post.
#[async_trait]
pub trait CommentSource: Send + Sync {
    /// Best-effort enrichment: any failure yields an empty list.
    async fn top_comments(&self, post_url: &str, product_name: &str) -> Vec<PostComment>;
}

/// Pulls the comment listing that Reddit-style APIs expose at `<post>.json`.
pub struct RedditComments {
    client: Client,
}

impl RedditComments {
    pub fn new(user_agent: &str, timeout_seconds: u64) -> Self {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(timeout_seconds))
            .gzip(true)
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }

    async fn fetch(&self, post_url: &str, product_name: &str) -> Result<Vec<PostComment>> {
        let response = self
            .client
            .get(format!("{}.json", post_url))
            .send()
            .await?;

        if !response.status().is_success() {
            return Ok(Vec::new());
        }

        // The endpoint answers with [post_listing, comment_listing]; the
        // whole payload is untrusted, so navigate defensively.
        let data: Value = response.json().await?;
        let Some(children) = data
            .get(1)
            .and_then(|listing| listing.get("data"))
            .and_then(|d| d.get("children"))
            .and_then(Value::as_array)
        else {
            return Ok(Vec::new());
        };

        let mut comments = Vec::new();
        for child in children {
            if comments.len() >= MAX_COMMENTS {
                break;
            }

            let Some(comment) = child.get("data") else { continue };
            let Some(body) = comment.get("body").and_then(Value::as_str) else { continue };
            let score = comment.get("score").and_then(Value::as_i64).unwrap_or(0);

            if score <= MIN_COMMENT_SCORE {
                continue;
            }

            if is_relevant_comment(body, product_name) {
                comments.push(PostComment {
                    body: body.to_string(),
                    score,
                });
            }
        }

        debug!("Kept {} comments from {}", comments.len(), post_url);
        Ok(comments)
    }
}

#[async_trait]
impl CommentSource for RedditComments {
    async fn top_comments(&self, post_url: &str, product_name: &str) -> Vec<PostComment> {
        match self.fetch(post_url, product_name).await {
            Ok(comments) => comments,
            Err(e) => {
                warn!("Comment fetch failed for {}: {}", post_url, e);
                Vec::new()
            }
        }
    }
}

/// A comment is worth keeping when it is long enough and either voices
/// review sentiment or mentions a significant token of the product name.
pub fn is_relevant_comment(body: &str, product_name: &str) -> bool {
    if body.len() < MIN_COMMENT_LENGTH {
        return false;
    }

    let body_lower = body.to_lowercase();
    if SENTIMENT_WORDS.iter().any(|word| body_lower.contains(word)) {
        return true;
    }

    product_name
        .to_lowercase()
        .split_whitespace()
        .any(|word| word.len() >= 4 && body_lower.contains(word))
}
