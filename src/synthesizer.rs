use crate::llm::{salvage_json, LlmClient};
use crate::types::{ForumPost, Result, ReviewSynthesis, TopPost, UserProfile};
use serde_json::Value;
use std::fmt::Write as _;
use tracing::{debug, warn};

/// At most this many posts go into the review digest.
const DIGEST_POSTS: usize = 5;

/// At most this many comments per digested post.
const DIGEST_COMMENTS: usize = 3;

const POST_EXCERPT_CHARS: usize = 200;
const COMMENT_EXCERPT_CHARS: usize = 150;

/// Summary posts carried in the final payload.
const TOP_POSTS: usize = 3;

/// Summarize ranked community posts into sentiment, themes and a summary.
///
/// Empty input short-circuits without a model call. `top_posts` is filled
/// from the ranked list regardless of whether the model reply parses, so a
/// bad synthesis never hides the underlying post evidence.
pub async fn synthesize_reviews(
    llm: &dyn LlmClient,
    posts: &[ForumPost],
    profile: &UserProfile,
) -> Result<ReviewSynthesis> {
    if posts.is_empty() {
        debug!("No posts to synthesize, skipping model call");
        return Ok(ReviewSynthesis::empty());
    }

    let prompt = build_prompt(posts, profile);
    let reply = llm.chat(&prompt).await?;

    let top_posts = top_posts(posts);
    let total_reviews = posts.len();

    match salvage_json(&reply) {
        Some(parsed) => Ok(synthesis_from_value(&parsed, total_reviews, top_posts)),
        None => {
            warn!("Unparseable synthesis reply ({} chars), using defaults", reply.len());
            Ok(ReviewSynthesis {
                sentiment: "neutral".to_string(),
                positive_percent: 50.0,
                total_reviews,
                key_themes: Vec::new(),
                summary: "Reviews analyzed.".to_string(),
                top_posts,
            })
        }
    }
}

fn build_prompt(posts: &[ForumPost], profile: &UserProfile) -> String {
    format!(
        r#"Analyze these community reviews for someone with {skin_type} skin and concerns about {concerns}.

Reviews:
{digest}
Return JSON:
{{
  "sentiment": "positive" or "mixed" or "negative",
  "positivePercent": 0-100,
  "keyThemes": ["theme1", "theme2"],
  "summary": "2-3 sentence summary"
}}"#,
        skin_type = profile.skin_type,
        concerns = profile.concerns.join(", "),
        digest = build_digest(posts),
    )
}

/// Concatenate post titles, body excerpts and top comment excerpts into the
/// prompt digest.
fn build_digest(posts: &[ForumPost]) -> String {
    let mut digest = String::new();
    for (i, post) in posts.iter().take(DIGEST_POSTS).enumerate() {
        let _ = writeln!(
            digest,
            "[Post {}]: {}. {}",
            i + 1,
            post.title,
            excerpt(&post.body, POST_EXCERPT_CHARS)
        );
        for comment in post.comments.iter().take(DIGEST_COMMENTS) {
            let _ = writeln!(digest, "- {}", excerpt(&comment.body, COMMENT_EXCERPT_CHARS));
        }
        digest.push('\n');
    }
    digest
}

fn excerpt(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

fn top_posts(posts: &[ForumPost]) -> Vec<TopPost> {
    posts
        .iter()
        .take(TOP_POSTS)
        .map(|post| TopPost {
            title: post.title.clone(),
            url: post.url.clone(),
            score: post.score,
            created_at: post.created_at,
            relevance_score: post.relevance_score,
        })
        .collect()
}

fn synthesis_from_value(
    parsed: &Value,
    total_reviews: usize,
    top_posts: Vec<TopPost>,
) -> ReviewSynthesis {
    ReviewSynthesis {
        sentiment: parsed
            .get("sentiment")
            .and_then(Value::as_str)
            .unwrap_or("neutral")
            .to_string(),
        positive_percent: parsed
            .get("positivePercent")
            .and_then(Value::as_f64)
            .unwrap_or(50.0),
        total_reviews,
        key_themes: parsed
            .get("keyThemes")
            .and_then(Value::as_array)
            .map(|themes| {
                themes
                    .iter()
                    .filter_map(Value::as_str)
                    .map(|theme| theme.to_string())
                    .collect()
            })
            .unwrap_or_default(),
        summary: parsed
            .get("summary")
            .and_then(Value::as_str)
            .unwrap_or("Reviews analyzed.")
            .to_string(),
        top_posts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlm;
    use crate::types::PostComment;
    use chrono::Utc;

    fn profile() -> UserProfile {
        UserProfile {
            skin_type: "dry".to_string(),
            climate: "cold".to_string(),
            concerns: vec!["redness".to_string()],
        }
    }

    fn post(title: &str) -> ForumPost {
        ForumPost {
            title: title.to_string(),
            body: "long body ".repeat(40),
            score: 12,
            num_comments: 4,
            created_at: Utc::now(),
            age_in_days: 3.0,
            url: format!("https://reddit.com/r/test/{}", title),
            subreddit: "test".to_string(),
            match_score: 1.0,
            relevance_score: 8.0,
            comments: vec![PostComment {
                body: "works well".to_string(),
                score: 9,
            }],
        }
    }

    #[tokio::test]
    async fn empty_posts_return_neutral_default_without_model_call() {
        let mock = MockLlm::new();
        let synthesis = synthesize_reviews(&mock, &[], &profile()).await.unwrap();

        assert_eq!(mock.call_count(), 0);
        assert_eq!(synthesis.sentiment, "neutral");
        assert_eq!(synthesis.total_reviews, 0);
        assert!(synthesis.top_posts.is_empty());
    }

    #[tokio::test]
    async fn parse_failure_still_surfaces_top_posts() {
        let mock = MockLlm::new().with_reply("sorry, no JSON today");
        let posts = vec![post("a"), post("b"), post("c"), post("d")];
        let synthesis = synthesize_reviews(&mock, &posts, &profile()).await.unwrap();

        assert_eq!(synthesis.sentiment, "neutral");
        assert_eq!(synthesis.total_reviews, 4);
        assert_eq!(synthesis.top_posts.len(), 3);
        assert_eq!(synthesis.top_posts[0].title, "a");
    }

    #[tokio::test]
    async fn well_formed_reply_is_parsed() {
        let mock = MockLlm::new().with_reply(
            r#"{"sentiment": "positive", "positivePercent": 82,
                "keyThemes": ["hydration", "texture"], "summary": "Well liked."}"#,
        );
        let posts = vec![post("a")];
        let synthesis = synthesize_reviews(&mock, &posts, &profile()).await.unwrap();

        assert_eq!(synthesis.sentiment, "positive");
        assert_eq!(synthesis.positive_percent, 82.0);
        assert_eq!(synthesis.key_themes, vec!["hydration", "texture"]);
        assert_eq!(synthesis.summary, "Well liked.");
        assert_eq!(synthesis.top_posts.len(), 1);
    }

    #[test]
    fn digest_truncates_posts_and_comments() {
        let posts: Vec<ForumPost> = (0..8).map(|i| post(&format!("p{}", i))).collect();
        let digest = build_digest(&posts);
        assert!(digest.contains("[Post 5]"));
        assert!(!digest.contains("[Post 6]"));
    }
}
