use crate::types::ForumPost;
use std::cmp::Ordering;

/// Ranked output is capped at the top 10 posts.
const MAX_RANKED_POSTS: usize = 10;

/// Relevance scores never exceed this ceiling. There is no floor: stale,
/// low-signal posts may score negative.
const MAX_RELEVANCE: f64 = 10.0;

const REVIEW_WORDS: &[&str] = &[
    "review", "tried", "tested", "using", "used", "love", "hate", "recommend", "thoughts",
];

/// Score and order posts by relevance, descending, truncated to the top 10.
///
/// Deterministic and pure; ties keep their original order (stable sort).
pub fn rank_posts(posts: Vec<ForumPost>) -> Vec<ForumPost> {
    if posts.is_empty() {
        return posts;
    }

    let mut ranked: Vec<ForumPost> = posts
        .into_iter()
        .map(|mut post| {
            post.relevance_score = relevance_score(&post);
            post
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.relevance_score
            .partial_cmp(&a.relevance_score)
            .unwrap_or(Ordering::Equal)
    });
    ranked.truncate(MAX_RANKED_POSTS);
    ranked
}

/// Relevance of a single post.
///
/// Starts from the product match weight, rewards review intent, active
/// question threads and upvotes, and penalizes posts older than a year.
pub fn relevance_score(post: &ForumPost) -> f64 {
    let mut score = post.match_score * 5.0;

    if is_review_post(post) {
        score += 3.0;
    }

    if is_question_post(post) && post.num_comments >= 10 {
        score += 2.0;
    }

    if post.score >= 50 {
        score += 1.0;
    }

    if post.age_in_days > 365.0 {
        score -= 1.0;
    }

    score.min(MAX_RELEVANCE)
}

fn is_review_post(post: &ForumPost) -> bool {
    let text = format!("{} {}", post.title, post.body).to_lowercase();
    REVIEW_WORDS.iter().any(|word| text.contains(word))
}

fn is_question_post(post: &ForumPost) -> bool {
    let title = post.title.to_lowercase();
    title.contains('?') || title.contains("anyone") || title.contains("should i")
}
