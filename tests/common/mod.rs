use async_trait::async_trait;
use chrono::Utc;
use skinsense_api::{
    AnalysisPipeline, CommentSource, ForumPost, ForumSearch, MockLlm, PostComment, ProductCache,
    UserProfile,
};
use std::sync::Arc;

/// Forum double that returns a fixed post list.
pub struct StaticForum {
    posts: Vec<ForumPost>,
}

impl StaticForum {
    pub fn new(posts: Vec<ForumPost>) -> Self {
        Self { posts }
    }
}

#[async_trait]
impl ForumSearch for StaticForum {
    async fn search(&self, _product_name: &str, _brand: &str) -> Vec<ForumPost> {
        self.posts.clone()
    }
}

/// Comment double that never finds anything.
pub struct NoComments;

#[async_trait]
impl CommentSource for NoComments {
    async fn top_comments(&self, _post_url: &str, _product_name: &str) -> Vec<PostComment> {
        Vec::new()
    }
}

pub fn profile() -> UserProfile {
    UserProfile {
        skin_type: "combination".to_string(),
        climate: "temperate".to_string(),
        concerns: vec!["acne".to_string(), "redness".to_string()],
    }
}

pub fn sample_post(title: &str) -> ForumPost {
    ForumPost {
        title: title.to_string(),
        body: "I tried this for a month and it works well on my skin.".to_string(),
        score: 42,
        num_comments: 7,
        created_at: Utc::now(),
        age_in_days: 12.0,
        url: format!("https://reddit.com/r/SkincareAddiction/comments/{}", title),
        subreddit: "SkincareAddiction".to_string(),
        match_score: 1.0,
        relevance_score: 0.0,
        comments: Vec::new(),
    }
}

pub async fn pipeline_with(llm: Arc<MockLlm>, posts: Vec<ForumPost>) -> AnalysisPipeline {
    let cache = ProductCache::in_memory()
        .await
        .expect("in-memory cache should open");
    AnalysisPipeline::new(
        cache,
        llm,
        Arc::new(StaticForum::new(posts)),
        Arc::new(NoComments),
    )
}
