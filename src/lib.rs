pub mod api;
pub mod cache;
pub mod classifier;
pub mod comments;
pub mod config;
pub mod extract;
pub mod forum;
pub mod llm;
pub mod pipeline;
pub mod ranker;
pub mod synthesizer;
pub mod types;

pub use cache::{CacheLookup, ProductCache};
pub use comments::{CommentSource, RedditComments};
pub use config::AppConfig;
pub use forum::{ForumConfig, ForumSearch, RedditSearchClient};
pub use llm::{LlmClient, LlmConfig, MockLlm, WorkersAiClient};
pub use pipeline::{derive_verdict, product_key, AnalysisPipeline};
pub use ranker::rank_posts;
pub use types::*;
