use crate::forum::ForumConfig;
use crate::llm::LlmConfig;
use std::env;

/// Process configuration, read from the environment with local-dev defaults.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub llm: LlmConfig,
    pub forum: ForumConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut llm = LlmConfig::default();
        llm.account_id = env::var("CF_ACCOUNT_ID").unwrap_or_default();
        llm.api_token = env::var("CF_API_TOKEN").unwrap_or_default();
        if let Ok(model) = env::var("LLM_MODEL") {
            llm.model = model;
        }

        let mut forum = ForumConfig::default();
        if let Ok(base_url) = env::var("FORUM_BASE_URL") {
            forum.base_url = base_url;
        }

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8787),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://skinsense-cache.db?mode=rwc".to_string()),
            llm,
            forum,
        }
    }
}
