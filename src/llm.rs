use crate::types::{AnalyzerError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

/// Trait for chat-style language model backends.
///
/// The pipeline only ever needs a single-turn completion; everything else
/// (prompt construction, reply salvage) lives with the callers.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Identifier of the underlying model, surfaced by the test endpoint.
    fn model_name(&self) -> String;

    /// Send a single user prompt and return the raw text reply.
    async fn chat(&self, prompt: &str) -> Result<String>;
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub account_id: String,
    pub api_token: String,
    pub model: String,
    pub timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            account_id: String::new(),
            api_token: String::new(),
            model: "@cf/meta/llama-3.3-70b-instruct-fp8-fast".to_string(),
            timeout_seconds: 10,
        }
    }
}

/// Workers AI REST client.
pub struct WorkersAiClient {
    client: Client,
    config: LlmConfig,
}

impl WorkersAiClient {
    pub fn new(config: LlmConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    fn run_url(&self) -> String {
        format!(
            "https://api.cloudflare.com/client/v4/accounts/{}/ai/run/{}",
            self.config.account_id, self.config.model
        )
    }
}

#[async_trait]
impl LlmClient for WorkersAiClient {
    fn model_name(&self) -> String {
        self.config.model.clone()
    }

    async fn chat(&self, prompt: &str) -> Result<String> {
        debug!("Sending prompt to {} ({} chars)", self.config.model, prompt.len());

        let response = self
            .client
            .post(self.run_url())
            .bearer_auth(&self.config.api_token)
            .json(&json!({
                "messages": [{ "role": "user", "content": prompt }]
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalyzerError::Llm(format!(
                "inference endpoint returned HTTP {}",
                status
            )));
        }

        let body: Value = response.json().await?;
        body.get("result")
            .and_then(|r| r.get("response"))
            .and_then(Value::as_str)
            .map(|s| s.to_string())
            .ok_or_else(|| AnalyzerError::Llm("reply missing result.response field".to_string()))
    }
}

/// Extract the JSON object embedded in a model reply.
///
/// Model replies routinely wrap JSON in markdown fences or prose. Takes the
/// substring between the first `{` and the last `}` and attempts a parse;
/// returns `None` when no parseable object is present.
pub fn salvage_json(reply: &str) -> Option<Value> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&reply[start..=end]).ok()
}

/// Scripted model for development and testing.
///
/// Pops one canned reply per `chat` call and counts invocations, so tests
/// can assert that short-circuit paths make no model calls.
pub struct MockLlm {
    replies: Mutex<VecDeque<String>>,
    calls: AtomicUsize,
}

impl MockLlm {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_reply(self, reply: impl Into<String>) -> Self {
        self.push_reply(reply);
        self
    }

    pub fn push_reply(&self, reply: impl Into<String>) {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(reply.into());
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockLlm {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    fn model_name(&self) -> String {
        "mock-llm".to_string()
    }

    async fn chat(&self, _prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = self
            .replies
            .lock()
            .ok()
            .and_then(|mut replies| replies.pop_front());
        Ok(reply.unwrap_or_else(|| "{}".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn salvages_fenced_json() {
        let reply = "Sure! Here you go:\n```json\n{\"score\": 7}\n```\nHope that helps.";
        let value = salvage_json(reply).unwrap();
        assert_eq!(value["score"], 7);
    }

    #[test]
    fn salvages_bare_json() {
        let value = salvage_json("{\"good\": []}").unwrap();
        assert!(value["good"].as_array().unwrap().is_empty());
    }

    #[test]
    fn rejects_reply_without_object() {
        assert!(salvage_json("no json here").is_none());
        assert!(salvage_json("} backwards {").is_none());
    }

    #[test]
    fn rejects_unparseable_object() {
        assert!(salvage_json("{not: valid json}").is_none());
    }

    #[tokio::test]
    async fn mock_counts_calls_and_pops_replies() {
        let mock = MockLlm::new().with_reply("first").with_reply("second");
        assert_eq!(mock.call_count(), 0);
        assert_eq!(mock.chat("a").await.unwrap(), "first");
        assert_eq!(mock.chat("b").await.unwrap(), "second");
        assert_eq!(mock.chat("c").await.unwrap(), "{}");
        assert_eq!(mock.call_count(), 3);
    }
}
