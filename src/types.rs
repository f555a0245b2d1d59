use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User skin profile supplied with every analysis request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub skin_type: String,
    pub climate: String,
    #[serde(default)]
    pub concerns: Vec<String>,
}

/// A single classified ingredient with the model's rationale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngredientEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub reason: String,
}

/// Ingredient classification produced by the language model.
///
/// Malformed model output never surfaces here: every field degrades
/// independently to its neutral default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngredientReport {
    pub good: Vec<IngredientEntry>,
    pub bad: Vec<IngredientEntry>,
    pub score: f64,
    pub reasoning: String,
}

impl IngredientReport {
    /// Neutral report used when there is nothing to classify.
    pub fn neutral(reasoning: impl Into<String>) -> Self {
        Self {
            good: Vec::new(),
            bad: Vec::new(),
            score: 5.0,
            reasoning: reasoning.into(),
        }
    }
}

/// A forum post as seen by the ranking and synthesis stages.
///
/// Ephemeral: lives only within one analysis run. Only the top-3 summary
/// subset is folded into the persisted payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForumPost {
    pub title: String,
    pub body: String,
    pub score: i64,
    pub num_comments: i64,
    pub created_at: DateTime<Utc>,
    pub age_in_days: f64,
    pub url: String,
    pub subreddit: String,
    pub match_score: f64,
    #[serde(default)]
    pub relevance_score: f64,
    #[serde(default)]
    pub comments: Vec<PostComment>,
}

/// A filtered top-level comment attached to a ranked post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostComment {
    pub body: String,
    pub score: i64,
}

/// Compact post reference kept in the persisted analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopPost {
    pub title: String,
    pub url: String,
    pub score: i64,
    pub created_at: DateTime<Utc>,
    pub relevance_score: f64,
}

/// Synthesized community review sentiment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSynthesis {
    pub sentiment: String,
    pub positive_percent: f64,
    pub total_reviews: usize,
    pub key_themes: Vec<String>,
    pub summary: String,
    pub top_posts: Vec<TopPost>,
}

impl ReviewSynthesis {
    /// Default returned when no community posts were found.
    pub fn empty() -> Self {
        Self {
            sentiment: "neutral".to_string(),
            positive_percent: 50.0,
            total_reviews: 0,
            key_themes: Vec::new(),
            summary: "No community reviews found for this product.".to_string(),
            top_posts: Vec::new(),
        }
    }
}

/// Recommendation verdict, derived solely from the ingredient sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Recommended,
    Avoid,
    Mixed,
    Neutral,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductIdentity {
    pub name: String,
    pub brand: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngredientBreakdown {
    pub good: Vec<IngredientEntry>,
    pub bad: Vec<IngredientEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub verdict: Verdict,
    pub reasoning: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisDetail {
    pub score: f64,
    pub ingredients: IngredientBreakdown,
    pub reviews: ReviewSynthesis,
    pub recommendation: Recommendation,
}

/// The persisted unit of analysis, returned verbatim on cache hits except
/// for the `cached` flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductAnalysis {
    pub id: String,
    pub product: ProductIdentity,
    pub analysis: AnalysisDetail,
    pub cached: bool,
    pub analyzed_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum AnalyzerError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] sqlx::Error),

    #[error("Language model error: {0}")]
    Llm(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("General error: {0}")]
    General(String),
}

pub type Result<T> = std::result::Result<T, AnalyzerError>;
