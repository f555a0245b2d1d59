use crate::extract::{extract_product, PageInfo};
use crate::pipeline::AnalysisPipeline;
use crate::types::{AnalyzerError, ProductAnalysis, UserProfile};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::error;

/// Fixed connectivity probe sent by the test endpoint.
const TEST_PROMPT: &str =
    "What is niacinamide and what does it do for skin? Answer in 2 sentences.";

/// Application state shared across handlers.
pub struct AppState {
    pub pipeline: Arc<AnalysisPipeline>,
}

/// Error envelope: `{success: false, error, timestamp}` with 4xx/5xx.
///
/// Validation errors carry their message; everything else is logged in full
/// and reported with a generic message.
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<AnalyzerError> for ApiError {
    fn from(err: AnalyzerError) -> Self {
        match err {
            AnalyzerError::InvalidRequest(message) => Self {
                status: StatusCode::BAD_REQUEST,
                message,
            },
            other => {
                error!("Request failed: {}", other);
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: "Internal server error".to_string(),
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "success": false,
            "error": self.message,
            "timestamp": Utc::now().to_rfc3339(),
        });
        (self.status, Json(body)).into_response()
    }
}

/// GET /api/v1/health
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "services": {
            "llm": "operational",
            "forum": "operational",
            "cache": "operational",
        },
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// GET /api/v1/test-ai
pub async fn test_ai(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let llm = state.pipeline.llm();
    let response = llm.chat(TEST_PROMPT).await?;

    Ok(Json(json!({
        "success": true,
        "model": llm.model_name(),
        "response": response,
        "timestamp": Utc::now().to_rfc3339(),
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeRequest {
    product_name: String,
    #[serde(default)]
    brand: String,
    #[serde(default)]
    ingredients: Vec<String>,
    user_profile: UserProfile,
}

/// POST /api/v1/products/analyze
pub async fn analyze_product(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<ProductAnalysis>, ApiError> {
    require_fields(&body, &["productName", "userProfile"])?;
    let request: AnalyzeRequest = parse_body(body)?;

    let analysis = state
        .pipeline
        .analyze(
            &request.product_name,
            &request.brand,
            &request.ingredients,
            &request.user_profile,
        )
        .await?;

    Ok(Json(analysis))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExtractRequest {
    page_info: PageInfo,
    #[serde(default)]
    page_text: String,
}

/// POST /api/v1/products/extract
pub async fn extract_product_info(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    require_fields(&body, &["pageInfo"])?;
    let request: ExtractRequest = parse_body(body)?;

    let extracted =
        extract_product(state.pipeline.llm(), &request.page_info, &request.page_text).await?;

    Ok(Json(json!({
        "success": true,
        "productName": extracted.product_name,
        "brand": extracted.brand,
        "confidence": extracted.confidence,
        "timestamp": Utc::now().to_rfc3339(),
    })))
}

#[derive(Debug, Deserialize)]
pub struct ClearCacheParams {
    #[serde(rename = "productId")]
    product_id: Option<String>,
}

/// DELETE /api/v1/cache/clear?productId=
pub async fn clear_cache(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ClearCacheParams>,
) -> Result<Json<Value>, ApiError> {
    let product_id = params
        .product_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AnalyzerError::InvalidRequest("Missing productId parameter".to_string()))?;

    let removed = state.pipeline.cache().clear(&product_id).await?;
    let message = if removed {
        format!("Cache cleared for product: {}", product_id)
    } else {
        format!("No cache entry for product: {}", product_id)
    };

    Ok(Json(json!({ "success": true, "message": message })))
}

/// Reject requests whose required fields are absent, null or empty strings
/// before any external call is made.
fn require_fields(body: &Value, fields: &[&str]) -> Result<(), AnalyzerError> {
    let missing: Vec<&str> = fields
        .iter()
        .copied()
        .filter(|field| match body.get(*field) {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.is_empty(),
            Some(_) => false,
        })
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AnalyzerError::InvalidRequest(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )))
    }
}

fn parse_body<T: serde::de::DeserializeOwned>(body: Value) -> Result<T, AnalyzerError> {
    serde_json::from_value(body)
        .map_err(|e| AnalyzerError::InvalidRequest(format!("Malformed request body: {}", e)))
}
