use super::routes::{
    analyze_product, clear_cache, extract_product_info, health, test_ai, AppState,
};
use crate::pipeline::AnalysisPipeline;
use anyhow::Result;
use axum::routing::{delete, get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

/// Assemble the API router. All responses carry a permissive CORS header so
/// the browser extension can call the API from any page origin.
pub fn build_router(pipeline: Arc<AnalysisPipeline>) -> Router {
    let state = Arc::new(AppState { pipeline });

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/test-ai", get(test_ai))
        .route("/api/v1/products/extract", post(extract_product_info))
        .route("/api/v1/products/analyze", post(analyze_product))
        .route("/api/v1/cache/clear", delete(clear_cache))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// Bind and serve the API until the process is stopped.
pub async fn serve(host: &str, port: u16, pipeline: Arc<AnalysisPipeline>) -> Result<()> {
    let app = build_router(pipeline);
    let addr = format!("{}:{}", host, port);
    info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
