use crate::cache::ProductCache;
use crate::classifier::classify_ingredients;
use crate::comments::CommentSource;
use crate::forum::ForumSearch;
use crate::llm::LlmClient;
use crate::ranker::rank_posts;
use crate::synthesizer::synthesize_reviews;
use crate::types::{
    AnalysisDetail, IngredientBreakdown, IngredientReport, ProductAnalysis, ProductIdentity,
    Recommendation, Result, UserProfile, Verdict,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Comments are fetched for at most this many top-ranked posts, one at a
/// time. Sequential on purpose: the comment endpoint rate-limits.
const COMMENT_ENRICHED_POSTS: usize = 3;

/// End-to-end product analysis orchestrator.
///
/// Cache-first: a hit returns the stored payload untouched except for the
/// `cached` flag. A miss runs classification (critical path), forum search,
/// ranking, comment enrichment and review synthesis, derives the verdict and
/// writes through to the cache.
pub struct AnalysisPipeline {
    cache: ProductCache,
    llm: Arc<dyn LlmClient>,
    forum: Arc<dyn ForumSearch>,
    comments: Arc<dyn CommentSource>,
}

impl AnalysisPipeline {
    pub fn new(
        cache: ProductCache,
        llm: Arc<dyn LlmClient>,
        forum: Arc<dyn ForumSearch>,
        comments: Arc<dyn CommentSource>,
    ) -> Self {
        Self {
            cache,
            llm,
            forum,
            comments,
        }
    }

    pub fn llm(&self) -> &dyn LlmClient {
        self.llm.as_ref()
    }

    pub fn cache(&self) -> &ProductCache {
        &self.cache
    }

    /// Run the full analysis pipeline for one product.
    pub async fn analyze(
        &self,
        product_name: &str,
        brand: &str,
        ingredients: &[String],
        profile: &UserProfile,
    ) -> Result<ProductAnalysis> {
        let request_id = Uuid::new_v4();
        let key = product_key(product_name, brand);
        info!(%request_id, %key, "Starting analysis");

        // Cache read is best-effort: a broken cache degrades to a recompute.
        match self.cache.get(&key).await {
            Ok(Some(hit)) => {
                if let Err(e) = self.cache.touch(&key).await {
                    warn!(%request_id, "Cache touch failed: {}", e);
                }
                info!(%request_id, %key, "Returning cached analysis");
                let mut analysis = hit.analysis;
                analysis.cached = true;
                return Ok(analysis);
            }
            Ok(None) => {}
            Err(e) => warn!(%request_id, "Cache read failed: {}", e),
        }

        // Critical path: a failing classifier propagates. A wrong verdict is
        // worse than no verdict.
        let report = classify_ingredients(self.llm.as_ref(), ingredients, profile).await?;

        let posts = self.forum.search(product_name, brand).await;
        let mut ranked = rank_posts(posts);

        for post in ranked.iter_mut().take(COMMENT_ENRICHED_POSTS) {
            post.comments = self.comments.top_comments(&post.url, product_name).await;
        }

        let reviews = synthesize_reviews(self.llm.as_ref(), &ranked, profile).await?;
        let verdict = derive_verdict(&report);

        let analysis = ProductAnalysis {
            id: key.clone(),
            product: ProductIdentity {
                name: product_name.to_string(),
                brand: brand.to_string(),
            },
            analysis: AnalysisDetail {
                score: report.score,
                ingredients: IngredientBreakdown {
                    good: report.good,
                    bad: report.bad,
                },
                reviews,
                recommendation: Recommendation {
                    verdict,
                    reasoning: report.reasoning,
                },
            },
            cached: false,
            analyzed_at: Utc::now(),
        };

        // Write-through is best-effort: the computed analysis is returned to
        // the caller even when the cache is down.
        if let Err(e) = self.cache.put(&key, &analysis).await {
            warn!(%request_id, "Cache write failed: {}", e);
        }

        info!(%request_id, %key, verdict = ?verdict, "Analysis complete");
        Ok(analysis)
    }
}

/// Deterministic cache identity for a product: lowercase, whitespace runs
/// collapsed to single hyphens. Distinct products that normalize to the same
/// string collide by design.
pub fn product_key(product_name: &str, brand: &str) -> String {
    format!("{} {}", brand, product_name)
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Recommendation verdict from the ingredient sets alone. Reviews never
/// influence the verdict.
pub fn derive_verdict(report: &IngredientReport) -> Verdict {
    match (!report.good.is_empty(), !report.bad.is_empty()) {
        (true, false) => Verdict::Recommended,
        (false, true) => Verdict::Avoid,
        (true, true) => Verdict::Mixed,
        (false, false) => Verdict::Neutral,
    }
}
