use crate::types::{ProductAnalysis, Result};
use chrono::{DateTime, Duration, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

/// Cache entries live for 30 days before being flagged stale.
const TTL_DAYS: i64 = 30;

/// Entries read at least this often are flagged hot.
const HOT_REQUEST_THRESHOLD: i64 = 50;

/// A cache read: the stored analysis plus advisory freshness metadata.
///
/// `is_expired` and `is_hot` are hints for direct inspectors. The analysis
/// pipeline deliberately ignores them: a hit is a hit.
#[derive(Debug, Clone)]
pub struct CacheLookup {
    pub analysis: ProductAnalysis,
    pub cached_at: DateTime<Utc>,
    pub request_count: i64,
    pub is_expired: bool,
    pub is_hot: bool,
}

/// Durable per-key store for completed product analyses.
///
/// Each key maps to one row; every operation is a single SQL statement, so
/// read-modify-write on a key is atomic and keys never contend with each
/// other. There is no transactional guarantee across a full
/// read-compute-write analysis run: concurrent writers for the same key race
/// and the last write wins.
pub struct ProductCache {
    db: SqlitePool,
}

impl ProductCache {
    /// Open (or create) the cache database at the given sqlx URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let db = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Self::init_schema(&db).await?;
        info!("Product cache ready at {}", database_url);
        Ok(Self { db })
    }

    /// Throwaway in-memory cache. A single connection keeps the whole pool
    /// on one SQLite memory database.
    pub async fn in_memory() -> Result<Self> {
        let db = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Self::init_schema(&db).await?;
        Ok(Self { db })
    }

    async fn init_schema(db: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS product_cache (
                id TEXT PRIMARY KEY,
                payload TEXT NOT NULL,
                cached_at INTEGER NOT NULL,
                request_count INTEGER NOT NULL DEFAULT 0,
                expires_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(db)
        .await?;
        Ok(())
    }

    /// Look up a product key. Absence is `None`, never an error.
    pub async fn get(&self, key: &str) -> Result<Option<CacheLookup>> {
        let row = sqlx::query(
            "SELECT payload, cached_at, request_count, expires_at FROM product_cache WHERE id = ?",
        )
        .bind(key)
        .fetch_optional(&self.db)
        .await?;

        let Some(row) = row else {
            debug!("Cache miss for {}", key);
            return Ok(None);
        };

        let payload: String = row.try_get("payload")?;
        let cached_at_ms: i64 = row.try_get("cached_at")?;
        let request_count: i64 = row.try_get("request_count")?;
        let expires_at_ms: i64 = row.try_get("expires_at")?;

        let analysis: ProductAnalysis = serde_json::from_str(&payload)?;
        let now_ms = Utc::now().timestamp_millis();

        debug!("Cache hit for {} (requests: {})", key, request_count);
        Ok(Some(CacheLookup {
            analysis,
            cached_at: DateTime::from_timestamp_millis(cached_at_ms).unwrap_or_else(Utc::now),
            request_count,
            is_expired: now_ms > expires_at_ms,
            is_hot: request_count >= HOT_REQUEST_THRESHOLD,
        }))
    }

    /// Store an analysis, resetting the request counter and TTL window.
    pub async fn put(&self, key: &str, analysis: &ProductAnalysis) -> Result<()> {
        let payload = serde_json::to_string(analysis)?;
        let now = Utc::now();
        let expires_at = now + Duration::days(TTL_DAYS);

        sqlx::query(
            r#"
            INSERT INTO product_cache (id, payload, cached_at, request_count, expires_at)
            VALUES (?, ?, ?, 0, ?)
            ON CONFLICT(id) DO UPDATE SET
                payload = excluded.payload,
                cached_at = excluded.cached_at,
                request_count = 0,
                expires_at = excluded.expires_at
            "#,
        )
        .bind(key)
        .bind(payload)
        .bind(now.timestamp_millis())
        .bind(expires_at.timestamp_millis())
        .execute(&self.db)
        .await?;

        info!("Cached analysis for {}", key);
        Ok(())
    }

    /// Record a cache hit. No-op when the key is absent.
    pub async fn touch(&self, key: &str) -> Result<()> {
        sqlx::query("UPDATE product_cache SET request_count = request_count + 1 WHERE id = ?")
            .bind(key)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    /// Drop a cached entry. Returns whether anything was removed.
    pub async fn clear(&self, key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM product_cache WHERE id = ?")
            .bind(key)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        AnalysisDetail, IngredientBreakdown, ProductIdentity, Recommendation, ReviewSynthesis,
        Verdict,
    };

    fn sample_analysis(key: &str) -> ProductAnalysis {
        ProductAnalysis {
            id: key.to_string(),
            product: ProductIdentity {
                name: "Moisturizing Cream".to_string(),
                brand: "CeraVe".to_string(),
            },
            analysis: AnalysisDetail {
                score: 7.5,
                ingredients: IngredientBreakdown {
                    good: Vec::new(),
                    bad: Vec::new(),
                },
                reviews: ReviewSynthesis::empty(),
                recommendation: Recommendation {
                    verdict: Verdict::Neutral,
                    reasoning: "test".to_string(),
                },
            },
            cached: false,
            analyzed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn get_on_missing_key_is_none() {
        let cache = ProductCache::in_memory().await.unwrap();
        assert!(cache.get("absent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn put_then_get_roundtrips_with_fresh_flags() {
        let cache = ProductCache::in_memory().await.unwrap();
        cache.put("k", &sample_analysis("k")).await.unwrap();

        let hit = cache.get("k").await.unwrap().unwrap();
        assert_eq!(hit.analysis.analysis.score, 7.5);
        assert_eq!(hit.request_count, 0);
        assert!(!hit.is_expired);
        assert!(!hit.is_hot);
    }

    #[tokio::test]
    async fn touch_increments_and_is_noop_when_absent() {
        let cache = ProductCache::in_memory().await.unwrap();
        cache.touch("nothing-here").await.unwrap();

        cache.put("k", &sample_analysis("k")).await.unwrap();
        cache.touch("k").await.unwrap();
        cache.touch("k").await.unwrap();

        let hit = cache.get("k").await.unwrap().unwrap();
        assert_eq!(hit.request_count, 2);
    }

    #[tokio::test]
    async fn put_resets_request_count() {
        let cache = ProductCache::in_memory().await.unwrap();
        cache.put("k", &sample_analysis("k")).await.unwrap();
        cache.touch("k").await.unwrap();
        cache.put("k", &sample_analysis("k")).await.unwrap();

        let hit = cache.get("k").await.unwrap().unwrap();
        assert_eq!(hit.request_count, 0);
    }

    #[tokio::test]
    async fn hot_flag_trips_at_threshold() {
        let cache = ProductCache::in_memory().await.unwrap();
        cache.put("k", &sample_analysis("k")).await.unwrap();
        for _ in 0..HOT_REQUEST_THRESHOLD {
            cache.touch("k").await.unwrap();
        }
        let hit = cache.get("k").await.unwrap().unwrap();
        assert!(hit.is_hot);
    }

    #[tokio::test]
    async fn expired_flag_is_advisory_not_eviction() {
        let cache = ProductCache::in_memory().await.unwrap();
        cache.put("k", &sample_analysis("k")).await.unwrap();

        // Backdate the entry past its TTL.
        sqlx::query("UPDATE product_cache SET expires_at = ? WHERE id = ?")
            .bind(Utc::now().timestamp_millis() - 1_000)
            .bind("k")
            .execute(&cache.db)
            .await
            .unwrap();

        let hit = cache.get("k").await.unwrap().unwrap();
        assert!(hit.is_expired);
        assert_eq!(hit.analysis.analysis.score, 7.5);
    }

    #[tokio::test]
    async fn clear_removes_entry() {
        let cache = ProductCache::in_memory().await.unwrap();
        cache.put("k", &sample_analysis("k")).await.unwrap();
        assert!(cache.clear("k").await.unwrap());
        assert!(!cache.clear("k").await.unwrap());
        assert!(cache.get("k").await.unwrap().is_none());
    }
}
