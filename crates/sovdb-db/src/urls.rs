//! Database operations for the `urls` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from `urls`: a cited URL with its domain and content-category label.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UrlRow {
    pub id: i64,
    pub url: String,
    pub domain: String,
    /// Content format of the page, e.g. `documentation`, `forum`, `comparison`.
    pub category: String,
    pub created_at: DateTime<Utc>,
}

/// Returns URL records for a list of url IDs, chunked. Callers dedupe the
/// ID list first; batching itself introduces no duplicates.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] from the first failing chunk.
pub async fn list_urls_by_ids(pool: &PgPool, url_ids: &[i64]) -> Result<Vec<UrlRow>, DbError> {
    sovdb_pipeline::fetch_chunked_concurrent(url_ids, sovdb_pipeline::CHUNK_SIZE, |chunk| {
        let pool = pool.clone();
        let ids = chunk.to_vec();
        async move {
            sqlx::query_as::<_, UrlRow>(
                "SELECT id, url, domain, category, created_at \
                 FROM urls \
                 WHERE id = ANY($1) \
                 ORDER BY id",
            )
            .bind(&ids)
            .fetch_all(&pool)
            .await
            .map_err(DbError::from)
        }
    })
    .await
}
