//! Database operations for the `citations` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from `citations`: one URL referenced by one prompt result.
/// Many citations may point at the same URL record.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CitationRow {
    pub id: i64,
    pub result_id: i64,
    pub url_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Returns citations for a list of result IDs. Result-id lists routinely
/// run into the thousands, so chunks are fetched concurrently and collected
/// in full before any downstream deduplication.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] from the first failing chunk.
pub async fn list_citations_by_result_ids(
    pool: &PgPool,
    result_ids: &[i64],
) -> Result<Vec<CitationRow>, DbError> {
    sovdb_pipeline::fetch_chunked_concurrent(result_ids, sovdb_pipeline::CHUNK_SIZE, |chunk| {
        let pool = pool.clone();
        let ids = chunk.to_vec();
        async move {
            sqlx::query_as::<_, CitationRow>(
                "SELECT id, result_id, url_id, created_at \
                 FROM citations \
                 WHERE result_id = ANY($1) \
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
