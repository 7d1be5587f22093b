//! Database operations for the `prompt_results` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from `prompt_results`: one prompt execution within a report.
/// Written by the external batch runner; read-only here.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ResultRow {
    pub id: i64,
    pub report_id: i64,
    pub prompt_id: Option<i64>,
    pub brand_mentioned: bool,
    pub answer_excerpt: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Returns prompt results for a list of report IDs, chunked to stay under
/// the query-parameter ceiling.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] from the first failing chunk; prior chunks
/// are discarded.
pub async fn list_results_by_report_ids(
    pool: &PgPool,
    report_ids: &[i64],
) -> Result<Vec<ResultRow>, DbError> {
    sovdb_pipeline::fetch_chunked(report_ids, sovdb_pipeline::CHUNK_SIZE, |chunk| {
        let pool = pool.clone();
        let ids = chunk.to_vec();
        async move {
            sqlx::query_as::<_, ResultRow>(
                "SELECT id, report_id, prompt_id, brand_mentioned, answer_excerpt, created_at \
                 FROM prompt_results \
                 WHERE report_id = ANY($1) \
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
