//! Read models for the internal operations page.
//!
//! Four read-only tables: storage-state health, the per-brand session
//! matrix, a recent-citation trace, and the scheduling queue.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// Row counts per storage table, plus the duplicate (brand, day) report
/// count that the dedupe step exists to absorb.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StorageHealthRow {
    pub table_name: String,
    pub row_count: i64,
    /// Only meaningful for `reports`: (brand, day) pairs with more than one
    /// row. Zero for every other table.
    pub duplicate_keys: i64,
}

/// Queue-run status counts for one brand.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SessionMatrixRow {
    pub brand_slug: String,
    pub queued: i64,
    pub running: i64,
    pub succeeded: i64,
    pub failed: i64,
}

/// One recent citation with its full join context.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CitationTraceRow {
    pub report_date: NaiveDate,
    pub brand_slug: String,
    pub prompt_text: Option<String>,
    pub url: String,
    pub domain: String,
    pub category: String,
    pub cited_at: DateTime<Utc>,
}

/// One scheduling-queue entry with brand context.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SchedulingQueueRow {
    pub public_id: Uuid,
    pub brand_slug: String,
    pub status: String,
    pub trigger_source: String,
    pub prompts_total: i32,
    pub prompts_completed: i32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
}

/// Returns row counts for every storage table.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn storage_health(pool: &PgPool) -> Result<Vec<StorageHealthRow>, DbError> {
    let rows = sqlx::query_as::<_, StorageHealthRow>(
        "SELECT 'brands' AS table_name, COUNT(*) AS row_count, 0::bigint AS duplicate_keys \
           FROM brands \
         UNION ALL \
         SELECT 'tracked_prompts', COUNT(*), 0::bigint FROM tracked_prompts \
         UNION ALL \
         SELECT 'reports', COUNT(*), \
                (SELECT COUNT(*) FROM ( \
                    SELECT 1 FROM reports GROUP BY brand_id, report_date HAVING COUNT(*) > 1 \
                 ) dupes) \
           FROM reports \
         UNION ALL \
         SELECT 'prompt_results', COUNT(*), 0::bigint FROM prompt_results \
         UNION ALL \
         SELECT 'citations', COUNT(*), 0::bigint FROM citations \
         UNION ALL \
         SELECT 'urls', COUNT(*), 0::bigint FROM urls \
         UNION ALL \
         SELECT 'report_queue', COUNT(*), 0::bigint FROM report_queue",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns queue-run status counts per active brand, ordered by slug.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn session_matrix(pool: &PgPool) -> Result<Vec<SessionMatrixRow>, DbError> {
    let rows = sqlx::query_as::<_, SessionMatrixRow>(
        "SELECT \
             b.slug AS brand_slug, \
             COUNT(*) FILTER (WHERE q.status = 'queued')    AS queued, \
             COUNT(*) FILTER (WHERE q.status = 'running')   AS running, \
             COUNT(*) FILTER (WHERE q.status = 'succeeded') AS succeeded, \
             COUNT(*) FILTER (WHERE q.status = 'failed')    AS failed \
         FROM report_queue q \
         JOIN brands b ON b.id = q.brand_id \
         WHERE b.deleted_at IS NULL \
         GROUP BY b.slug \
         ORDER BY b.slug",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns the most recent citations with their full join context.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn citation_trace(pool: &PgPool, limit: i64) -> Result<Vec<CitationTraceRow>, DbError> {
    let rows = sqlx::query_as::<_, CitationTraceRow>(
        "SELECT \
             r.report_date, \
             b.slug AS brand_slug, \
             tp.text AS prompt_text, \
             u.url, \
             u.domain, \
             u.category, \
             c.created_at AS cited_at \
         FROM citations c \
         JOIN prompt_results pr ON pr.id = c.result_id \
         JOIN reports r ON r.id = pr.report_id \
         JOIN brands b ON b.id = r.brand_id \
         JOIN urls u ON u.id = c.url_id \
         LEFT JOIN tracked_prompts tp ON tp.id = pr.prompt_id \
         ORDER BY c.created_at DESC, c.id DESC \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns the newest scheduling-queue entries with brand context.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn scheduling_queue(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<SchedulingQueueRow>, DbError> {
    let rows = sqlx::query_as::<_, SchedulingQueueRow>(
        "SELECT \
             q.public_id, \
             b.slug AS brand_slug, \
             q.status, \
             q.trigger_source, \
             q.prompts_total, \
             q.prompts_completed, \
             q.error_message, \
             q.created_at, \
             q.started_at \
         FROM report_queue q \
         JOIN brands b ON b.id = q.brand_id \
         ORDER BY q.created_at DESC, q.id DESC \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
