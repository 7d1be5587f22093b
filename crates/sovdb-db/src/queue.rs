//! Database operations for the `report_queue` table.
//!
//! Queue entries are created here (re-runs, onboarding's first run) and
//! consumed by the external batch runner, which advances the
//! `prompts_completed` counter that progress screens poll.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `report_queue` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReportQueueRow {
    pub id: i64,
    pub public_id: Uuid,
    pub brand_id: i64,
    pub status: String,
    pub trigger_source: String,
    pub prompts_total: i32,
    pub prompts_completed: i32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Creates a queue entry in `queued` status and returns the full row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn enqueue_report_run(
    pool: &PgPool,
    brand_id: i64,
    trigger_source: &str,
    prompts_total: i32,
) -> Result<ReportQueueRow, DbError> {
    let public_id = Uuid::new_v4();

    let row = sqlx::query_as::<_, ReportQueueRow>(
        "INSERT INTO report_queue (public_id, brand_id, status, trigger_source, prompts_total) \
         VALUES ($1, $2, 'queued', $3, $4) \
         RETURNING id, public_id, brand_id, status, trigger_source, prompts_total, \
                   prompts_completed, error_message, created_at, started_at, completed_at",
    )
    .bind(public_id)
    .bind(brand_id)
    .bind(trigger_source)
    .bind(prompts_total)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Returns a queue entry by public id, or `None` if unknown.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_queue_run(
    pool: &PgPool,
    public_id: Uuid,
) -> Result<Option<ReportQueueRow>, DbError> {
    let row = sqlx::query_as::<_, ReportQueueRow>(
        "SELECT id, public_id, brand_id, status, trigger_source, prompts_total, \
                prompts_completed, error_message, created_at, started_at, completed_at \
         FROM report_queue \
         WHERE public_id = $1",
    )
    .bind(public_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Marks a run as `running` and sets `started_at = NOW()`.
///
/// # Errors
///
/// Returns [`DbError::InvalidQueueTransition`] if the run is not `queued`.
pub async fn start_queue_run(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE report_queue \
         SET status = 'running', started_at = NOW() \
         WHERE id = $1 AND status = 'queued'",
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidQueueTransition {
            id,
            expected_status: "queued",
        });
    }

    Ok(())
}

/// Marks a run as `succeeded` and sets `completed_at = NOW()`.
///
/// # Errors
///
/// Returns [`DbError::InvalidQueueTransition`] if the run is not `running`.
pub async fn complete_queue_run(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE report_queue \
         SET status = 'succeeded', completed_at = NOW() \
         WHERE id = $1 AND status = 'running'",
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidQueueTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Marks a run as `failed` with an error message.
///
/// # Errors
///
/// Returns [`DbError::InvalidQueueTransition`] if the run is not `running`.
pub async fn fail_queue_run(pool: &PgPool, id: i64, error_message: &str) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE report_queue \
         SET status = 'failed', completed_at = NOW(), error_message = $1 \
         WHERE id = $2 AND status = 'running'",
    )
    .bind(error_message)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidQueueTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Fails every `running` run whose `started_at` is older than
/// `stale_after_secs`. Used by the janitor; returns the number failed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn fail_stalled_runs(pool: &PgPool, stale_after_secs: i64) -> Result<u64, DbError> {
    let result = sqlx::query(
        "UPDATE report_queue \
         SET status = 'failed', completed_at = NOW(), \
             error_message = 'stalled: no progress within the run ceiling' \
         WHERE status = 'running' \
           AND started_at < NOW() - make_interval(secs => $1::float8)",
    )
    .bind(stale_after_secs)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
