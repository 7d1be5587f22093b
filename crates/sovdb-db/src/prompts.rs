//! Database operations for the `tracked_prompts` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `tracked_prompts` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TrackedPromptRow {
    pub id: i64,
    pub brand_id: i64,
    pub text: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub deactivated_at: Option<DateTime<Utc>>,
}

/// Inserts a batch of prompt texts for a brand and returns the new rows.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_prompts(
    pool: &PgPool,
    brand_id: i64,
    texts: &[String],
) -> Result<Vec<TrackedPromptRow>, DbError> {
    let rows = sqlx::query_as::<_, TrackedPromptRow>(
        "INSERT INTO tracked_prompts (brand_id, text) \
         SELECT $1, UNNEST($2::text[]) \
         RETURNING id, brand_id, text, is_active, created_at, deactivated_at",
    )
    .bind(brand_id)
    .bind(texts)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns a brand's active prompts, oldest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_active_prompts(
    pool: &PgPool,
    brand_id: i64,
) -> Result<Vec<TrackedPromptRow>, DbError> {
    let rows = sqlx::query_as::<_, TrackedPromptRow>(
        "SELECT id, brand_id, text, is_active, created_at, deactivated_at \
         FROM tracked_prompts \
         WHERE brand_id = $1 AND is_active = true \
         ORDER BY id",
    )
    .bind(brand_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Counts a brand's active prompts.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_active_prompts(pool: &PgPool, brand_id: i64) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM tracked_prompts WHERE brand_id = $1 AND is_active = true",
    )
    .bind(brand_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Soft-deactivates a tracked prompt. Returns `false` if the prompt was
/// unknown or already inactive.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn deactivate_prompt(pool: &PgPool, prompt_id: i64) -> Result<bool, DbError> {
    let result = sqlx::query(
        "UPDATE tracked_prompts \
         SET is_active = false, deactivated_at = NOW() \
         WHERE id = $1 AND is_active = true",
    )
    .bind(prompt_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
