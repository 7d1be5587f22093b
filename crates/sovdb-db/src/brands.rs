//! Database operations for the `brands` table.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `brands` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BrandRow {
    pub id: i64,
    pub public_id: Uuid,
    pub name: String,
    pub slug: String,
    pub website: Option<String>,
    pub description: Option<String>,
    pub keywords: Vec<String>,
    pub onboarding_answers: Value,
    pub onboarding_completed_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Creates a new brand row and returns it.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, including unique-slug
/// violations.
pub async fn create_brand(
    pool: &PgPool,
    name: &str,
    slug: &str,
    website: Option<&str>,
) -> Result<BrandRow, DbError> {
    let row = sqlx::query_as::<_, BrandRow>(
        "INSERT INTO brands (name, slug, website, is_active) \
         VALUES ($1, $2, $3, true) \
         RETURNING id, public_id, name, slug, website, description, keywords, \
                   onboarding_answers, onboarding_completed_at, is_active, \
                   created_at, updated_at, deleted_at",
    )
    .bind(name)
    .bind(slug)
    .bind(website)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Returns a single active, non-deleted brand by slug, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_brand_by_slug(pool: &PgPool, slug: &str) -> Result<Option<BrandRow>, DbError> {
    let row = sqlx::query_as::<_, BrandRow>(
        "SELECT id, public_id, name, slug, website, description, keywords, \
                onboarding_answers, onboarding_completed_at, is_active, \
                created_at, updated_at, deleted_at \
         FROM brands \
         WHERE slug = $1 AND is_active = true AND deleted_at IS NULL",
    )
    .bind(slug)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Stores the website-analysis output (description and keywords) on a brand.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the brand does not exist.
pub async fn update_brand_analysis(
    pool: &PgPool,
    brand_id: i64,
    description: &str,
    keywords: &[String],
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE brands \
         SET description = $1, keywords = $2, updated_at = NOW() \
         WHERE id = $3 AND deleted_at IS NULL",
    )
    .bind(description)
    .bind(keywords)
    .bind(brand_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}

/// Saves the final onboarding answers and stamps completion.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the brand does not exist.
pub async fn complete_onboarding(
    pool: &PgPool,
    brand_id: i64,
    answers: &Value,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE brands \
         SET onboarding_answers = $1, onboarding_completed_at = NOW(), updated_at = NOW() \
         WHERE id = $2 AND deleted_at IS NULL",
    )
    .bind(answers)
    .bind(brand_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}
