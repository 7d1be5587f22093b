//! Pre-aggregated content-category read model.
//!
//! Two content-analysis widgets read the server-side
//! `content_category_summary` function instead of aggregating client-side;
//! the database groups, counts, and ranks the top URLs in one pass.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

/// One already-grouped category row from `content_category_summary`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CategorySummaryRow {
    pub category: String,
    pub unique_urls: i64,
    pub citation_count: i64,
    /// Share of all in-range citations, rounded to two decimals.
    pub percentage: Option<Decimal>,
    /// The five most-cited URLs in the category, most-cited first.
    pub top_urls: Vec<String>,
}

/// Returns the pre-aggregated category summary for a brand and date range,
/// ordered by citation count descending.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn category_summary(
    pool: &PgPool,
    brand_id: i64,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<CategorySummaryRow>, DbError> {
    let rows = sqlx::query_as::<_, CategorySummaryRow>(
        "SELECT category, unique_urls, citation_count, percentage, top_urls \
         FROM content_category_summary($1, $2, $3)",
    )
    .bind(brand_id)
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
