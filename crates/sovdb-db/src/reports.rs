//! Database operations for the `reports` table.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `reports` table: one automated visibility check for one
/// brand on one calendar day.
///
/// Repeated processing upstream can leave duplicate rows per
/// (`brand_id`, `report_date`); readers dedupe, keeping the highest
/// `visibility_score`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReportRow {
    pub id: i64,
    pub public_id: Uuid,
    pub brand_id: i64,
    pub report_date: NaiveDate,
    pub status: String,
    pub visibility_score: Option<Decimal>,
    /// Per-entity mention counts, e.g. `{"Acme Insights": 12, "Signalhouse": 4}`.
    pub entity_breakdown: Value,
    pub extracted_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Returns completed reports for a brand within an inclusive date range,
/// in stable (`report_date`, `id`) order so downstream first-seen-wins
/// tie-breaks are deterministic.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_completed_reports(
    pool: &PgPool,
    brand_id: i64,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<ReportRow>, DbError> {
    let rows = sqlx::query_as::<_, ReportRow>(
        "SELECT id, public_id, brand_id, report_date, status, visibility_score, \
                entity_breakdown, extracted_at, created_at \
         FROM reports \
         WHERE brand_id = $1 \
           AND status = 'completed' \
           AND report_date BETWEEN $2 AND $3 \
         ORDER BY report_date, id",
    )
    .bind(brand_id)
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
