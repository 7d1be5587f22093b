//! Postgres access for the sovdb workspace: pool construction, embedded
//! migrations, and the shared [`DbError`]. Table-level queries live in the
//! per-table modules at the bottom of this file.

use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use thiserror::Error;

// Compiled in at build time; the path resolves from crates/sovdb-db/ up to
// the workspace-root migrations/ directory.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

/// Connection-pool sizing, overridable through the `SOVDB_DB_*` env vars.
#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 1,
            acquire_timeout_secs: 10,
        }
    }
}

impl PoolConfig {
    /// Reads pool sizing from the environment, keeping the defaults for
    /// anything unset or unparsable.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_connections: env_or("SOVDB_DB_MAX_CONNECTIONS", defaults.max_connections),
            min_connections: env_or("SOVDB_DB_MIN_CONNECTIONS", defaults.min_connections),
            acquire_timeout_secs: env_or(
                "SOVDB_DB_ACQUIRE_TIMEOUT_SECS",
                defaults.acquire_timeout_secs,
            ),
        }
    }

    /// Opens a Postgres pool sized by this config.
    ///
    /// # Errors
    ///
    /// Returns [`sqlx::Error`] if no connection can be established within
    /// the acquire timeout.
    pub async fn connect(self, database_url: &str) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(Duration::from_secs(self.acquire_timeout_secs))
            .connect(database_url)
            .await
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("DATABASE_URL is not set")]
    MissingDatabaseUrl,
    #[error("record not found")]
    NotFound,
    #[error("queue run {id} is not in expected status '{expected_status}'")]
    InvalidQueueTransition { id: i64, expected_status: &'static str },
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Opens a pool from `DATABASE_URL` plus the `SOVDB_DB_*` sizing vars.
///
/// # Errors
///
/// Returns [`DbError::MissingDatabaseUrl`] when the URL is unset, otherwise
/// whatever [`PoolConfig::connect`] reports.
pub async fn connect_pool_from_env() -> Result<PgPool, DbError> {
    let database_url = std::env::var("DATABASE_URL").map_err(|_| DbError::MissingDatabaseUrl)?;
    Ok(PoolConfig::from_env().connect(&database_url).await?)
}

/// Applies pending migrations and returns how many ran.
///
/// # Errors
///
/// Returns [`sqlx::migrate::MigrateError`] if any migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<usize, sqlx::migrate::MigrateError> {
    let before = applied_migrations(pool).await;
    MIGRATOR.run(pool).await?;
    let after = applied_migrations(pool).await;
    Ok(usize::try_from((after - before).max(0)).unwrap_or(0))
}

// The bookkeeping table does not exist on a fresh database; treat that as
// zero applied rather than an error.
async fn applied_migrations(pool: &PgPool) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = true")
        .fetch_one(pool)
        .await
        .unwrap_or(0)
}

/// Confirms the pool can complete a trivial round trip.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] when the query fails.
pub async fn health_check(pool: &PgPool) -> Result<(), DbError> {
    sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(pool)
        .await?;
    Ok(())
}

fn env_or<T: FromStr>(var: &str, default: T) -> T {
    std::env::var(var)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pool_sizing_is_small_and_patient() {
        let config = PoolConfig::default();
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 1);
        assert_eq!(config.acquire_timeout_secs, 10);
    }
}

pub mod admin_sessions;
pub mod brands;
pub mod citations;
pub mod content_categories;
pub mod forensic;
pub mod prompts;
pub mod queue;
pub mod reports;
pub mod results;
pub mod urls;

pub use admin_sessions::{
    create_admin_session, is_valid_admin_session, purge_expired_admin_sessions, AdminSessionRow,
};
pub use brands::{
    complete_onboarding, create_brand, get_brand_by_slug, update_brand_analysis, BrandRow,
};
pub use citations::{list_citations_by_result_ids, CitationRow};
pub use content_categories::{category_summary, CategorySummaryRow};
pub use forensic::{
    citation_trace, scheduling_queue, session_matrix, storage_health, CitationTraceRow,
    SchedulingQueueRow, SessionMatrixRow, StorageHealthRow,
};
pub use prompts::{
    count_active_prompts, deactivate_prompt, insert_prompts, list_active_prompts,
    TrackedPromptRow,
};
pub use queue::{
    complete_queue_run, enqueue_report_run, fail_queue_run, fail_stalled_runs, get_queue_run,
    start_queue_run, ReportQueueRow,
};
pub use reports::{list_completed_reports, ReportRow};
pub use results::{list_results_by_report_ids, ResultRow};
pub use urls::{list_urls_by_ids, UrlRow};
