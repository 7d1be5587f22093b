//! Database operations for the `admin_sessions` table.
//!
//! Only the SHA-256 digest of a session token is ever stored; the raw
//! token exists solely in the login response and the client's header.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `admin_sessions` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AdminSessionRow {
    pub id: i64,
    pub token_digest: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Creates a session for the given token digest, expiring `ttl_secs` from now.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_admin_session(
    pool: &PgPool,
    token_digest: &str,
    ttl_secs: i64,
) -> Result<AdminSessionRow, DbError> {
    let row = sqlx::query_as::<_, AdminSessionRow>(
        "INSERT INTO admin_sessions (token_digest, expires_at) \
         VALUES ($1, NOW() + make_interval(secs => $2::float8)) \
         RETURNING id, token_digest, created_at, expires_at",
    )
    .bind(token_digest)
    .bind(ttl_secs)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Returns whether an unexpired session exists for the token digest.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn is_valid_admin_session(pool: &PgPool, token_digest: &str) -> Result<bool, DbError> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS( \
            SELECT 1 FROM admin_sessions \
            WHERE token_digest = $1 AND expires_at > NOW() \
         )",
    )
    .bind(token_digest)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// Deletes every expired session; returns the number removed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn purge_expired_admin_sessions(pool: &PgPool) -> Result<u64, DbError> {
    let result = sqlx::query("DELETE FROM admin_sessions WHERE expires_at <= NOW()")
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
